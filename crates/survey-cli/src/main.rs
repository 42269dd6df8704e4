use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use survey_collect::config::{SurveyConfig, CONFIG_TEMPLATE};
use survey_collect::timeline::{build_timeline, scenario_order};
use survey_collect::{analysis, export, validate};
use survey_collect::{
    ClientEnvironment, CollectorOptions, CompletionOutcome, DataCollector, FileKvStore,
    HeaderPolicy, HttpTransport, KeyValueStore, ParticipantContext, RecordStore, RunnerHooks,
    TrialData, SNAPSHOT_KEY,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "survey", version = "0.1.0", about = "Bayesian morality survey data tools")]
struct Cli {
    #[arg(long, global = true, default_value = "survey.yaml")]
    config: PathBuf,
    #[arg(long, global = true)]
    storage_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Init {
        #[arg(long)]
        force: bool,
    },
    Plan {
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        json: bool,
    },
    Run {
        events: PathBuf,
        #[arg(long, default_value = "")]
        url: String,
        #[arg(long, default_value = "survey-cli")]
        user_agent: String,
        #[arg(long, default_value_t = 0)]
        screen_width: u32,
        #[arg(long, default_value_t = 0)]
        screen_height: u32,
        #[arg(long)]
        json: bool,
    },
    Export {
        #[arg(long)]
        out_dir: Option<PathBuf>,
        #[arg(long)]
        filename: Option<String>,
        #[arg(long)]
        union_headers: bool,
    },
    Validate {
        #[arg(long)]
        json: bool,
    },
    Analyze {
        #[arg(long)]
        json: bool,
    },
    Progress {
        #[arg(long)]
        expected: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    Submit {
        #[arg(long)]
        endpoint: Option<String>,
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let json_mode = command_json_mode(&cli.command);
    let mut config = SurveyConfig::load_or_default(Some(&cli.config))?;
    if let Some(dir) = &cli.storage_dir {
        config.storage_dir = dir.clone();
    }
    init_logging(&config.log_level);

    let result = run_command(cli.command, &cli.config, &config);
    match result {
        Ok(Some(payload)) => {
            emit_json(&payload);
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(err) => {
            if json_mode {
                emit_json(&json_error("command_failed", err.to_string(), json!({})));
                std::process::exit(1);
            }
            Err(err)
        }
    }
}

fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run_command(
    command: Commands,
    config_path: &Path,
    config: &SurveyConfig,
) -> Result<Option<Value>> {
    match command {
        Commands::Init { force } => {
            if !force && config_path.exists() {
                return Err(anyhow!(
                    "config file already exists (use --force): {}",
                    config_path.display()
                ));
            }
            if let Some(parent) = config_path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(config_path, CONFIG_TEMPLATE)?;
            println!("wrote: {}", config_path.display());
            println!("next: survey plan");
        }
        Commands::Plan { seed, json } => {
            let seed = seed.unwrap_or(config.random_seed);
            let steps = build_timeline(seed);
            if json {
                return Ok(Some(json!({
                    "ok": true,
                    "command": "plan",
                    "seed": seed,
                    "scenario_order": scenario_order(&steps),
                    "steps": steps,
                })));
            }
            println!("seed: {}", seed);
            println!("steps: {}", steps.len());
            for (i, step) in steps.iter().enumerate() {
                println!("{:>3}: {}", i, serde_json::to_string(step)?);
            }
        }
        Commands::Run {
            events,
            url,
            user_agent,
            screen_width,
            screen_height,
            json,
        } => {
            let env = ClientEnvironment {
                user_agent,
                screen_width,
                screen_height,
            };
            let participant = ParticipantContext::resolve(&url, &env);
            let storage = file_store(config);
            let mut collector = DataCollector::new(
                participant,
                storage,
                HttpTransport::new(),
                CollectorOptions::from(config),
            );
            let trials = read_events(&events)?;
            let trial_count = trials.len();
            for data in trials {
                collector.on_trial_complete(data);
            }
            let outcome = collector.on_experiment_complete();
            let completion_url = collector
                .participant()
                .has_participant_id()
                .then(|| config.completion_url.clone());
            if json {
                return Ok(Some(json!({
                    "ok": true,
                    "command": "run",
                    "trials": trial_count,
                    "outcome": outcome_to_json(&outcome),
                    "completion_url": completion_url,
                })));
            }
            println!("trials: {}", trial_count);
            print_outcome(&outcome);
            if let Some(u) = completion_url {
                println!("completion_url: {}", u);
            }
        }
        Commands::Export {
            out_dir,
            filename,
            union_headers,
        } => {
            let stored = load_stored_records(&file_store(config))?;
            let policy = if union_headers {
                HeaderPolicy::Union
            } else {
                config.header_policy
            };
            match out_dir {
                Some(dir) => {
                    let path = export::download_csv(
                        stored.records.records(),
                        policy,
                        &dir,
                        filename.as_deref(),
                    )?;
                    eprintln!("wrote: {}", path.display());
                }
                None => {
                    let csv = export::export_csv(stored.records.records(), policy);
                    if !csv.is_empty() {
                        println!("{}", csv);
                    }
                }
            }
        }
        Commands::Validate { json } => {
            let stored = load_stored_records(&file_store(config))?;
            let result = validate::validate_data(stored.records.records());
            if json {
                return Ok(Some(json!({
                    "ok": result.is_valid,
                    "command": "validate",
                    "validation": result,
                })));
            }
            if !result.is_valid {
                for e in &result.errors {
                    eprintln!("validation error: {}", e);
                }
                std::process::exit(1);
            }
            println!("ok");
        }
        Commands::Analyze { json } => {
            let stored = load_stored_records(&file_store(config))?;
            let summary =
                analysis::process_for_analysis(stored.records.records(), &stored.participant);
            if json {
                return Ok(Some(json!({
                    "ok": true,
                    "command": "analyze",
                    "analysis": summary,
                })));
            }
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Progress { expected, json } => {
            let stored = load_stored_records(&file_store(config))?;
            let progress = analysis::progress(
                stored.records.len(),
                expected.unwrap_or(config.expected_trials),
            );
            if json {
                return Ok(Some(json!({
                    "ok": true,
                    "command": "progress",
                    "progress": progress,
                })));
            }
            println!("completed: {}", progress.completed);
            println!("total: {}", progress.total);
            println!("percentage: {:.1}", progress.percentage);
        }
        Commands::Submit { endpoint, json } => {
            let storage = file_store(config);
            let stored = load_stored_records(&storage)?;
            if stored.records.is_empty() {
                return Err(anyhow!(
                    "no stored trials under {}",
                    config.storage_dir.display()
                ));
            }
            let mut collector = DataCollector::restore(
                stored.participant,
                stored.records,
                storage,
                HttpTransport::new(),
                CollectorOptions::from(config),
            );
            let sent = collector.send_to_server(endpoint.as_deref());
            if json {
                return Ok(Some(json!({
                    "ok": sent,
                    "command": "submit",
                    "trials": collector.records().len(),
                    "endpoint": endpoint.unwrap_or_else(|| config.endpoint.clone()),
                })));
            }
            if !sent {
                return Err(anyhow!("submission failed; data kept in local storage"));
            }
            println!("submitted: {}", collector.records().len());
        }
    }
    Ok(None)
}

fn file_store(config: &SurveyConfig) -> FileKvStore {
    FileKvStore::new(&config.storage_dir).with_quota(config.storage_quota_bytes)
}

struct StoredSession {
    participant: ParticipantContext,
    records: RecordStore,
}

// The stored records carry the participant context they were collected
// under, so that context is reused instead of resolving a new one.
fn load_stored_records(storage: &FileKvStore) -> Result<StoredSession> {
    let records: RecordStore = match storage.get_item(SNAPSHOT_KEY)? {
        Some(raw) => serde_json::from_str(&raw).with_context(|| {
            format!(
                "stored snapshot is not valid JSON: {}",
                storage.path_for(SNAPSHOT_KEY).display()
            )
        })?,
        None => RecordStore::new(),
    };
    let participant = records
        .records()
        .first()
        .map(|r| r.participant().clone())
        .unwrap_or_else(|| ParticipantContext::resolve("", &ClientEnvironment::default()));
    tracing::debug!(
        trials = records.len(),
        storage_dir = %storage.dir().display(),
        "loaded stored session"
    );
    Ok(StoredSession {
        participant,
        records,
    })
}

fn read_events(path: &Path) -> Result<Vec<TrialData>> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read events {}", path.display()))?;
    let mut out = Vec::new();
    for (i, line) in data.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let trial: TrialData = serde_json::from_str(line)
            .with_context(|| format!("{}:{}: invalid trial event", path.display(), i + 1))?;
        out.push(trial);
    }
    Ok(out)
}

fn outcome_to_json(outcome: &CompletionOutcome) -> Value {
    match outcome {
        CompletionOutcome::Submitted => json!({ "status": "submitted" }),
        CompletionOutcome::SubmissionFailed => json!({ "status": "submission_failed" }),
        CompletionOutcome::Invalid(result) => json!({
            "status": "invalid",
            "errors": result.errors,
        }),
    }
}

fn print_outcome(outcome: &CompletionOutcome) {
    match outcome {
        CompletionOutcome::Submitted => println!("outcome: submitted"),
        CompletionOutcome::SubmissionFailed => {
            println!("outcome: submission_failed (kept in local storage)")
        }
        CompletionOutcome::Invalid(result) => {
            println!("outcome: invalid (kept in local storage)");
            for e in &result.errors {
                println!("  - {}", e);
            }
        }
    }
}

fn emit_json(value: &Value) {
    match serde_json::to_string(value) {
        Ok(s) => println!("{}", s),
        Err(_) => println!(
            "{{\"ok\":false,\"error\":{{\"code\":\"serialization_error\",\"message\":\"failed to serialize JSON payload\",\"details\":{{}}}}}}"
        ),
    }
}

fn json_error(code: &str, message: String, details: Value) -> Value {
    json!({
        "ok": false,
        "error": {
            "code": code,
            "message": message,
            "details": details
        }
    })
}

fn command_json_mode(command: &Commands) -> bool {
    match command {
        Commands::Plan { json, .. }
        | Commands::Run { json, .. }
        | Commands::Validate { json }
        | Commands::Analyze { json }
        | Commands::Progress { json, .. }
        | Commands::Submit { json, .. } => *json,
        _ => false,
    }
}
