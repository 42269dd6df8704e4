pub mod analysis;
pub mod config;
pub mod context;
pub mod error;
pub mod export;
pub mod record;
pub mod remote;
pub mod scenarios;
pub mod storage;
pub mod timeline;
pub mod validate;

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub use analysis::{AnalysisSummary, Progress, SummaryStats};
pub use context::{ClientEnvironment, ParticipantContext};
pub use error::{CollectError, NetworkError, Result, StorageError};
pub use export::HeaderPolicy;
pub use record::{RecordStore, TrialData, TrialRecord};
pub use remote::{HttpTransport, SubmissionTransport};
pub use storage::{FileKvStore, KeyValueStore, MemoryKvStore};
pub use validate::ValidationResult;

pub const SNAPSHOT_KEY: &str = "bayesian_morality_data";

#[derive(Debug, Clone)]
pub struct CollectorOptions {
    pub base_url: String,
    pub endpoint: String,
}

impl Default for CollectorOptions {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            endpoint: remote::DEFAULT_ENDPOINT.to_string(),
        }
    }
}

impl From<&config::SurveyConfig> for CollectorOptions {
    fn from(config: &config::SurveyConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            endpoint: config.endpoint.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    Submitted,
    SubmissionFailed,
    Invalid(ValidationResult),
}

pub trait RunnerHooks {
    fn on_trial_complete(&mut self, data: TrialData);
    fn on_experiment_complete(&mut self) -> CompletionOutcome;
}

pub struct DataCollector<S, T> {
    participant: ParticipantContext,
    records: RecordStore,
    storage: S,
    transport: T,
    options: CollectorOptions,
}

impl<S: KeyValueStore, T: SubmissionTransport> DataCollector<S, T> {
    pub fn new(
        participant: ParticipantContext,
        storage: S,
        transport: T,
        options: CollectorOptions,
    ) -> Self {
        Self {
            participant,
            records: RecordStore::new(),
            storage,
            transport,
            options,
        }
    }

    // Resumes a session from records already decoded from storage.
    pub fn restore(
        participant: ParticipantContext,
        records: RecordStore,
        storage: S,
        transport: T,
        options: CollectorOptions,
    ) -> Self {
        Self {
            participant,
            records,
            storage,
            transport,
            options,
        }
    }

    pub fn participant(&self) -> &ParticipantContext {
        &self.participant
    }

    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn append(&mut self, data: TrialData) {
        self.append_at(data, Utc::now());
    }

    pub fn append_at(&mut self, data: TrialData, trial_timestamp: DateTime<Utc>) {
        let record = TrialRecord::new(data, &self.participant, trial_timestamp);
        self.records.append(record);
    }

    pub fn try_save_snapshot(&mut self) -> Result<()> {
        let encoded = serde_json::to_string(&self.records)?;
        self.storage.set_item(SNAPSHOT_KEY, &encoded)?;
        Ok(())
    }

    pub fn save_snapshot(&mut self) -> bool {
        match self.try_save_snapshot() {
            Ok(()) => true,
            Err(err) => {
                error!(error = %err, "error saving snapshot to local storage");
                false
            }
        }
    }

    pub fn try_load_snapshot(&mut self) -> Result<bool> {
        let stored = match self.storage.get_item(SNAPSHOT_KEY)? {
            Some(s) => s,
            None => return Ok(false),
        };
        let restored: RecordStore = serde_json::from_str(&stored)?;
        self.records.replace_all(restored);
        Ok(true)
    }

    pub fn load_snapshot(&mut self) -> bool {
        match self.try_load_snapshot() {
            Ok(loaded) => loaded,
            Err(err) => {
                error!(error = %err, "error loading snapshot from local storage");
                false
            }
        }
    }

    pub fn try_send(&self, endpoint: Option<&str>) -> Result<()> {
        let endpoint = endpoint.unwrap_or(self.options.endpoint.as_str());
        let url = remote::resolve_endpoint(&self.options.base_url, endpoint)?;
        let payload = remote::SubmissionPayload {
            participant: &self.participant,
            trials: &self.records,
        };
        let body = serde_json::to_vec(&payload)?;
        let status = self.transport.post_json(&url, &body)?;
        if !remote::is_acknowledged(status) {
            return Err(NetworkError::Status(status).into());
        }
        Ok(())
    }

    // One attempt. On failure the store is snapshotted locally once and
    // `false` is returned.
    pub fn send_to_server(&mut self, endpoint: Option<&str>) -> bool {
        match self.try_send(endpoint) {
            Ok(()) => {
                info!(trials = self.records.len(), "data sent successfully");
                true
            }
            Err(err) => {
                error!(error = %err, "error sending data to server");
                self.save_snapshot();
                false
            }
        }
    }

    pub fn export_csv(&self, policy: HeaderPolicy) -> String {
        export::export_csv(self.records.records(), policy)
    }

    pub fn download_csv(
        &self,
        policy: HeaderPolicy,
        dir: &Path,
        filename: Option<&str>,
    ) -> std::io::Result<PathBuf> {
        export::download_csv(self.records.records(), policy, dir, filename)
    }

    pub fn process_for_analysis(&self) -> AnalysisSummary {
        analysis::process_for_analysis(self.records.records(), &self.participant)
    }

    pub fn validate_data(&self) -> ValidationResult {
        validate::validate_data(self.records.records())
    }

    pub fn progress(&self, expected_total: usize) -> Progress {
        analysis::progress(self.records.len(), expected_total)
    }
}

impl<S: KeyValueStore, T: SubmissionTransport> RunnerHooks for DataCollector<S, T> {
    fn on_trial_complete(&mut self, data: TrialData) {
        self.append(data);
        self.save_snapshot();
    }

    fn on_experiment_complete(&mut self) -> CompletionOutcome {
        let validation = self.validate_data();
        if validation.is_valid {
            if self.send_to_server(None) {
                CompletionOutcome::Submitted
            } else {
                CompletionOutcome::SubmissionFailed
            }
        } else {
            error!(errors = ?validation.errors, "data validation failed");
            self.save_snapshot();
            CompletionOutcome::Invalid(validation)
        }
    }
}
