use crate::analysis::DEFAULT_EXPECTED_TRIALS;
use crate::export::HeaderPolicy;
use crate::remote::DEFAULT_ENDPOINT;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_COMPLETION_URL: &str =
    "https://app.prolific.co/submissions/complete?cc=CJXZ6K4V";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveyConfig {
    pub base_url: String,
    pub endpoint: String,
    pub storage_dir: PathBuf,
    pub storage_quota_bytes: Option<usize>,
    pub expected_trials: usize,
    pub random_seed: u64,
    pub completion_url: String,
    pub header_policy: HeaderPolicy,
    pub log_level: String,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            storage_dir: PathBuf::from(".survey/storage"),
            storage_quota_bytes: None,
            expected_trials: DEFAULT_EXPECTED_TRIALS,
            random_seed: 0,
            completion_url: DEFAULT_COMPLETION_URL.to_string(),
            header_policy: HeaderPolicy::FirstRecord,
            log_level: "info".to_string(),
        }
    }
}

impl SurveyConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read survey config {}", path.display()))?;
        let config: SurveyConfig = serde_yaml::from_str(&raw)
            .with_context(|| format!("invalid survey config {}", path.display()))?;
        Ok(config)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) if p.exists() => Self::load(p),
            Some(p) => {
                tracing::debug!(path = %p.display(), "survey config not found, using defaults");
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }
}

pub const CONFIG_TEMPLATE: &str = "\
# Where finished sessions are POSTed. Relative endpoints are joined onto base_url.
base_url: 'http://localhost:8080'
endpoint: '/api/save-data'
# Directory holding the local snapshot (one file per key).
storage_dir: '.survey/storage'
# Optional byte cap on local storage, like a browser storage quota.
storage_quota_bytes: null
expected_trials: 20
# Seed for the scenario order.
random_seed: 0
completion_url: 'https://app.prolific.co/submissions/complete?cc=CJXZ6K4V'
# first_record | union
header_policy: first_record
log_level: info
";

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn template_parses_to_defaults() {
        let parsed: SurveyConfig = serde_yaml::from_str(CONFIG_TEMPLATE).expect("template");
        assert_eq!(parsed, SurveyConfig::default());
    }

    #[test]
    fn partial_config_fills_in_defaults() {
        let parsed: SurveyConfig =
            serde_yaml::from_str("endpoint: 'https://collect.example.org/save'\nheader_policy: union\n")
                .expect("partial");
        assert_eq!(parsed.endpoint, "https://collect.example.org/save");
        assert_eq!(parsed.header_policy, HeaderPolicy::Union);
        assert_eq!(parsed.expected_trials, 20);
        assert_eq!(parsed.log_level, "info");
    }

    #[test]
    fn load_or_default_tolerates_missing_file_but_not_bad_yaml() {
        let dir = std::env::temp_dir().join(format!(
            "survey_cfg_{}_{}",
            std::process::id(),
            Utc::now().timestamp_micros()
        ));
        fs::create_dir_all(&dir).expect("dir");
        let missing = dir.join("survey.yaml");
        assert_eq!(
            SurveyConfig::load_or_default(Some(&missing)).expect("defaults"),
            SurveyConfig::default()
        );
        fs::write(&missing, "expected_trials: [not, a, number]\n").expect("write");
        assert!(SurveyConfig::load_or_default(Some(&missing)).is_err());
        let _ = fs::remove_dir_all(dir);
    }
}
