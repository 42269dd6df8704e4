use crate::record::TrialRecord;
use crate::scenarios::REQUIRED_SCENARIO_IDS;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

pub fn validate_data(records: &[TrialRecord]) -> ValidationResult {
    let mut errors = Vec::new();

    if records.is_empty() {
        errors.push("No trial data found".to_string());
    }

    if !records.iter().any(|r| r.data().is_demographics()) {
        errors.push("No demographic data found".to_string());
    }

    for id in REQUIRED_SCENARIO_IDS {
        if !records.iter().any(|r| r.data().scenario_id() == Some(id)) {
            errors.push(format!("No data for scenario: {}", id));
        }
    }

    ValidationResult {
        is_valid: errors.is_empty(),
        errors,
    }
}
