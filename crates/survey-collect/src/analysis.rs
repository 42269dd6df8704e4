use crate::context::ParticipantContext;
use crate::record::{TrialData, TrialRecord};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const DEFAULT_EXPECTED_TRIALS: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub demographics: Map<String, Value>,
    pub scenarios: BTreeMap<String, BTreeMap<String, Value>>,
    pub summary: SummaryStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total_trials: usize,
    pub completion_time: Option<i64>,
    pub participant_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub percentage: f64,
}

pub fn process_for_analysis(
    records: &[TrialRecord],
    participant: &ParticipantContext,
) -> AnalysisSummary {
    let demographics = records
        .iter()
        .find_map(|r| match r.data() {
            TrialData::Demographics { response, .. } => Some(response.clone()),
            _ => None,
        })
        .unwrap_or_default();

    let mut scenarios: BTreeMap<String, BTreeMap<String, Value>> = BTreeMap::new();
    for record in records {
        match record.data() {
            TrialData::ScenarioPresentation { scenario_id, .. } => {
                scenarios.entry(scenario_id.clone()).or_default();
            }
            TrialData::ScenarioResponse {
                scenario_id,
                question_type,
                question_index,
                response,
                ..
            } => {
                let key = format!("{}_{}", question_type.as_str(), question_index);
                scenarios
                    .entry(scenario_id.clone())
                    .or_default()
                    .insert(key, response.clone());
            }
            _ => {}
        }
    }

    let start = records.iter().map(TrialRecord::trial_timestamp).min();
    let end = records.iter().map(TrialRecord::trial_timestamp).max();
    let completion_time = match (start, end) {
        (Some(start), Some(end)) => Some((end - start).num_milliseconds()),
        _ => None,
    };

    AnalysisSummary {
        demographics,
        scenarios,
        summary: SummaryStats {
            total_trials: records.len(),
            completion_time,
            participant_id: participant.prolific_pid.clone(),
        },
    }
}

pub fn progress(completed: usize, expected_total: usize) -> Progress {
    let percentage = if expected_total == 0 {
        100.0
    } else {
        (completed as f64 / expected_total as f64 * 100.0).min(100.0)
    };
    Progress {
        completed,
        total: expected_total,
        percentage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ClientEnvironment;
    use crate::scenarios::QuestionType;
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;

    fn ctx() -> ParticipantContext {
        ParticipantContext::resolve("?PROLIFIC_PID=pid-42", &ClientEnvironment::default())
    }

    fn answer(scenario: &str, qt: QuestionType, index: u32, response: Value) -> TrialData {
        TrialData::ScenarioResponse {
            scenario_id: scenario.to_string(),
            question_type: qt,
            question_index: index,
            response,
            rt: None,
        }
    }

    #[test]
    fn completion_time_is_span_of_trial_timestamps() {
        let t1 = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
        let t2 = t1 + Duration::milliseconds(95_250);
        let ctx = ctx();
        let records = vec![
            TrialRecord::new(TrialData::Debrief { rt: None }, &ctx, t2),
            TrialRecord::new(TrialData::Instructions { rt: None }, &ctx, t1),
        ];
        let summary = process_for_analysis(&records, &ctx);
        assert_eq!(summary.summary.completion_time, Some(95_250));
        assert_eq!(summary.summary.total_trials, 2);
        assert_eq!(summary.summary.participant_id, "pid-42");
    }

    #[test]
    fn empty_store_has_null_completion_time() {
        let summary = process_for_analysis(&[], &ctx());
        assert_eq!(summary.summary.completion_time, None);
        assert!(summary.demographics.is_empty());
        assert!(summary.scenarios.is_empty());
        let v = serde_json::to_value(&summary).expect("serialize");
        assert_eq!(v["summary"]["completion_time"], Value::Null);
    }

    #[test]
    fn demographics_come_from_first_demographic_record() {
        let ctx = ctx();
        let first = json!({"age": "29", "education": "masters"});
        let second = json!({"age": "99"});
        let records = vec![
            TrialRecord::new(TrialData::Instructions { rt: None }, &ctx, Utc::now()),
            TrialRecord::new(
                TrialData::Demographics {
                    response: first.as_object().cloned().expect("obj"),
                    rt: None,
                },
                &ctx,
                Utc::now(),
            ),
            TrialRecord::new(
                TrialData::Demographics {
                    response: second.as_object().cloned().expect("obj"),
                    rt: None,
                },
                &ctx,
                Utc::now(),
            ),
        ];
        let summary = process_for_analysis(&records, &ctx);
        assert_eq!(Value::Object(summary.demographics), first);
    }

    #[test]
    fn scenario_answers_keyed_by_type_and_index_last_write_wins() {
        let ctx = ctx();
        let now = Utc::now();
        let records: Vec<TrialRecord> = vec![
            TrialData::ScenarioPresentation {
                scenario_id: "intent_inference".to_string(),
                rt: None,
            },
            answer("trolley_uncertainty", QuestionType::MoralJudgment, 0, json!(2)),
            answer("trolley_uncertainty", QuestionType::ProbabilityJudgment, 1, json!({"probability": "65"})),
            answer("trolley_uncertainty", QuestionType::MoralJudgment, 0, json!(6)),
        ]
        .into_iter()
        .map(|d| TrialRecord::new(d, &ctx, now))
        .collect();

        let summary = process_for_analysis(&records, &ctx);
        let trolley = &summary.scenarios["trolley_uncertainty"];
        assert_eq!(trolley.len(), 2);
        assert_eq!(trolley["moral_judgment_0"], json!(6));
        assert_eq!(trolley["probability_judgment_1"], json!({"probability": "65"}));
        assert!(summary.scenarios["intent_inference"].is_empty());
        assert_eq!(summary.summary.completion_time, Some(0));
    }

    #[test]
    fn progress_caps_at_one_hundred_percent() {
        let p = progress(5, DEFAULT_EXPECTED_TRIALS);
        assert_eq!(p.percentage, 25.0);
        assert_eq!(p.total, 20);
        assert_eq!(progress(27, 20).percentage, 100.0);
        assert_eq!(progress(0, 0).percentage, 100.0);
    }
}
