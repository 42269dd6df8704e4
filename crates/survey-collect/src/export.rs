use crate::record::TrialRecord;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CSV_FILENAME: &str = "bayesian_morality_data.csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderPolicy {
    // Columns of the first record only; keys that appear later are dropped.
    #[default]
    FirstRecord,
    // Every key seen in any record, in first-seen order.
    Union,
}

pub fn export_csv(records: &[TrialRecord], policy: HeaderPolicy) -> String {
    if records.is_empty() {
        return String::new();
    }
    let rows: Vec<Map<String, Value>> = records.iter().map(TrialRecord::fields).collect();
    let headers = header_set(&rows, policy);

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(headers.join(","));
    for row in &rows {
        let cells: Vec<String> = headers
            .iter()
            .map(|h| format_cell(row.get(h.as_str())))
            .collect();
        lines.push(cells.join(","));
    }
    lines.join("\n")
}

pub fn download_csv(
    records: &[TrialRecord],
    policy: HeaderPolicy,
    dir: &Path,
    filename: Option<&str>,
) -> std::io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(filename.unwrap_or(DEFAULT_CSV_FILENAME));
    fs::write(&path, export_csv(records, policy))?;
    Ok(path)
}

fn header_set(rows: &[Map<String, Value>], policy: HeaderPolicy) -> Vec<String> {
    match policy {
        HeaderPolicy::FirstRecord => rows
            .first()
            .map(|r| r.keys().cloned().collect())
            .unwrap_or_default(),
        HeaderPolicy::Union => {
            let mut headers: Vec<String> = Vec::new();
            for row in rows {
                for key in row.keys() {
                    if !headers.iter().any(|h| h == key) {
                        headers.push(key.clone());
                    }
                }
            }
            headers
        }
    }
}

fn format_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => escape_text(s),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => escape_text(&other.to_string()),
    }
}

// Only text containing a comma is quoted; quotes inside it are doubled.
fn escape_text(s: &str) -> String {
    if s.contains(',') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ClientEnvironment, ParticipantContext};
    use crate::record::TrialData;
    use crate::scenarios::QuestionType;
    use chrono::Utc;
    use serde_json::json;

    fn ctx() -> ParticipantContext {
        ParticipantContext::resolve("?PROLIFIC_PID=p1", &ClientEnvironment::default())
    }

    fn response(scenario: &str, index: u32, response: Value) -> TrialRecord {
        TrialRecord::new(
            TrialData::ScenarioResponse {
                scenario_id: scenario.to_string(),
                question_type: QuestionType::MoralJudgment,
                question_index: index,
                response,
                rt: Some(900.into()),
            },
            &ctx(),
            Utc::now(),
        )
    }

    fn column(csv: &str, header: &str, row: usize) -> String {
        let lines: Vec<&str> = csv.split('\n').collect();
        let idx = lines[0]
            .split(',')
            .position(|h| h == header)
            .expect("header present");
        lines[row + 1].split(',').nth(idx).expect("cell").to_string()
    }

    #[test]
    fn empty_store_exports_empty_string() {
        assert_eq!(export_csv(&[], HeaderPolicy::FirstRecord), "");
        assert_eq!(export_csv(&[], HeaderPolicy::Union), "");
    }

    #[test]
    fn one_header_row_plus_one_row_per_record() {
        let records = vec![
            response("trolley_uncertainty", 0, json!(3)),
            response("trolley_uncertainty", 1, json!(70)),
            response("causal_uncertainty", 0, json!(2)),
        ];
        let csv = export_csv(&records, HeaderPolicy::FirstRecord);
        let lines: Vec<&str> = csv.split('\n').collect();
        assert_eq!(lines.len(), records.len() + 1);
        let width = lines[0].split(',').count();
        for line in &lines[1..] {
            assert_eq!(line.split(',').count(), width);
        }
        assert_eq!(column(&csv, "question_index", 1), "1");
        assert_eq!(column(&csv, "response", 1), "70");
        assert_eq!(column(&csv, "scenario_id", 2), "causal_uncertainty");
    }

    #[test]
    fn text_with_commas_and_quotes_is_escaped() {
        let records = vec![
            response("s", 0, json!("hello, world")),
            response("s", 1, json!("He said \"hi\", twice")),
            response("s", 2, json!("He said \"hi\"")),
        ];
        let csv = export_csv(&records, HeaderPolicy::FirstRecord);
        assert!(csv.contains("\"hello, world\""));
        assert!(csv.contains("\"He said \"\"hi\"\", twice\""));
        // No comma, so the text goes out untouched.
        assert!(csv.contains(",He said \"hi\","));
    }

    #[test]
    fn nested_values_are_written_as_json() {
        let records = vec![response("s", 0, json!({"Q0": 4}))];
        let csv = export_csv(&records, HeaderPolicy::FirstRecord);
        assert_eq!(column(&csv, "response", 0), "{\"Q0\":4}");

        let records = vec![response("s", 0, json!({"a": 1, "b": 2}))];
        let csv = export_csv(&records, HeaderPolicy::FirstRecord);
        assert!(csv.contains("\"{\"\"a\"\":1,\"\"b\"\":2}\""));
    }

    #[test]
    fn first_record_policy_drops_later_columns_union_keeps_them() {
        let records = vec![
            TrialRecord::new(TrialData::Instructions { rt: None }, &ctx(), Utc::now()),
            response("trolley_uncertainty", 0, json!(5)),
        ];
        let first = export_csv(&records, HeaderPolicy::FirstRecord);
        let header: Vec<&str> = first.split('\n').next().expect("header").split(',').collect();
        assert!(!header.contains(&"scenario_id"));
        assert!(header.contains(&"trial_kind"));

        let union = export_csv(&records, HeaderPolicy::Union);
        let header: Vec<&str> = union.split('\n').next().expect("header").split(',').collect();
        assert!(header.contains(&"scenario_id"));
        assert!(header.contains(&"question_type"));
        assert_eq!(column(&union, "scenario_id", 0), "");
        assert_eq!(column(&union, "scenario_id", 1), "trolley_uncertainty");
    }

    #[test]
    fn header_keeps_record_field_order_and_integer_rt() {
        let csv = export_csv(&[response("s", 0, json!(4))], HeaderPolicy::FirstRecord);
        let header: Vec<&str> = csv.split('\n').next().expect("header").split(',').collect();
        assert_eq!(header.first(), Some(&"trial_kind"));
        assert_eq!(header.last(), Some(&"trial_timestamp"));
        let rt = header.iter().position(|h| *h == "rt").expect("rt");
        let response = header.iter().position(|h| *h == "response").expect("response");
        assert!(response < rt);
        assert_eq!(column(&csv, "rt", 0), "900");
    }

    #[test]
    fn download_writes_default_filename() {
        let dir = std::env::temp_dir().join(format!(
            "survey_csv_{}_{}",
            std::process::id(),
            Utc::now().timestamp_micros()
        ));
        let records = vec![response("s", 0, json!(1))];
        let path = download_csv(&records, HeaderPolicy::FirstRecord, &dir, None).expect("write");
        assert_eq!(path.file_name().and_then(|s| s.to_str()), Some(DEFAULT_CSV_FILENAME));
        let written = fs::read_to_string(&path).expect("read back");
        assert_eq!(written, export_csv(&records, HeaderPolicy::FirstRecord));
        let _ = fs::remove_dir_all(dir);
    }
}
