use crate::context::ParticipantContext;
use crate::scenarios::QuestionType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

pub const DEMOGRAPHIC_TRIAL_TYPE: &str = "survey-html-form";

const KEYBOARD_TRIAL_TYPE: &str = "html-keyboard-response";
const INSTRUCTIONS_TRIAL_TYPE: &str = "instructions";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "trial_kind", rename_all = "snake_case")]
pub enum TrialData {
    Instructions {
        #[serde(default)]
        rt: Option<Number>,
    },
    Demographics {
        #[serde(default)]
        response: Map<String, Value>,
        #[serde(default)]
        rt: Option<Number>,
    },
    ScenarioPresentation {
        scenario_id: String,
        #[serde(default)]
        rt: Option<Number>,
    },
    ScenarioResponse {
        scenario_id: String,
        question_type: QuestionType,
        question_index: u32,
        #[serde(default)]
        response: Value,
        #[serde(default)]
        rt: Option<Number>,
    },
    Debrief {
        #[serde(default)]
        rt: Option<Number>,
    },
}

impl TrialData {
    pub fn trial_type(&self) -> &'static str {
        match self {
            TrialData::Instructions { .. } => INSTRUCTIONS_TRIAL_TYPE,
            TrialData::Demographics { .. } => DEMOGRAPHIC_TRIAL_TYPE,
            TrialData::ScenarioPresentation { .. } | TrialData::Debrief { .. } => {
                KEYBOARD_TRIAL_TYPE
            }
            TrialData::ScenarioResponse { question_type, .. } => question_type.trial_type(),
        }
    }

    pub fn scenario_id(&self) -> Option<&str> {
        match self {
            TrialData::ScenarioPresentation { scenario_id, .. }
            | TrialData::ScenarioResponse { scenario_id, .. } => Some(scenario_id),
            _ => None,
        }
    }

    pub fn is_demographics(&self) -> bool {
        matches!(self, TrialData::Demographics { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    #[serde(flatten)]
    data: TrialData,
    trial_type: String,
    #[serde(flatten)]
    participant: ParticipantContext,
    trial_timestamp: DateTime<Utc>,
}

impl TrialRecord {
    pub fn new(
        data: TrialData,
        participant: &ParticipantContext,
        trial_timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            trial_type: data.trial_type().to_string(),
            data,
            participant: participant.clone(),
            trial_timestamp,
        }
    }

    pub fn data(&self) -> &TrialData {
        &self.data
    }

    pub fn trial_type(&self) -> &str {
        &self.trial_type
    }

    pub fn participant(&self) -> &ParticipantContext {
        &self.participant
    }

    pub fn trial_timestamp(&self) -> DateTime<Utc> {
        self.trial_timestamp
    }

    // Keys in serialization order: trial fields, envelope, then timestamp.
    pub fn fields(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordStore {
    records: Vec<TrialRecord>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: TrialRecord) {
        self.records.push(record);
    }

    pub(crate) fn replace_all(&mut self, other: RecordStore) {
        self.records = other.records;
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[TrialRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrialRecord> {
        self.records.iter()
    }
}

impl From<Vec<TrialRecord>> for RecordStore {
    fn from(records: Vec<TrialRecord>) -> Self {
        Self { records }
    }
}

impl<'a> IntoIterator for &'a RecordStore {
    type Item = &'a TrialRecord;
    type IntoIter = std::slice::Iter<'a, TrialRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
