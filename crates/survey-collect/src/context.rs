use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

pub const NOT_PROVIDED: &str = "not_provided";

pub const PARAM_PROLIFIC_PID: &str = "PROLIFIC_PID";
pub const PARAM_STUDY_ID: &str = "STUDY_ID";
pub const PARAM_SESSION_ID: &str = "SESSION_ID";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantContext {
    pub prolific_pid: String,
    pub study_id: String,
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub user_agent: String,
    pub screen_width: u32,
    pub screen_height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClientEnvironment {
    pub user_agent: String,
    pub screen_width: u32,
    pub screen_height: u32,
}

impl ParticipantContext {
    pub fn resolve(page_url: &str, env: &ClientEnvironment) -> Self {
        Self::resolve_at(page_url, env, Utc::now())
    }

    pub fn resolve_at(page_url: &str, env: &ClientEnvironment, now: DateTime<Utc>) -> Self {
        let params = QueryParams::parse(page_url);
        Self {
            prolific_pid: params.get_or_default(PARAM_PROLIFIC_PID),
            study_id: params.get_or_default(PARAM_STUDY_ID),
            session_id: params.get_or_default(PARAM_SESSION_ID),
            timestamp: now,
            user_agent: env.user_agent.clone(),
            screen_width: env.screen_width,
            screen_height: env.screen_height,
        }
    }

    pub fn has_participant_id(&self) -> bool {
        self.prolific_pid != NOT_PROVIDED
    }
}

struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    // Accepts a full page URL, a bare "?a=b" query, or "a=b&c=d".
    fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let parsed = Url::parse(trimmed).or_else(|_| {
            let query = trimmed.trim_start_matches('?');
            Url::parse(&format!("http://localhost/?{}", query))
        });
        let pairs = match parsed {
            Ok(url) => url
                .query_pairs()
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect(),
            Err(_) => Vec::new(),
        };
        Self { pairs }
    }

    // First occurrence wins; an empty value counts as unresolved.
    fn get_or_default(&self, name: &str) -> String {
        self.pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.is_empty())
            .unwrap_or(NOT_PROVIDED)
            .to_string()
    }
}
