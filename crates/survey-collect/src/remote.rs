use crate::context::ParticipantContext;
use crate::error::NetworkError;
use crate::record::RecordStore;
use serde::Serialize;
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "/api/save-data";

#[derive(Debug, Serialize)]
pub struct SubmissionPayload<'a> {
    pub participant: &'a ParticipantContext,
    pub trials: &'a RecordStore,
}

pub trait SubmissionTransport {
    fn post_json(&self, url: &Url, body: &[u8]) -> Result<u16, NetworkError>;
}

impl<T: SubmissionTransport + ?Sized> SubmissionTransport for Box<T> {
    fn post_json(&self, url: &Url, body: &[u8]) -> Result<u16, NetworkError> {
        (**self).post_json(url, body)
    }
}

pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmissionTransport for HttpTransport {
    fn post_json(&self, url: &Url, body: &[u8]) -> Result<u16, NetworkError> {
        let response = self
            .client
            .post(url.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body.to_vec())
            .send()
            .map_err(|e| NetworkError::Transport(e.to_string()))?;
        Ok(response.status().as_u16())
    }
}

pub fn resolve_endpoint(base_url: &str, endpoint: &str) -> Result<Url, NetworkError> {
    if let Ok(url) = Url::parse(endpoint) {
        return Ok(url);
    }
    let base = Url::parse(base_url).map_err(|e| NetworkError::InvalidEndpoint {
        endpoint: base_url.to_string(),
        reason: e.to_string(),
    })?;
    base.join(endpoint)
        .map_err(|e| NetworkError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })
}

pub fn is_acknowledged(status: u16) -> bool {
    (200..300).contains(&status)
}
