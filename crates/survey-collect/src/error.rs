use thiserror::Error;

pub type Result<T> = std::result::Result<T, CollectError>;

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("storage failure: {0}")]
    Storage(#[from] StorageError),

    #[error("network failure: {0}")]
    Network(#[from] NetworkError),

    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("quota exceeded: writing {attempted} bytes would exceed quota of {quota} bytes")]
    QuotaExceeded { attempted: usize, quota: usize },

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("server responded with status: {0}")]
    Status(u16),
}
