//! Error types for backend calls

use thiserror::Error;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Everything that can go wrong talking to the backend. Screens show the
/// `Display` text as-is, so `Status` renders as the bare message.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection, TLS or timeout failure
    #[error("{0}")]
    Request(#[from] reqwest::Error),

    /// Backend answered with a non-2xx status
    #[error("{message}")]
    Status { status: u16, message: String },

    /// Base URL that cannot carry request paths
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    /// 2xx response whose body did not decode
    #[error("Unexpected response from backend: {0}")]
    Decode(String),
}

impl ApiError {
    /// Build a status error, preferring the backend's `detail` over `fallback`.
    pub fn from_body(status: u16, body: &str, fallback: &str) -> Self {
        let message = detail_message(body).unwrap_or_else(|| fallback.to_string());
        Self::Status { status, message }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Pull `detail` out of an error body. FastAPI validation errors carry a
/// list of `{msg, ...}` objects instead of a string.
fn detail_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Array(items) => {
            let msgs: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .collect();
            if msgs.is_empty() {
                None
            } else {
                Some(msgs.join("; "))
            }
        }
        _ => None,
    }
}
