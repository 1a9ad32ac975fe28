use thiserror::Error;

/// Errors talking to the catalog service
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Non-2xx response
    #[error("catalog returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Transport-level failure
    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not have the expected shape
    #[error("unexpected catalog response: {message}")]
    Decode { message: String },

    /// Base URL could not be used to build a request
    #[error("invalid catalog URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl CatalogError {
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Only "service unavailable" and "gateway timeout" are worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Status { status: 503 | 504, .. })
    }

    /// HTTP status, when the service answered at all
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Pull a readable message out of an error body: `error` or `message` JSON
/// fields, else the raw text.
pub(crate) fn extract_error_message(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        for field in ["error", "message"] {
            if let Some(msg) = json.get(field).and_then(|v| v.as_str()) {
                return msg.to_string();
            }
        }
    }
    body.trim().to_string()
}
