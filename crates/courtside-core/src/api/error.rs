use thiserror::Error;

/// Failure of a read or mutating call against the club backend.
///
/// Cloneable because every caller coalesced onto one in-flight request
/// receives its own copy of the outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error (status {status}): {body}")]
    Server { status: u16, body: String },

    #[error("Request rejected (status {status}): {body}")]
    Client { status: u16, body: String },

    #[error("Invalid response body: {0}")]
    Parse(String),

    #[error("Request could not be built: {0}")]
    InvalidRequest(String),

    #[error("Request task aborted: {0}")]
    Aborted(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl FetchError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!(
            "{}... (truncated, {} total bytes)",
            &body[..end],
            body.len()
        )
    }

    /// Classify a non-success HTTP response.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        if status.is_server_error() {
            FetchError::Server {
                status: status.as_u16(),
                body: truncated,
            }
        } else {
            FetchError::Client {
                status: status.as_u16(),
                body: truncated,
            }
        }
    }

    /// Whether a retry might succeed: 5xx responses and network-level failures.
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Network(_) | FetchError::Server { .. })
    }

    /// HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Server { status, .. } | FetchError::Client { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Parse(err.to_string())
        } else if err.is_builder() {
            FetchError::InvalidRequest(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Parse(err.to_string())
    }
}
