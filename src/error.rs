use thiserror::Error;

/// Errors raised while talking to the conversation backend or loading the
/// credentials needed to do so.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response (connection refused, timeout, ...).
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The backend answered with a non-success status.
    #[error("{endpoint} returned {status}: {message}")]
    Status {
        endpoint: String,
        status: u16,
        message: String,
    },

    /// The backend answered, but not with the shape we expect.
    #[error("malformed response from {endpoint}: {reason}")]
    MalformedResponse { endpoint: String, reason: String },

    #[error("no auth token found; set CHATBOT_TOKEN or run `chatbot login --token <TOKEN>`")]
    MissingToken,

    #[error("auth token contains characters that cannot be sent in a header")]
    InvalidToken,

    #[error("invalid backend url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("failed to build HTTP client: {0}")]
    Builder(#[source] reqwest::Error),

    #[error("token storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    pub fn malformed(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        ClientError::MalformedResponse {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
