use reqwest::StatusCode;
use thiserror::Error;

/// The forecast payload was not valid JSON or did not match the expected shape.
#[derive(Debug, Error)]
#[error("Failed to decode forecast response: {0}")]
pub struct DecodeError(#[from] serde_json::Error);

/// Transport failures and non-2xx responses.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Failed to reach forecast endpoint: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Forecast request failed with status {status}: {body}")]
    Status { status: StatusCode, body: String },
}

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Network(#[from] NetworkError),

    /// Invalid endpoint configuration. Raised at client construction only.
    #[error("Invalid forecast endpoint configuration: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for ForecastError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(NetworkError::Transport(err))
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(DecodeError(err))
    }
}

impl ForecastError {
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }

    /// Short message suitable for showing next to stale data.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Network(NetworkError::Transport(_)) => {
                "Could not reach the forecast service. Check your connection."
            }
            Self::Network(NetworkError::Status { status, .. }) if status.is_server_error() => {
                "The forecast service is having trouble. Try again later."
            }
            Self::Network(NetworkError::Status { .. }) => "The forecast service rejected the request.",
            Self::Decode(_) => "The forecast service sent data we could not read.",
            Self::Configuration(_) => "The forecast endpoint is misconfigured.",
        }
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
