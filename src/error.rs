use reqwest::StatusCode;
use thiserror::Error;

use crate::locale::Locale;

/// Everything that can go wrong between pressing Enter and getting an answer.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("backend URL is not configured (set RAG_API_URL)")]
    MissingEndpoint,

    #[error("request to backend failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned status {0}")]
    Status(StatusCode),

    #[error("backend response is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("request task ended unexpectedly: {0}")]
    Interrupted(#[from] tokio::task::JoinError),
}

impl ChatError {
    /// Text for the assistant bubble. Only a missing endpoint gets its own
    /// message; every other failure reads the same to the user.
    pub fn user_message(&self, locale: Locale) -> &'static str {
        let strings = locale.strings();
        match self {
            ChatError::MissingEndpoint => strings.missing_endpoint,
            _ => strings.request_failed,
        }
    }
}
