use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::ChatError;
use crate::message::Citation;

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

/// Body of a successful `/chat` response. Both fields are optional on the wire.
#[derive(Debug, Default, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub sources: Option<Vec<Citation>>,
}

impl ChatReply {
    /// The answer text, or `None` when the backend sent nothing usable.
    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref().filter(|a| !a.is_empty())
    }

    pub fn into_sources(self) -> Vec<Citation> {
        self.sources.unwrap_or_default()
    }
}

#[derive(Clone)]
pub struct RagClient {
    client: Client,
    base_url: Option<String>,
}

impl RagClient {
    /// `base_url` is the backend root; `/chat` is appended per request.
    pub fn new(base_url: Option<&str>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url
                .map(|u| u.trim().trim_end_matches('/').to_string())
                .filter(|u| !u.is_empty()),
        }
    }

    pub fn endpoint(&self) -> Result<String, ChatError> {
        self.base_url
            .as_ref()
            .map(|base| format!("{}/chat", base))
            .ok_or(ChatError::MissingEndpoint)
    }

    pub async fn chat(&self, message: &str) -> Result<ChatReply, ChatError> {
        let url = self.endpoint()?;

        log::debug!("POST {} ({} chars)", url, message.chars().count());

        let response = self
            .client
            .post(&url)
            .json(&ChatRequest { message })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Status(status));
        }

        let body = response.text().await?;
        let reply: ChatReply = serde_json::from_str(&body)?;

        log::debug!(
            "reply from {}: {} sources",
            url,
            reply.sources.as_ref().map_or(0, Vec::len)
        );

        Ok(reply)
    }
}
