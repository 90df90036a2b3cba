//! Chat transcript types
//!
//! These are plain data: the [`App`](crate::app::App) owns the list and only
//! ever appends to it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::locale::Locale;

/// Excerpts longer than this are cut when used as a citation label.
pub const EXCERPT_LABEL_CHARS: usize = 20;

/// A chat message in the conversation
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub sources: Vec<Citation>,
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            sources: Vec::new(),
        }
    }

    pub fn assistant(content: impl Into<String>, sources: Vec<Citation>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            sources,
        }
    }
}

/// A supporting source returned alongside an answer.
///
/// Backends send either bare strings or objects shaped like
/// `{"metadata": {"no": 3}, "content": "..."}`; anything else is kept as raw
/// JSON so one odd entry does not discard the whole answer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Citation {
    Label(String),
    Record(SourceRecord),
    Unrecognized(serde_json::Value),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SourceRecord {
    #[serde(default)]
    pub metadata: Option<SourceMetadata>,
    #[serde(default, alias = "excerpt")]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SourceMetadata {
    #[serde(default)]
    pub no: Option<SourceId>,
}

/// Document identifiers arrive as either strings or numbers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SourceId {
    Text(String),
    Number(serde_json::Number),
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceId::Text(s) => f.write_str(s),
            SourceId::Number(n) => write!(f, "{}", n),
        }
    }
}

impl SourceRecord {
    fn identifier(&self) -> Option<String> {
        let id = self.metadata.as_ref()?.no.as_ref()?;
        match id {
            SourceId::Text(s) if s.is_empty() => None,
            other => Some(other.to_string()),
        }
    }

    fn excerpt(&self) -> Option<String> {
        self.content
            .as_deref()
            .filter(|c| !c.is_empty())
            .map(|c| c.chars().take(EXCERPT_LABEL_CHARS).collect())
    }
}

impl Citation {
    /// Short text shown in the sources line: the identifier if present,
    /// else the start of the excerpt, else the "unknown source" placeholder.
    pub fn label(&self, locale: Locale) -> String {
        let label = match self {
            Citation::Label(text) => Some(text.clone()),
            Citation::Record(record) => record.identifier().or_else(|| record.excerpt()),
            Citation::Unrecognized(value) => {
                log::debug!("unrecognized source entry: {}", value);
                None
            }
        };
        label.unwrap_or_else(|| locale.strings().unknown_source.to_string())
    }
}
