//! Natural-language → structured event extraction.
//!
//! Provides the [`ExtractionClient`] trait the conversation controller talks
//! to, and an OpenAI-compatible implementation in [`llm`]. The controller only
//! ever sees [`Extraction`] values, so tests can substitute a scripted client.

pub mod llm;

use std::future::Future;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::draft::EventDraft;

/// Why an extraction call produced nothing usable.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("extraction service unavailable: {0}")]
    Unavailable(String),
    #[error("extraction service returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("malformed extraction response: {0}")]
    Malformed(String),
}

/// Who said a conversation line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One line of conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub role: Role,
    pub text: String,
}

impl HistoryTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// Input to one extraction call.
#[derive(Debug, Clone, Default)]
pub struct ExtractionRequest {
    pub text: String,
    pub prior_draft: Option<EventDraft>,
    pub history: Vec<HistoryTurn>,
}

/// Coarse classification of a user turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    CreateEvent,
    Search,
    ChitChat,
    /// Anything else the extractor said. Handled like `ChitChat`.
    Unrecognized(String),
}

impl Intent {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "create_event" | "event_creation" | "create" => Self::CreateEvent,
            "search" => Self::Search,
            "chit_chat" | "message" => Self::ChitChat,
            _ => Self::Unrecognized(label.to_string()),
        }
    }
}

/// A parsed extraction result.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub intent: Intent,
    pub query: Option<String>,
    pub message: Option<String>,
    pub event: Option<EventDraft>,
}

impl Extraction {
    pub fn create(event: EventDraft) -> Self {
        Self {
            intent: Intent::CreateEvent,
            query: None,
            message: None,
            event: Some(event),
        }
    }

    pub fn search(query: impl Into<String>) -> Self {
        Self {
            intent: Intent::Search,
            query: Some(query.into()),
            message: None,
            event: None,
        }
    }

    pub fn chit_chat(message: impl Into<String>) -> Self {
        Self {
            intent: Intent::ChitChat,
            query: None,
            message: Some(message.into()),
            event: None,
        }
    }
}

/// Wire shape of an extraction reply. Its JSON schema is what the model is
/// asked to produce.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExtractionReply {
    /// One of "create_event", "search", "chit_chat".
    pub intent: String,
    /// Keywords to search for when intent is "search".
    #[serde(default)]
    pub query: Option<String>,
    /// Conversational reply when intent is "chit_chat".
    #[serde(default)]
    pub message: Option<String>,
    /// Event fields mentioned so far when intent is "create_event". Use null for
    /// fields you looked for but could not find; omit fields never mentioned.
    #[serde(default, alias = "event_data")]
    pub event: Option<EventDraft>,
}

impl From<ExtractionReply> for Extraction {
    fn from(reply: ExtractionReply) -> Self {
        let clean = |s: Option<String>| s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        Self {
            intent: Intent::from_label(&reply.intent),
            query: clean(reply.query),
            message: clean(reply.message),
            event: reply.event,
        }
    }
}

/// Turns free text into an [`Extraction`].
///
/// This is the only suspension point in a conversation turn. Implementations
/// must not retry on their own; callers decide whether to resubmit a turn.
pub trait ExtractionClient: Send + Sync {
    fn extract(
        &self,
        request: &ExtractionRequest,
    ) -> impl Future<Output = Result<Extraction, ExtractionError>> + Send;
}
