//! Conversation controller: one slot-filling turn at a time.
//!
//! A [`Conversation`] (state, draft, bounded history) is passed in by the
//! caller and a new one is handed back with the [`TurnResponse`]; nothing is
//! kept between turns. The flow per turn:
//!
//! 1. short control replies ("yes", "no", "start over") are handled locally
//! 2. otherwise the [`ExtractionClient`] classifies and extracts
//! 3. `create_event` extractions are merged into the draft and the
//!    completeness check decides between a follow-up, a confirmation request,
//!    or ready-to-publish. While confirming, a restatement is merged the same
//!    way and the updated draft is confirmed again.
//!
//! Extraction failures leave the conversation exactly as it was.

pub mod replies;

use serde::{Deserialize, Serialize};

use crate::config::ConversationConfig;
use crate::draft::{check, merge, EventDraft};
use crate::extraction::{
    Extraction, ExtractionClient, ExtractionError, ExtractionRequest, HistoryTurn, Intent,
};
use crate::timezone::TownDirectory;
use replies::ShortReply;

const ABANDONED_MESSAGE: &str = "No problem, I've discarded that event. What would you like to do next?";
const CORRECTION_PROMPT: &str = "Okay, what should I change?";
const DEFAULT_CHAT_REPLY: &str =
    "I can help you post an event or find one. Tell me about an event, or what you're looking for.";
const READY_MESSAGE: &str = "Ready to publish.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    #[default]
    Gathering,
    Confirming,
    Ready,
}

impl ConversationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gathering => "gathering",
            Self::Confirming => "confirming",
            Self::Ready => "ready",
        }
    }
}

impl std::fmt::Display for ConversationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a caller needs to carry between turns.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Conversation {
    pub state: ConversationState,
    pub draft: EventDraft,
    pub history: Vec<HistoryTurn>,
}

/// The outgoing shape of a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TurnResponse {
    FollowUp {
        draft: EventDraft,
        questions: Vec<String>,
    },
    Confirm {
        draft: EventDraft,
        message: String,
    },
    Ready {
        draft: EventDraft,
    },
    Search {
        query: String,
    },
    Message {
        message: String,
    },
    Error {
        reason: String,
    },
}

impl TurnResponse {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FollowUp { .. } => "follow_up",
            Self::Confirm { .. } => "confirm",
            Self::Ready { .. } => "ready",
            Self::Search { .. } => "search",
            Self::Message { .. } => "message",
            Self::Error { .. } => "error",
        }
    }

    /// What goes into the history as the assistant's side of the turn.
    fn history_text(&self) -> String {
        match self {
            Self::FollowUp { questions, .. } => questions.join(" "),
            Self::Confirm { message, .. } | Self::Message { message } => message.clone(),
            Self::Ready { .. } => READY_MESSAGE.to_string(),
            Self::Search { query } => format!("Searching for \"{query}\"."),
            Self::Error { reason } => reason.clone(),
        }
    }
}

/// Result of [`Controller::turn`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub conversation: Conversation,
    pub response: TurnResponse,
}

pub struct Controller<C> {
    client: C,
    towns: TownDirectory,
    config: ConversationConfig,
}

impl<C: ExtractionClient> Controller<C> {
    pub fn new(client: C, towns: TownDirectory, config: ConversationConfig) -> Self {
        Self {
            client,
            towns,
            config,
        }
    }

    /// Directory the publisher should resolve this controller's drafts with.
    pub fn towns(&self) -> &TownDirectory {
        &self.towns
    }

    /// Process one user message against `conversation`.
    pub async fn turn(&self, conversation: &Conversation, text: &str) -> Turn {
        let text = text.trim();
        let state = conversation.state;

        match replies::classify(text) {
            ShortReply::Abandon => {
                tracing::info!(state = %state, "draft abandoned");
                let message = ABANDONED_MESSAGE.to_string();
                let fresh = Conversation::default();
                return self.advance(&fresh, text, ConversationState::Gathering, TurnResponse::Message { message });
            }
            ShortReply::Affirmative if awaiting_go_ahead(state) => {
                tracing::info!("draft confirmed");
                let draft = conversation.draft.clone();
                return self.advance(conversation, text, ConversationState::Ready, TurnResponse::Ready { draft });
            }
            ShortReply::Negative if awaiting_go_ahead(state) => {
                tracing::info!("confirmation declined, back to gathering");
                let message = CORRECTION_PROMPT.to_string();
                return self.advance(conversation, text, ConversationState::Gathering, TurnResponse::Message { message });
            }
            _ => {}
        }

        let request = ExtractionRequest {
            text: text.to_string(),
            prior_draft: Some(conversation.draft.clone()),
            history: conversation.history.clone(),
        };

        let extraction = match self.client.extract(&request).await {
            Ok(extraction) => extraction,
            Err(err) => return self.failed(conversation, err),
        };

        match self.respond(conversation, extraction) {
            Ok((next_state, response)) => self.advance(conversation, text, next_state, response),
            Err(err) => self.failed(conversation, err),
        }
    }

    /// Map an extraction to the next state and response.
    fn respond(
        &self,
        conversation: &Conversation,
        extraction: Extraction,
    ) -> Result<(ConversationState, TurnResponse), ExtractionError> {
        let state = conversation.state;

        match extraction.intent {
            Intent::Search => {
                let query = extraction.query.ok_or_else(|| {
                    ExtractionError::Malformed("search intent without a query".to_string())
                })?;
                tracing::info!(query = %query, "search requested");
                Ok((state, TurnResponse::Search { query }))
            }
            Intent::ChitChat | Intent::Unrecognized(_) => {
                if let Intent::Unrecognized(label) = &extraction.intent {
                    tracing::warn!(intent = %label, "unrecognized intent, replying as chit-chat");
                }
                let message = extraction
                    .message
                    .unwrap_or_else(|| DEFAULT_CHAT_REPLY.to_string());
                Ok((state, TurnResponse::Message { message }))
            }
            Intent::CreateEvent => {
                let incoming = extraction.event.ok_or_else(|| {
                    ExtractionError::Malformed("create_event intent without event data".to_string())
                })?;
                // Local times stay local in the draft so a corrected town
                // still applies; the publisher resolves them.
                let draft = merge(&conversation.draft, &incoming);
                let completeness = check(&draft);

                tracing::info!(
                    complete = completeness.complete,
                    missing = ?completeness.labels(),
                    "draft updated"
                );

                if !completeness.complete {
                    let questions = completeness.questions();
                    Ok((ConversationState::Gathering, TurnResponse::FollowUp { draft, questions }))
                } else if self.config.require_confirmation {
                    let message = format!("Here's what I have: {}. Shall I publish it?", draft.summary());
                    Ok((ConversationState::Confirming, TurnResponse::Confirm { draft, message }))
                } else {
                    Ok((ConversationState::Ready, TurnResponse::Ready { draft }))
                }
            }
        }
    }

    /// Build the next conversation: take the draft carried by the response (if
    /// any), move to `state`, and append both sides of the turn to the history.
    fn advance(
        &self,
        conversation: &Conversation,
        text: &str,
        state: ConversationState,
        response: TurnResponse,
    ) -> Turn {
        let draft = match &response {
            TurnResponse::FollowUp { draft, .. }
            | TurnResponse::Confirm { draft, .. }
            | TurnResponse::Ready { draft } => draft.clone(),
            _ => conversation.draft.clone(),
        };

        let mut history = conversation.history.clone();
        history.push(HistoryTurn::user(text));
        history.push(HistoryTurn::assistant(response.history_text()));
        let overflow = history.len().saturating_sub(self.config.max_history);
        history.drain(..overflow);

        Turn {
            conversation: Conversation {
                state,
                draft,
                history,
            },
            response,
        }
    }

    fn failed(&self, conversation: &Conversation, err: ExtractionError) -> Turn {
        tracing::warn!(error = %err, state = %conversation.state, "extraction failed, turn not applied");
        Turn {
            conversation: conversation.clone(),
            response: TurnResponse::Error {
                reason: err.to_string(),
            },
        }
    }
}

/// States in which a bare "yes" means "go ahead and publish".
fn awaiting_go_ahead(state: ConversationState) -> bool {
    matches!(state, ConversationState::Confirming | ConversationState::Ready)
}
