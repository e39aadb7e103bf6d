#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use roam::config::ConversationConfig;
use roam::conversation::Controller;
use roam::draft::{EventDraft, Host, Location, Occurrence, Slot};
use roam::extraction::{Extraction, ExtractionClient, ExtractionError, ExtractionRequest};
use roam::timezone::TownDirectory;
use rusqlite::Connection;

/// Open a fresh in-memory database with schema and migrations applied.
pub fn test_db() -> Connection {
    roam::db::open_memory_database().unwrap()
}

/// Town directory with the seeded towns plus one zone that differs from the default.
pub fn test_towns() -> TownDirectory {
    TownDirectory::new(chrono_tz::America::Santo_Domingo)
        .with_town("Cabarete", chrono_tz::America::Santo_Domingo)
        .with_town("Las Terrenas", chrono_tz::America::Santo_Domingo)
        .with_town("New York", chrono_tz::America::New_York)
}

/// Extraction client that plays back a fixed script of results and records
/// every request it receives. Clones share the same script.
#[derive(Clone, Default)]
pub struct ScriptedExtractor {
    replies: Arc<Mutex<VecDeque<Result<Extraction, ExtractionError>>>>,
    requests: Arc<Mutex<Vec<ExtractionRequest>>>,
}

impl ScriptedExtractor {
    pub fn new(replies: Vec<Result<Extraction, ExtractionError>>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into())),
            requests: Arc::default(),
        }
    }

    pub fn push(&self, reply: Result<Extraction, ExtractionError>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    /// Number of extraction calls made so far.
    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ExtractionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl ExtractionClient for ScriptedExtractor {
    async fn extract(&self, request: &ExtractionRequest) -> Result<Extraction, ExtractionError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ExtractionError::Unavailable("script exhausted".into())))
    }
}

/// Controller with the given confirmation setting and a generous history bound.
pub fn controller(
    extractor: &ScriptedExtractor,
    require_confirmation: bool,
) -> Controller<ScriptedExtractor> {
    Controller::new(
        extractor.clone(),
        test_towns(),
        ConversationConfig {
            require_confirmation,
            max_history: 20,
        },
    )
}

/// Draft with only a host name.
pub fn host_only(name: &str) -> EventDraft {
    EventDraft {
        host: Host {
            name: name.into(),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Draft with title, host and location but no occurrences.
pub fn draft_without_time(title: &str, host: &str, location: &str) -> EventDraft {
    EventDraft {
        title: title.into(),
        host: Host {
            name: host.into(),
            ..Default::default()
        },
        location: Location {
            name: location.into(),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Draft carrying a single occurrence starting at `start` (RFC 3339 or local).
pub fn starting_at(start: &str) -> EventDraft {
    EventDraft {
        occurrences: Slot::Known(vec![Occurrence::starting(start.parse().unwrap())]),
        ..Default::default()
    }
}

/// A publishable draft in `town`.
pub fn complete_draft(title: &str, town: &str, start: &str) -> EventDraft {
    EventDraft {
        town: town.into(),
        ..roam::draft::merge(
            &draft_without_time(title, "Mia", "Kite Beach"),
            &starting_at(start),
        )
    }
}
