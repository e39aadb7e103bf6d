//! Completeness checking against the mandatory field schema.

use serde::Serialize;

use crate::draft::schema::{mandatory_fields_of, FieldPath};
use crate::draft::types::{EventDraft, Slot, Timestamp};

const TOWN_LABEL: &str = "town";
const TOWN_QUESTION: &str = "Which town is it in? I need that to pin down the start time.";

/// A mandatory field that still needs a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingField {
    pub path: FieldPath,
    pub label: &'static str,
    pub question: &'static str,
}

impl MissingField {
    fn of(path: FieldPath) -> Self {
        Self {
            path,
            label: path.label(),
            question: path.question(),
        }
    }
}

/// Result of [`check`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Completeness {
    pub complete: bool,
    pub missing: Vec<MissingField>,
}

impl Completeness {
    pub fn labels(&self) -> Vec<&'static str> {
        self.missing.iter().map(|m| m.label).collect()
    }

    pub fn questions(&self) -> Vec<String> {
        self.missing.iter().map(|m| m.question.to_string()).collect()
    }
}

/// Check `draft` against the mandatory fields, in schema order.
///
/// Local (offset-less) times count as present once the town is known, since
/// the town's zone pins them at publish time. While any occurrence still has
/// a local time and the town is unknown, the start-time slot asks for the town.
pub fn check(draft: &EventDraft) -> Completeness {
    let missing: Vec<MissingField> = mandatory_fields_of(draft)
        .iter()
        .filter_map(|path| missing_for(draft, *path))
        .collect();

    Completeness {
        complete: missing.is_empty(),
        missing,
    }
}

fn missing_for(draft: &EventDraft, path: FieldPath) -> Option<MissingField> {
    let present = match path {
        FieldPath::Title => draft.title.is_known(),
        FieldPath::HostName => draft.host.name.is_known(),
        FieldPath::LocationName => draft.location.name.is_known(),
        FieldPath::FirstStart => {
            return match first_start(draft) {
                None => Some(MissingField::of(path)),
                Some(_) if has_local_times(draft) && !draft.town.is_known() => Some(MissingField {
                    path,
                    label: TOWN_LABEL,
                    question: TOWN_QUESTION,
                }),
                Some(_) => None,
            };
        }
    };
    (!present).then(|| MissingField::of(path))
}

fn first_start(draft: &EventDraft) -> Option<Timestamp> {
    draft
        .first_occurrence()
        .and_then(|occ| occ.start_ts.known())
        .copied()
}

/// True if any occurrence boundary is a wall-clock time without an offset.
fn has_local_times(draft: &EventDraft) -> bool {
    let is_local = |slot: &Slot<Timestamp>| matches!(slot.known(), Some(Timestamp::Local(_)));
    draft
        .occurrences
        .known()
        .is_some_and(|occ| occ.iter().any(|o| is_local(&o.start_ts) || is_local(&o.end_ts)))
}
