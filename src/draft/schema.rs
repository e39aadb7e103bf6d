//! Mandatory-for-publication field declaration.

use serde::Serialize;

use crate::draft::types::EventDraft;

/// A mandatory field, identified by its dotted path in the draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FieldPath {
    #[serde(rename = "title")]
    Title,
    #[serde(rename = "host.name")]
    HostName,
    #[serde(rename = "location.name")]
    LocationName,
    #[serde(rename = "occurrences[0].start_ts")]
    FirstStart,
}

/// Mandatory fields in the order follow-up questions are asked.
pub const MANDATORY_FIELDS: [FieldPath; 4] = [
    FieldPath::Title,
    FieldPath::HostName,
    FieldPath::LocationName,
    FieldPath::FirstStart,
];

impl FieldPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::HostName => "host.name",
            Self::LocationName => "location.name",
            Self::FirstStart => "occurrences[0].start_ts",
        }
    }

    /// Human-readable label used in follow-up prompts.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::HostName => "host name",
            Self::LocationName => "location name",
            Self::FirstStart => "start time",
        }
    }

    pub fn question(&self) -> &'static str {
        match self {
            Self::Title => "What's the name of the event?",
            Self::HostName => "Who is hosting it?",
            Self::LocationName => "Where is it taking place?",
            Self::FirstStart => "When does it start? A date and time would be great.",
        }
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The mandatory field paths for `draft`, in checking order.
///
/// The set does not depend on the draft's contents today; taking the draft
/// keeps call sites stable if event kinds with different requirements appear.
pub fn mandatory_fields_of(_draft: &EventDraft) -> &'static [FieldPath] {
    &MANDATORY_FIELDS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mandatory_fields_are_in_question_order() {
        let fields = mandatory_fields_of(&EventDraft::default());
        let paths: Vec<&str> = fields.iter().map(FieldPath::as_str).collect();
        assert_eq!(
            paths,
            vec!["title", "host.name", "location.name", "occurrences[0].start_ts"]
        );
    }

    #[test]
    fn field_paths_serialize_as_dotted_paths() {
        let json = serde_json::to_string(&FieldPath::HostName).unwrap();
        assert_eq!(json, "\"host.name\"");
    }
}
