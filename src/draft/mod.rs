//! Event drafts and the slot-filling rules over them.
//!
//! - [`types`]: [`EventDraft`] and the three-state [`Slot`] wrapper
//! - [`schema`]: which fields are mandatory for publication
//! - [`merge`]: folding a new extraction into the previous draft
//! - [`completeness`]: which mandatory fields are still missing

pub mod completeness;
pub mod merge;
pub mod schema;
pub mod types;

pub use completeness::{check, Completeness, MissingField};
pub use merge::merge;
pub use schema::{mandatory_fields_of, FieldPath, MANDATORY_FIELDS};
pub use types::{
    EventDraft, Host, Link, Location, Occurrence, Price, RecurrenceRule, Slot, Timestamp,
};
