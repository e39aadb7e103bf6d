//! Event draft type definitions.
//!
//! Defines [`Slot`] (the three-state field wrapper that separates "never
//! mentioned" from "mentioned but unknown"), [`Timestamp`] (resolved or still
//! local), and [`EventDraft`] with its nested records.

use std::borrow::Cow;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use schemars::{json_schema, JsonSchema, Schema, SchemaGenerator};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Strings the extraction client uses to say "I looked, there is nothing here".
const UNKNOWN_MARKERS: &[&str] = &["", "missing", "unknown", "n/a", "tbd"];

/// A single draft field.
///
/// `Absent` and `Unknown` are both "not present" for completeness, but they
/// stay distinct so callers can tell a field nobody asked about from one the
/// extractor explicitly could not fill.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Slot<T> {
    /// Never mentioned. Not serialized.
    #[default]
    Absent,
    /// Considered by the extractor but no value found. Serialized as `null`.
    Unknown,
    /// A concrete value.
    Known(T),
}

impl<T> Slot<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }

    /// Borrow the concrete value, if any.
    pub fn known(&self) -> Option<&T> {
        match self {
            Self::Known(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_known(self) -> Option<T> {
        match self {
            Self::Known(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Slot<U> {
        match self {
            Self::Absent => Slot::Absent,
            Self::Unknown => Slot::Unknown,
            Self::Known(value) => Slot::Known(f(value)),
        }
    }
}

impl<T> From<T> for Slot<T> {
    fn from(value: T) -> Self {
        Self::Known(value)
    }
}

impl From<&str> for Slot<String> {
    fn from(value: &str) -> Self {
        Self::Known(value.to_string())
    }
}

impl<T: Serialize> Serialize for Slot<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Known(value) => value.serialize(serializer),
            Self::Absent | Self::Unknown => serializer.serialize_none(),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Slot<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        if is_unknown_marker(&value) {
            return Ok(Self::Unknown);
        }
        T::deserialize(value).map(Self::Known).map_err(D::Error::custom)
    }
}

impl<T: JsonSchema> JsonSchema for Slot<T> {
    fn inline_schema() -> bool {
        true
    }

    fn schema_name() -> Cow<'static, str> {
        format!("Nullable_{}", T::schema_name()).into()
    }

    fn json_schema(generator: &mut SchemaGenerator) -> Schema {
        let inner = generator.subschema_for::<T>();
        json_schema!({ "anyOf": [inner, { "type": "null" }] })
    }
}

fn is_unknown_marker(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::String(s) => {
            let trimmed = s.trim();
            UNKNOWN_MARKERS
                .iter()
                .any(|marker| trimmed.eq_ignore_ascii_case(marker))
        }
        _ => false,
    }
}

/// Treat an explicit `null` for a nested record the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

// ── Timestamps ────────────────────────────────────────────────────────────────

const LOCAL_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// An occurrence boundary.
///
/// The extractor often returns wall-clock times without an offset; those stay
/// `Local` until the draft's town gives them a timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    Resolved(DateTime<FixedOffset>),
    Local(NaiveDateTime),
}

impl Timestamp {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    pub fn resolved(&self) -> Option<DateTime<FixedOffset>> {
        match self {
            Self::Resolved(ts) => Some(*ts),
            Self::Local(_) => None,
        }
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resolved(ts) => f.write_str(&ts.to_rfc3339()),
            Self::Local(ts) => write!(f, "{}", ts.format("%Y-%m-%dT%H:%M:%S")),
        }
    }
}

impl std::str::FromStr for Timestamp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self::Resolved(ts));
        }
        LOCAL_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
            .map(Self::Local)
            .ok_or_else(|| format!("unrecognized timestamp: {s}"))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(D::Error::custom)
    }
}

impl JsonSchema for Timestamp {
    fn schema_name() -> Cow<'static, str> {
        "Timestamp".into()
    }

    fn json_schema(_generator: &mut SchemaGenerator) -> Schema {
        json_schema!({
            "type": "string",
            "description": "ISO 8601 date-time. Include the UTC offset only if the user stated one; otherwise give local wall-clock time like 2025-06-01T20:00:00"
        })
    }
}

// ── Draft records ─────────────────────────────────────────────────────────────

/// How often an event repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceRule {
    #[default]
    #[serde(alias = "one-time", alias = "once", alias = "none")]
    OneTime,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RecurrenceRule {
    /// SQL-compatible string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneTime => "one_time",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

impl std::fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RecurrenceRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "one_time" | "one-time" | "once" | "none" => Ok(Self::OneTime),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            _ => Err(format!("unknown recurrence rule: {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Price {
    #[serde(skip_serializing_if = "Slot::is_absent")]
    pub value: Slot<f64>,
    /// Free-form price text, e.g. "500 DOP at the door".
    #[serde(skip_serializing_if = "Slot::is_absent")]
    pub text: Slot<String>,
    #[serde(skip_serializing_if = "Slot::is_absent")]
    pub currency: Slot<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Host {
    #[serde(skip_serializing_if = "Slot::is_absent")]
    pub name: Slot<String>,
    #[serde(skip_serializing_if = "Slot::is_absent", alias = "phone_whatsapp")]
    pub phone_contact: Slot<String>,
    #[serde(skip_serializing_if = "Slot::is_absent", alias = "instagram")]
    pub social_handle: Slot<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Location {
    #[serde(skip_serializing_if = "Slot::is_absent")]
    pub name: Slot<String>,
    #[serde(skip_serializing_if = "Slot::is_absent")]
    pub address: Slot<String>,
    #[serde(skip_serializing_if = "Slot::is_absent")]
    pub lat: Slot<f64>,
    #[serde(skip_serializing_if = "Slot::is_absent")]
    pub lng: Slot<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Link {
    pub url: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Occurrence {
    #[serde(skip_serializing_if = "Slot::is_absent")]
    pub start_ts: Slot<Timestamp>,
    #[serde(skip_serializing_if = "Slot::is_absent")]
    pub end_ts: Slot<Timestamp>,
}

impl Occurrence {
    /// An occurrence starting at `start` with no known end.
    pub fn starting(start: Timestamp) -> Self {
        Self {
            start_ts: Slot::Known(start),
            end_ts: Slot::Absent,
        }
    }

    /// True if either boundary carries a concrete time.
    pub fn has_time(&self) -> bool {
        self.start_ts.is_known() || self.end_ts.is_known()
    }
}

/// An event under construction. Every field is optional at this stage;
/// [`crate::draft::completeness::check`] decides when it is publishable.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct EventDraft {
    #[serde(skip_serializing_if = "Slot::is_absent")]
    pub title: Slot<String>,
    #[serde(skip_serializing_if = "Slot::is_absent")]
    pub description: Slot<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub price: Price,
    /// Locality name; drives timezone resolution for local times.
    #[serde(skip_serializing_if = "Slot::is_absent")]
    pub town: Slot<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub host: Host,
    #[serde(deserialize_with = "null_as_default")]
    pub location: Location,
    #[serde(skip_serializing_if = "Slot::is_absent")]
    pub tags: Slot<Vec<String>>,
    #[serde(skip_serializing_if = "Slot::is_absent")]
    pub image_url: Slot<String>,
    #[serde(skip_serializing_if = "Slot::is_absent")]
    pub links: Slot<Vec<Link>>,
    #[serde(skip_serializing_if = "Slot::is_absent")]
    pub recurrence_rule: Slot<RecurrenceRule>,
    #[serde(skip_serializing_if = "Slot::is_absent")]
    pub is_on_demand: Slot<bool>,
    #[serde(skip_serializing_if = "Slot::is_absent")]
    pub occurrences: Slot<Vec<Occurrence>>,
}

impl EventDraft {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// The first occurrence, if the draft has any.
    pub fn first_occurrence(&self) -> Option<&Occurrence> {
        self.occurrences.known().and_then(|occ| occ.first())
    }

    /// One-paragraph human summary used in confirmation prompts.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();

        let title = self.title.known().map(String::as_str).unwrap_or("Untitled event");
        parts.push(format!("\"{title}\""));

        if let Some(host) = self.host.name.known() {
            parts.push(format!("hosted by {host}"));
        }
        if let Some(place) = self.location.name.known() {
            match self.town.known() {
                Some(town) => parts.push(format!("at {place}, {town}")),
                None => parts.push(format!("at {place}")),
            }
        }
        if let Some(start) = self.first_occurrence().and_then(|o| o.start_ts.known()) {
            let when = match start {
                Timestamp::Resolved(ts) => ts.format("%a %b %-d, %Y %-I:%M %p").to_string(),
                Timestamp::Local(ts) => ts.format("%a %b %-d, %Y %-I:%M %p").to_string(),
            };
            parts.push(format!("on {when}"));
        }
        if let Some(rule) = self.recurrence_rule.known() {
            if *rule != RecurrenceRule::OneTime {
                parts.push(format!("repeating {rule}"));
            }
        }
        if let Some(price) = self.price.text.known() {
            parts.push(format!("({price})"));
        } else if let Some(value) = self.price.value.known() {
            let currency = self.price.currency.known().map(String::as_str).unwrap_or("");
            parts.push(format!("({value} {currency})").replace(" )", ")"));
        }

        parts.join(" ")
    }
}
