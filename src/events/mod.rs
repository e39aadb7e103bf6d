//! Published events: the persisted form of a complete draft.
//!
//! [`publish`] validates and stores a draft; [`search`] does keyword lookup
//! over what has been stored.

pub mod publish;
pub mod search;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::draft::{check, EventDraft, Link, Occurrence, RecurrenceRule, Timestamp};

pub use publish::publish;
pub use search::search_events;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("event is missing mandatory fields: {}", .missing.join(", "))]
    Validation { missing: Vec<String> },
    #[error("failed to store event: {0}")]
    Persistence(#[from] rusqlite::Error),
    #[error("failed to encode event: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostRecord {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_contact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub social_handle: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccurrenceRecord {
    pub start_ts: DateTime<FixedOffset>,
    pub end_ts: Option<DateTime<FixedOffset>>,
}

/// A complete event with every mandatory field concrete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<PriceRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub town: Option<String>,
    pub host: HostRecord,
    pub location: LocationRecord,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub links: Vec<Link>,
    pub recurrence_rule: RecurrenceRule,
    pub is_on_demand: bool,
    pub occurrences: Vec<OccurrenceRecord>,
}

impl EventRecord {
    /// Build a record from a draft, or report which mandatory fields are missing.
    ///
    /// Times must already be resolved (see [`crate::timezone::TownDirectory::resolve_times`]).
    /// A local time left over is reported as a missing town. Occurrences with
    /// no start time are skipped.
    pub fn from_draft(draft: &EventDraft) -> Result<Self, PublishError> {
        let completeness = check(draft);
        if !completeness.complete {
            return Err(PublishError::Validation {
                missing: completeness.labels().into_iter().map(String::from).collect(),
            });
        }

        let d = draft.clone();
        let missing = |label: &str| PublishError::Validation {
            missing: vec![label.to_string()],
        };

        let price = PriceRecord {
            value: d.price.value.into_known(),
            text: d.price.text.into_known(),
            currency: d.price.currency.into_known(),
        };
        let has_price = price.value.is_some() || price.text.is_some() || price.currency.is_some();

        let occurrences = d
            .occurrences
            .known()
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .filter_map(|occ| occurrence_record(occ).transpose())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            title: d.title.into_known().ok_or_else(|| missing("title"))?,
            description: d.description.into_known(),
            price: has_price.then_some(price),
            town: d.town.into_known(),
            host: HostRecord {
                name: d.host.name.into_known().ok_or_else(|| missing("host name"))?,
                phone_contact: d.host.phone_contact.into_known(),
                social_handle: d.host.social_handle.into_known(),
            },
            location: LocationRecord {
                name: d.location.name.into_known().ok_or_else(|| missing("location name"))?,
                address: d.location.address.into_known(),
                lat: d.location.lat.into_known(),
                lng: d.location.lng.into_known(),
            },
            tags: d.tags.into_known().unwrap_or_default(),
            image_url: d.image_url.into_known(),
            links: d.links.into_known().unwrap_or_default(),
            recurrence_rule: d.recurrence_rule.into_known().unwrap_or_default(),
            is_on_demand: d.is_on_demand.into_known().unwrap_or(false),
            occurrences,
        })
    }

    /// Start of the first occurrence. Always present on a validated record.
    pub fn first_start(&self) -> Option<DateTime<FixedOffset>> {
        self.occurrences.first().map(|o| o.start_ts)
    }
}

fn occurrence_record(occurrence: &Occurrence) -> Result<Option<OccurrenceRecord>, PublishError> {
    let Some(start) = occurrence.start_ts.known() else {
        return Ok(None);
    };
    let start_ts = resolved_or_town(start)?;
    let end_ts = occurrence.end_ts.known().map(resolved_or_town).transpose()?;
    Ok(Some(OccurrenceRecord { start_ts, end_ts }))
}

fn resolved_or_town(ts: &Timestamp) -> Result<DateTime<FixedOffset>, PublishError> {
    ts.resolved().ok_or_else(|| PublishError::Validation {
        missing: vec!["town".to_string()],
    })
}

/// A stored event as returned by the Publisher and the Search Service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedEvent {
    /// UUID v7 (time-sortable) primary key.
    pub id: String,
    /// RFC 3339 UTC creation timestamp.
    pub created_at: String,
    #[serde(flatten)]
    pub event: EventRecord,
}
