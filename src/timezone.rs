//! Town → timezone lookup and local-time resolution for drafts.
//!
//! Extracted start/end times usually arrive as wall-clock times. Once the
//! draft names a town, [`TownDirectory::resolve_times`] pins them to that
//! town's zone. Towns missing from the directory use the default zone.

use std::collections::HashMap;

use anyhow::{anyhow, Context, Result};
use chrono::{Duration, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use rusqlite::Connection;

use crate::draft::{EventDraft, Occurrence, Slot, Timestamp};

/// Parse an IANA zone name such as `America/Santo_Domingo`.
pub fn parse_zone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|e| anyhow!("invalid timezone {name:?}: {e}"))
}

#[derive(Debug, Clone)]
pub struct TownDirectory {
    zones: HashMap<String, Tz>,
    default_zone: Tz,
}

impl TownDirectory {
    pub fn new(default_zone: Tz) -> Self {
        Self {
            zones: HashMap::new(),
            default_zone,
        }
    }

    pub fn with_town(mut self, name: &str, zone: Tz) -> Self {
        self.zones.insert(normalize(name), zone);
        self
    }

    /// Load every row of the `towns` table. Rows with an unparseable zone are
    /// skipped with a warning.
    pub fn load(conn: &Connection, default_zone: Tz) -> Result<Self> {
        let mut stmt = conn
            .prepare("SELECT name, tz FROM towns ORDER BY name")
            .context("failed to query towns")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut directory = Self::new(default_zone);
        for (name, tz) in rows {
            match tz.parse::<Tz>() {
                Ok(zone) => directory = directory.with_town(&name, zone),
                Err(e) => tracing::warn!(town = %name, tz = %tz, error = %e, "skipping town with invalid timezone"),
            }
        }
        tracing::debug!(towns = directory.zones.len(), default = %default_zone, "town directory loaded");
        Ok(directory)
    }

    pub fn default_zone(&self) -> Tz {
        self.default_zone
    }

    /// Zone for `town`, falling back to the default zone.
    pub fn zone_for(&self, town: &str) -> Tz {
        self.zones
            .get(&normalize(town))
            .copied()
            .unwrap_or(self.default_zone)
    }

    /// Return a copy of `draft` with local occurrence times resolved in the
    /// town's zone. Drafts without a known town are returned unchanged.
    pub fn resolve_times(&self, draft: &EventDraft) -> EventDraft {
        let (Some(town), Some(occurrences)) = (draft.town.known(), draft.occurrences.known())
        else {
            return draft.clone();
        };
        let zone = self.zone_for(town);

        let resolved = occurrences
            .iter()
            .map(|occ| Occurrence {
                start_ts: resolve_slot(&occ.start_ts, zone),
                end_ts: resolve_slot(&occ.end_ts, zone),
            })
            .collect();

        EventDraft {
            occurrences: Slot::Known(resolved),
            ..draft.clone()
        }
    }
}

fn resolve_slot(slot: &Slot<Timestamp>, zone: Tz) -> Slot<Timestamp> {
    match slot {
        Slot::Known(Timestamp::Local(naive)) => match localize(*naive, zone) {
            Some(ts) => Slot::Known(ts),
            None => slot.clone(),
        },
        other => other.clone(),
    }
}

/// Ambiguous times take the earlier instant; times in a DST gap move forward an hour.
fn localize(naive: NaiveDateTime, zone: Tz) -> Option<Timestamp> {
    zone.from_local_datetime(&naive)
        .earliest()
        .or_else(|| zone.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|dt| Timestamp::Resolved(dt.fixed_offset()))
}

fn normalize(town: &str) -> String {
    town.trim().to_lowercase()
}
