use anyhow::{Context, Result};
use rusqlite::{params, Connection, Row};

use crate::events::{EventRecord, PublishedEvent};

/// Keyword search over published events, optionally scoped to a town.
///
/// Every query word must match (FTS5 implicit AND) in the title, description,
/// tags, host or location name. Results come back in BM25 rank order, newest
/// first among ties. A query with no usable words lists the newest events.
pub fn search_events(
    conn: &Connection,
    query: &str,
    town: Option<&str>,
    limit: usize,
) -> Result<Vec<PublishedEvent>> {
    let escaped = escape_fts_query(query);
    let town = town.map(str::trim).filter(|t| !t.is_empty());

    let results = if escaped.is_empty() {
        let mut stmt = conn.prepare(
            "SELECT id, payload, created_at FROM events \
             WHERE (?1 IS NULL OR town = ?1 COLLATE NOCASE) \
             ORDER BY created_at DESC LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![town, limit as i64], read_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows
    } else {
        let mut stmt = conn.prepare(
            "SELECT e.id, e.payload, e.created_at \
             FROM (SELECT rowid, rank FROM events_fts WHERE events_fts MATCH ?1) AS hits \
             JOIN events e ON e.rowid = hits.rowid \
             WHERE (?2 IS NULL OR e.town = ?2 COLLATE NOCASE) \
             ORDER BY hits.rank, e.created_at DESC LIMIT ?3",
        )?;
        let rows = stmt
            .query_map(params![escaped, town, limit as i64], read_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows
    };

    tracing::debug!(query = %query, town = ?town, hits = results.len(), "event search");

    results
        .into_iter()
        .map(|(id, payload, created_at)| {
            let event: EventRecord = serde_json::from_str(&payload)
                .with_context(|| format!("corrupt payload for event {id}"))?;
            Ok(PublishedEvent {
                id,
                created_at,
                event,
            })
        })
        .collect()
}

fn read_row(row: &Row) -> rusqlite::Result<(String, String, String)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
}

/// Escape a user query for FTS5 MATCH syntax.
///
/// Wraps each whitespace-delimited word in double quotes and joins with spaces
/// so FTS5 treats them as individual terms (implicit AND). Strips empty tokens.
fn escape_fts_query(query: &str) -> String {
    query
        .split_whitespace()
        .map(|word| {
            // Strip any existing quotes and wrap in fresh ones
            let clean = word.replace('"', "");
            format!("\"{clean}\"")
        })
        .filter(|w| w != "\"\"")
        .collect::<Vec<_>>()
        .join(" ")
}
