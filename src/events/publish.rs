//! Write path: validation, storage, search indexing, and audit logging.
//!
//! [`publish`] is the single entry point. It re-validates the draft (the
//! conversation's ready gate is not trusted), then inserts the event row, its
//! FTS5 entry and an audit log line inside one transaction.

use rusqlite::{params, Connection, Transaction};

use crate::draft::EventDraft;
use crate::events::{EventRecord, PublishError, PublishedEvent};
use crate::timezone::TownDirectory;

/// Validate and persist a complete draft.
///
/// Local times are resolved with `towns` first, so a draft whose only gap is
/// an unresolved time with a known town still publishes.
pub fn publish(
    conn: &mut Connection,
    draft: &EventDraft,
    towns: &TownDirectory,
) -> Result<PublishedEvent, PublishError> {
    let draft = towns.resolve_times(draft);
    let record = EventRecord::from_draft(&draft)?;

    let id = uuid::Uuid::now_v7().to_string();
    let created_at = chrono::Utc::now().to_rfc3339();

    let tx = conn.transaction()?;
    let rowid = insert_event(&tx, &id, &record, &created_at)?;
    insert_fts(&tx, rowid, &record)?;
    write_audit_log(
        &tx,
        "publish",
        &id,
        Some(&serde_json::json!({ "title": &record.title, "town": &record.town })),
    )?;
    tx.commit()?;

    tracing::info!(id = %id, title = %record.title, town = ?record.town, "event published");

    Ok(PublishedEvent {
        id,
        created_at,
        event: record,
    })
}

/// Insert the event row. Returns the SQLite rowid for FTS5 sync.
fn insert_event(
    tx: &Transaction,
    id: &str,
    record: &EventRecord,
    created_at: &str,
) -> Result<i64, PublishError> {
    let payload = serde_json::to_string(record)?;
    let first_start = record
        .first_start()
        .map(|ts| ts.to_rfc3339())
        .unwrap_or_default();

    tx.execute(
        "INSERT INTO events (id, title, town, host_name, location_name, first_start_ts, recurrence_rule, is_on_demand, payload, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            id,
            record.title,
            record.town,
            record.host.name,
            record.location.name,
            first_start,
            record.recurrence_rule.as_str(),
            record.is_on_demand,
            payload,
            created_at,
        ],
    )?;

    Ok(tx.last_insert_rowid())
}

/// Sync the FTS5 index. Must use the same rowid as the `events` row.
fn insert_fts(tx: &Transaction, rowid: i64, record: &EventRecord) -> Result<(), PublishError> {
    tx.execute(
        "INSERT INTO events_fts (rowid, title, description, tags, host_name, location_name) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            rowid,
            record.title,
            record.description.as_deref().unwrap_or(""),
            record.tags.join(" "),
            record.host.name,
            record.location.name,
        ],
    )?;
    Ok(())
}

/// Write an entry to the event_log audit table.
fn write_audit_log(
    conn: &Connection,
    operation: &str,
    event_id: &str,
    details: Option<&serde_json::Value>,
) -> Result<(), PublishError> {
    let now = chrono::Utc::now().to_rfc3339();
    let details_json = details.map(|d| d.to_string());
    conn.execute(
        "INSERT INTO event_log (operation, event_id, details, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![operation, event_id, details_json, now],
    )?;
    Ok(())
}
