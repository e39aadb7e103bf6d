//! SQL DDL for all Roam tables.
//!
//! Defines the `events`, `events_fts` (FTS5), `event_log`, and `schema_meta`
//! tables. All DDL uses `IF NOT EXISTS` for idempotent initialization.

use rusqlite::Connection;

/// All schema DDL statements for Roam's core tables.
const SCHEMA_SQL: &str = r#"
-- Published events. The full record lives in `payload` (JSON); the other
-- columns are denormalized for filtering.
CREATE TABLE IF NOT EXISTS events (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    town TEXT,
    host_name TEXT NOT NULL,
    location_name TEXT NOT NULL,
    first_start_ts TEXT NOT NULL,
    recurrence_rule TEXT NOT NULL DEFAULT 'one_time'
        CHECK(recurrence_rule IN ('one_time','daily','weekly','monthly','yearly')),
    is_on_demand INTEGER NOT NULL DEFAULT 0,
    payload TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_events_town ON events(town COLLATE NOCASE);
CREATE INDEX IF NOT EXISTS idx_events_start ON events(first_start_ts);
CREATE INDEX IF NOT EXISTS idx_events_created ON events(created_at);

-- Keyword search (BM25). rowid matches events.rowid.
CREATE VIRTUAL TABLE IF NOT EXISTS events_fts USING fts5(
    title,
    description,
    tags,
    host_name,
    location_name
);

-- Audit log
CREATE TABLE IF NOT EXISTS event_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    operation TEXT NOT NULL CHECK(operation IN ('publish')),
    event_id TEXT NOT NULL,
    details TEXT,
    created_at TEXT NOT NULL
);

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    // Set initial schema version if not already present
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}
