use roam::db;
use roam::timezone::TownDirectory;
use tempfile::TempDir;

#[test]
fn open_creates_new_db_at_nonexistent_path() {
    let tmp = TempDir::new().unwrap();
    let db_path = tmp.path().join("subdir").join("new.db");

    assert!(!db_path.exists());

    let conn = db::open_database(&db_path).unwrap();

    assert!(db_path.exists());
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn health_check_passes_on_fresh_db() {
    let conn = db::open_memory_database().unwrap();

    let report = db::check_database_health(&conn).unwrap();
    assert!(report.integrity_ok);
    assert_eq!(report.schema_version, db::migrations::CURRENT_SCHEMA_VERSION);
    assert_eq!(report.event_count, 0);
    assert_eq!(report.town_count, 3);
}

#[test]
fn busy_timeout_is_set() {
    let tmp = TempDir::new().unwrap();
    let db_path = tmp.path().join("test.db");

    let conn = db::open_database(&db_path).unwrap();

    let timeout: i64 = conn
        .pragma_query_value(None, "busy_timeout", |row| row.get(0))
        .unwrap();
    assert_eq!(timeout, 5000);
}

#[test]
fn wal_mode_is_enabled_on_file_db() {
    let tmp = TempDir::new().unwrap();
    let conn = db::open_database(tmp.path().join("wal.db")).unwrap();

    let mode: String = conn
        .pragma_query_value(None, "journal_mode", |row| row.get(0))
        .unwrap();
    assert_eq!(mode.to_lowercase(), "wal");
}

#[test]
fn reopening_keeps_data_and_version() {
    let tmp = TempDir::new().unwrap();
    let db_path = tmp.path().join("reopen.db");

    {
        let conn = db::open_database(&db_path).unwrap();
        conn.execute(
            "INSERT INTO towns (name, tz) VALUES ('Sosua', 'America/Santo_Domingo')",
            [],
        )
        .unwrap();
    }

    let conn = db::open_database(&db_path).unwrap();
    let report = db::check_database_health(&conn).unwrap();
    assert_eq!(report.schema_version, db::migrations::CURRENT_SCHEMA_VERSION);
    assert_eq!(report.town_count, 4);
}

#[test]
fn v1_database_is_migrated_with_seeded_towns() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    db::schema::init_schema(&conn).unwrap();
    assert_eq!(db::migrations::get_schema_version(&conn).unwrap(), 1);

    db::migrations::run_migrations(&conn).unwrap();
    db::migrations::run_migrations(&conn).unwrap();

    assert_eq!(db::migrations::get_schema_version(&conn).unwrap(), 2);
    let towns = TownDirectory::load(&conn, chrono_tz::UTC).unwrap();
    assert_eq!(towns.zone_for("cabarete"), chrono_tz::America::Santo_Domingo);
    assert_eq!(towns.zone_for("Nowhere"), chrono_tz::UTC);
}
