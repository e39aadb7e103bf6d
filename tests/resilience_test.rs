mod helpers;

use helpers::*;
use roam::db;
use roam::events::{publish, search_events};
use tempfile::TempDir;

#[test]
fn concurrent_reader_sees_committed_events() {
    let tmp = TempDir::new().unwrap();
    let db_path = tmp.path().join("shared.db");

    let mut writer = db::open_database(&db_path).unwrap();
    let reader = db::open_database(&db_path).unwrap();

    publish(
        &mut writer,
        &complete_draft("Sunrise yoga", "Cabarete", "2025-06-01T08:00:00-04:00"),
        &test_towns(),
    )
    .unwrap();

    let results = search_events(&reader, "yoga", None, 10).unwrap();
    assert_eq!(results.len(), 1);
}

#[test]
fn corrupt_payload_is_reported_not_panicked() {
    let conn = test_db();
    conn.execute(
        "INSERT INTO events (id, title, host_name, location_name, first_start_ts, payload, created_at) \
         VALUES ('bad', 'Broken', 'h', 'l', '2025-06-01T08:00:00-04:00', '{not json', '2025-05-01T00:00:00Z')",
        [],
    )
    .unwrap();

    let err = search_events(&conn, "", None, 10).unwrap_err();
    assert!(err.to_string().contains("bad"));
}

#[test]
fn unknown_town_timezone_row_is_skipped() {
    let conn = test_db();
    conn.execute(
        "INSERT INTO towns (name, tz) VALUES ('Atlantis', 'Ocean/Deep')",
        [],
    )
    .unwrap();

    let towns = roam::timezone::TownDirectory::load(&conn, chrono_tz::UTC).unwrap();
    assert_eq!(towns.zone_for("Atlantis"), chrono_tz::UTC);
    assert_eq!(towns.zone_for("Cabarete"), chrono_tz::America::Santo_Domingo);
}
