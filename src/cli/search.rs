use anyhow::Result;

use roam::config::RoamConfig;

/// Run a keyword search from the terminal.
pub fn search(
    config: &RoamConfig,
    query: &str,
    town: Option<&str>,
    limit: Option<usize>,
) -> Result<()> {
    let db_path = config.resolved_db_path();
    let conn = roam::db::open_database(&db_path)?;

    let limit = limit.unwrap_or(config.search.default_limit);
    let results = roam::events::search_events(&conn, query, town, limit)?;

    if !results.is_empty() {
        println!("Found {} event(s)\n", results.len());
    }
    super::print_events(&results);

    Ok(())
}
