use std::path::Path;

use anyhow::Result;
use log::info;

use lotofacil_db::db::{fetch_all_draws, replace_draws};
use lotofacil_db::rusqlite::Connection;
use lotofacil_engine::error::HistoryError;
use lotofacil_engine::history::{HistorySnapshot, LoadSummary, parse_history};

pub fn read_history_file(path: &Path) -> Result<String, HistoryError> {
    std::fs::read_to_string(path).map_err(|e| HistoryError::Fetch {
        source_name: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Remplace l'historique en base par le contenu du CSV. Si le contenu est
/// inexploitable, la base reste intacte.
pub fn store_history(conn: &Connection, raw: &str) -> Result<LoadSummary> {
    let parsed = parse_history(raw)?;
    let written = replace_draws(conn, &parsed.draws)?;
    info!("{written} concours enregistrés en base");
    Ok(parsed.summary)
}

pub fn load_snapshot(conn: &Connection) -> Result<Option<HistorySnapshot>> {
    let draws = fetch_all_draws(conn)?;
    if draws.is_empty() {
        return Ok(None);
    }
    Ok(Some(HistorySnapshot::from_draws(draws)?))
}
