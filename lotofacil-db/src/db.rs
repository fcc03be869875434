use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

use crate::models::{Combination, DrawRecord};

// `seq` conserve l'ordre du fichier source : le dernier tirage est le plus grand seq.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS draws (
    seq      INTEGER PRIMARY KEY,
    draw_id  TEXT NOT NULL,
    date     TEXT NOT NULL,
    numbers  TEXT NOT NULL
);
";

pub fn db_path() -> std::path::PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("lotofacil.db");
    path
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Impossible de créer le répertoire {:?}", parent))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Impossible d'ouvrir la base {:?}", path))?;
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("Échec de la migration")?;
    Ok(())
}

fn encode_numbers(numbers: &Combination) -> String {
    numbers
        .numbers()
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn decode_numbers(raw: &str) -> Result<Combination> {
    let numbers = raw
        .split(',')
        .map(|s| s.trim().parse::<u8>())
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Numéros illisibles en base : '{}'", raw))?;
    Combination::new(&numbers)
}

/// Remplace tout l'historique en une seule transaction.
pub fn replace_draws(conn: &Connection, draws: &[DrawRecord]) -> Result<usize> {
    let tx = conn.unchecked_transaction()
        .context("Impossible de démarrer la transaction")?;

    tx.execute("DELETE FROM draws", [])
        .context("Échec de la purge de l'historique")?;

    {
        let mut stmt = tx.prepare(
            "INSERT INTO draws (seq, draw_id, date, numbers) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for (seq, draw) in draws.iter().enumerate() {
            stmt.execute(rusqlite::params![
                seq as i64,
                draw.draw_id,
                draw.date,
                encode_numbers(&draw.numbers),
            ])
            .with_context(|| format!("Échec de l'insertion du concours {}", draw.draw_id))?;
        }
    }

    tx.commit().context("Échec du commit")?;
    Ok(draws.len())
}

/// Tous les tirages, dans l'ordre du fichier importé.
pub fn fetch_all_draws(conn: &Connection) -> Result<Vec<DrawRecord>> {
    let mut stmt = conn.prepare(
        "SELECT draw_id, date, numbers FROM draws ORDER BY seq ASC"
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?.collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(draw_id, date, numbers)| {
            let numbers = decode_numbers(&numbers)
                .with_context(|| format!("Concours {} corrompu", draw_id))?;
            Ok(DrawRecord { draw_id, date, numbers })
        })
        .collect()
}

pub fn count_draws(conn: &Connection) -> Result<u32> {
    let count: u32 = conn.query_row("SELECT COUNT(*) FROM draws", [], |row| row.get(0))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_draw(id: &str, first: u8) -> DrawRecord {
        let numbers: Vec<u8> = (first..first + 15).collect();
        DrawRecord {
            draw_id: id.to_string(),
            date: "01/01/2024".to_string(),
            numbers: Combination::new(&numbers).unwrap(),
        }
    }

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        conn
    }

    #[test]
    fn test_replace_and_count() {
        let conn = memory_db();
        assert_eq!(count_draws(&conn).unwrap(), 0);

        let stored = replace_draws(&conn, &[test_draw("1", 1), test_draw("2", 2)]).unwrap();
        assert_eq!(stored, 2);
        assert_eq!(count_draws(&conn).unwrap(), 2);
    }

    #[test]
    fn test_replace_discards_previous_history() {
        let conn = memory_db();
        replace_draws(&conn, &[test_draw("1", 1), test_draw("2", 2)]).unwrap();
        replace_draws(&conn, &[test_draw("9", 5)]).unwrap();

        let draws = fetch_all_draws(&conn).unwrap();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].draw_id, "9");
    }

    #[test]
    fn test_fetch_keeps_file_order() {
        let conn = memory_db();
        replace_draws(
            &conn,
            &[test_draw("3", 3), test_draw("1", 1), test_draw("2", 2)],
        ).unwrap();

        let draws = fetch_all_draws(&conn).unwrap();
        let ids: Vec<&str> = draws.iter().map(|d| d.draw_id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1", "2"]);
        assert_eq!(draws[0].numbers, test_draw("3", 3).numbers);
    }

    #[test]
    fn test_decode_rejects_corrupt_numbers() {
        assert!(decode_numbers("1,2,3").is_err());
        assert!(decode_numbers("a,b").is_err());
    }
}
