use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{Connection, Row};
use std::path::Path;

use crate::models::Draw;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS draws (
    date    TEXT PRIMARY KEY,
    ball_1  INTEGER NOT NULL,
    ball_2  INTEGER NOT NULL,
    ball_3  INTEGER NOT NULL,
    ball_4  INTEGER NOT NULL,
    ball_5  INTEGER NOT NULL,
    chance  INTEGER NOT NULL
);
";

const COLUMNS: &str = "date, ball_1, ball_2, ball_3, ball_4, ball_5, chance";

pub fn db_path() -> std::path::PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("loto.db");
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

/// Returns `false` when a draw with the same date is already stored.
pub fn insert_draw(conn: &Connection, draw: &Draw) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO draws (date, ball_1, ball_2, ball_3, ball_4, ball_5, chance)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            draw.date,
            draw.balls[0],
            draw.balls[1],
            draw.balls[2],
            draw.balls[3],
            draw.balls[4],
            draw.chance,
        ],
    ).context("Échec de l'insertion")?;
    Ok(changed > 0)
}

fn row_to_draw(row: &Row<'_>) -> rusqlite::Result<Draw> {
    Ok(Draw {
        date: row.get::<_, NaiveDate>(0)?,
        balls: [
            row.get::<_, u8>(1)?,
            row.get::<_, u8>(2)?,
            row.get::<_, u8>(3)?,
            row.get::<_, u8>(4)?,
            row.get::<_, u8>(5)?,
        ],
        chance: row.get::<_, u8>(6)?,
    })
}

/// Newest first.
pub fn fetch_last_draws(conn: &Connection, limit: u32) -> Result<Vec<Draw>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM draws ORDER BY date DESC LIMIT ?1"
    ))?;
    let draws = stmt
        .query_map([limit], row_to_draw)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(draws)
}

/// Whole history, oldest first: the order every pipeline stage expects.
pub fn fetch_history(conn: &Connection) -> Result<Vec<Draw>> {
    let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM draws ORDER BY date ASC"))?;
    let draws = stmt
        .query_map([], row_to_draw)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(draws)
}

pub fn count_draws(conn: &Connection) -> Result<u32> {
    let count: u32 = conn.query_row("SELECT COUNT(*) FROM draws", [], |row| row.get(0))?;
    Ok(count)
}
