use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{Days, NaiveDate};
use csv::StringRecord;
use loto_db::db::insert_draw;
use loto_db::models::{validate_draw, Draw};
use loto_db::rusqlite::Connection;

const BALL_COLUMNS: [&str; 5] = ["boule1", "boule2", "boule3", "boule4", "boule5"];
/// Used when the file has no `chance` column.
const DEFAULT_CHANCE: u8 = 1;

/// First synthetic date when the file has no `date` column; row `i` gets
/// this date plus `i` days so file order is kept.
fn synthetic_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// `;` when the header line has more semicolons than commas, `,` otherwise.
pub fn detect_delimiter(header_line: &str) -> u8 {
    let semicolons = header_line.matches(';').count();
    let commas = header_line.matches(',').count();
    if semicolons > commas { b';' } else { b',' }
}

/// `YYYY-MM-DD` or `DD/MM/YYYY`.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
        .with_context(|| format!("Format de date invalide: '{}'", raw))
}

struct ColumnMap {
    balls: [usize; 5],
    chance: Option<usize>,
    date: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let mut balls = [0usize; 5];
        for (slot, name) in balls.iter_mut().zip(BALL_COLUMNS) {
            *slot = find(name).with_context(|| format!("Colonne manquante: {}", name))?;
        }
        Ok(Self { balls, chance: find("chance"), date: find("date") })
    }
}

fn parse_record(record: &StringRecord, columns: &ColumnMap, row: usize) -> Result<Draw> {
    let get = |idx: usize| -> Result<&str> {
        record
            .get(idx)
            .map(str::trim)
            .with_context(|| format!("Champ manquant à l'index {}", idx))
    };
    let get_u8 = |idx: usize| -> Result<u8> {
        let s = get(idx)?;
        s.parse::<u8>()
            .with_context(|| format!("Impossible de parser '{}' (index {})", s, idx))
    };

    let mut balls = [0u8; 5];
    for (ball, &idx) in balls.iter_mut().zip(&columns.balls) {
        *ball = get_u8(idx)?;
    }
    let chance = match columns.chance {
        Some(idx) => get_u8(idx)?,
        None => DEFAULT_CHANCE,
    };
    let date = match columns.date {
        Some(idx) => parse_date(get(idx)?)?,
        None => synthetic_start() + Days::new(row as u64),
    };
    Ok(Draw::new(date, balls, chance))
}

#[derive(Debug, Default)]
pub struct ParsedCsv {
    pub draws: Vec<Draw>,
    /// Parsed but rejected by draw validation.
    pub dropped: u32,
    /// Unreadable or unparsable rows.
    pub errors: u32,
}

pub fn parse_csv<R: Read>(reader: R, delimiter: u8) -> Result<ParsedCsv> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(reader);
    let headers = reader.headers().context("En-tête CSV illisible")?.clone();
    let columns = ColumnMap::from_headers(&headers)?;

    let mut parsed = ParsedCsv::default();
    for (row, record_result) in reader.records().enumerate() {
        let line = row + 2;
        let record = match record_result {
            Ok(record) => record,
            Err(e) => {
                log::warn!("Erreur lecture ligne {}: {}", line, e);
                parsed.errors += 1;
                continue;
            }
        };
        match parse_record(&record, &columns, row) {
            Ok(draw) => match validate_draw(&draw.balls, draw.chance) {
                Ok(()) => parsed.draws.push(draw),
                Err(e) => {
                    log::warn!("Ligne {} ignorée: {}", line, e);
                    parsed.dropped += 1;
                }
            },
            Err(e) => {
                log::warn!("Erreur parsing ligne {}: {:#}", line, e);
                parsed.errors += 1;
            }
        }
    }
    Ok(parsed)
}

pub struct ImportResult {
    pub total_records: u32,
    pub inserted: u32,
    pub skipped: u32,
    pub dropped: u32,
    pub errors: u32,
}

pub fn import_csv(conn: &Connection, path: &Path) -> Result<ImportResult> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;
    let Some(header_line) = content.lines().next() else {
        bail!("Fichier vide: {:?}", path);
    };
    let parsed = parse_csv(content.as_bytes(), detect_delimiter(header_line))?;

    let tx = conn
        .unchecked_transaction()
        .context("Impossible de démarrer la transaction")?;

    let mut result = ImportResult {
        total_records: parsed.draws.len() as u32 + parsed.dropped + parsed.errors,
        inserted: 0,
        skipped: 0,
        dropped: parsed.dropped,
        errors: parsed.errors,
    };

    for draw in &parsed.draws {
        match insert_draw(&tx, draw) {
            Ok(true) => result.inserted += 1,
            Ok(false) => result.skipped += 1,
            Err(e) => {
                log::warn!("Erreur insertion tirage du {}: {:#}", draw.date, e);
                result.errors += 1;
            }
        }
    }

    tx.commit().context("Échec du commit")?;
    Ok(result)
}
