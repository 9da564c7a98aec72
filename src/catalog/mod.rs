//! Local comic catalog backed by SQLite.
//!
//! The database is owned by an external indexer; this module only reads it.
//! Expected tables: `comics`, `creators`, `characters`, `teams` and the join
//! tables `comic_creators` (with a `role` column), `comic_characters` and
//! `comic_teams`.

mod fuzzy;
mod models;
mod query;
mod search;
mod tools;


pub use fuzzy::{ratio, FUZZY_THRESHOLD};
pub use models::{
    AdvancedCriteria, Collaboration, ComicResult, CreatorCredit, DatabaseStats, SearchMetadata,
    SearchResponse, YearRange, FULL_CONFIDENCE,
};
pub use query::escape_like;
pub use tools::CatalogTools;

use crate::error::{ComicError, Result};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{error, info};

/// Read-only handle on the comic database.
pub struct ComicCatalog {
    conn: Mutex<Connection>,
}

/// A `comics` row before its creators, characters and teams are attached.
#[derive(Debug)]
struct ComicRow {
    id: i64,
    title: String,
    series: String,
    number: Option<String>,
    publisher: String,
    year: i64,
    story_arc: Option<String>,
    file_path: String,
}

impl ComicCatalog {
    /// Open an existing database file read-only.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ComicError::Config(format!(
                "Database file not found: {}",
                path.display()
            )));
        }

        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        info!("Opened comic database {}", path.display());
        Ok(Self::from_connection(conn))
    }

    /// Wrap an already opened connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run a SELECT, logging the statement and parameters on failure.
    fn fetch<T, F>(&self, sql: &str, params: &[Value], map: F) -> Result<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let conn = self.conn();
        let result = conn.prepare(sql).and_then(|mut stmt| {
            let rows = stmt
                .query_map(params_from_iter(params.iter()), map)?
                .collect::<rusqlite::Result<Vec<T>>>();
            rows
        });

        result.map_err(|e| {
            error!("Database query error: {}", e);
            error!("Query: {}", sql);
            error!("Params: {:?}", params);
            ComicError::Database(e)
        })
    }

    fn fetch_comics(&self, sql: &str, params: &[Value]) -> Result<Vec<ComicRow>> {
        self.fetch(sql, params, comic_row)
    }

    fn count(&self, sql: &str) -> Result<i64> {
        Ok(self
            .fetch(sql, &[], |r| r.get::<_, Option<i64>>(0))?
            .into_iter()
            .next()
            .flatten()
            .unwrap_or(0))
    }

    fn creators_of(&self, comic_id: i64) -> Result<Vec<CreatorCredit>> {
        self.fetch(
            "SELECT cr.name, cc.role
             FROM comic_creators cc
             JOIN creators cr ON cc.creator_id = cr.id
             WHERE cc.comic_id = ?
             ORDER BY cc.role, cr.name",
            &[Value::Integer(comic_id)],
            |r| {
                Ok(CreatorCredit {
                    name: r.get::<_, Option<String>>(0)?.unwrap_or_default(),
                    role: r.get(1)?,
                })
            },
        )
    }

    fn names_of(&self, sql: &str, comic_id: i64) -> Result<Vec<String>> {
        self.fetch(sql, &[Value::Integer(comic_id)], |r| {
            Ok(r.get::<_, Option<String>>(0)?.unwrap_or_default())
        })
    }

    fn characters_of(&self, comic_id: i64) -> Result<Vec<String>> {
        self.names_of(
            "SELECT ch.name
             FROM comic_characters cc
             JOIN characters ch ON cc.character_id = ch.id
             WHERE cc.comic_id = ?
             ORDER BY ch.name",
            comic_id,
        )
    }

    fn teams_of(&self, comic_id: i64) -> Result<Vec<String>> {
        self.names_of(
            "SELECT t.name
             FROM comic_teams ct
             JOIN teams t ON ct.team_id = t.id
             WHERE ct.comic_id = ?
             ORDER BY t.name",
            comic_id,
        )
    }

    /// Attach creators, characters and teams to a row.
    fn hydrate(&self, row: ComicRow, match_confidence: f64) -> Result<ComicResult> {
        Ok(ComicResult {
            creators: self.creators_of(row.id)?,
            characters: self.characters_of(row.id)?,
            teams: self.teams_of(row.id)?,
            id: row.id,
            title: row.title,
            series: row.series,
            number: row.number,
            publisher: row.publisher,
            year: row.year,
            story_arc: row.story_arc,
            file_path: row.file_path,
            match_confidence,
        })
    }

    fn hydrate_all(&self, rows: Vec<ComicRow>) -> Result<Vec<ComicResult>> {
        rows.into_iter()
            .map(|row| self.hydrate(row, FULL_CONFIDENCE))
            .collect()
    }
}

fn comic_row(r: &Row<'_>) -> rusqlite::Result<ComicRow> {
    Ok(ComicRow {
        id: r.get(0)?,
        title: r.get::<_, Option<String>>(1)?.unwrap_or_default(),
        series: r.get::<_, Option<String>>(2)?.unwrap_or_default(),
        number: text_of(r.get(3)?),
        publisher: r.get::<_, Option<String>>(4)?.unwrap_or_default(),
        year: year_of(r.get(5)?),
        story_arc: r.get(6)?,
        file_path: r.get::<_, Option<String>>(7)?.unwrap_or_default(),
    })
}

fn year_of(value: Value) -> i64 {
    match value {
        Value::Integer(i) => i,
        Value::Real(f) => f as i64,
        Value::Text(s) => s.trim().parse().unwrap_or(0),
        Value::Null | Value::Blob(_) => 0,
    }
}

/// Issue numbers are stored as text or integers depending on the indexer.
fn text_of(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Integer(i) => Some(i.to_string()),
        Value::Real(f) => Some(f.to_string()),
        Value::Text(s) => Some(s),
        Value::Blob(_) => None,
    }
}
