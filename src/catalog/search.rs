//! Search operations over the comic catalog.

use super::fuzzy::{self, FUZZY_THRESHOLD};
use super::models::{
    AdvancedCriteria, Collaboration, ComicResult, DatabaseStats, SearchResponse, YearRange,
};
use super::query::{contains_pattern, like_clause, Connector, Predicate, COMIC_COLUMNS};
use super::ComicCatalog;
use crate::error::{ComicError, Result};
use rusqlite::types::Value;
use serde_json::json;
use std::collections::HashMap;
use std::time::Instant;
use tracing::debug;

const DEFAULT_ORDER: &str = "ORDER BY c.year, c.title, c.id";

impl ComicCatalog {
    /// Search by title. Substring searches that find nothing fall back to
    /// approximate matching against every title.
    pub fn search_by_title(&self, title: &str, exact: bool) -> Result<SearchResponse> {
        let started = Instant::now();

        let mut predicate = Predicate::new();
        predicate.text_match("c.title", title, exact);
        let sql = format!(
            "SELECT {COMIC_COLUMNS} FROM comics c WHERE {} {DEFAULT_ORDER}",
            predicate.render(Connector::And)
        );
        let rows = self.fetch_comics(&sql, predicate.params())?;

        let mut fuzzy_used = false;
        let results = if rows.is_empty() && !exact {
            let approximate = self.approximate_titles(title)?;
            fuzzy_used = !approximate.is_empty();
            approximate
        } else {
            self.hydrate_all(rows)?
        };

        Ok(SearchResponse::new(
            results,
            started,
            json!({ "title": title, "exact_match": exact }),
        )
        .with_fuzzy(fuzzy_used))
    }

    fn approximate_titles(&self, title: &str) -> Result<Vec<ComicResult>> {
        let titles = self.fetch(
            "SELECT id, title FROM comics WHERE title IS NOT NULL",
            &[],
            |r| Ok((r.get::<_, i64>(0)?, r.get::<_, String>(1)?)),
        )?;

        let scores: HashMap<i64, f64> = fuzzy::matches(
            title,
            titles.iter().map(|(id, t)| (*id, t.as_str())),
            FUZZY_THRESHOLD,
        )
        .into_iter()
        .collect();

        debug!(
            "Approximate title match for {:?}: {} of {} titles",
            title,
            scores.len(),
            titles.len()
        );

        if scores.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Value> = scores.keys().map(|id| Value::Integer(*id)).collect();
        let placeholders = vec!["?"; ids.len()].join(",");
        let sql = format!(
            "SELECT {COMIC_COLUMNS} FROM comics c WHERE c.id IN ({placeholders}) {DEFAULT_ORDER}"
        );

        self.fetch_comics(&sql, &ids)?
            .into_iter()
            .map(|row| {
                let score = scores.get(&row.id).copied().unwrap_or(FUZZY_THRESHOLD);
                self.hydrate(row, score)
            })
            .collect()
    }

    /// Search by series name, optionally narrowed by publisher.
    pub fn search_by_series(
        &self,
        series: &str,
        publisher: Option<&str>,
        exact: bool,
    ) -> Result<SearchResponse> {
        let started = Instant::now();

        let mut predicate = Predicate::new();
        predicate.text_match("c.series", series, exact);
        if let Some(publisher) = publisher {
            predicate.contains("c.publisher", publisher);
        }

        let sql = format!(
            "SELECT {COMIC_COLUMNS} FROM comics c WHERE {} ORDER BY c.series, c.number, c.year, c.id",
            predicate.render(Connector::And)
        );
        let results = self.hydrate_all(self.fetch_comics(&sql, predicate.params())?)?;

        Ok(SearchResponse::new(
            results,
            started,
            json!({ "series": series, "publisher": publisher, "exact_match": exact }),
        ))
    }

    /// Comics featuring a character, plus comics of teams matching the same
    /// term when `include_teams` is set.
    pub fn search_by_character(&self, name: &str, include_teams: bool) -> Result<SearchResponse> {
        let started = Instant::now();

        let mut predicate = Predicate::new();
        predicate.contains("ch.name", name);
        let mut sql = format!(
            "SELECT DISTINCT {COMIC_COLUMNS}
             FROM comics c
             JOIN comic_characters cc ON c.id = cc.comic_id
             JOIN characters ch ON cc.character_id = ch.id
             WHERE {}",
            predicate.render(Connector::And)
        );
        let mut params = predicate.params().to_vec();

        if include_teams {
            let mut teams = Predicate::new();
            teams.contains("t.name", name);
            sql.push_str(&format!(
                "
             UNION
             SELECT DISTINCT {COMIC_COLUMNS}
             FROM comics c
             JOIN comic_teams ct ON c.id = ct.comic_id
             JOIN teams t ON ct.team_id = t.id
             WHERE {}",
                teams.render(Connector::And)
            ));
            params.extend_from_slice(teams.params());
        }
        sql.push_str(" ORDER BY year, title, id");

        let results = self.hydrate_all(self.fetch_comics(&sql, &params)?)?;

        Ok(SearchResponse::new(
            results,
            started,
            json!({ "character_name": name, "include_teams": include_teams }),
        ))
    }

    /// Comics featuring a team.
    pub fn search_by_team(&self, name: &str) -> Result<SearchResponse> {
        let started = Instant::now();

        let mut predicate = Predicate::new();
        predicate.contains("t.name", name);
        let sql = format!(
            "SELECT DISTINCT {COMIC_COLUMNS}
             FROM comics c
             JOIN comic_teams ct ON c.id = ct.comic_id
             JOIN teams t ON ct.team_id = t.id
             WHERE {} {DEFAULT_ORDER}",
            predicate.render(Connector::And)
        );
        let results = self.hydrate_all(self.fetch_comics(&sql, predicate.params())?)?;

        Ok(SearchResponse::new(
            results,
            started,
            json!({ "team_name": name }),
        ))
    }

    /// Comics by a creator, optionally only in a given role.
    pub fn search_by_creator(
        &self,
        name: &str,
        role: Option<&str>,
        exact: bool,
    ) -> Result<SearchResponse> {
        let started = Instant::now();

        let mut predicate = Predicate::new();
        predicate.text_match("cr.name", name, exact);
        if let Some(role) = role {
            predicate.equals("cc.role", role);
        }

        let sql = format!(
            "SELECT DISTINCT {COMIC_COLUMNS}
             FROM comics c
             JOIN comic_creators cc ON c.id = cc.comic_id
             JOIN creators cr ON cc.creator_id = cr.id
             WHERE {} {DEFAULT_ORDER}",
            predicate.render(Connector::And)
        );
        let results = self.hydrate_all(self.fetch_comics(&sql, predicate.params())?)?;

        Ok(SearchResponse::new(
            results,
            started,
            json!({ "creator_name": name, "role": role, "exact_match": exact }),
        ))
    }

    /// Comics whose story arc, title or summary mention the event.
    pub fn search_by_event(&self, name: &str) -> Result<SearchResponse> {
        let started = Instant::now();

        let mut predicate = Predicate::new();
        predicate
            .contains("c.story_arc", name)
            .contains("c.title", name)
            .contains("c.summary", name);
        let sql = format!(
            "SELECT {COMIC_COLUMNS} FROM comics c WHERE {} {DEFAULT_ORDER}",
            predicate.render(Connector::Or)
        );
        let results = self.hydrate_all(self.fetch_comics(&sql, predicate.params())?)?;

        Ok(SearchResponse::new(
            results,
            started,
            json!({ "event_name": name }),
        ))
    }

    /// Comics from one year, or within inclusive bounds.
    pub fn search_by_year(
        &self,
        year: Option<i64>,
        start_year: Option<i64>,
        end_year: Option<i64>,
    ) -> Result<SearchResponse> {
        let started = Instant::now();

        let mut predicate = Predicate::new();
        if !predicate.years("c.year", year, start_year, end_year) {
            return Err(ComicError::Validation(
                "Must specify either year or start_year/end_year".to_string(),
            ));
        }

        let sql = format!(
            "SELECT {COMIC_COLUMNS} FROM comics c WHERE {} {DEFAULT_ORDER}",
            predicate.render(Connector::And)
        );
        let results = self.hydrate_all(self.fetch_comics(&sql, predicate.params())?)?;

        Ok(SearchResponse::new(
            results,
            started,
            json!({ "year": year, "start_year": start_year, "end_year": end_year }),
        ))
    }

    /// Creators who worked on the same comics as any creator matching `name`.
    pub fn find_creator_collaborations(
        &self,
        name: &str,
        collaboration_type: Option<&str>,
    ) -> Result<SearchResponse<Collaboration>> {
        let started = Instant::now();

        let mut predicate = Predicate::new();
        predicate
            .contains("c1.name", name)
            .push("c1.id != c2.id", []);
        if let Some(role) = collaboration_type {
            predicate.equals("cc2.role", role);
        }

        let sql = format!(
            "SELECT c2.name AS collaborator_name, cc2.role AS role,
                    COUNT(DISTINCT cc1.comic_id) AS collaboration_count
             FROM comic_creators cc1
             JOIN comic_creators cc2 ON cc1.comic_id = cc2.comic_id
             JOIN creators c1 ON cc1.creator_id = c1.id
             JOIN creators c2 ON cc2.creator_id = c2.id
             WHERE {}
             GROUP BY c2.name, cc2.role
             ORDER BY collaboration_count DESC, c2.name, cc2.role",
            predicate.render(Connector::And)
        );

        let results = self.fetch(&sql, predicate.params(), |r| {
            Ok(Collaboration {
                collaborator_name: r.get::<_, Option<String>>(0)?.unwrap_or_default(),
                role: r.get(1)?,
                collaboration_count: r.get(2)?,
            })
        })?;

        Ok(SearchResponse::new(
            results,
            started,
            json!({ "creator_name": name, "collaboration_type": collaboration_type }),
        ))
    }

    /// Multi-field search. Conditions are ANDed when `match_all`, ORed otherwise.
    pub fn advanced_search(
        &self,
        criteria: &AdvancedCriteria,
        match_all: bool,
    ) -> Result<SearchResponse> {
        let started = Instant::now();

        let mut predicate = Predicate::new();
        for (column, term) in [
            ("c.title", &criteria.title),
            ("c.series", &criteria.series),
            ("c.publisher", &criteria.publisher),
        ] {
            if let Some(term) = term {
                predicate.contains(column, term);
            }
        }
        predicate.years(
            "c.year",
            criteria.year,
            criteria.start_year,
            criteria.end_year,
        );

        if let Some(creator) = &criteria.creator {
            predicate.push(
                related_exists(
                    "comic_creators acc JOIN creators acr ON acc.creator_id = acr.id",
                    "acc",
                    "acr.name",
                ),
                [Value::Text(contains_pattern(creator))],
            );
        }
        if let Some(character) = &criteria.character {
            predicate.push(
                related_exists(
                    "comic_characters ach JOIN characters ahr ON ach.character_id = ahr.id",
                    "ach",
                    "ahr.name",
                ),
                [Value::Text(contains_pattern(character))],
            );
        }
        if let Some(team) = &criteria.team {
            predicate.push(
                related_exists(
                    "comic_teams atm JOIN teams atn ON atm.team_id = atn.id",
                    "atm",
                    "atn.name",
                ),
                [Value::Text(contains_pattern(team))],
            );
        }

        let connector = if match_all {
            Connector::And
        } else {
            Connector::Or
        };
        let sql = format!(
            "SELECT DISTINCT {COMIC_COLUMNS} FROM comics c WHERE {} {DEFAULT_ORDER}",
            predicate.render(connector)
        );
        let results = self.hydrate_all(self.fetch_comics(&sql, predicate.params())?)?;

        let terms = serde_json::to_value(criteria)?;
        Ok(SearchResponse::new(results, started, terms).with_match_all(match_all))
    }

    /// Row counts and the publication year range.
    pub fn database_stats(&self) -> Result<DatabaseStats> {
        let year_range = self
            .fetch(
                "SELECT MIN(year), MAX(year) FROM comics WHERE year IS NOT NULL",
                &[],
                |r| {
                    Ok(YearRange {
                        min_year: r.get(0)?,
                        max_year: r.get(1)?,
                    })
                },
            )?
            .into_iter()
            .next()
            .unwrap_or_default();

        Ok(DatabaseStats {
            total_comics: self.count("SELECT COUNT(*) FROM comics")?,
            total_series: self
                .count("SELECT COUNT(DISTINCT series) FROM comics WHERE series IS NOT NULL")?,
            total_publishers: self.count(
                "SELECT COUNT(DISTINCT publisher) FROM comics WHERE publisher IS NOT NULL",
            )?,
            total_creators: self.count("SELECT COUNT(*) FROM creators")?,
            total_characters: self.count("SELECT COUNT(*) FROM characters")?,
            total_teams: self.count("SELECT COUNT(*) FROM teams")?,
            year_range,
        })
    }
}

/// Correlated EXISTS over a join table, matching `name_column` by substring.
fn related_exists(join: &str, link_alias: &str, name_column: &str) -> String {
    format!(
        "EXISTS (SELECT 1 FROM {join} WHERE {link_alias}.comic_id = c.id AND {})",
        like_clause(name_column)
    )
}
