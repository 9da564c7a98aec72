//! Result and criteria types for the local catalog.

use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Confidence reported for exact and substring matches.
pub const FULL_CONFIDENCE: f64 = 100.0;

/// A creator credited on a comic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatorCredit {
    pub name: String,
    pub role: Option<String>,
}

/// One comic in a search result, with its creators, characters and teams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComicResult {
    pub id: i64,
    pub title: String,
    pub series: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    pub publisher: String,
    pub year: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_arc: Option<String>,
    pub creators: Vec<CreatorCredit>,
    pub characters: Vec<String>,
    pub teams: Vec<String>,
    pub file_path: String,
    /// 100 for exact/substring hits, the similarity score for approximate hits.
    pub match_confidence: f64,
}

/// A creator who shares comics with the queried creator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collaboration {
    pub collaborator_name: String,
    pub role: Option<String>,
    pub collaboration_count: i64,
}

/// Envelope returned by every search operation.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse<T = ComicResult> {
    pub results: Vec<T>,
    pub metadata: SearchMetadata,
}

/// Timing and echo information attached to search results.
#[derive(Debug, Clone, Serialize)]
pub struct SearchMetadata {
    /// Elapsed seconds.
    pub query_time: f64,
    pub result_count: usize,
    pub search_terms: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_all: Option<bool>,
    pub fuzzy_matches_used: bool,
}

impl<T> SearchResponse<T> {
    /// Wrap results, stamping elapsed time since `started`.
    pub fn new(results: Vec<T>, started: Instant, search_terms: serde_json::Value) -> Self {
        let metadata = SearchMetadata {
            query_time: started.elapsed().as_secs_f64(),
            result_count: results.len(),
            search_terms,
            match_all: None,
            fuzzy_matches_used: false,
        };
        Self { results, metadata }
    }

    pub fn with_fuzzy(mut self, used: bool) -> Self {
        self.metadata.fuzzy_matches_used = used;
        self
    }

    pub fn with_match_all(mut self, match_all: bool) -> Self {
        self.metadata.match_all = Some(match_all);
        self
    }
}

/// Filters accepted by `advanced_search`. Unknown keys are ignored on deserialize.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdvancedCriteria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_year: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_year: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
}

/// Earliest and latest publication year.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct YearRange {
    pub min_year: Option<i64>,
    pub max_year: Option<i64>,
}

/// Row counts across the catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DatabaseStats {
    pub total_comics: i64,
    pub total_series: i64,
    pub total_publishers: i64,
    pub total_creators: i64,
    pub total_characters: i64,
    pub total_teams: i64,
    pub year_range: YearRange,
}
