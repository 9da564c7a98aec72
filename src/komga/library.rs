//! Komga library operations: searches, listings and reading-list edits.

use super::client::{KomgaClient, QueryParams};
use super::condition::{search_body, ConditionBuilder};
use crate::error::Result;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::info;

/// Metadata categories and the endpoints listing them.
const METADATA_ENDPOINTS: &[(&str, &str)] = &[
    ("genres", "/api/v1/genres"),
    ("tags", "/api/v1/tags"),
    ("publishers", "/api/v1/publishers"),
    ("languages", "/api/v1/languages"),
    ("age_ratings", "/api/v1/age-ratings"),
];

/// Accept either `"x"` or `["x", "y"]` for multi-valued filters.
fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(value)) => vec![value],
        Some(OneOrMany::Many(values)) => values,
    })
}

/// Komga ids are strings, but callers often send them as numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum IdValue {
    Text(String),
    Number(serde_json::Number),
}

impl From<IdValue> for String {
    fn from(id: IdValue) -> Self {
        match id {
            IdValue::Text(text) => text,
            IdValue::Number(number) => number.to_string(),
        }
    }
}

fn single_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    IdValue::deserialize(deserializer).map(String::from)
}

fn id_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let ids = Vec::<IdValue>::deserialize(deserializer)?;
    Ok(ids.into_iter().map(String::from).collect())
}

fn paging(page: Option<u32>, size: Option<u32>) -> QueryParams {
    QueryParams::new()
        .push_opt("page", page)
        .push_opt("size", size)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeriesSearch {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub library_id: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub publisher: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub genre: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub tag: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub read_status: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub series_status: Vec<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(default)]
    pub sort: Option<String>,
}

impl SeriesSearch {
    pub fn condition(&self) -> Option<Value> {
        ConditionBuilder::new()
            .is_each("libraryId", &self.library_id)
            .is_each("publisher", &self.publisher)
            .is_each("genre", &self.genre)
            .is_each("tag", &self.tag)
            .is_each("readStatus", &self.read_status)
            .is_each("seriesStatus", &self.series_status)
            .build()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookSearch {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub library_id: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub series_id: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub read_status: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub media_status: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub tag: Vec<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(default)]
    pub sort: Option<String>,
}

impl BookSearch {
    pub fn condition(&self) -> Option<Value> {
        ConditionBuilder::new()
            .is_each("libraryId", &self.library_id)
            .is_each("seriesId", &self.series_id)
            .is_each("readStatus", &self.read_status)
            .is_each("mediaStatus", &self.media_status)
            .is_each("tag", &self.tag)
            .build()
    }
}

/// Filters shared by the collection, reading-list and on-deck listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub library_id: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub size: Option<u32>,
}

impl ListQuery {
    fn params(&self) -> QueryParams {
        QueryParams::new()
            .push_opt("search", self.search.as_deref())
            .push_opt("library_id", self.library_id.as_deref())
            .push_opt("page", self.page)
            .push_opt("size", self.size)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub library_id: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub size: Option<u32>,
}

/// Kinds of recently added or updated content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LatestKind {
    NewSeries,
    UpdatedSeries,
    Books,
}

impl LatestKind {
    pub const ALL: [LatestKind; 3] = [
        LatestKind::NewSeries,
        LatestKind::UpdatedSeries,
        LatestKind::Books,
    ];

    pub fn key(self) -> &'static str {
        match self {
            LatestKind::NewSeries => "new_series",
            LatestKind::UpdatedSeries => "updated_series",
            LatestKind::Books => "books",
        }
    }

    pub fn endpoint(self) -> &'static str {
        match self {
            LatestKind::NewSeries => "/api/v1/series/new",
            LatestKind::UpdatedSeries => "/api/v1/series/updated",
            LatestKind::Books => "/api/v1/books/latest",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LatestQuery {
    #[serde(default)]
    pub content_types: Option<Vec<LatestKind>>,
    #[serde(default)]
    pub library_id: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub size: Option<u32>,
}

/// Body of `POST /api/v1/readlists`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReadingList {
    pub name: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default = "default_ordered")]
    pub ordered: bool,
    #[serde(alias = "book_ids", deserialize_with = "id_list")]
    pub book_ids: Vec<String>,
}

fn default_ordered() -> bool {
    true
}

/// Reading list as returned by Komga.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingList {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub ordered: bool,
    #[serde(default, deserialize_with = "id_list")]
    pub book_ids: Vec<String>,
}

/// Additions and overrides for an existing reading list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReadingListAddition {
    #[serde(alias = "id", deserialize_with = "single_id")]
    pub reading_list_id: String,
    #[serde(deserialize_with = "id_list")]
    pub book_ids: Vec<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub ordered: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadingListSummary {
    pub status: &'static str,
    pub id: String,
    pub total_books: usize,
}

/// Existing ids in their original order, then new ids; duplicates dropped.
pub fn merge_book_ids(existing: Vec<String>, added: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    existing
        .into_iter()
        .chain(added.iter().cloned())
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

impl ReadingList {
    /// Apply an addition, producing the full update body.
    pub fn merged(self, addition: &ReadingListAddition) -> NewReadingList {
        NewReadingList {
            name: addition.name.clone().unwrap_or(self.name),
            summary: addition.summary.clone().unwrap_or(self.summary),
            ordered: addition.ordered.unwrap_or(self.ordered),
            book_ids: merge_book_ids(self.book_ids, &addition.book_ids),
        }
    }
}

impl KomgaClient {
    pub async fn search_series(&self, query: &SeriesSearch) -> Result<Value> {
        let params =
            paging(query.page, query.size).push_opt("sort", query.sort.as_deref());
        let body = search_body(query.condition(), query.search.as_deref());
        self.post("/api/v1/series/list", &params, &body).await
    }

    pub async fn search_books(&self, query: &BookSearch) -> Result<Value> {
        let params =
            paging(query.page, query.size).push_opt("sort", query.sort.as_deref());
        let body = search_body(query.condition(), query.search.as_deref());
        self.post("/api/v1/books/list", &params, &body).await
    }

    pub async fn get_libraries(&self) -> Result<Value> {
        self.get("/api/v1/libraries", &QueryParams::new()).await
    }

    pub async fn get_collections(&self, query: &ListQuery) -> Result<Value> {
        self.get("/api/v1/collections", &query.params()).await
    }

    pub async fn get_reading_lists(&self, query: &ListQuery) -> Result<Value> {
        self.get("/api/v1/readlists", &query.params()).await
    }

    pub async fn search_authors(&self, query: &AuthorQuery) -> Result<Value> {
        let params = QueryParams::new()
            .push_opt("search", query.search.as_deref())
            .push_opt("role", query.role.as_deref())
            .push_opt("library_id", query.library_id.as_deref())
            .push_opt("page", query.page)
            .push_opt("size", query.size);
        self.get("/api/v2/authors", &params).await
    }

    /// Every metadata category in one object.
    pub async fn get_metadata_options(&self, library_id: Option<&str>) -> Result<Value> {
        let params = QueryParams::new().push_opt("library_id", library_id);
        let mut merged = Map::new();
        for (key, endpoint) in METADATA_ENDPOINTS {
            let values = self.get(endpoint, &params).await?;
            merged.insert(key.to_string(), values);
        }
        Ok(Value::Object(merged))
    }

    pub async fn get_on_deck_books(&self, query: &ListQuery) -> Result<Value> {
        let params = QueryParams::new()
            .push_opt("library_id", query.library_id.as_deref())
            .push_opt("page", query.page)
            .push_opt("size", query.size);
        self.get("/api/v1/books/ondeck", &params).await
    }

    /// Recent content keyed by kind. Defaults to every kind.
    pub async fn get_latest_additions(&self, query: &LatestQuery) -> Result<Value> {
        let kinds = match &query.content_types {
            Some(kinds) if !kinds.is_empty() => kinds.clone(),
            _ => LatestKind::ALL.to_vec(),
        };
        let params = QueryParams::new()
            .push_opt("library_id", query.library_id.as_deref())
            .push_opt("page", query.page)
            .push_opt("size", query.size);

        let mut merged = Map::new();
        for kind in kinds {
            if merged.contains_key(kind.key()) {
                continue;
            }
            let values = self.get(kind.endpoint(), &params).await?;
            merged.insert(kind.key().to_string(), values);
        }
        Ok(Value::Object(merged))
    }

    pub async fn create_reading_list(&self, list: &NewReadingList) -> Result<Value> {
        info!(
            "Creating reading list '{}' with {} books",
            list.name,
            list.book_ids.len()
        );
        self.post("/api/v1/readlists", &QueryParams::new(), list).await
    }

    /// Fetch, merge and write back a reading list. Not atomic: a concurrent
    /// edit between the read and the write is overwritten.
    pub async fn add_to_reading_list(
        &self,
        addition: &ReadingListAddition,
    ) -> Result<ReadingListSummary> {
        let path = format!("/api/v1/readlists/{}", addition.reading_list_id);
        let current = self.get(&path, &QueryParams::new()).await?;
        let current: ReadingList = serde_json::from_value(current)?;
        let update = current.merged(addition);
        let total_books = update.book_ids.len();

        self.patch(&path, &update).await?;
        info!(
            "Reading list {} now holds {} books",
            addition.reading_list_id, total_books
        );

        Ok(ReadingListSummary {
            status: "success",
            id: addition.reading_list_id.clone(),
            total_books,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_merge_book_ids() {
        assert_eq!(
            merge_book_ids(ids(&["2", "3"]), &ids(&["1", "2"])),
            ids(&["2", "3", "1"])
        );
        assert_eq!(merge_book_ids(ids(&["a", "a"]), &[]), ids(&["a"]));
    }

    #[test]
    fn test_numeric_ids_become_strings() {
        let addition: ReadingListAddition = serde_json::from_value(json!({
            "reading_list_id": 7,
            "book_ids": [1, "2"]
        }))
        .unwrap();
        assert_eq!(addition.reading_list_id, "7");
        assert_eq!(addition.book_ids, ids(&["1", "2"]));

        let list: NewReadingList =
            serde_json::from_value(json!({"name": "Arc", "book_ids": [10, 11]})).unwrap();
        assert_eq!(list.book_ids, ids(&["10", "11"]));
    }

    #[test]
    fn test_one_or_many_filters() {
        let query: SeriesSearch =
            serde_json::from_value(json!({"genre": "Horror", "tag": ["a", "b"]})).unwrap();
        assert_eq!(query.genre, ids(&["Horror"]));
        assert_eq!(query.tag, ids(&["a", "b"]));
        assert!(query.publisher.is_empty());
    }

    #[test]
    fn test_book_condition_field_names() {
        let query = BookSearch {
            series_id: ids(&["s1"]),
            media_status: ids(&["READY"]),
            ..BookSearch::default()
        };
        assert_eq!(
            query.condition().unwrap(),
            json!({"allOf": [
                {"seriesId": {"operator": "is", "value": "s1"}},
                {"mediaStatus": {"operator": "is", "value": "READY"}}
            ]})
        );
    }

    #[test]
    fn test_merged_overlays_fields() {
        let list = ReadingList {
            id: "rl".to_string(),
            name: "Old".to_string(),
            summary: "keep".to_string(),
            ordered: true,
            book_ids: ids(&["1"]),
        };
        let addition = ReadingListAddition {
            reading_list_id: "rl".to_string(),
            book_ids: ids(&["2"]),
            name: Some("New".to_string()),
            ordered: Some(false),
            ..ReadingListAddition::default()
        };
        let update = list.merged(&addition);
        assert_eq!(update.name, "New");
        assert_eq!(update.summary, "keep");
        assert!(!update.ordered);
        assert_eq!(update.book_ids, ids(&["1", "2"]));
    }

    #[test]
    fn test_new_reading_list_wire_shape() {
        let list: NewReadingList =
            serde_json::from_value(json!({"name": "Arc", "book_ids": ["b1"]})).unwrap();
        assert_eq!(
            serde_json::to_value(&list).unwrap(),
            json!({"name": "Arc", "summary": "", "ordered": true, "bookIds": ["b1"]})
        );
    }

    #[test]
    fn test_latest_kind_names() {
        let kinds: Vec<LatestKind> =
            serde_json::from_value(json!(["new_series", "books"])).unwrap();
        assert_eq!(kinds, vec![LatestKind::NewSeries, LatestKind::Books]);
        assert_eq!(LatestKind::UpdatedSeries.endpoint(), "/api/v1/series/updated");
    }
}
