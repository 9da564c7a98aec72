//! MCP tools for the local comic catalog.

use super::{AdvancedCriteria, ComicCatalog};
use crate::error::Result;
use crate::mcp::tools::{parse_args, to_output, unknown_tool, ToolDefinition, ToolHandler};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

/// Tool handler exposing [`ComicCatalog`] searches.
pub struct CatalogTools {
    catalog: ComicCatalog,
}

#[derive(Debug, Deserialize)]
struct TitleArgs {
    title: String,
    #[serde(default)]
    exact_match: bool,
}

#[derive(Debug, Deserialize)]
struct SeriesArgs {
    series: String,
    #[serde(default)]
    publisher: Option<String>,
    #[serde(default)]
    exact_match: bool,
}

#[derive(Debug, Deserialize)]
struct CharacterArgs {
    character_name: String,
    #[serde(default = "default_true")]
    include_teams: bool,
}

#[derive(Debug, Deserialize)]
struct TeamArgs {
    team_name: String,
}

#[derive(Debug, Deserialize)]
struct CreatorArgs {
    creator_name: String,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    exact_match: bool,
}

#[derive(Debug, Deserialize)]
struct EventArgs {
    event_name: String,
}

#[derive(Debug, Deserialize)]
struct YearArgs {
    #[serde(default)]
    year: Option<i64>,
    #[serde(default)]
    start_year: Option<i64>,
    #[serde(default)]
    end_year: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct CollaborationArgs {
    creator_name: String,
    #[serde(default)]
    collaboration_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AdvancedArgs {
    #[serde(default)]
    criteria: AdvancedCriteria,
    #[serde(default = "default_true")]
    match_all: bool,
}

fn default_true() -> bool {
    true
}

impl CatalogTools {
    pub fn new(catalog: ComicCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &ComicCatalog {
        &self.catalog
    }

    /// Dispatch a tool call synchronously.
    pub fn dispatch(&self, name: &str, arguments: Value) -> Result<Value> {
        match name {
            "search_by_title" => {
                let args: TitleArgs = parse_args(name, arguments)?;
                to_output(&self.catalog.search_by_title(&args.title, args.exact_match)?)
            }
            "search_by_series" => {
                let args: SeriesArgs = parse_args(name, arguments)?;
                to_output(&self.catalog.search_by_series(
                    &args.series,
                    args.publisher.as_deref(),
                    args.exact_match,
                )?)
            }
            "search_by_character" => {
                let args: CharacterArgs = parse_args(name, arguments)?;
                to_output(
                    &self
                        .catalog
                        .search_by_character(&args.character_name, args.include_teams)?,
                )
            }
            "search_by_team" => {
                let args: TeamArgs = parse_args(name, arguments)?;
                to_output(&self.catalog.search_by_team(&args.team_name)?)
            }
            "search_by_creator" => {
                let args: CreatorArgs = parse_args(name, arguments)?;
                to_output(&self.catalog.search_by_creator(
                    &args.creator_name,
                    args.role.as_deref(),
                    args.exact_match,
                )?)
            }
            "search_by_event" => {
                let args: EventArgs = parse_args(name, arguments)?;
                to_output(&self.catalog.search_by_event(&args.event_name)?)
            }
            "search_by_year" => {
                let args: YearArgs = parse_args(name, arguments)?;
                to_output(
                    &self
                        .catalog
                        .search_by_year(args.year, args.start_year, args.end_year)?,
                )
            }
            "find_creator_collaborations" => {
                let args: CollaborationArgs = parse_args(name, arguments)?;
                to_output(&self.catalog.find_creator_collaborations(
                    &args.creator_name,
                    args.collaboration_type.as_deref(),
                )?)
            }
            "advanced_search" => {
                let args: AdvancedArgs = parse_args(name, arguments)?;
                to_output(
                    &self
                        .catalog
                        .advanced_search(&args.criteria, args.match_all)?,
                )
            }
            "get_database_stats" => {
                let stats = self.catalog.database_stats()?;
                Ok(json!({ "stats": stats, "success": true }))
            }
            other => Err(unknown_tool(other)),
        }
    }
}

#[async_trait]
impl ToolHandler for CatalogTools {
    fn server_name(&self) -> &'static str {
        "comic-search"
    }

    fn tools(&self) -> Vec<ToolDefinition> {
        catalog_tool_definitions()
    }

    async fn call(&self, name: &str, arguments: Value) -> Result<Value> {
        self.dispatch(name, arguments)
    }
}

/// Definitions of every catalog tool.
pub fn catalog_tool_definitions() -> Vec<ToolDefinition> {
    let exact = json!({
        "type": "boolean",
        "description": "Require a case-insensitive exact match instead of a substring match",
        "default": false
    });

    vec![
        ToolDefinition::new(
            "search_by_title",
            "Search for comics by title. Falls back to approximate matching when no title contains the query.",
            json!({
                "type": "object",
                "properties": {
                    "title": { "type": "string", "description": "Title or part of a title" },
                    "exact_match": exact
                },
                "required": ["title"]
            }),
        ),
        ToolDefinition::new(
            "search_by_series",
            "Search for comics by series name, optionally filtered by publisher.",
            json!({
                "type": "object",
                "properties": {
                    "series": { "type": "string", "description": "Series name" },
                    "publisher": { "type": "string", "description": "Publisher name (substring)" },
                    "exact_match": exact
                },
                "required": ["series"]
            }),
        ),
        ToolDefinition::new(
            "search_by_character",
            "Find comics featuring a character, optionally including team appearances.",
            json!({
                "type": "object",
                "properties": {
                    "character_name": { "type": "string", "description": "Character name" },
                    "include_teams": {
                        "type": "boolean",
                        "description": "Also match team names",
                        "default": true
                    }
                },
                "required": ["character_name"]
            }),
        ),
        ToolDefinition::new(
            "search_by_team",
            "Find comics featuring a team.",
            json!({
                "type": "object",
                "properties": {
                    "team_name": { "type": "string", "description": "Team name" }
                },
                "required": ["team_name"]
            }),
        ),
        ToolDefinition::new(
            "search_by_creator",
            "Find comics by a creator (writer, artist, etc.) with optional role filtering.",
            json!({
                "type": "object",
                "properties": {
                    "creator_name": { "type": "string", "description": "Creator name" },
                    "role": { "type": "string", "description": "Role such as writer or artist" },
                    "exact_match": exact
                },
                "required": ["creator_name"]
            }),
        ),
        ToolDefinition::new(
            "search_by_event",
            "Find comics related to an event or story arc (matches story arc, title or summary).",
            json!({
                "type": "object",
                "properties": {
                    "event_name": { "type": "string", "description": "Event or story arc" }
                },
                "required": ["event_name"]
            }),
        ),
        ToolDefinition::new(
            "search_by_year",
            "Find comics published in a year or an inclusive year range.",
            json!({
                "type": "object",
                "properties": {
                    "year": { "type": "integer" },
                    "start_year": { "type": "integer" },
                    "end_year": { "type": "integer" }
                },
                "required": []
            }),
        ),
        ToolDefinition::new(
            "find_creator_collaborations",
            "List creators who worked on the same comics as the given creator.",
            json!({
                "type": "object",
                "properties": {
                    "creator_name": { "type": "string", "description": "Creator name" },
                    "collaboration_type": {
                        "type": "string",
                        "description": "Only collaborators credited in this role"
                    }
                },
                "required": ["creator_name"]
            }),
        ),
        ToolDefinition::new(
            "advanced_search",
            "Multi-criteria search. Criteria: title, series, publisher, year, start_year, end_year, creator, character, team. Set match_all=false for OR logic.",
            json!({
                "type": "object",
                "properties": {
                    "criteria": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "series": { "type": "string" },
                            "publisher": { "type": "string" },
                            "year": { "type": "integer" },
                            "start_year": { "type": "integer" },
                            "end_year": { "type": "integer" },
                            "creator": { "type": "string" },
                            "character": { "type": "string" },
                            "team": { "type": "string" }
                        }
                    },
                    "match_all": { "type": "boolean", "default": true }
                },
                "required": ["criteria"]
            }),
        ),
        ToolDefinition::new(
            "get_database_stats",
            "Get counts of comics, series, publishers, creators, characters and teams, and the year range.",
            json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        ),
    ]
}
