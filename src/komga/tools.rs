//! MCP tools for a Komga server.

use super::client::KomgaClient;
use super::library::{
    AuthorQuery, BookSearch, LatestQuery, ListQuery, NewReadingList, ReadingListAddition,
    SeriesSearch,
};
use crate::config::KomgaConfig;
use crate::error::Result;
use crate::mcp::tools::{parse_args, to_output, unknown_tool, ToolDefinition, ToolHandler};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Tool handler owning the current Komga connection.
pub struct KomgaTools {
    client: RwLock<Arc<KomgaClient>>,
}

#[derive(Debug, Deserialize)]
struct ConfigureArgs {
    base_url: String,
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LibraryArgs {
    #[serde(default)]
    library_id: Option<String>,
}

impl KomgaTools {
    pub fn new(client: KomgaClient) -> Self {
        Self {
            client: RwLock::new(Arc::new(client)),
        }
    }

    pub fn from_config(config: KomgaConfig) -> Result<Self> {
        Ok(Self::new(KomgaClient::new(config)?))
    }

    /// Snapshot of the current client. Calls in flight keep the one they started with.
    pub async fn client(&self) -> Arc<KomgaClient> {
        self.client.read().await.clone()
    }

    async fn configure(&self, args: ConfigureArgs) -> Result<Value> {
        let timeout_secs = match args.timeout_secs {
            Some(secs) => secs,
            None => self.client().await.config().timeout_secs,
        };
        let config = KomgaConfig {
            base_url: args.base_url,
            api_key: args.api_key,
            username: args.username,
            password: args.password,
            timeout_secs,
        };
        let client = KomgaClient::new(config)?;
        let base_url = client.config().base_url.clone();
        let auth = client.config().auth_mode();

        *self.client.write().await = Arc::new(client);
        info!("Komga connection set to {} (auth: {})", base_url, auth);

        Ok(json!({
            "status": "success",
            "base_url": base_url,
            "auth": auth
        }))
    }

    pub async fn dispatch(&self, name: &str, arguments: Value) -> Result<Value> {
        if name == "configure_komga" {
            return self.configure(parse_args(name, arguments)?).await;
        }

        let client = self.client().await;
        match name {
            "search_series" => {
                let query: SeriesSearch = parse_args(name, arguments)?;
                client.search_series(&query).await
            }
            "search_books" => {
                let query: BookSearch = parse_args(name, arguments)?;
                client.search_books(&query).await
            }
            "get_libraries" => client.get_libraries().await,
            "get_collections" => {
                let query: ListQuery = parse_args(name, arguments)?;
                client.get_collections(&query).await
            }
            "get_reading_lists" => {
                let query: ListQuery = parse_args(name, arguments)?;
                client.get_reading_lists(&query).await
            }
            "search_authors" => {
                let query: AuthorQuery = parse_args(name, arguments)?;
                client.search_authors(&query).await
            }
            "get_metadata_options" => {
                let args: LibraryArgs = parse_args(name, arguments)?;
                client.get_metadata_options(args.library_id.as_deref()).await
            }
            "get_on_deck_books" => {
                let query: ListQuery = parse_args(name, arguments)?;
                client.get_on_deck_books(&query).await
            }
            "get_latest_additions" => {
                let query: LatestQuery = parse_args(name, arguments)?;
                client.get_latest_additions(&query).await
            }
            "create_reading_list" => {
                let list: NewReadingList = parse_args(name, arguments)?;
                client.create_reading_list(&list).await
            }
            "add_to_reading_list" => {
                let addition: ReadingListAddition = parse_args(name, arguments)?;
                to_output(&client.add_to_reading_list(&addition).await?)
            }
            other => Err(unknown_tool(other)),
        }
    }
}

#[async_trait]
impl ToolHandler for KomgaTools {
    fn server_name(&self) -> &'static str {
        "komga"
    }

    fn tools(&self) -> Vec<ToolDefinition> {
        komga_tool_definitions()
    }

    async fn call(&self, name: &str, arguments: Value) -> Result<Value> {
        self.dispatch(name, arguments).await
    }
}

fn string_list(description: &str) -> Value {
    json!({
        "type": "array",
        "items": { "type": "string" },
        "description": description
    })
}

/// Definitions of every Komga tool.
pub fn komga_tool_definitions() -> Vec<ToolDefinition> {
    let page = json!({ "type": "integer", "description": "Zero-based page index" });
    let size = json!({ "type": "integer", "description": "Page size" });
    let sort = json!({ "type": "string", "description": "Sort, e.g. metadata.titleSort,asc" });
    let library_id = json!({ "type": "string", "description": "Restrict to one library" });
    let search = json!({ "type": "string", "description": "Search text" });

    vec![
        ToolDefinition::new(
            "search_series",
            "Search series with full-text search and metadata filters. Multiple filter values are combined with AND.",
            json!({
                "type": "object",
                "properties": {
                    "search": search,
                    "library_id": string_list("Library ids"),
                    "publisher": string_list("Publishers"),
                    "genre": string_list("Genres"),
                    "tag": string_list("Tags"),
                    "read_status": string_list("READ, UNREAD or IN_PROGRESS"),
                    "series_status": string_list("ENDED, ONGOING, ABANDONED or HIATUS"),
                    "page": page,
                    "size": size,
                    "sort": sort
                },
                "required": []
            }),
        ),
        ToolDefinition::new(
            "search_books",
            "Search books with full-text search and filters. Multiple filter values are combined with AND.",
            json!({
                "type": "object",
                "properties": {
                    "search": search,
                    "library_id": string_list("Library ids"),
                    "series_id": string_list("Series ids"),
                    "read_status": string_list("READ, UNREAD or IN_PROGRESS"),
                    "media_status": string_list("READY, UNKNOWN, ERROR, UNSUPPORTED or OUTDATED"),
                    "tag": string_list("Tags"),
                    "page": page,
                    "size": size,
                    "sort": sort
                },
                "required": []
            }),
        ),
        ToolDefinition::new(
            "get_libraries",
            "List all libraries.",
            json!({ "type": "object", "properties": {}, "required": [] }),
        ),
        ToolDefinition::new(
            "get_collections",
            "List collections.",
            json!({
                "type": "object",
                "properties": {
                    "search": search,
                    "library_id": library_id,
                    "page": page,
                    "size": size
                },
                "required": []
            }),
        ),
        ToolDefinition::new(
            "get_reading_lists",
            "List reading lists.",
            json!({
                "type": "object",
                "properties": {
                    "search": search,
                    "library_id": library_id,
                    "page": page,
                    "size": size
                },
                "required": []
            }),
        ),
        ToolDefinition::new(
            "search_authors",
            "Search authors, optionally by role.",
            json!({
                "type": "object",
                "properties": {
                    "search": search,
                    "role": { "type": "string", "description": "Role such as writer or penciller" },
                    "library_id": library_id,
                    "page": page,
                    "size": size
                },
                "required": []
            }),
        ),
        ToolDefinition::new(
            "get_metadata_options",
            "List available genres, tags, publishers, languages and age ratings.",
            json!({
                "type": "object",
                "properties": { "library_id": library_id },
                "required": []
            }),
        ),
        ToolDefinition::new(
            "get_on_deck_books",
            "Books to continue reading.",
            json!({
                "type": "object",
                "properties": {
                    "library_id": library_id,
                    "page": page,
                    "size": size
                },
                "required": []
            }),
        ),
        ToolDefinition::new(
            "get_latest_additions",
            "Recently added series, updated series and books.",
            json!({
                "type": "object",
                "properties": {
                    "content_types": {
                        "type": "array",
                        "items": {
                            "type": "string",
                            "enum": ["new_series", "updated_series", "books"]
                        },
                        "description": "Defaults to all three"
                    },
                    "library_id": library_id,
                    "page": page,
                    "size": size
                },
                "required": []
            }),
        ),
        ToolDefinition::new(
            "create_reading_list",
            "Create a reading list from book ids.",
            json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "book_ids": string_list("Book ids in reading order"),
                    "summary": { "type": "string" },
                    "ordered": { "type": "boolean", "default": true }
                },
                "required": ["name", "book_ids"]
            }),
        ),
        ToolDefinition::new(
            "add_to_reading_list",
            "Add books to an existing reading list, optionally renaming it or changing its summary.",
            json!({
                "type": "object",
                "properties": {
                    "reading_list_id": { "type": "string" },
                    "book_ids": string_list("Book ids to append"),
                    "name": { "type": "string" },
                    "summary": { "type": "string" },
                    "ordered": { "type": "boolean" }
                },
                "required": ["reading_list_id", "book_ids"]
            }),
        ),
        ToolDefinition::new(
            "configure_komga",
            "Point the server at a Komga instance. Provide an API key or a username and password.",
            json!({
                "type": "object",
                "properties": {
                    "base_url": { "type": "string" },
                    "api_key": { "type": "string" },
                    "username": { "type": "string" },
                    "password": { "type": "string" },
                    "timeout_secs": { "type": "integer" }
                },
                "required": ["base_url"]
            }),
        ),
    ]
}
