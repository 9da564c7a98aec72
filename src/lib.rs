//! # comic-mcp
//!
//! MCP (Model Context Protocol) servers for comic collections.
//!
//! ## Features
//!
//! - Local catalog search over a SQLite comic database, with approximate title matching
//! - Creator collaboration and multi-criteria queries
//! - Remote adapter for a Komga server: search, listings and reading-list edits
//! - Line-delimited JSON-RPC over stdio for AI assistant integration
//!
//! ## Usage
//!
//! ```bash
//! # Serve the local catalog
//! comic-mcp search ./comics.db
//!
//! # Serve a Komga library
//! KOMGA_API_KEY=... comic-mcp komga
//!
//! # Print catalog statistics
//! comic-mcp stats ./comics.db
//!
//! # Check Komga connectivity
//! comic-mcp validate
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod komga;
pub mod mcp;

pub use catalog::{CatalogTools, ComicCatalog};
pub use config::Config;
pub use error::{ComicError, Result};
pub use komga::{KomgaClient, KomgaTools};
