//! comic-mcp - MCP servers for a local comic catalog and a Komga library.

use clap::{Parser, Subcommand};
use comic_mcp::catalog::{CatalogTools, ComicCatalog};
use comic_mcp::config::{Config, DEFAULT_DATABASE_FILE};
use comic_mcp::komga::{KomgaClient, KomgaTools};
use comic_mcp::mcp::McpServer;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "comic-mcp")]
#[command(about = "MCP servers for searching comic collections")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the local catalog MCP server over stdio
    Search {
        /// SQLite comic database
        #[arg(env = "COMIC_DB_PATH")]
        db_path: Option<PathBuf>,
    },

    /// Run the Komga MCP server over stdio
    Komga,

    /// Print local catalog statistics
    Stats {
        /// SQLite comic database
        #[arg(env = "COMIC_DB_PATH")]
        db_path: Option<PathBuf>,
    },

    /// Check Komga connectivity and credentials
    Validate,
}

fn get_config_path(cli_path: Option<PathBuf>) -> PathBuf {
    if let Some(path) = cli_path {
        return path;
    }

    let candidates = [
        dirs::config_dir().map(|p| p.join("comic-mcp/config.toml")),
        Some(PathBuf::from("/etc/comic-mcp/config.toml")),
        Some(PathBuf::from("config.toml")),
    ];

    for candidate in candidates.into_iter().flatten() {
        if candidate.exists() {
            return candidate;
        }
    }

    Config::default_path().unwrap_or_else(|_| PathBuf::from("config.toml"))
}

/// CLI argument (or `COMIC_DB_PATH`), then the config file, then `comics.db`.
fn database_path(cli_path: Option<PathBuf>, config: &Config) -> PathBuf {
    cli_path
        .or_else(|| config.database.path.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_FILE))
}

fn open_catalog(cli_path: Option<PathBuf>, config: &Config) -> ComicCatalog {
    let path = database_path(cli_path, config);
    match ComicCatalog::open(&path) {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the protocol
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    let config_path = get_config_path(cli.config);
    let config = Config::load_from(&config_path)?;

    match cli.command {
        Commands::Search { db_path } => cmd_search(open_catalog(db_path, &config)).await?,
        Commands::Komga => cmd_komga(config).await?,
        Commands::Stats { db_path } => cmd_stats(open_catalog(db_path, &config))?,
        Commands::Validate => cmd_validate(config).await?,
    }

    Ok(())
}

async fn cmd_search(catalog: ComicCatalog) -> anyhow::Result<()> {
    let server = McpServer::new(CatalogTools::new(catalog));
    server.run().await?;
    Ok(())
}

async fn cmd_komga(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        "Komga server at {} (auth: {})",
        config.komga.base_url,
        config.komga.auth_mode()
    );
    let server = McpServer::new(KomgaTools::from_config(config.komga)?);
    server.run().await?;
    Ok(())
}

fn cmd_stats(catalog: ComicCatalog) -> anyhow::Result<()> {
    let stats = catalog.database_stats()?;

    println!("Comic Database Statistics");
    println!("=========================\n");
    println!("  Comics:     {}", stats.total_comics);
    println!("  Series:     {}", stats.total_series);
    println!("  Publishers: {}", stats.total_publishers);
    println!("  Creators:   {}", stats.total_creators);
    println!("  Characters: {}", stats.total_characters);
    println!("  Teams:      {}", stats.total_teams);

    match (stats.year_range.min_year, stats.year_range.max_year) {
        (Some(min), Some(max)) => println!("  Years:      {} - {}", min, max),
        _ => println!("  Years:      (none)"),
    }

    Ok(())
}

async fn cmd_validate(config: Config) -> anyhow::Result<()> {
    println!("Validating Komga connection...\n");
    println!("  Server: {}", config.komga.base_url);
    println!("  Auth:   {}", config.komga.auth_mode());

    let client = KomgaClient::new(config.komga)?;

    match client.get_libraries().await {
        Ok(libraries) => {
            let count = libraries.as_array().map_or(0, |l| l.len());
            println!("  Result: OK ({} libraries)", count);
        }
        Err(e) => {
            println!("  Result: FAILED - {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
