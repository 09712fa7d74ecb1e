//! `pagesearch` - build and query a passage index over extracted PDF text.
//!
//! ```bash
//! pagesearch ingest --corpus data/corpus
//! pagesearch query "GDPR rights" -n 3
//! pagesearch query "breach notification" --chat
//! echo '{"query": "consent", "max_results": 2}' | pagesearch request
//! pagesearch health
//! ```

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pagesearch_core::Settings;
use pagesearch_embed::embedder_from_config;
use pagesearch_hybrid::{format_chat_reply, JsonArtifactStore, SearchService};

#[derive(Parser)]
#[command(name = "pagesearch", version, about)]
struct Cli {
    /// Config file (default: pagesearch.toml plus the RUST_ENV overlay)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the index artifact from the corpus directory
    Ingest {
        /// Directory of pre-extracted `.txt` files (overrides data.corpus_dir)
        #[arg(long)]
        corpus: Option<PathBuf>,
    },
    /// Search the index
    Query {
        query: String,

        /// Maximum number of results to return
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Leave out highlighted text
        #[arg(long)]
        no_highlights: bool,

        /// Print a conversational reply instead of JSON
        #[arg(long)]
        chat: bool,
    },
    /// Run a JSON request body (argument or stdin) and print the JSON response
    Request { body: Option<String> },
    /// Report index status
    Health,
}

fn load_settings(path: Option<&PathBuf>) -> Result<Settings> {
    match path {
        Some(path) => {
            let mut settings = Settings::load_from(path).with_context(|| format!("loading {}", path.display()))?;
            if let Some(base) = path.parent() {
                settings.resolve_paths(base);
            }
            Ok(settings)
        }
        None => Ok(Settings::load()?),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();

    let mut settings = load_settings(cli.config.as_ref())?;
    if let Command::Ingest { corpus: Some(dir) } = &cli.command {
        settings.data.corpus_dir = dir.to_string_lossy().into_owned();
    }
    let embedder = embedder_from_config(&settings.semantic)?;

    match cli.command {
        Command::Ingest { .. } => {
            let service = SearchService::new(settings, embedder, Box::new(JsonArtifactStore));
            let report = service.rebuild_from_corpus()?;
            for warning in &report.warnings {
                eprintln!("warning: {warning}");
            }
            println!(
                "Indexed {} passages from {} documents ({} pages, {} warnings) into {}",
                report.passages,
                report.documents,
                report.pages_read,
                report.warning_count(),
                service.artifact_path().display()
            );
        }
        Command::Query { query, limit, no_highlights, chat } => {
            let limit = limit.unwrap_or(settings.search.default_results);
            let service = SearchService::initialize(settings, embedder, Box::new(JsonArtifactStore));
            let response = service.search(&query, limit, !no_highlights);
            if chat {
                println!("{}", format_chat_reply(&response));
            } else {
                println!("{}", serde_json::to_string_pretty(&response)?);
            }
        }
        Command::Request { body } => {
            let body = match body {
                Some(body) => body,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf).context("reading request from stdin")?;
                    buf
                }
            };
            let value: serde_json::Value = serde_json::from_str(&body).context("request body is not JSON")?;
            let service = SearchService::initialize(settings, embedder, Box::new(JsonArtifactStore));
            println!("{}", serde_json::to_string_pretty(&service.handle_json(&value))?);
        }
        Command::Health => {
            let service = SearchService::initialize(settings, embedder, Box::new(JsonArtifactStore));
            println!("{}", serde_json::to_string_pretty(&service.health())?);
        }
    }
    Ok(())
}
