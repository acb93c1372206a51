use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use termex_core::TermRecord;
use termex_service::{SearchMode, TermService, TermexConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "termex", about = "Construction term extraction and hybrid term search")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "termex.toml")]
    config: PathBuf,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract terms from a text or a file
    Extract {
        /// Text to extract from
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        text: Option<String>,
        /// UTF-8 file to extract from
        #[arg(long)]
        file: Option<PathBuf>,
        /// Drop candidates below this confidence (overrides config)
        #[arg(long)]
        min_confidence: Option<f32>,
    },
    /// Extract from every document in a directory
    Batch {
        /// Directory holding the documents
        dir: PathBuf,
        /// Rebuild the index from the extracted terms
        #[arg(long)]
        rebuild: bool,
    },
    /// Search the index
    Search {
        /// Query text
        query: String,
        /// dense, sparse or hybrid
        #[arg(short, long, default_value_t = SearchMode::Hybrid)]
        mode: SearchMode,
        /// Number of results (overrides config)
        #[arg(short, long)]
        limit: Option<usize>,
        /// Dense weight for hybrid search (overrides config)
        #[arg(short, long)]
        alpha: Option<f32>,
    },
    /// List indexed terms
    List {
        /// Only terms of this category
        #[arg(long)]
        category: Option<String>,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long, default_value_t = 100)]
        limit: usize,
    },
    /// Show index statistics
    Info,
    /// Build the index from the built-in term dictionary
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = TermexConfig::load(&cli.config).await.map_err(|e| {
        anyhow::anyhow!("Failed to load config '{}': {}", cli.config.display(), e)
    })?;
    let service = TermService::new(config)?;

    match cli.command {
        Commands::Extract {
            text,
            file,
            min_confidence,
        } => {
            let text = match (text, file) {
                (Some(text), _) => text,
                (None, Some(path)) => tokio::fs::read_to_string(&path).await.map_err(|e| {
                    anyhow::anyhow!("Failed to read '{}': {}", path.display(), e)
                })?,
                (None, None) => anyhow::bail!("either --text or --file is required"),
            };
            let min_confidence =
                min_confidence.unwrap_or(service.config().extraction.min_confidence);
            print_json(&service.extract(&text, min_confidence)?)?;
        }
        Commands::Batch { dir, rebuild } => {
            let paths = service.documents_in(&dir).await?;
            info!(documents = paths.len(), dir = %dir.display(), "Starting batch extraction");
            let report = service.extract_batch(&paths, rebuild).await?;
            service.wait_for_rebuild().await?;
            print_json(&report)?;
        }
        Commands::Search {
            query,
            mode,
            limit,
            alpha,
        } => {
            service.load().await?;
            let results = service.search(&query, mode, limit, alpha).await?;
            print_json(&results.iter().map(RecordView::from).collect::<Vec<_>>())?;
        }
        Commands::List {
            category,
            offset,
            limit,
        } => {
            service.load().await?;
            let records = service.list_all(category.as_deref(), offset, limit);
            print_json(&records.iter().map(RecordView::from).collect::<Vec<_>>())?;
        }
        Commands::Info => {
            service.load().await?;
            print_json(&service.info())?;
        }
        Commands::Seed => {
            let count = service.build_from_dictionary().await?;
            info!(records = count, "Index seeded from dictionary");
            print_json(&service.info())?;
        }
    }

    Ok(())
}

/// A record without its embedding.
#[derive(Serialize)]
struct RecordView<'a> {
    id: u32,
    term: &'a str,
    category: &'a str,
    aliases: &'a [String],
    confidence: f32,
    frequency: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    score: Option<f32>,
}

impl<'a> From<&'a TermRecord> for RecordView<'a> {
    fn from(record: &'a TermRecord) -> Self {
        Self {
            id: record.id,
            term: &record.term,
            category: &record.category,
            aliases: &record.aliases,
            confidence: record.confidence,
            frequency: record.frequency,
            score: record.score,
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
