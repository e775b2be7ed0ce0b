//! Admin tool for a docsearch index.
//!
//! Usage:
//!     docsearch [--config docsearch.toml] <command>
//!
//! Examples:
//!     docsearch config init
//!     docsearch index --id 1 --type md --tags 1,2 --file notes.md
//!     docsearch search "quarterly report" --type pdf --limit 5
//!     docsearch drain

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use docsearch::boundary::{parse_datetime, parse_tag_ids};
use docsearch::config::CONFIG_FILE_NAME;
use docsearch::{IndexEntry, SearchConfig, SearchParams, SearchService};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "docsearch", about = "Full-text search index for the document archive", version)]
struct Cli {
    /// Config file; defaults apply when it does not exist
    #[arg(short, long, default_value = CONFIG_FILE_NAME)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Index or replace one document
    Index {
        #[arg(long)]
        id: i64,

        /// Lowercase file type, e.g. "pdf"
        #[arg(long = "type")]
        file_type: String,

        #[arg(long)]
        folder: Option<i64>,

        /// Comma-separated tag ids
        #[arg(long)]
        tags: Option<String>,

        /// Creation time (RFC 3339 or YYYY-MM-DD); now when omitted
        #[arg(long)]
        created_at: Option<String>,

        /// Read the extracted text from this file
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,

        /// Extracted text given inline
        #[arg(long)]
        text: Option<String>,
    },

    /// Remove one document
    Delete { id: i64 },

    /// Run a query and print the page as JSON
    Search {
        query: String,

        #[arg(long = "type")]
        file_type: Option<String>,

        #[arg(long)]
        folder: Option<i64>,

        /// Comma-separated tag ids, any of which must match
        #[arg(long)]
        tags: Option<String>,

        #[arg(long)]
        from: Option<String>,

        #[arg(long)]
        to: Option<String>,

        #[arg(long, default_value_t = 0)]
        skip: usize,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print the stored fields of one document
    Get { id: i64 },

    /// Retry pending reindex events
    Drain,

    /// Print index statistics and outbox backlog
    Stats,

    /// Remove every document from the index
    Clear,

    /// Manage the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Write a commented default config file if none exists
    Init,
    /// Print the effective configuration
    Show,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Config { action: ConfigAction::Init } = &cli.command {
        if SearchConfig::write_default_if_missing(&cli.config)? {
            println!("Wrote {}", cli.config.display());
        } else {
            println!("{} already exists", cli.config.display());
        }
        return Ok(());
    }

    let config = SearchConfig::load(Some(&cli.config))
        .with_context(|| format!("loading {}", cli.config.display()))?;
    init_logging(&config.log_level);

    if let Commands::Config { action: ConfigAction::Show } = &cli.command {
        print!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let service = SearchService::open(config).context("opening search service")?;

    match cli.command {
        Commands::Index {
            id,
            file_type,
            folder,
            tags,
            created_at,
            file,
            text,
        } => {
            let content = match (file, text) {
                (Some(path), _) => std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?,
                (None, Some(text)) => text,
                (None, None) => bail!("either --file or --text is required"),
            };
            let mut entry = IndexEntry::new(id, content, file_type.to_lowercase())
                .with_folder(folder)
                .with_tags(tags.as_deref().map(parse_tag_ids).transpose()?.flatten().unwrap_or_default());
            if let Some(raw) = created_at {
                entry = entry.with_created_at(parse_datetime("created_at", &raw)?);
            }

            service.upsert(entry);
            report_backlog(&service)?;
        }
        Commands::Delete { id } => {
            service.delete(id);
            report_backlog(&service)?;
        }
        Commands::Search {
            query,
            file_type,
            folder,
            tags,
            from,
            to,
            skip,
            limit,
        } => {
            let params = SearchParams {
                q: query,
                file_type,
                folder_id: folder,
                tag_ids: tags,
                date_from: from,
                date_to: to,
                skip,
                limit,
            };
            print_json(&service.search_params(params)?)?;
        }
        Commands::Get { id } => match service.get(id)? {
            Some(entry) => print_json(&entry)?,
            None => bail!("document {} is not indexed", id),
        },
        Commands::Drain => {
            print_json(&service.drain()?)?;
            report_backlog(&service)?;
        }
        Commands::Stats => {
            print_json(&serde_json::json!({
                "index": service.stats()?,
                "pending_events": service.pending()?,
            }))?;
        }
        Commands::Clear => {
            service.clear()?;
            println!("Index cleared");
        }
        Commands::Config { .. } => {}
    }

    Ok(())
}

fn report_backlog(service: &SearchService) -> Result<()> {
    let pending = service.pending()?;
    if pending > 0 {
        eprintln!("{} reindex event(s) pending; run `docsearch drain` to retry", pending);
    }
    Ok(())
}
