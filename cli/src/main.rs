//! `compahunt` command-line interface.
//!
//! Embeds and compares texts with the configured provider, and previews the
//! feedback reminder the scheduler job would create for an interview.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

/// Semantic similarity and interview follow-ups
#[derive(Debug, Parser)]
#[command(name = "compahunt")]
#[command(version)]
struct Cli {
    /// Embedding configuration file (TOML)
    #[arg(long, env = "COMPAHUNT_EMBEDDING_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the embedding of a text as JSON
    Embed {
        text: String,

        /// Embed with query semantics instead of passage semantics
        #[arg(long)]
        query: bool,
    },

    /// Print the cosine similarity of two texts
    Similarity { text_a: String, text_b: String },

    /// Rank candidate texts against a query, best match first
    Rank {
        /// Query text
        #[arg(long)]
        query: String,

        /// Candidate texts
        #[arg(required = true)]
        candidates: Vec<String>,
    },

    /// Run the feedback job for an interview read from a JSON file
    Feedback {
        /// Interview JSON file
        interview: PathBuf,

        /// Creation time to use instead of the current time (RFC 3339)
        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();
    init_logging();

    let Cli { config, command } = Cli::parse();
    let service = || {
        commands::similarity_service(config.as_deref())
            .context("failed to set up embedding provider")
    };

    let output = match command {
        Command::Embed { text, query } => commands::embed(&service()?, &text, query).await?,
        Command::Similarity { text_a, text_b } => {
            commands::similarity(&service()?, &text_a, &text_b).await?
        }
        Command::Rank { query, candidates } => {
            commands::rank(&service()?, &query, &candidates).await?
        }
        Command::Feedback { interview, now } => {
            commands::feedback(&interview, now.unwrap_or_else(Utc::now)).await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
