#![allow(clippy::doc_markdown)]
//! `tiersearch` CLI - index documents and query the shard tree
//!
//! Usage:
//!   `tiersearch --doc a=hello --doc b="hello world" search hello`
//!   `tiersearch --file README.md suggest sea --limit 5`
//!   `tiersearch --config tiersearch.toml --file notes.txt search rust`

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;
use tiersearch_core::{SearchEntry, SearchTree, TierConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "tiersearch")]
#[command(author, version, about = "tiersearch CLI - sharded in-process full-text index")]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (defaults to ./tiersearch.toml when present)
    #[arg(short, long, env = "TIERSEARCH_CONFIG")]
    config: Option<PathBuf>,

    /// Inline document as NAME=TEXT (repeatable)
    #[arg(long = "doc", value_name = "NAME=TEXT", value_parser = parse_doc)]
    docs: Vec<(String, String)>,

    /// File to index under its path (repeatable)
    #[arg(long = "file", value_name = "PATH")]
    files: Vec<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Documents containing a word, with occurrence counts
    Search {
        /// Word to look up
        word: String,
    },

    /// Indexed words starting with a prefix
    Suggest {
        /// Prefix to complete
        prefix: String,

        /// Maximum suggestions (defaults to search.default_suggest_limit)
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

fn parse_doc(raw: &str) -> Result<(String, String), String> {
    let (name, text) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=TEXT, got '{raw}'"))?;
    if name.is_empty() {
        return Err("document name must not be empty".to_string());
    }
    Ok((name.to_string(), text.to_string()))
}

fn init_logging(config: &TierConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str()));
    let registry = tracing_subscriber::registry().with(filter);
    // Logs go to stderr so stdout stays machine-readable.
    if config.logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<TierConfig> {
    let config = match path {
        Some(path) => TierConfig::load_from_path(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => TierConfig::load()?,
    };
    config.validate()?;
    Ok(config)
}

fn index_inputs(tree: &SearchTree, cli: &Cli) -> anyhow::Result<usize> {
    let mut indexed = 0;
    for (name, text) in &cli.docs {
        tree.add_document(name, text)?;
        indexed += 1;
    }
    for path in &cli.files {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        tree.add_document(&path.display().to_string(), &text)?;
        indexed += 1;
    }
    Ok(indexed)
}

fn run(tree: &SearchTree, cli: &Cli) -> anyhow::Result<()> {
    let indexed = index_inputs(tree, cli)?;
    tree.sync();
    tracing::info!(documents = indexed, "indexing complete");

    let output = match &cli.command {
        Commands::Search { word } => {
            let mut hits: Vec<(String, u64)> = tree.search_documents(word)?.into_iter().collect();
            hits.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            let results: Vec<_> = hits
                .into_iter()
                .map(|(document, count)| json!({ "document": document, "count": count }))
                .collect();
            json!({ "word": word, "results": results })
        }
        Commands::Suggest { prefix, limit } => {
            let suggestions = match limit {
                Some(limit) => tree.suggest(prefix, *limit),
                None => tree.autocomplete(prefix),
            };
            json!({ "prefix": prefix, "suggestions": suggestions })
        }
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    init_logging(&config);

    let tree = SearchTree::build(&config)?;
    let result = run(&tree, &cli);
    tree.shutdown();
    result
}
