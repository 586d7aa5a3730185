//! Annai Pipeline CLI
//!
//! Builds the vector index from the raw anime dataset (offline, run once
//! or whenever the dataset changes) and serves one-shot recommendation
//! queries from the command line.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use annai::{
    ChunkRecord, Chunker, Config, Index, Recommender, TextEmbedder, build_index, load_dataset,
    write_combined,
};

/// CLI arguments
#[derive(Parser)]
#[command(name = "annai")]
#[command(about = "Grounded anime recommendations over a local vector index")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Vector index location
    #[arg(short, long, env = "ANNAI_INDEX")]
    index: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize the dataset, embed it, and build the vector index
    Build {
        /// Raw dataset CSV with Name, Genres, and sypnopsis columns
        dataset: PathBuf,

        /// Also write the reduced combined_info CSV artifact here
        #[arg(short, long)]
        combined_out: Option<PathBuf>,
    },
    /// Ask for a recommendation
    Recommend {
        /// Free-text viewer preference
        query: String,
    },
    /// Show index status and information
    Status,
    /// Remove the built index
    Clean {
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut config = Config::load();
    if let Some(index) = cli.index {
        config.index_path = index;
    }

    match cli.command {
        Commands::Build {
            dataset,
            combined_out,
        } => build(&config, &dataset, combined_out.as_deref()),
        Commands::Recommend { query } => recommend(&config, &query),
        Commands::Status => status(&config),
        Commands::Clean { yes } => clean(&config, yes),
    }
}

fn build(config: &Config, dataset: &Path, combined_out: Option<&Path>) -> Result<()> {
    info!("normalizing dataset {}", dataset.display());
    let records = load_dataset(dataset).context("failed to normalize dataset")?;

    if let Some(out) = combined_out {
        write_combined(&records, out).context("failed to write combined dataset artifact")?;
        info!("wrote reduced dataset to {}", out.display());
    }

    let chunker = Chunker::new(config.chunk.clone()).context("invalid chunk configuration")?;
    let chunks: Vec<ChunkRecord> = records
        .iter()
        .flat_map(|record| chunker.split(record))
        .map(|chunk| ChunkRecord {
            source_name: chunk.source_name,
            chunk_index: chunk.chunk_index,
            text: chunk.text,
        })
        .collect();
    info!("{} chunks from {} records", chunks.len(), records.len());

    let embedder = TextEmbedder::load(&config.embed).context("failed to load embedding model")?;
    let summary = build_index(&chunks, &embedder, &config.index_path)
        .context("failed to build vector index")?;
    info!(
        "index built at {} ({} entries, dimension {})",
        config.index_path.display(),
        summary.entries,
        summary.dimension
    );
    Ok(())
}

fn recommend(config: &Config, query: &str) -> Result<()> {
    let recommender =
        Recommender::open(config).context("failed to open recommendation pipeline")?;
    let answer = recommender.recommend(query)?;
    println!("{answer}");
    Ok(())
}

fn status(config: &Config) -> Result<()> {
    match Index::open(&config.index_path) {
        Ok(index) => {
            println!("index:     {}", config.index_path.display());
            println!("entries:   {}", index.len());
            println!("dimension: {}", index.dimension());
            println!("model:     {}", index.model_id());
        }
        Err(err) => println!("{err}"),
    }
    Ok(())
}

fn clean(config: &Config, yes: bool) -> Result<()> {
    if !config.index_path.exists() {
        info!("nothing to clean");
        return Ok(());
    }
    if !yes {
        print!("Remove {}? [y/N]: ", config.index_path.display());
        std::io::stdout().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            info!("clean cancelled");
            return Ok(());
        }
    }
    std::fs::remove_file(&config.index_path).context("failed to remove index")?;
    info!("removed {}", config.index_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }
}
