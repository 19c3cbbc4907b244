use anyhow::Result;
use clap::{Parser, Subcommand};
use searcher::{load_or_build_index, read_stopwords, run_batch, run_interactive};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "searcher")]
#[command(about = "BM25 search over a document collection", long_about = None)]
struct Cli {
    /// Document collection directory
    #[arg(long, default_value = "documents")]
    corpus: PathBuf,
    /// Index directory (built and persisted on first run)
    #[arg(long, default_value = "index")]
    index: PathBuf,
    /// Stopword file, one word per line
    #[arg(long, default_value = "files/stopwords.txt")]
    stopwords: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank every query in a query file and write the results file
    Batch {
        /// Query file: one `queryId term term ...` line per query
        #[arg(long, default_value = "files/queries.txt")]
        queries: PathBuf,
        /// Ranked output file
        #[arg(long, default_value = "files/results.txt")]
        output: PathBuf,
    },
    /// Read queries from stdin and print the top 15 documents
    Interactive,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    let start = Instant::now();
    let stopwords = read_stopwords(&cli.stopwords)?;
    let index = load_or_build_index(&cli.index, &cli.corpus, &stopwords)?;
    tracing::info!(elapsed_s = start.elapsed().as_secs_f64(), "index ready");

    match cli.command {
        Commands::Batch { queries, output } => {
            let start = Instant::now();
            run_batch(&index, &stopwords, &queries, &output)?;
            tracing::info!(
                elapsed_s = start.elapsed().as_secs_f64(),
                output = %output.display(),
                "batch search complete"
            );
        }
        Commands::Interactive => run_interactive(&index, &stopwords)?,
    }
    Ok(())
}
