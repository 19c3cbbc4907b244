use anyhow::Result;
use clap::Parser;
use okapi_core::eval::{evaluate, read_judgments, read_ranked_results};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "evaluator")]
#[command(about = "Score ranked retrieval output against relevance judgments", long_about = None)]
struct Args {
    /// Ranked results file: `queryId rank docId score` lines
    #[arg(long, default_value = "files/results.txt")]
    results: PathBuf,
    /// Relevance judgments file: `queryId <ignored> docId [grade]` lines
    #[arg(long, default_value = "files/qrels.txt")]
    qrels: PathBuf,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let judgments = read_judgments(&args.qrels)?;
    let results = read_ranked_results(&args.results)?;
    tracing::info!(
        num_queries = results.len(),
        num_judged = judgments.len(),
        "evaluating ranked output"
    );
    let metrics = evaluate(&results, &judgments)?;

    println!("Precision: {}", metrics.precision);
    println!("Recall: {}", metrics.recall);
    println!("P@10: {}", metrics.p_at_10);
    println!("R-precision: {}", metrics.r_precision);
    println!("MAP: {}", metrics.map);
    println!("Bpref: {}", metrics.bpref);
    Ok(())
}
