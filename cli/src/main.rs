use anyhow::{bail, Result};
use clap::Parser;
use ferret_core::{engine, term, Source};
use tracing_subscriber::{fmt, EnvFilter};

/// TF-IDF search over a directory of documents or a crawled web site.
///
/// With three arguments the source is a directory; adding a page budget
/// makes it a seed URL to crawl.
#[derive(Parser)]
#[command(name = "ferret")]
#[command(about = "Rank documents against a query with TF-IDF", long_about = None)]
struct Cli {
    /// Search query (quote multi-term queries)
    query: String,
    /// Directory path, or seed URL when PAGE_BUDGET is given
    source: String,
    /// Number of results to return
    k: String,
    /// Maximum pages to crawl; presence selects web mode
    page_budget: Option<String>,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    let k = parse_count(&cli.k, "<k>")?;
    let source = match cli.page_budget {
        Some(budget) => Source::Web {
            seed: cli.source,
            page_budget: parse_count(&budget, "<page-budget>")?,
        },
        None => Source::Directory(cli.source),
    };

    let results = engine::run(&cli.query, &source, k)?;
    tracing::info!(returned = results.len(), "search complete");
    for (i, hit) in results.iter().enumerate() {
        println!("Rank {}: {}  (score: {:.5})", i + 1, hit.doc_id, hit.score);
    }
    Ok(())
}

fn parse_count(s: &str, field: &str) -> Result<usize> {
    if !term::is_numeric(s) {
        bail!("{field} must be a non-negative integer, got {s:?}");
    }
    Ok(s.parse()?)
}
