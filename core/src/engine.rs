//! The search façade: corpus acquisition (cache or fresh build) tied to
//! query execution. This is the only place that decides between reusing a
//! cached index and building one.

use crate::crawl::HttpFetcher;
use crate::index::{CorpusIndex, ScoredDocument};
use crate::{cache, term, CacheOutcome, Error};
use std::path::Path;
use url::Url;

/// Where the corpus comes from. Both variants hold the literal string the
/// user supplied: the cache key contract is exact concatenation of that
/// string, with no normalization.
#[derive(Debug, Clone)]
pub enum Source {
    /// A directory tree of documents.
    Directory(String),
    /// A seed URL to crawl, indexing at most `page_budget` pages.
    Web { seed: String, page_budget: usize },
}

impl Source {
    /// The cache key component: the source exactly as given.
    pub fn descriptor(&self) -> &str {
        match self {
            Source::Directory(path) => path,
            Source::Web { seed, .. } => seed,
        }
    }
}

/// Run one search: tokenize the query, obtain a corpus (cached or freshly
/// built), and return the top `k` documents by cumulative TF-IDF.
pub fn run(query_text: &str, source: &Source, k: usize) -> Result<Vec<ScoredDocument>, Error> {
    let query = term::tokenize(query_text);
    tracing::info!(?query, k, "search terms");

    let descriptor = source.descriptor();
    let index = match cache::load(descriptor) {
        CacheOutcome::Hit(index) => {
            tracing::info!(descriptor, num_docs = index.len(), "reusing cached index");
            index
        }
        outcome => {
            if matches!(outcome, CacheOutcome::Corrupt) {
                tracing::warn!(descriptor, "cache file is corrupt; rebuilding");
            }
            let index = build(source)?;
            if let Err(e) = cache::save(&index, descriptor) {
                tracing::warn!(descriptor, error = %e, "failed to cache index");
            }
            index
        }
    };

    index.top_k(&query, k)
}

fn build(source: &Source) -> Result<CorpusIndex, Error> {
    match source {
        Source::Directory(path) => CorpusIndex::from_directory(Path::new(path)),
        Source::Web { seed, page_budget } => {
            let seed_url = Url::parse(seed).map_err(|e| Error::InvalidUrl {
                url: seed.clone(),
                source: e,
            })?;
            let fetcher = HttpFetcher::new().map_err(|e| Error::SeedFetch {
                url: seed.clone(),
                source: e,
            })?;
            CorpusIndex::from_crawl(&seed_url, *page_budget, &fetcher)
        }
    }
}
