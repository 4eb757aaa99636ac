//! TF-IDF search over a file tree or a crawled set of web pages.
//!
//! The pipeline is: normalize text into terms ([`term`]), count them per
//! document and aggregate per corpus ([`index`]), optionally populate the
//! corpus by breadth-first crawling ([`crawl`]), snapshot a built corpus to
//! disk ([`cache`]), and tie it all together behind one entry point
//! ([`engine`]).

pub mod cache;
pub mod crawl;
pub mod engine;
pub mod index;
pub mod term;

pub use cache::CacheOutcome;
pub use crawl::{Crawler, FetchError, FetchedPage, HttpFetcher, PageFetcher};
pub use engine::{run, Source};
pub use index::{CorpusIndex, DocumentIndex, ScoredDocument};

use std::path::PathBuf;

/// Errors that abort a search. Per-page fetch failures during a crawl are
/// absorbed inside the crawl loop and never surface here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Directory traversal could not complete; the whole build aborts.
    #[error("failed to walk corpus directory {path}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// A corpus file could not be opened or read.
    #[error("failed to read document {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The seed string is not a parseable absolute URL.
    #[error("invalid seed url {url:?}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The seed page could not be fetched; a crawl cannot start without it.
    #[error("failed to fetch seed page {url}")]
    SeedFetch {
        url: String,
        #[source]
        source: FetchError,
    },

    /// IDF is undefined over a corpus with no documents.
    #[error("cannot compute idf over an empty corpus")]
    EmptyCorpus,
}
