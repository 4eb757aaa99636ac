//! Breadth-first web crawler that populates a [`CorpusIndex`].
//!
//! The HTML mechanics live behind [`PageFetcher`]; the crawl loop only
//! sees "fetch page, get text and outbound links".

use crate::index::{CorpusIndex, DocumentIndex};
use crate::Error;
use reqwest::header;
use scraper::{Html, Selector};
use std::collections::{HashSet, VecDeque};
use std::time::Duration;
use url::Url;

const USER_AGENT: &str = "ferret-bot/0.1";
const FETCH_TIMEOUT: Duration = Duration::from_secs(12);
const MAX_REDIRECTS: usize = 5;
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// One fetched page: its visible text and the absolute outbound links
/// found in it.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub text: String,
    pub links: Vec<Url>,
}

/// Why a single page fetch failed. These are absorbed by the crawl loop
/// for non-seed pages.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),
    #[error("not an html page: {0}")]
    ContentType(String),
    #[error("page body exceeds the size cap")]
    TooLarge,
}

/// Fetches one page and extracts its outbound links.
pub trait PageFetcher {
    fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError>;
}

/// [`PageFetcher`] over live HTTP. Each request carries its own deadline,
/// so a stalled server cannot stall the crawl forever.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    sel_body: Selector,
    sel_a: Selector,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(FETCH_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            sel_body: Selector::parse("body").expect("valid selector"),
            sel_a: Selector::parse("a").expect("valid selector"),
        })
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let resp = self.client.get(url.clone()).send()?;
        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status()));
        }
        if let Some(ct) = resp.headers().get(header::CONTENT_TYPE) {
            let ct = ct.to_str().unwrap_or_default();
            if !ct.starts_with("text/html") {
                return Err(FetchError::ContentType(ct.to_string()));
            }
        }
        let bytes = resp.bytes()?;
        if bytes.len() > MAX_BODY_BYTES {
            return Err(FetchError::TooLarge);
        }
        let html = String::from_utf8_lossy(&bytes);

        let doc = Html::parse_document(&html);
        let text = match doc.select(&self.sel_body).next() {
            Some(body) => body.text().collect::<String>(),
            None => doc.root_element().text().collect::<String>(),
        };

        let mut links = Vec::new();
        for a in doc.select(&self.sel_a) {
            if let Some(href) = a.value().attr("href") {
                if let Ok(link) = Url::parse(href).or_else(|_| url.join(href)) {
                    if link.scheme().starts_with("http") {
                        links.push(link);
                    }
                }
            }
        }
        Ok(FetchedPage { text, links })
    }
}

/// Dedup key for a page: the absolute URL with its fragment stripped.
pub fn normalize_url(url: &Url) -> String {
    let mut u = url.clone();
    u.set_fragment(None);
    u.to_string()
}

/// Breadth-first crawl bounded by a total-page budget.
///
/// The budget caps how many pages end up in the corpus; it is not a
/// hop-distance limit. The frontier grows as needed.
pub struct Crawler<'a, F: PageFetcher> {
    fetcher: &'a F,
    page_budget: usize,
}

impl<'a, F: PageFetcher> Crawler<'a, F> {
    pub fn new(fetcher: &'a F, page_budget: usize) -> Self {
        Self {
            fetcher,
            page_budget,
        }
    }

    /// Crawl from `seed`. A seed fetch failure is fatal; any later
    /// single-page failure is logged and skipped. Returns the corpus of
    /// every page successfully fetched and indexed.
    pub fn crawl(&self, seed: &Url) -> Result<CorpusIndex, Error> {
        let mut corpus = CorpusIndex::default();
        if self.page_budget == 0 {
            return Ok(corpus);
        }

        let mut frontier: VecDeque<Url> = VecDeque::new();
        let mut visited: HashSet<String> = HashSet::new();

        let seed_key = normalize_url(seed);
        let seed_page = self.fetcher.fetch(seed).map_err(|e| Error::SeedFetch {
            url: seed_key.clone(),
            source: e,
        })?;
        visited.insert(seed_key.clone());
        corpus.insert(seed_key, DocumentIndex::from_text(&seed_page.text));
        for link in seed_page.links {
            if !visited.contains(&normalize_url(&link)) {
                frontier.push_back(link);
            }
        }

        while corpus.len() < self.page_budget {
            let Some(url) = frontier.pop_front() else {
                break;
            };
            let key = normalize_url(&url);
            if visited.contains(&key) {
                continue;
            }
            match self.fetcher.fetch(&url) {
                Ok(page) => {
                    visited.insert(key.clone());
                    corpus.insert(key, DocumentIndex::from_text(&page.text));
                    for link in page.links {
                        if !visited.contains(&normalize_url(&link)) {
                            frontier.push_back(link);
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(url = %key, error = %e, "skipping unreachable page");
                }
            }
        }

        tracing::info!(
            pages = corpus.len(),
            frontier = frontier.len(),
            "crawl finished"
        );
        Ok(corpus)
    }
}
