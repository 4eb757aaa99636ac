//! Per-document term counts and the corpus-wide TF-IDF index.

use crate::crawl::{Crawler, PageFetcher};
use crate::{term, Error};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use url::Url;
use walkdir::WalkDir;

/// A ranked search result. Scores are always finite; they can be negative
/// when a query term appears in nearly every document.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDocument {
    pub doc_id: String,
    pub score: f64,
}

/// Term counts for a single document, frozen once built.
///
/// `max_count` is maintained as a running maximum while counting, so
/// term-frequency lookups never rescan the table.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct DocumentIndex {
    counts: HashMap<String, u32>,
    max_count: u32,
}

impl DocumentIndex {
    /// Tokenize `text` and count every term.
    pub fn from_text(text: &str) -> Self {
        let mut index = Self::default();
        for t in term::tokenize(text) {
            index.increment(t);
        }
        index
    }

    fn increment(&mut self, term: String) {
        let count = self.counts.entry(term).or_insert(0);
        *count += 1;
        if *count > self.max_count {
            self.max_count = *count;
        }
    }

    /// Occurrences of `term` in this document; 0 when unseen.
    pub fn count(&self, term: &str) -> u32 {
        self.counts.get(term).copied().unwrap_or(0)
    }

    /// `count(term) / max_count`. A document with no terms has no most
    /// frequent term, so every frequency in it is 0.
    pub fn term_frequency(&self, term: &str) -> f64 {
        if self.max_count == 0 {
            return 0.0;
        }
        f64::from(self.count(term)) / f64::from(self.max_count)
    }

    /// All terms with a nonzero count.
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// One `DocumentIndex` per document, keyed by canonical path string or
/// normalized absolute URL. Immutable after a successful build.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CorpusIndex {
    docs: HashMap<String, DocumentIndex>,
}

impl CorpusIndex {
    /// Index every non-directory entry under `root`, recursively. Any
    /// traversal or read failure aborts the whole build; no partial index
    /// escapes. File bytes are decoded lossily, matching how a text
    /// scanner reads whatever is in the file.
    pub fn from_directory(root: &Path) -> Result<Self, Error> {
        let mut docs = HashMap::new();
        for entry in WalkDir::new(root) {
            let entry = entry.map_err(|e| Error::Walk {
                path: root.to_path_buf(),
                source: e,
            })?;
            if entry.file_type().is_dir() {
                continue;
            }
            let path = entry.path();
            let bytes = std::fs::read(path).map_err(|e| Error::Read {
                path: path.to_path_buf(),
                source: e,
            })?;
            let text = String::from_utf8_lossy(&bytes);
            docs.insert(
                path.to_string_lossy().into_owned(),
                DocumentIndex::from_text(&text),
            );
        }
        tracing::info!(root = %root.display(), num_docs = docs.len(), "indexed directory");
        Ok(Self { docs })
    }

    /// Build a corpus by breadth-first crawling from `seed`, indexing at
    /// most `page_budget` pages.
    pub fn from_crawl<F: PageFetcher>(
        seed: &Url,
        page_budget: usize,
        fetcher: &F,
    ) -> Result<Self, Error> {
        Crawler::new(fetcher, page_budget).crawl(seed)
    }

    pub(crate) fn insert(&mut self, doc_id: String, doc: DocumentIndex) {
        self.docs.insert(doc_id, doc);
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn contains(&self, doc_id: &str) -> bool {
        self.docs.contains_key(doc_id)
    }

    pub fn document(&self, doc_id: &str) -> Option<&DocumentIndex> {
        self.docs.get(doc_id)
    }

    /// Number of documents in which `term` appears at least once.
    pub fn document_frequency(&self, term: &str) -> usize {
        self.docs.values().filter(|d| d.count(term) > 0).count()
    }

    /// `log2(n / (df + 1))`. Negative for terms common to nearly every
    /// document; that is intended. Errors on an empty corpus rather than
    /// producing a non-finite value.
    pub fn idf(&self, term: &str) -> Result<f64, Error> {
        if self.docs.is_empty() {
            return Err(Error::EmptyCorpus);
        }
        let n = self.docs.len() as f64;
        let df = self.document_frequency(term) as f64;
        Ok((n / (df + 1.0)).log2())
    }

    /// TF-IDF of `term` for every document in the corpus.
    pub fn tfidf(&self, term: &str) -> Result<HashMap<String, f64>, Error> {
        let idf = self.idf(term)?;
        Ok(self
            .docs
            .iter()
            .map(|(doc_id, doc)| (doc_id.clone(), doc.term_frequency(term) * idf))
            .collect())
    }

    /// Cumulative TF-IDF per document. Query terms are summed per
    /// occurrence, so a repeated term carries extra weight. An empty query
    /// yields an empty map, even over an empty corpus.
    pub fn score(&self, query: &[String]) -> Result<HashMap<String, f64>, Error> {
        let mut scores: HashMap<String, f64> = HashMap::new();
        for term in query {
            for (doc_id, tfidf) in self.tfidf(term)? {
                *scores.entry(doc_id).or_insert(0.0) += tfidf;
            }
        }
        Ok(scores)
    }

    /// The `k` highest-scoring documents, descending by score with ties
    /// broken by ascending document id. A candidate whose id begins with
    /// "http" and whose score exactly equals an already selected result's
    /// score is taken for a crawl duplicate and dropped.
    pub fn top_k(&self, query: &[String], k: usize) -> Result<Vec<ScoredDocument>, Error> {
        let scores = self.score(query)?;
        let mut ranked: Vec<ScoredDocument> = scores
            .into_iter()
            .map(|(doc_id, score)| ScoredDocument { doc_id, score })
            .collect();
        ranked.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.doc_id.cmp(&b.doc_id))
        });

        let mut top: Vec<ScoredDocument> = Vec::with_capacity(k.min(ranked.len()));
        for candidate in ranked {
            if top.len() == k {
                break;
            }
            let duplicate = candidate.doc_id.starts_with("http")
                && top.iter().any(|s| s.score == candidate.score);
            if duplicate {
                continue;
            }
            top.push(candidate);
        }
        Ok(top)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus(docs: &[(&str, &str)]) -> CorpusIndex {
        let mut index = CorpusIndex::default();
        for (id, text) in docs {
            index.insert((*id).to_string(), DocumentIndex::from_text(text));
        }
        index
    }

    #[test]
    fn counts_and_running_max() {
        let doc = DocumentIndex::from_text("Dog cat dog; dog CAT bird");
        assert_eq!(doc.count("dog"), 3);
        assert_eq!(doc.count("cat"), 2);
        assert_eq!(doc.count("fish"), 0);
        assert_eq!(doc.term_frequency("dog"), 1.0);
        assert_eq!(doc.term_frequency("bird"), 1.0 / 3.0);
        assert_eq!(doc.terms().count(), 3);
    }

    #[test]
    fn empty_document_has_zero_frequencies() {
        let doc = DocumentIndex::from_text("12 34 !!");
        assert!(doc.is_empty());
        assert_eq!(doc.term_frequency("anything"), 0.0);
    }

    #[test]
    fn dog_cat_bird_scenario() {
        let index = corpus(&[("D1", "dog cat dog"), ("D2", "cat cat cat"), ("D3", "bird")]);
        assert_eq!(index.document_frequency("dog"), 1);

        let idf = index.idf("dog").unwrap();
        assert!((idf - (3.0f64 / 2.0).log2()).abs() < 1e-12);

        let query = vec!["dog".to_string()];
        let scores = index.score(&query).unwrap();
        assert!((scores["D1"] - idf).abs() < 1e-12);
        assert_eq!(scores["D2"], 0.0);
        assert_eq!(scores["D3"], 0.0);

        let top = index.top_k(&query, 2).unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].doc_id, "D1");
        assert_eq!(top[1].score, 0.0);
    }

    #[test]
    fn idf_is_monotonic_in_document_frequency() {
        let index = corpus(&[
            ("a", "rare common"),
            ("b", "common"),
            ("c", "common"),
            ("d", "nothing here"),
        ]);
        assert!(index.document_frequency("rare") < index.document_frequency("common"));
        assert!(index.idf("rare").unwrap() >= index.idf("common").unwrap());
    }

    #[test]
    fn idf_can_be_negative_for_ubiquitous_terms() {
        let index = corpus(&[("a", "the dog"), ("b", "the cat"), ("c", "the bird")]);
        // df = 3, n = 3 -> log2(3/4) < 0
        assert!(index.idf("the").unwrap() < 0.0);
    }

    #[test]
    fn idf_over_empty_corpus_is_an_error() {
        let index = CorpusIndex::default();
        assert!(matches!(index.idf("dog"), Err(Error::EmptyCorpus)));
    }

    #[test]
    fn repeated_query_terms_add_weight() {
        let index = corpus(&[("a", "dog"), ("b", "cat")]);
        let once = index.score(&["dog".to_string()]).unwrap();
        let twice = index.score(&["dog".to_string(), "dog".to_string()]).unwrap();
        assert!((twice["a"] - 2.0 * once["a"]).abs() < 1e-12);
    }

    #[test]
    fn empty_query_scores_nothing() {
        let index = corpus(&[("a", "dog")]);
        assert!(index.score(&[]).unwrap().is_empty());
        assert!(index.top_k(&[], 5).unwrap().is_empty());

        // Even over an empty corpus: idf is never consulted.
        assert!(CorpusIndex::default().top_k(&[], 5).unwrap().is_empty());
    }

    #[test]
    fn top_k_is_bounded_and_ordered() {
        let index = corpus(&[
            ("a", "dog dog dog"),
            ("b", "dog cat"),
            ("c", "cat"),
            ("d", "bird"),
        ]);
        let query = vec!["dog".to_string()];
        let top = index.top_k(&query, 10).unwrap();
        assert_eq!(top.len(), 4);
        for pair in top.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        assert_eq!(index.top_k(&query, 2).unwrap().len(), 2);
    }

    #[test]
    fn equal_scores_break_ties_by_doc_id() {
        let index = corpus(&[("b.txt", "dog"), ("a.txt", "dog"), ("c.txt", "cat")]);
        let top = index.top_k(&["dog".to_string()], 3).unwrap();
        assert_eq!(top[0].doc_id, "a.txt");
        assert_eq!(top[1].doc_id, "b.txt");
    }

    #[test]
    fn equal_scored_crawled_pages_are_dropped_as_duplicates() {
        let index = corpus(&[
            ("http://site/a", "dog"),
            ("http://site/a-copy", "dog"),
            ("http://site/b", "dog cat cat"),
            ("http://site/x", "bird"),
            ("http://site/y", "fish"),
        ]);
        let top = index.top_k(&["dog".to_string()], 4).unwrap();
        let ids: Vec<&str> = top.iter().map(|s| s.doc_id.as_str()).collect();
        // a and a-copy tie exactly, so only the first survives; the two
        // zero-scored pages tie the same way.
        assert_eq!(ids, vec!["http://site/a", "http://site/b", "http://site/x"]);
    }
}
