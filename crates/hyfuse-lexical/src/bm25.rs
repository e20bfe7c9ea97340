//! BM25 Okapi index over a fixed corpus.
//!
//! Scores are produced densely, one per corpus position, so the fusion layer
//! can pick its own candidate pool.

use std::collections::HashMap;

use hyfuse_core::{Corpus, LexicalConfig};
use tracing::debug;

use crate::tokenizer::tokenize;

/// BM25 parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    /// Term-frequency saturation parameter.
    pub k1: f64,
    /// Length normalization parameter.
    pub b: f64,
    /// Negative IDF values are replaced by `epsilon * average_idf`.
    pub epsilon: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self {
            k1: 1.5,
            b: 0.75,
            epsilon: 0.25,
        }
    }
}

impl From<&LexicalConfig> for Bm25Params {
    fn from(config: &LexicalConfig) -> Self {
        Self {
            k1: config.k1,
            b: config.b,
            epsilon: config.epsilon,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Posting {
    position: u32,
    term_frequency: u32,
}

/// In-memory BM25 index.
#[derive(Debug, Clone)]
pub struct Bm25Index {
    params: Bm25Params,
    postings: HashMap<String, Vec<Posting>>,
    idf: HashMap<String, f64>,
    doc_lengths: Vec<u32>,
    avgdl: f64,
}

impl Bm25Index {
    /// Build the index from every document of the corpus.
    pub fn build(corpus: &Corpus, params: Bm25Params) -> Self {
        let mut postings: HashMap<String, Vec<Posting>> = HashMap::new();
        let mut doc_lengths = Vec::with_capacity(corpus.len());
        let mut total_len: u64 = 0;

        for (position, doc) in corpus.iter().enumerate() {
            let tokens = tokenize(&doc.text);
            doc_lengths.push(tokens.len() as u32);
            total_len += tokens.len() as u64;

            let mut frequencies: HashMap<String, u32> = HashMap::new();
            for token in tokens {
                *frequencies.entry(token).or_default() += 1;
            }
            for (term, term_frequency) in frequencies {
                postings.entry(term).or_default().push(Posting {
                    position: position as u32,
                    term_frequency,
                });
            }
        }

        let avgdl = if doc_lengths.is_empty() {
            0.0
        } else {
            total_len as f64 / doc_lengths.len() as f64
        };

        let idf = Self::compute_idf(&postings, doc_lengths.len(), params.epsilon);

        debug!(
            "Built BM25 index: docs={}, vocabulary={}, avgdl={:.2}",
            doc_lengths.len(),
            postings.len(),
            avgdl
        );

        Self {
            params,
            postings,
            idf,
            doc_lengths,
            avgdl,
        }
    }

    /// Okapi IDF with negative values floored to `epsilon * average_idf`.
    ///
    /// Terms are summed in sorted order so the floor is bit-identical across runs.
    fn compute_idf(
        postings: &HashMap<String, Vec<Posting>>,
        doc_count: usize,
        epsilon: f64,
    ) -> HashMap<String, f64> {
        let n = doc_count as f64;
        let mut terms: Vec<&String> = postings.keys().collect();
        terms.sort_unstable();

        let mut idf = HashMap::with_capacity(terms.len());
        let mut idf_sum = 0.0;
        let mut negative = Vec::new();

        for term in terms {
            let df = postings[term].len() as f64;
            let value = (n - df + 0.5).ln() - (df + 0.5).ln();
            idf_sum += value;
            if value < 0.0 {
                negative.push(term.clone());
            }
            idf.insert(term.clone(), value);
        }

        if !idf.is_empty() {
            let floor = epsilon * idf_sum / idf.len() as f64;
            for term in negative {
                idf.insert(term, floor);
            }
        }

        idf
    }

    /// Score every document against the query, indexed by corpus position.
    ///
    /// Repeated query tokens contribute once per occurrence. An empty query
    /// yields all zeros.
    pub fn scores(&self, query: &str) -> Vec<f64> {
        let mut scores = vec![0.0; self.doc_lengths.len()];
        let Bm25Params { k1, b, .. } = self.params;

        for token in tokenize(query) {
            let (Some(postings), Some(&idf)) = (self.postings.get(&token), self.idf.get(&token))
            else {
                continue;
            };

            for posting in postings {
                let tf = posting.term_frequency as f64;
                let dl = self.doc_lengths[posting.position as usize] as f64;
                let tf_norm = tf * (k1 + 1.0) / (tf + k1 * (1.0 - b + b * dl / self.avgdl));
                scores[posting.position as usize] += idf * tf_norm;
            }
        }

        scores
    }

    /// IDF of a term after flooring, if the term occurs in the corpus.
    pub fn idf(&self, term: &str) -> Option<f64> {
        self.idf.get(term).copied()
    }

    /// Number of indexed documents.
    pub fn doc_count(&self) -> usize {
        self.doc_lengths.len()
    }

    /// Number of distinct terms.
    pub fn vocabulary_size(&self) -> usize {
        self.postings.len()
    }

    /// Average document length in tokens.
    pub fn average_doc_length(&self) -> f64 {
        self.avgdl
    }

    /// Parameters the index was built with.
    pub fn params(&self) -> Bm25Params {
        self.params
    }
}

/// Select the `n` best positions, highest score first, ties by ascending position.
pub fn top_n(scores: &[f64], n: usize) -> Vec<(usize, f64)> {
    let mut ranked: Vec<(usize, f64)> = scores.iter().copied().enumerate().collect();
    ranked.sort_unstable_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(n);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyfuse_core::Document;

    fn corpus(texts: &[&str]) -> Corpus {
        Corpus::from_documents(
            texts
                .iter()
                .enumerate()
                .map(|(i, t)| Document::new(i as i64, *t)),
        )
        .unwrap()
    }

    fn vehicle_corpus() -> Corpus {
        Corpus::from_documents(vec![
            Document::new("A", "brake failure report"),
            Document::new("B", "headlight issue bright"),
            Document::new("C", "brake and headlight combined"),
        ])
        .unwrap()
    }

    #[test]
    fn test_empty_query_scores_zero() {
        let index = Bm25Index::build(&vehicle_corpus(), Bm25Params::default());
        let scores = index.scores("");
        assert_eq!(scores, vec![0.0, 0.0, 0.0]);

        let scores = index.scores("  ?! ");
        assert_eq!(scores, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_both_terms_outrank_single_term() {
        let index = Bm25Index::build(&vehicle_corpus(), Bm25Params::default());
        let scores = index.scores("brake headlight");

        assert!(scores[0] > 0.0);
        assert_eq!(scores[0], scores[1], "A and B match one term each at equal length");
        assert!(scores[2] > scores[0]);
    }

    #[test]
    fn test_negative_idf_is_floored() {
        let index = Bm25Index::build(&vehicle_corpus(), Bm25Params::default());

        // "brake" occurs in 2 of 3 documents, so the raw Okapi IDF is negative.
        let raw = (3.0f64 - 2.0 + 0.5).ln() - (2.0f64 + 0.5).ln();
        assert!(raw < 0.0);

        let rare = index.idf("failure").unwrap();
        let floored = index.idf("brake").unwrap();
        assert!(floored > 0.0);
        assert!(floored < rare);

        // 6 terms with df=1 and 2 terms with df=2 across 8 vocabulary entries.
        let average = (6.0 * -raw + 2.0 * raw) / 8.0;
        assert!((floored - 0.25 * average).abs() < 1e-12);
    }

    #[test]
    fn test_term_frequency_saturates_upward() {
        let index = Bm25Index::build(
            &corpus(&["rust rust rust", "rust programming", "python scripting"]),
            Bm25Params::default(),
        );
        let scores = index.scores("rust");
        assert!(scores[0] > scores[1]);
        assert_eq!(scores[2], 0.0);
    }

    #[test]
    fn test_length_normalization() {
        let index = Bm25Index::build(
            &corpus(&[
                "engine stall",
                "engine stall while driving on the highway at night",
                "transmission slip",
                "airbag light",
                "seat belt latch",
            ]),
            Bm25Params::default(),
        );
        let scores = index.scores("stall");
        assert!(scores[0] > scores[1], "shorter document should score higher");
    }

    #[test]
    fn test_unknown_term_and_repeated_token() {
        let index = Bm25Index::build(&vehicle_corpus(), Bm25Params::default());
        assert_eq!(index.scores("nonexistent"), vec![0.0, 0.0, 0.0]);

        let once = index.scores("failure");
        let twice = index.scores("failure failure");
        assert_eq!(twice[0], once[0] * 2.0);
    }

    #[test]
    fn test_query_uses_same_normalization() {
        let index = Bm25Index::build(&vehicle_corpus(), Bm25Params::default());
        assert_eq!(index.scores("BRAKE, Failure!"), index.scores("brake failure"));
    }

    #[test]
    fn test_index_stats() {
        let index = Bm25Index::build(&vehicle_corpus(), Bm25Params::default());
        assert_eq!(index.doc_count(), 3);
        assert_eq!(index.vocabulary_size(), 8);
        assert!((index.average_doc_length() - 10.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_top_n_ties_by_position() {
        let ranked = top_n(&[0.5, 1.0, 0.5, 0.0, 1.0], 4);
        assert_eq!(ranked, vec![(1, 1.0), (4, 1.0), (0, 0.5), (2, 0.5)]);
    }

    #[test]
    fn test_top_n_larger_than_corpus() {
        let ranked = top_n(&[0.0, 0.0], 20);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].0, 0);
    }
}
