//! Read-only lexical snapshots with atomic rebuild.

use std::sync::{Arc, RwLock};

use hyfuse_core::{Corpus, DocId};
use tracing::info;

use crate::bm25::{top_n, Bm25Index, Bm25Params};

/// A corpus together with the BM25 index built from it.
#[derive(Debug)]
pub struct LexicalSnapshot {
    corpus: Arc<Corpus>,
    index: Bm25Index,
}

impl LexicalSnapshot {
    /// Build a snapshot over the corpus.
    pub fn build(corpus: Arc<Corpus>, params: Bm25Params) -> Self {
        let index = Bm25Index::build(&corpus, params);
        Self { corpus, index }
    }

    /// The indexed corpus.
    pub fn corpus(&self) -> &Arc<Corpus> {
        &self.corpus
    }

    /// The BM25 index.
    pub fn index(&self) -> &Bm25Index {
        &self.index
    }

    /// Score every document against the query.
    pub fn scores(&self, query: &str) -> Vec<f64> {
        self.index.scores(query)
    }

    /// The `n` best documents with their raw BM25 scores.
    pub fn top_candidates(&self, query: &str, n: usize) -> Vec<(DocId, f64)> {
        let scores = self.index.scores(query);
        top_n(&scores, n)
            .into_iter()
            .filter_map(|(position, score)| {
                self.corpus.get(position).map(|doc| (doc.id.clone(), score))
            })
            .collect()
    }
}

/// Holds the active lexical snapshot.
///
/// Queries grab an `Arc` to the current snapshot and never observe a rebuild
/// in progress: [`LexicalRanker::rebuild`] builds the replacement first and
/// only takes the write lock to swap the pointer.
#[derive(Debug)]
pub struct LexicalRanker {
    params: Bm25Params,
    active: RwLock<Arc<LexicalSnapshot>>,
}

impl LexicalRanker {
    /// Create a ranker over the corpus.
    pub fn new(corpus: impl Into<Arc<Corpus>>, params: Bm25Params) -> Self {
        let snapshot = LexicalSnapshot::build(corpus.into(), params);
        info!(
            "Lexical index ready: {} documents, {} terms",
            snapshot.index.doc_count(),
            snapshot.index.vocabulary_size()
        );
        Self {
            params,
            active: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// The snapshot queries should run against.
    pub fn snapshot(&self) -> Arc<LexicalSnapshot> {
        let guard = self.active.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&*guard)
    }

    /// Rebuild the index over a new corpus and swap it in.
    pub fn rebuild(&self, corpus: impl Into<Arc<Corpus>>) {
        let snapshot = Arc::new(LexicalSnapshot::build(corpus.into(), self.params));
        info!(
            "Lexical index rebuilt: {} documents, {} terms",
            snapshot.index.doc_count(),
            snapshot.index.vocabulary_size()
        );
        let mut guard = self.active.write().unwrap_or_else(|e| e.into_inner());
        *guard = snapshot;
    }

    /// BM25 parameters used for every build.
    pub fn params(&self) -> Bm25Params {
        self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyfuse_core::Document;

    fn corpus() -> Corpus {
        Corpus::from_documents(vec![
            Document::new("A", "brake failure report"),
            Document::new("B", "headlight issue bright"),
            Document::new("C", "brake and headlight combined"),
        ])
        .unwrap()
    }

    #[test]
    fn test_top_candidates() {
        let ranker = LexicalRanker::new(corpus(), Bm25Params::default());
        let candidates = ranker.snapshot().top_candidates("brake headlight", 20);

        let ids: Vec<DocId> = candidates.iter().map(|(id, _)| id.clone()).collect();
        assert_eq!(ids, vec![DocId::from("C"), DocId::from("A"), DocId::from("B")]);
        assert_eq!(candidates[1].1, candidates[2].1);
    }

    #[test]
    fn test_top_candidates_truncates() {
        let ranker = LexicalRanker::new(corpus(), Bm25Params::default());
        assert_eq!(ranker.snapshot().top_candidates("brake", 1).len(), 1);
    }

    #[test]
    fn test_rebuild_keeps_old_snapshot_alive() {
        let ranker = LexicalRanker::new(corpus(), Bm25Params::default());
        let before = ranker.snapshot();

        let replacement =
            Corpus::from_documents(vec![Document::new(1i64, "airbag did not deploy")]).unwrap();
        ranker.rebuild(replacement);

        let after = ranker.snapshot();
        assert_eq!(before.corpus().len(), 3);
        assert_eq!(after.corpus().len(), 1);
        assert_eq!(after.top_candidates("airbag", 5)[0].0, DocId::Int(1));
    }

    #[test]
    fn test_concurrent_readers_during_rebuild() {
        let ranker = Arc::new(LexicalRanker::new(corpus(), Bm25Params::default()));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let ranker = Arc::clone(&ranker);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        let snapshot = ranker.snapshot();
                        let scores = snapshot.scores("brake");
                        assert_eq!(scores.len(), snapshot.corpus().len());
                    }
                })
            })
            .collect();

        for _ in 0..10 {
            ranker.rebuild(corpus());
        }
        for reader in readers {
            reader.join().unwrap();
        }
    }
}
