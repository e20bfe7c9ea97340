//! Weighted min-max fusion of lexical and dense rankings.

use std::collections::BTreeMap;

use hyfuse_core::{DocId, Metadata, ScoredPoint};

/// A document surfaced by at least one ranker, with raw scores.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub id: DocId,
    pub lexical_score: Option<f64>,
    pub dense_score: Option<f64>,
    pub payload: Option<Metadata>,
}

/// A candidate after normalization and weighting.
#[derive(Debug, Clone, PartialEq)]
pub struct FusedCandidate {
    pub id: DocId,

    /// `alpha * lexical + (1 - alpha) * dense`, absent sides counting as 0.
    pub combined: f64,

    /// Normalized lexical score, if the lexical ranker surfaced the document.
    pub lexical: Option<f64>,

    /// Normalized dense score, if the dense ranker surfaced the document.
    pub dense: Option<f64>,

    /// Payload attached by the dense ranker.
    pub payload: Option<Metadata>,
}

/// Observed score range of one ranker's candidates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinMax {
    pub min: f64,
    pub max: f64,
}

impl MinMax {
    /// Range of the given scores, `None` when there are none.
    pub fn observe(scores: impl IntoIterator<Item = f64>) -> Option<Self> {
        scores.into_iter().fold(None, |range, s| {
            Some(match range {
                None => Self { min: s, max: s },
                Some(Self { min, max }) => Self {
                    min: min.min(s),
                    max: max.max(s),
                },
            })
        })
    }

    /// Rescale into [0, 1]. A degenerate range maps everything to 0.0.
    pub fn normalize(&self, raw: f64) -> f64 {
        if self.max > self.min {
            (raw - self.min) / (self.max - self.min)
        } else {
            0.0
        }
    }
}

/// Union both candidate lists by id.
///
/// A dense id returned more than once keeps its first (highest) entry.
/// The result is ordered by ascending id.
pub fn union_candidates(lexical: &[(DocId, f64)], dense: Vec<ScoredPoint>) -> Vec<ScoredCandidate> {
    let mut candidates: BTreeMap<DocId, ScoredCandidate> = BTreeMap::new();

    for (id, score) in lexical {
        let entry = candidates
            .entry(id.clone())
            .or_insert_with(|| ScoredCandidate {
                id: id.clone(),
                lexical_score: None,
                dense_score: None,
                payload: None,
            });
        if entry.lexical_score.is_none() {
            entry.lexical_score = Some(*score);
        }
    }

    for point in dense {
        let entry = candidates
            .entry(point.id.clone())
            .or_insert_with(|| ScoredCandidate {
                id: point.id.clone(),
                lexical_score: None,
                dense_score: None,
                payload: None,
            });
        if entry.dense_score.is_none() {
            entry.dense_score = Some(f64::from(point.score));
            entry.payload = point.payload;
        }
    }

    candidates.into_values().collect()
}

/// Fuse the two rankings into one list sorted by combined score descending,
/// ties broken by ascending id.
///
/// Each side is normalized over its own candidates only, so the weighting
/// reflects what was retrieved rather than the whole corpus.
pub fn fuse(lexical: &[(DocId, f64)], dense: Vec<ScoredPoint>, alpha: f64) -> Vec<FusedCandidate> {
    let candidates = union_candidates(lexical, dense);

    let lexical_range = MinMax::observe(candidates.iter().filter_map(|c| c.lexical_score));
    let dense_range = MinMax::observe(candidates.iter().filter_map(|c| c.dense_score));

    let mut fused: Vec<FusedCandidate> = candidates
        .into_iter()
        .map(|c| {
            let lexical = c
                .lexical_score
                .zip(lexical_range)
                .map(|(raw, range)| range.normalize(raw));
            let dense = c
                .dense_score
                .zip(dense_range)
                .map(|(raw, range)| range.normalize(raw));
            let combined = alpha * lexical.unwrap_or(0.0) + (1.0 - alpha) * dense.unwrap_or(0.0);

            FusedCandidate {
                id: c.id,
                combined,
                lexical,
                dense,
                payload: c.payload,
            }
        })
        .collect();

    fused.sort_by(|a, b| b.combined.total_cmp(&a.combined).then_with(|| a.id.cmp(&b.id)));
    fused
}
