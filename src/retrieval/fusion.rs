//! Reciprocal-rank fusion of per-signal ranked lists.

use std::collections::HashMap;

use crate::models::{RetrievedChunk, Signal};
use crate::store::Hit;

/// Fusion constant. Dampens the gap between the top handful of ranks so a
/// chunk appearing mid-list in several signals can outrank a chunk that is
/// first in one signal only.
const RRF_K: f32 = 60.0;

/// One signal's ranked hit list, ordered best first.
pub struct SignalList {
    pub signal: Signal,
    pub hits: Vec<Hit>,
}

struct Fused {
    hit: Hit,
    score: f32,
    best_rank: usize,
    signals: Vec<Signal>,
}

/// Fuse ranked lists with reciprocal-rank fusion: each appearance at
/// 1-based rank r contributes 1 / (K + r) to the chunk's fused score.
/// Raw signal scores never mix; only ranks matter.
///
/// Ties break by best single-signal rank, then composite key, so equal-score
/// results order deterministically across runs.
pub fn reciprocal_rank_fusion(lists: Vec<SignalList>, top_k: usize) -> Vec<RetrievedChunk> {
    let mut fused: HashMap<(String, u32), Fused> = HashMap::new();

    for list in lists {
        for (i, hit) in list.hits.into_iter().enumerate() {
            let rank = i + 1;
            let contribution = 1.0 / (RRF_K + rank as f32);
            let key = (hit.document_id.clone(), hit.chunk_id);

            let entry = fused.entry(key).or_insert_with(|| Fused {
                hit,
                score: 0.0,
                best_rank: usize::MAX,
                signals: Vec::new(),
            });
            entry.score += contribution;
            entry.best_rank = entry.best_rank.min(rank);
            if !entry.signals.contains(&list.signal) {
                entry.signals.push(list.signal);
            }
        }
    }

    let mut results: Vec<Fused> = fused.into_values().collect();
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.best_rank.cmp(&b.best_rank))
            .then_with(|| {
                (a.hit.document_id.as_str(), a.hit.chunk_id)
                    .cmp(&(b.hit.document_id.as_str(), b.hit.chunk_id))
            })
    });
    results.truncate(top_k);

    results
        .into_iter()
        .map(|f| RetrievedChunk {
            document_id: f.hit.document_id,
            chunk_id: f.hit.chunk_id,
            filename: f.hit.filename,
            source_url: f.hit.source_url,
            content: f.hit.text,
            score: f.score,
            signals: f.signals,
        })
        .collect()
}
