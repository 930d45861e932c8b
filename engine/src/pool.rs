//! Candidate pool construction: union of top-N per signal, deduplicated and
//! capped, with visited cafés removed.
//!
//! Grounded in `build_candidate_pool_from_signals` (referenced by
//! `combined_score.py`) and structurally mirrored on
//! `RecallLayer::recall_candidates` / `deduplicate_and_merge` in
//! `ranking-service/src/services/recall/mod.rs`.

use crate::config::{POOL_CAP, TOP_N_EACH};
use crate::models::{CafeId, ScoreMap};
use std::collections::HashSet;

/// Returns the `top_n` café ids from `scores`, sorted by descending score
/// (ties broken by ascending id for determinism), preserving that order.
fn top_n(scores: &ScoreMap, top_n: usize) -> Vec<CafeId> {
    let mut entries: Vec<(CafeId, f64)> = scores.iter().map(|(&k, &v)| (k, v)).collect();
    entries.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    entries.into_iter().take(top_n).map(|(id, _)| id).collect()
}

/// Builds the candidate pool: top-50 by UBCF, top-50 by VF, top-50 by
/// `|CO matches|` (already as counts), concatenated in that signal order,
/// deduplicated keeping first occurrence, capped at 300, then filtered
/// against the visited set.
pub fn build_candidate_pool(ubcf: &ScoreMap, vf: &ScoreMap, co_counts: &ScoreMap, visited: &[CafeId]) -> Vec<CafeId> {
    let mut merged: Vec<CafeId> = Vec::new();
    let mut seen: HashSet<CafeId> = HashSet::new();

    for id in top_n(ubcf, TOP_N_EACH)
        .into_iter()
        .chain(top_n(vf, TOP_N_EACH))
        .chain(top_n(co_counts, TOP_N_EACH))
    {
        if seen.insert(id) {
            merged.push(id);
        }
        if merged.len() >= POOL_CAP {
            break;
        }
    }

    let visited_set: HashSet<CafeId> = visited.iter().copied().collect();
    merged.retain(|id| !visited_set.contains(id));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_signals_yield_empty_pool() {
        let pool = build_candidate_pool(&ScoreMap::new(), &ScoreMap::new(), &ScoreMap::new(), &[]);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_union_dedupes_across_signals() {
        let ubcf: ScoreMap = [(1, 0.9)].into_iter().collect();
        let vf: ScoreMap = [(1, 5.0), (2, 1.0)].into_iter().collect();
        let co: ScoreMap = [(3, 2.0)].into_iter().collect();
        let pool = build_candidate_pool(&ubcf, &vf, &co, &[]);
        let mut sorted = pool.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![1, 2, 3]);
        assert_eq!(pool.iter().filter(|&&id| id == 1).count(), 1);
    }

    #[test]
    fn test_visited_cafes_are_removed() {
        let ubcf: ScoreMap = [(1, 0.9), (2, 0.5)].into_iter().collect();
        let pool = build_candidate_pool(&ubcf, &ScoreMap::new(), &ScoreMap::new(), &[1]);
        assert_eq!(pool, vec![2]);
    }

    #[test]
    fn test_pool_caps_at_limit() {
        let ubcf: ScoreMap = (0..400).map(|i| (i, (400 - i) as f64)).collect();
        let pool = build_candidate_pool(&ubcf, &ScoreMap::new(), &ScoreMap::new(), &[]);
        assert!(pool.len() <= POOL_CAP);
    }
}
