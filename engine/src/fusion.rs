//! Per-signal robust normalization and weighted score fusion.
//!
//! Ported from `combined_score.py`'s fusion loop (`robust_normalize_scores`,
//! `normalize_number`, the `w_cf/w_vf/w_co/w_sent_and_rate` weights).

use crate::models::ScoreMap;

/// Robust percentile normalization: divides every value by the 95th
/// percentile of the dictionary's values, capped at 1.0. An all-zero
/// dictionary yields all zeros; an empty dictionary yields an empty map.
pub fn robust_normalize(scores: &ScoreMap, pct: f64) -> ScoreMap {
    if scores.is_empty() {
        return ScoreMap::new();
    }
    let mut values: Vec<f64> = scores.values().copied().collect();
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let p = percentile(&values, pct);
    if p <= 0.0 {
        return scores.keys().map(|&k| (k, 0.0)).collect();
    }
    scores.iter().map(|(&k, &v)| (k, (v / p).min(1.0))).collect()
}

/// Linear-interpolated percentile over an already-sorted slice, matching
/// `numpy.percentile`'s default behavior.
fn percentile(sorted: &[f64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = (pct / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let frac = rank - lower as f64;
        sorted[lower] * (1.0 - frac) + sorted[upper] * frac
    }
}

/// `rating_n = clamp(rating/5, 0, 1)`; callers pass 0.0 for missing ratings.
pub fn normalize_rating(rating: f64) -> f64 {
    (rating / 5.0).clamp(0.0, 1.0)
}

pub struct FusionWeights {
    pub w_cf: f64,
    pub w_vf: f64,
    pub w_co: f64,
    pub w_sent_and_rate: f64,
}

/// Fuses the three normalized signal scores plus the rating/sentiment
/// content subscore into the final candidate score.
pub fn fuse(weights: &FusionWeights, cf_n: f64, vf_n: f64, co_n: f64, sent_n: f64, rating_n: f64) -> f64 {
    let sent_and_rate = (sent_n + rating_n) / 2.0;
    weights.w_cf * cf_n + weights.w_vf * vf_n + weights.w_co * co_n + weights.w_sent_and_rate * sent_and_rate
}

/// Orders candidates by descending score, then descending raw CF score, then
/// ascending café id — the deterministic tie-break from §4.5.
pub fn tie_break_cmp(
    (a_score, a_raw_cf, a_cafe_id): (f64, f64, i64),
    (b_score, b_raw_cf, b_cafe_id): (f64, f64, i64),
) -> std::cmp::Ordering {
    b_score
        .partial_cmp(&a_score)
        .unwrap_or(std::cmp::Ordering::Equal)
        .then_with(|| b_raw_cf.partial_cmp(&a_raw_cf).unwrap_or(std::cmp::Ordering::Equal))
        .then_with(|| a_cafe_id.cmp(&b_cafe_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_robust_normalize_empty_is_empty() {
        assert!(robust_normalize(&ScoreMap::new(), 95.0).is_empty());
    }

    #[test]
    fn test_robust_normalize_all_zero_stays_zero() {
        let scores: ScoreMap = [(1, 0.0), (2, 0.0)].into_iter().collect();
        let normalized = robust_normalize(&scores, 95.0);
        assert_eq!(normalized.get(&1), Some(&0.0));
        assert_eq!(normalized.get(&2), Some(&0.0));
    }

    #[test]
    fn test_robust_normalize_max_value_caps_at_one() {
        let scores: ScoreMap = [(1, 10.0), (2, 1.0)].into_iter().collect();
        let normalized = robust_normalize(&scores, 95.0);
        assert!(normalized.get(&1).copied().unwrap() <= 1.0);
        // argmax should land at or very near 1.0 for a two-point set at p95.
        assert!(normalized.get(&1).copied().unwrap() > 0.9);
    }

    #[test]
    fn test_normalize_rating_clamps() {
        assert_eq!(normalize_rating(4.0), 0.8);
        assert_eq!(normalize_rating(10.0), 1.0);
        assert_eq!(normalize_rating(-1.0), 0.0);
    }

    #[test]
    fn test_fuse_matches_weighted_formula() {
        let weights = FusionWeights {
            w_cf: 0.5,
            w_vf: 0.2,
            w_co: 0.2,
            w_sent_and_rate: 0.1,
        };
        let score = fuse(&weights, 1.0, 1.0, 1.0, 1.0, 1.0);
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_tie_break_prefers_smaller_cafe_id() {
        let a = (0.5, 0.0, 2);
        let b = (0.5, 0.0, 1);
        assert_eq!(tie_break_cmp(a, b), std::cmp::Ordering::Greater);
    }

    #[test]
    fn test_tie_break_prefers_higher_raw_cf_before_cafe_id() {
        let a = (0.5, 0.8, 5);
        let b = (0.5, 0.2, 1);
        assert_eq!(tie_break_cmp(a, b), std::cmp::Ordering::Less);
    }
}
