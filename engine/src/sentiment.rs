//! Bayesian-smoothed sentiment aggregation.
//!
//! Grounded in `context_normalize.py`'s inline scoring loop (per-review score
//! in {0, 0.5, 1}) and the `compute_sentiment_for_cafe` smoothing it calls.
//! Owns its own TTL cache over the derived smoothed score, separate from the
//! Data Access Layer's cache of raw review payloads — recomputing the
//! weighted mean on every fusion call would redo work the TTL window is
//! meant to amortize.

use crate::data_access::cache::TtlCache;
use crate::models::{CafeId, Review};
use std::time::Duration;

pub struct SentimentAggregator {
    mu: f64,
    c: f64,
    cache: TtlCache<CafeId, Option<f64>>,
}

fn review_score(review: &Review) -> Option<f64> {
    match review {
        Review::Probabilistic { p_pos, p_neu, p_neg } => {
            if *p_pos > 0.0 || *p_neu > 0.0 || *p_neg > 0.0 {
                Some(p_pos * 1.0 + p_neu * 0.5 + p_neg * 0.0)
            } else {
                None
            }
        }
        Review::Labeled { label } => {
            if label.starts_with("pos") {
                Some(1.0)
            } else if label.starts_with("neg") {
                Some(0.0)
            } else {
                Some(0.5)
            }
        }
        Review::Unknown => None,
    }
}

impl SentimentAggregator {
    pub fn new(mu: f64, c: f64, ttl: Duration) -> Self {
        Self {
            mu,
            c,
            cache: TtlCache::new(ttl),
        }
    }

    /// Smooths a raw review list into a single `[0,1]` score, or `None` if
    /// none of the reviews were scorable.
    fn smooth(&self, reviews: &[Review]) -> Option<f64> {
        let scores: Vec<f64> = reviews.iter().filter_map(review_score).collect();
        if scores.is_empty() {
            return None;
        }
        let n = scores.len() as f64;
        let raw_mean = scores.iter().sum::<f64>() / n;
        let smoothed = (raw_mean * n + self.mu * self.c) / (n + self.c);
        Some(smoothed.clamp(0.0, 1.0))
    }

    /// Returns the smoothed sentiment for `cafe_id`, computing and caching it
    /// via `fetch_reviews` on a cache miss. `None` means no scorable review
    /// exists for this café — callers that need a neutral fallback for
    /// fusion should substitute 0.5 themselves, per the distinction between
    /// "unknown" (aggregator output) and "neutral" (fusion input).
    pub async fn score<F, Fut>(&self, cafe_id: CafeId, fetch_reviews: F) -> Option<f64>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Vec<Review>>,
    {
        self.cache
            .get_or_fetch(cafe_id, || async { self.smooth(&fetch_reviews().await) })
            .await
    }

    pub async fn invalidate(&self) {
        self.cache.invalidate().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregator() -> SentimentAggregator {
        SentimentAggregator::new(0.6, 5.0, Duration::from_secs(3600))
    }

    #[test]
    fn test_review_score_probabilistic() {
        let r = Review::Probabilistic {
            p_pos: 0.7,
            p_neu: 0.2,
            p_neg: 0.1,
        };
        assert_eq!(review_score(&r), Some(0.7 * 1.0 + 0.2 * 0.5));
    }

    #[test]
    fn test_review_score_labeled() {
        assert_eq!(review_score(&Review::Labeled { label: "positive".into() }), Some(1.0));
        assert_eq!(review_score(&Review::Labeled { label: "negative".into() }), Some(0.0));
        assert_eq!(review_score(&Review::Labeled { label: "neutral".into() }), Some(0.5));
    }

    #[test]
    fn test_review_score_unknown_is_none() {
        assert_eq!(review_score(&Review::Unknown), None);
    }

    #[test]
    fn test_smooth_no_reviews_is_none() {
        let agg = aggregator();
        assert_eq!(agg.smooth(&[]), None);
    }

    #[test]
    fn test_smooth_pulls_toward_prior_for_small_n() {
        let agg = aggregator();
        // Single all-positive review: raw_mean = 1.0, n = 1, mu = 0.6, c = 5.
        // smoothed = (1.0*1 + 0.6*5) / (1+5) = 4.0/6 ≈ 0.6667
        let reviews = vec![Review::Labeled { label: "positive".into() }];
        let smoothed = agg.smooth(&reviews).unwrap();
        assert!((smoothed - (4.0 / 6.0)).abs() < 1e-9);
    }

    #[test]
    fn test_smooth_converges_to_raw_mean_for_large_n() {
        let agg = aggregator();
        let reviews: Vec<Review> = (0..1000)
            .map(|_| Review::Labeled { label: "positive".into() })
            .collect();
        let smoothed = agg.smooth(&reviews).unwrap();
        assert!(smoothed > 0.99);
    }

    #[tokio::test]
    async fn test_score_caches_result() {
        let agg = aggregator();
        let calls = std::sync::Arc::new(std::sync::atomic::AtomicU32::new(0));
        for _ in 0..2 {
            let calls = calls.clone();
            agg.score(1, || async move {
                calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                vec![Review::Labeled { label: "positive".into() }]
            })
            .await;
        }
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_score_none_for_unscorable_reviews() {
        let agg = aggregator();
        let result = agg.score(2, || async { vec![Review::Unknown] }).await;
        assert_eq!(result, None);
    }
}
