//! Offline evaluation harness: leave-last-M ranking metrics, and user-split
//! k-fold cross-validation for pointwise error.
//!
//! Grounded in `api_evaluate` in `ubcf_api/main.py` (hit-rate/MRR
//! leave-one-out), generalized to the ranking-at-K and CV layers this engine
//! adds; the candidate scoring path reuses the exact same fusion pipeline as
//! `recommender::RecommenderService`.

use crate::config::{Config, RANKING_K_SET};
use crate::data_access::DataAccessLayer;
use crate::fusion::{self, FusionWeights};
use crate::models::{CafeId, LikedMenu, ScoreMap, User, UserId};
use crate::pool::build_candidate_pool;
use crate::recommender::build_cf_model;
use crate::sentiment::SentimentAggregator;
use crate::signals::{co, ubcf_scores, vf_scores};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::sync::Arc;

pub struct Evaluator {
    dal: Arc<dyn DataAccessLayer>,
    sentiment: SentimentAggregator,
    weights: FusionWeights,
}

#[derive(Debug, Clone, Default)]
pub struct RankingMetrics {
    pub precision: BTreeMap<usize, f64>,
    pub recall: BTreeMap<usize, f64>,
    pub f1: BTreeMap<usize, f64>,
    pub ndcg: BTreeMap<usize, f64>,
}

#[derive(Debug, Clone, Default)]
pub struct FoldMetrics {
    pub rmse: f64,
    pub mae: f64,
}

#[derive(Debug, Clone, Default)]
pub struct CrossValidationReport {
    pub per_fold: Vec<FoldMetrics>,
    pub rmse: f64,
    pub mae: f64,
}

impl Evaluator {
    pub fn new(dal: Arc<dyn DataAccessLayer>, config: &Config) -> Self {
        Self {
            dal,
            sentiment: SentimentAggregator::new(
                crate::config::SENTIMENT_PRIOR_MU,
                crate::config::SENTIMENT_PRIOR_C,
                config.cache.sentiment_ttl,
            ),
            weights: FusionWeights {
                w_cf: config.fusion.w_cf,
                w_vf: config.fusion.w_vf,
                w_co: config.fusion.w_co,
                w_sent_and_rate: config.fusion.w_sent_and_rate,
            },
        }
    }

    /// (A) Ranking at K, averaged over every user with at least `m + 1`
    /// visits.
    pub async fn evaluate_ranking(&self, m: usize) -> RankingMetrics {
        let users = self.dal.get_all_users().await;
        let cf_model = build_cf_model(&users);
        let vf_input: Vec<(UserId, Vec<CafeId>)> =
            users.iter().map(|u| (u.user_id, u.visit_history.clone())).collect();
        let co_input: Vec<(UserId, Vec<LikedMenu>)> =
            users.iter().map(|u| (u.user_id, u.liked_menus.clone())).collect();

        let mut per_user: Vec<BTreeMap<usize, (f64, f64, f64, f64)>> = Vec::new();

        for user in &users {
            if user.visit_history.len() < m + 1 {
                continue;
            }
            let split_at = user.visit_history.len() - m;
            let history = user.visit_history[..split_at].to_vec();
            let relevant: std::collections::HashSet<CafeId> =
                user.visit_history[split_at..].iter().copied().collect();

            let ubcf_raw = ubcf_scores(user.user_id, &cf_model);

            let mut vf_input_for_user = vf_input.clone();
            if let Some(entry) = vf_input_for_user.iter_mut().find(|(uid, _)| *uid == user.user_id) {
                entry.1 = history.clone();
            }
            let vf_raw = vf_scores(user.user_id, &vf_input_for_user);

            let co_matches = co::co_scores(user.user_id, &co_input);
            let co_counts = co::co_counts(&co_matches);

            let mut pool = build_candidate_pool(&ubcf_raw, &vf_raw, &co_counts, &history);
            for id in &relevant {
                if !pool.contains(id) {
                    pool.push(*id);
                }
            }
            if pool.is_empty() {
                continue;
            }

            let scored = self.score_pool(&pool, &ubcf_raw, &vf_raw, &co_counts).await;
            let mut ranked: Vec<CafeId> = scored.iter().map(|(id, _)| *id).collect();
            ranked.sort_by(|&a, &b| {
                fusion::tie_break_cmp(
                    (
                        scored.iter().find(|(id, _)| *id == a).unwrap().1,
                        ubcf_raw.get(&a).copied().unwrap_or(0.0),
                        a,
                    ),
                    (
                        scored.iter().find(|(id, _)| *id == b).unwrap().1,
                        ubcf_raw.get(&b).copied().unwrap_or(0.0),
                        b,
                    ),
                )
            });

            let mut metrics_at_k = BTreeMap::new();
            for &k in RANKING_K_SET.iter() {
                let top_k: Vec<CafeId> = ranked.iter().take(k).copied().collect();
                let hits = top_k.iter().filter(|id| relevant.contains(id)).count();
                let precision_denom = k.min(ranked.len()).max(1);
                let precision = hits as f64 / precision_denom as f64;
                let recall = if relevant.is_empty() {
                    0.0
                } else {
                    hits as f64 / relevant.len() as f64
                };
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                let dcg: f64 = top_k
                    .iter()
                    .enumerate()
                    .filter(|(_, id)| relevant.contains(id))
                    .map(|(i, _)| 1.0 / ((i + 2) as f64).log2())
                    .sum();
                let ideal_hits = k.min(relevant.len());
                let idcg: f64 = (0..ideal_hits).map(|i| 1.0 / ((i + 2) as f64).log2()).sum();
                let ndcg = if idcg > 0.0 { dcg / idcg } else { 0.0 };
                metrics_at_k.insert(k, (precision, recall, f1, ndcg));
            }
            per_user.push(metrics_at_k);
        }

        let mut result = RankingMetrics::default();
        for &k in RANKING_K_SET.iter() {
            let n = per_user.len().max(1) as f64;
            let (mut p, mut r, mut f, mut nd) = (0.0, 0.0, 0.0, 0.0);
            for user_metrics in &per_user {
                if let Some(&(pp, rr, ff, ndng)) = user_metrics.get(&k) {
                    p += pp;
                    r += rr;
                    f += ff;
                    nd += ndng;
                }
            }
            let denom = if per_user.is_empty() { 1.0 } else { n };
            result.precision.insert(k, p / denom);
            result.recall.insert(k, r / denom);
            result.f1.insert(k, f / denom);
            result.ndcg.insert(k, nd / denom);
        }
        result
    }

    /// (B) User-split k-fold cross validation, deterministic for a fixed
    /// seed and fold count.
    pub async fn evaluate_cv(&self, folds: usize, seed: u64) -> CrossValidationReport {
        let users = self.dal.get_all_users().await;
        if users.is_empty() || folds == 0 {
            tracing::info!(folds, "no users or zero folds requested, reporting zero metrics");
            return CrossValidationReport::default();
        }

        let mut ordered: Vec<UserId> = users.iter().map(|u| u.user_id).collect();
        ordered.sort_unstable();
        let mut rng = StdRng::seed_from_u64(seed);
        ordered.shuffle(&mut rng);

        let mut fold_of: std::collections::HashMap<UserId, usize> = std::collections::HashMap::new();
        for (i, uid) in ordered.iter().enumerate() {
            fold_of.insert(*uid, i % folds);
        }

        let mut per_fold = Vec::with_capacity(folds);
        let mut all_mse = Vec::new();
        let mut all_mae = Vec::new();

        for fold in 0..folds {
            let train_users: Vec<User> = users
                .iter()
                .filter(|u| fold_of.get(&u.user_id) != Some(&fold))
                .cloned()
                .collect();
            let test_users: Vec<&User> = users
                .iter()
                .filter(|u| fold_of.get(&u.user_id) == Some(&fold) && u.visit_history.len() >= 2)
                .collect();

            let train_cf_model = build_cf_model(&train_users);

            let mut fold_mse = Vec::new();
            let mut fold_mae = Vec::new();

            for user in &test_users {
                let split_at = user.visit_history.len() - 1;
                let history = user.visit_history[..split_at].to_vec();
                let target = user.visit_history[split_at];

                // UBCF is empty for this user since it never joined the
                // trained model's rows — the existing "absent from model"
                // rule already produces an empty map here.
                let ubcf_raw = ubcf_scores(user.user_id, &train_cf_model);

                let mut vf_input: Vec<(UserId, Vec<CafeId>)> = train_users
                    .iter()
                    .map(|u| (u.user_id, u.visit_history.clone()))
                    .collect();
                vf_input.push((user.user_id, history.clone()));
                let vf_raw = vf_scores(user.user_id, &vf_input);

                let mut co_input: Vec<(UserId, Vec<LikedMenu>)> = train_users
                    .iter()
                    .map(|u| (u.user_id, u.liked_menus.clone()))
                    .collect();
                co_input.push((user.user_id, user.liked_menus.clone()));
                let co_matches = co::co_scores(user.user_id, &co_input);
                let co_counts = co::co_counts(&co_matches);

                let mut pool = build_candidate_pool(&ubcf_raw, &vf_raw, &co_counts, &history);
                if !pool.contains(&target) {
                    pool.push(target);
                }
                if pool.is_empty() {
                    continue;
                }

                let scored = self.score_pool(&pool, &ubcf_raw, &vf_raw, &co_counts).await;
                let squared_errors: Vec<f64> = scored
                    .iter()
                    .map(|&(id, p)| {
                        let a = if id == target { 1.0 } else { 0.0 };
                        (p - a).powi(2)
                    })
                    .collect();
                let abs_errors: Vec<f64> = scored
                    .iter()
                    .map(|&(id, p)| {
                        let a = if id == target { 1.0 } else { 0.0 };
                        (p - a).abs()
                    })
                    .collect();
                let mse = squared_errors.iter().sum::<f64>() / squared_errors.len() as f64;
                let mae = abs_errors.iter().sum::<f64>() / abs_errors.len() as f64;
                fold_mse.push(mse);
                fold_mae.push(mae);
            }

            let fold_rmse = if fold_mse.is_empty() {
                0.0
            } else {
                (fold_mse.iter().sum::<f64>() / fold_mse.len() as f64).sqrt()
            };
            let fold_mae_avg = if fold_mae.is_empty() {
                0.0
            } else {
                fold_mae.iter().sum::<f64>() / fold_mae.len() as f64
            };

            all_mse.extend(fold_mse);
            all_mae.extend(fold_mae);
            per_fold.push(FoldMetrics {
                rmse: fold_rmse,
                mae: fold_mae_avg,
            });
        }

        let overall_rmse = if all_mse.is_empty() {
            0.0
        } else {
            (all_mse.iter().sum::<f64>() / all_mse.len() as f64).sqrt()
        };
        let overall_mae = if all_mae.is_empty() {
            0.0
        } else {
            all_mae.iter().sum::<f64>() / all_mae.len() as f64
        };

        CrossValidationReport {
            per_fold,
            rmse: overall_rmse,
            mae: overall_mae,
        }
    }

    async fn score_pool(
        &self,
        pool: &[CafeId],
        ubcf_raw: &ScoreMap,
        vf_raw: &ScoreMap,
        co_counts: &ScoreMap,
    ) -> Vec<(CafeId, f64)> {
        let cf_norm = fusion::robust_normalize(ubcf_raw, 95.0);
        let vf_norm = fusion::robust_normalize(vf_raw, 95.0);
        let co_norm = fusion::robust_normalize(co_counts, 95.0);

        let mut out = Vec::with_capacity(pool.len());
        for &cafe_id in pool {
            let cafe = self.dal.get_cafe(cafe_id).await;
            let rating = cafe.as_ref().map(|c| c.rating).unwrap_or(0.0);
            let reviews = self.dal.get_reviews(cafe_id).await;
            let sent_n = self
                .sentiment
                .score(cafe_id, || async { reviews })
                .await
                .unwrap_or(0.5);
            let rating_n = fusion::normalize_rating(rating);

            let cf_n = cf_norm.get(&cafe_id).copied().unwrap_or(0.0);
            let vf_n = vf_norm.get(&cafe_id).copied().unwrap_or(0.0);
            let co_n = co_norm.get(&cafe_id).copied().unwrap_or(0.0);
            let score = fusion::fuse(&self.weights, cf_n, vf_n, co_n, sent_n, rating_n);
            out.push((cafe_id, score));
        }
        out
    }
}
