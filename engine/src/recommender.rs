//! Orchestrates the full recommendation pipeline: Data Access Layer → CF
//! model build → three signal extractors → candidate pool → per-candidate
//! content fetch → fusion → sort → Top-K.
//!
//! Mirrors `api_recommend` in `ubcf_api/main.py` end to end, generalized to
//! the café/sentiment fusion this engine adds on top of the plain
//! CF+VF+CO blend.

use crate::cf::{CfModel, Interaction};
use crate::config::{Config, TOP_K};
use crate::data_access::DataAccessLayer;
use crate::fusion::{self, FusionWeights};
use crate::models::{round2, CafeId, Recommendation, ScoreMap, UserId};
use crate::pool::build_candidate_pool;
use crate::sentiment::SentimentAggregator;
use crate::signals::{co, ubcf_scores, vf_scores};
use std::sync::Arc;

pub struct RecommenderService {
    dal: Arc<dyn DataAccessLayer>,
    sentiment: SentimentAggregator,
    weights: FusionWeights,
}

impl RecommenderService {
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

    /// `recommend(user_id) -> list<Recommendation>`. Returns `[]` for a
    /// cold-start user (no visit history) or once the candidate pool is
    /// empty — no exception ever crosses this boundary.
    pub async fn recommend(&self, user_id: UserId) -> Vec<Recommendation> {
        let visited = self.dal.get_visited(user_id).await;
        if visited.is_empty() {
            tracing::debug!(user_id, "cold-start user, skipping recommendation");
            return Vec::new();
        }

        let all_users = self.dal.get_all_users().await;
        let cf_model = build_cf_model(&all_users);
        if cf_model.is_empty() {
            tracing::info!(user_id, "empty CF model, falling back to VF/CO signals only");
        }

        let ubcf_raw = ubcf_scores(user_id, &cf_model);
        let vf_input: Vec<(UserId, Vec<CafeId>)> = all_users
            .iter()
            .map(|u| (u.user_id, u.visit_history.clone()))
            .collect();
        let vf_raw = vf_scores(user_id, &vf_input);

        let co_input: Vec<(UserId, Vec<crate::models::LikedMenu>)> = all_users
            .iter()
            .map(|u| (u.user_id, u.liked_menus.clone()))
            .collect();
        let co_matches = co::co_scores(user_id, &co_input);
        let co_counts = co::co_counts(&co_matches);

        let pool = build_candidate_pool(&ubcf_raw, &vf_raw, &co_counts, &visited);
        if pool.is_empty() {
            tracing::debug!(user_id, "candidate pool empty after visited filter");
            return Vec::new();
        }

        let candidates = self
            .score_candidates(&pool, &ubcf_raw, &vf_raw, &co_counts, &co_matches)
            .await;

        let mut ranked = candidates;
        ranked.sort_by(|a, b| {
            fusion::tie_break_cmp(
                (a.score, ubcf_raw.get(&a.cafe_id).copied().unwrap_or(0.0), a.cafe_id),
                (b.score, ubcf_raw.get(&b.cafe_id).copied().unwrap_or(0.0), b.cafe_id),
            )
        });
        ranked.truncate(TOP_K);
        ranked
            .into_iter()
            .map(|c| Recommendation {
                cafe_id: c.cafe_id,
                name: c.name,
                address: c.address,
                rating: c.rating,
                sentiment: round2(c.sentiment),
                score: round2(c.score),
                matched_menu: c.matched_menu,
            })
            .collect()
    }

    async fn score_candidates(
        &self,
        pool: &[CafeId],
        ubcf_raw: &ScoreMap,
        vf_raw: &ScoreMap,
        co_counts: &ScoreMap,
        co_matches: &co::CoMatches,
    ) -> Vec<Recommendation> {
        let cf_norm = fusion::robust_normalize(ubcf_raw, 95.0);
        let vf_norm = fusion::robust_normalize(vf_raw, 95.0);
        let co_norm = fusion::robust_normalize(co_counts, 95.0);

        let mut out = Vec::with_capacity(pool.len());
        for &cafe_id in pool {
            let cafe = self.dal.get_cafe(cafe_id).await;
            let (name, address, rating) = match &cafe {
                Some(c) => (c.name.clone(), c.address.clone(), c.rating),
                None => (String::new(), String::new(), 0.0),
            };

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

            out.push(Recommendation {
                cafe_id,
                name,
                address,
                rating,
                sentiment: sent_n,
                score,
                matched_menu: co_matches.get(&cafe_id).cloned().unwrap_or_default(),
            });
        }
        out
    }
}

/// Flattens every user's liked-menu list into interactions and builds a CF
/// model from them.
pub fn build_cf_model(users: &[crate::models::User]) -> CfModel {
    let interactions: Vec<Interaction> = users
        .iter()
        .flat_map(|u| {
            u.liked_menus.iter().map(move |m| Interaction {
                user_id: u.user_id,
                cafe_id: m.cafe_id,
                price: m.price as f64,
            })
        })
        .collect();
    CfModel::build(&interactions)
}
