//! HTTP surface: `GET /recommend/{user_id}` and `GET /evaluate`.

use crate::config::{Config, EvaluatorConfig};
use crate::error::{AppError, Result};
use crate::evaluator::Evaluator;
use crate::recommender::RecommenderService;
use actix_web::{get, web, HttpResponse};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub struct AppState {
    pub recommender: RecommenderService,
    pub evaluator: Evaluator,
    pub evaluator_config: EvaluatorConfig,
}

#[derive(Serialize, Deserialize)]
struct RecommendResponse {
    recommendations: Vec<crate::models::Recommendation>,
}

#[get("/recommend/{user_id}")]
pub async fn recommend(path: web::Path<String>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let user_id: i64 = path
        .into_inner()
        .parse()
        .map_err(|_| AppError::InvalidInput("user_id must be an integer".to_string()))?;

    let recommendations = state.recommender.recommend(user_id).await;
    Ok(HttpResponse::Ok().json(RecommendResponse { recommendations }))
}

#[derive(Deserialize)]
pub struct EvaluateQuery {
    m: Option<usize>,
    folds: Option<usize>,
}

#[derive(Serialize)]
struct RankingMetricsResponse {
    precision: std::collections::BTreeMap<String, f64>,
    recall: std::collections::BTreeMap<String, f64>,
    #[serde(rename = "f1-score")]
    f1_score: std::collections::BTreeMap<String, f64>,
    ndcg: std::collections::BTreeMap<String, f64>,
}

#[derive(Serialize)]
struct FoldMetricsResponse {
    #[serde(rename = "RMSE")]
    rmse: f64,
    #[serde(rename = "MAE")]
    mae: f64,
}

#[derive(Serialize)]
struct CrossValidationResponse {
    per_fold: std::collections::BTreeMap<String, FoldMetricsResponse>,
    #[serde(rename = "RMSE")]
    rmse: f64,
    #[serde(rename = "MAE")]
    mae: f64,
}

#[derive(Serialize)]
struct EvaluateResponse {
    ranking_metrics: RankingMetricsResponse,
    #[serde(rename = "5-fold-cross-validation")]
    cross_validation: CrossValidationResponse,
}

#[get("/evaluate")]
pub async fn evaluate(query: web::Query<EvaluateQuery>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let m = query.m.unwrap_or(state.evaluator_config.default_m);
    let folds = query.folds.unwrap_or(state.evaluator_config.default_folds);

    let ranking = state.evaluator.evaluate_ranking(m).await;
    let cv = state.evaluator.evaluate_cv(folds, state.evaluator_config.cv_seed).await;

    let to_labeled = |map: &std::collections::BTreeMap<usize, f64>, prefix: &str| {
        map.iter()
            .map(|(k, v)| (format!("{}@{}", prefix, k), *v))
            .collect::<std::collections::BTreeMap<String, f64>>()
    };

    let response = EvaluateResponse {
        ranking_metrics: RankingMetricsResponse {
            precision: to_labeled(&ranking.precision, "precision"),
            recall: to_labeled(&ranking.recall, "recall"),
            f1_score: to_labeled(&ranking.f1, "f1"),
            ndcg: to_labeled(&ranking.ndcg, "ndcg"),
        },
        cross_validation: CrossValidationResponse {
            per_fold: cv
                .per_fold
                .iter()
                .enumerate()
                .map(|(i, f)| {
                    (
                        format!("fold-{}", i + 1),
                        FoldMetricsResponse {
                            rmse: f.rmse,
                            mae: f.mae,
                        },
                    )
                })
                .collect(),
            rmse: cv.rmse,
            mae: cv.mae,
        },
    };

    Ok(HttpResponse::Ok().json(response))
}

pub fn build_app_state(config: &Config, dal: Arc<dyn crate::data_access::DataAccessLayer>) -> web::Data<AppState> {
    web::Data::new(AppState {
        recommender: RecommenderService::new(dal.clone(), config),
        evaluator: Evaluator::new(dal, config),
        evaluator_config: config.evaluator,
    })
}
