//! Process-level configuration, loaded from the environment.
//!
//! Follows the same `from_env` convention used across the Nova services
//! (`graph-service`, `vlm-service`): a flat `Deserialize` struct with
//! `#[serde(default = "...")]` per field, loaded via `envy::from_env()`.

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub service: ServiceConfig,
    pub collaborator: CollaboratorConfig,
    pub cache: CacheConfig,
    pub fusion: FusionWeights,
    pub evaluator: EvaluatorConfig,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub http_port: u16,
}

#[derive(Debug, Clone)]
pub struct CollaboratorConfig {
    pub base_url: String,
    pub fetch_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub user_cafe_ttl: Duration,
    pub sentiment_ttl: Duration,
}

/// Fusion weights from §4.5 / §6: must sum to 1.0.
#[derive(Debug, Clone, Copy)]
pub struct FusionWeights {
    pub w_cf: f64,
    pub w_vf: f64,
    pub w_co: f64,
    pub w_sent_and_rate: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            w_cf: 0.5,
            w_vf: 0.2,
            w_co: 0.2,
            w_sent_and_rate: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EvaluatorConfig {
    pub default_m: usize,
    pub default_folds: usize,
    pub cv_seed: u64,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            default_m: 3,
            default_folds: 5,
            cv_seed: 42,
        }
    }
}

/// Bayesian smoothing prior for the sentiment aggregator (§4.2).
pub const SENTIMENT_PRIOR_MU: f64 = 0.6;
pub const SENTIMENT_PRIOR_C: f64 = 5.0;

/// KNN neighbourhood size cap (§4.3).
pub const KNN_K_CAP: usize = 7;

/// Per-signal top-N and pool cap (§4.6).
pub const TOP_N_EACH: usize = 50;
pub const POOL_CAP: usize = 300;

/// Final Top-K size (§4.7).
pub const TOP_K: usize = 6;

/// Ranking evaluation cut-offs (§4.8).
pub const RANKING_K_SET: [usize; 4] = [1, 3, 5, 10];

/// Flat shape envy reads straight from the environment. Nested structs like
/// `Config` itself aren't what `envy` deserializes into; it matches one level
/// of lowercase field names against env vars, so the grouping into
/// `ServiceConfig`/`CollaboratorConfig`/`CacheConfig` happens in `from_env`.
#[derive(Debug, Clone, Deserialize)]
struct EnvConfig {
    #[serde(default = "default_http_port")]
    http_port: u16,
    #[serde(default = "default_collaborator_base_url")]
    collaborator_base_url: String,
    #[serde(default = "default_fetch_timeout_secs")]
    fetch_timeout_secs: u64,
    #[serde(default = "default_user_cafe_cache_ttl_secs")]
    user_cafe_cache_ttl_secs: u64,
    #[serde(default = "default_sentiment_cache_ttl_secs")]
    sentiment_cache_ttl_secs: u64,
}

fn default_http_port() -> u16 {
    8090
}

fn default_collaborator_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_fetch_timeout_secs() -> u64 {
    6
}

fn default_user_cafe_cache_ttl_secs() -> u64 {
    2
}

fn default_sentiment_cache_ttl_secs() -> u64 {
    3600
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        let env = envy::from_env::<EnvConfig>()?;

        Ok(Config {
            service: ServiceConfig {
                http_port: env.http_port,
            },
            collaborator: CollaboratorConfig {
                base_url: env.collaborator_base_url,
                fetch_timeout: Duration::from_secs(env.fetch_timeout_secs),
            },
            cache: CacheConfig {
                user_cafe_ttl: Duration::from_secs(env.user_cafe_cache_ttl_secs),
                sentiment_ttl: Duration::from_secs(env.sentiment_cache_ttl_secs),
            },
            fusion: FusionWeights::default(),
            evaluator: EvaluatorConfig::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fusion_weights_sum_to_one() {
        let w = FusionWeights::default();
        let sum = w.w_cf + w.w_vf + w.w_co + w.w_sent_and_rate;
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_from_env_applies_defaults() {
        let config = Config::from_env().expect("default env config should load");
        assert_eq!(config.service.http_port, 8090);
        assert_eq!(config.cache.sentiment_ttl, Duration::from_secs(3600));
    }
}
