//! Data Access Layer: cached fetchers over the collaborator API.
//!
//! Every fetch here can fail (network, HTTP, malformed JSON); failures
//! surface as an empty result, never as an exception/`Err`, per §4.1 and §7.

pub mod cache;
pub mod parse;

use crate::config::CacheConfig;
use crate::models::{Cafe, CafeId, LikedMenu, Review, User, UserId};
use async_trait::async_trait;
use cache::TtlCache;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::warn;

/// Abstract collaborator-backed data access, so the recommender and
/// evaluator can run unmodified against either the live HTTP implementation
/// or an in-memory fixture.
#[async_trait]
pub trait DataAccessLayer: Send + Sync {
    async fn get_all_users(&self) -> Vec<User>;
    async fn get_all_cafes(&self) -> Vec<Cafe>;
    async fn get_cafe(&self, id: CafeId) -> Option<Cafe>;
    async fn get_visited(&self, user_id: UserId) -> Vec<CafeId>;
    /// Returns the parsed review list backing a café's sentiment, trying
    /// `/api/sentiment/{id}` first and `/api/reviews/{id}` as a fallback.
    async fn get_reviews(&self, cafe_id: CafeId) -> Vec<Review>;
    /// Clears the user/café cache always; clears the sentiment-adjacent
    /// review cache only when `clear_sentiment` is true.
    async fn invalidate_caches(&self, clear_sentiment: bool);
}

/// Production implementation: talks to the collaborator API over HTTP, with
/// per-call timeouts and two process-wide TTL caches (users+cafés share one
/// short-lived cache; reviews get a longer-lived one since sentiment changes
/// slowly).
pub struct HttpDataAccessLayer {
    client: Client,
    base_url: String,
    fetch_timeout: Duration,
    users_cache: TtlCache<(), Vec<User>>,
    cafes_cache: TtlCache<(), Vec<Cafe>>,
    reviews_cache: TtlCache<CafeId, Vec<Review>>,
}

impl HttpDataAccessLayer {
    pub fn new(base_url: String, cache: &CacheConfig, fetch_timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url,
            fetch_timeout,
            users_cache: TtlCache::new(cache.user_cafe_ttl),
            cafes_cache: TtlCache::new(cache.user_cafe_ttl),
            reviews_cache: TtlCache::new(cache.sentiment_ttl),
        }
    }

    async fn fetch_json(&self, path: &str) -> Option<Value> {
        let url = format!("{}{}", self.base_url, path);
        let result = resilience::with_timeout_result(self.fetch_timeout, async {
            let resp = self.client.get(&url).send().await?;
            let resp = resp.error_for_status()?;
            resp.json::<Value>().await
        })
        .await;

        match result {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(url = %url, error = %e, "collaborator fetch failed");
                None
            }
        }
    }

    fn parse_user(value: &Value) -> Option<User> {
        let obj = value.as_object()?;
        let user_id = obj.get("id_user").and_then(|v| v.as_i64())?;
        let liked_menus: Vec<LikedMenu> = obj
            .get("menu_yang_disukai")
            .map(parse::parse_liked_menus)
            .unwrap_or_default();
        let visit_history: Vec<CafeId> = obj
            .get("cafe_telah_dikunjungi")
            .or_else(|| obj.get("visited"))
            .map(parse::parse_visited_list)
            .unwrap_or_default();
        Some(User {
            user_id,
            liked_menus,
            visit_history,
        })
    }
}

#[async_trait]
impl DataAccessLayer for HttpDataAccessLayer {
    async fn get_all_users(&self) -> Vec<User> {
        self.users_cache
            .get_or_fetch((), || async {
                let Some(ids) = self.fetch_json("/api/users").await else {
                    return Vec::new();
                };
                let Some(ids) = ids.as_array() else {
                    return Vec::new();
                };
                ids.iter().filter_map(Self::parse_user).collect()
            })
            .await
    }

    async fn get_all_cafes(&self) -> Vec<Cafe> {
        self.cafes_cache
            .get_or_fetch((), || async {
                let Some(data) = self.fetch_json("/api/data").await else {
                    return Vec::new();
                };
                let Some(arr) = data.as_array() else {
                    return Vec::new();
                };
                arr.iter().filter_map(parse::parse_cafe).collect()
            })
            .await
    }

    async fn get_cafe(&self, id: CafeId) -> Option<Cafe> {
        if let Some(cafes) = self.cafes_cache.get(&()).await {
            if let Some(cafe) = cafes.into_iter().find(|c| c.cafe_id == id) {
                return Some(cafe);
            }
        }
        let value = self.fetch_json(&format!("/api/cafe/{}", id)).await?;
        parse::parse_cafe(&value)
    }

    async fn get_visited(&self, user_id: UserId) -> Vec<CafeId> {
        let Some(value) = self.fetch_json(&format!("/api/visited/{}", user_id)).await else {
            return Vec::new();
        };
        parse::parse_visited_list(&value)
    }

    async fn get_reviews(&self, cafe_id: CafeId) -> Vec<Review> {
        self.reviews_cache
            .get_or_fetch(cafe_id, || async {
                let raw = self.fetch_json(&format!("/api/sentiment/{}", cafe_id)).await;
                let raw_list = raw.as_ref().map(parse::extract_review_list).unwrap_or_default();
                let raw_list = if raw_list.is_empty() {
                    let fallback = self.fetch_json(&format!("/api/reviews/{}", cafe_id)).await;
                    fallback.as_ref().map(parse::extract_review_list).unwrap_or_default()
                } else {
                    raw_list
                };
                raw_list.iter().map(parse::parse_review).collect()
            })
            .await
    }

    async fn invalidate_caches(&self, clear_sentiment: bool) {
        self.users_cache.invalidate().await;
        self.cafes_cache.invalidate().await;
        if clear_sentiment {
            self.reviews_cache.invalidate().await;
        }
    }
}

/// In-memory fixture implementation used by tests and by the evaluator's
/// per-fold subset views (constructing a scoped data access layer over a
/// subset of users without round-tripping through the network).
#[derive(Default)]
pub struct InMemoryDataAccessLayer {
    users: std::sync::RwLock<HashMap<UserId, User>>,
    cafes: std::sync::RwLock<HashMap<CafeId, Cafe>>,
    reviews: std::sync::RwLock<HashMap<CafeId, Vec<Review>>>,
}

impl InMemoryDataAccessLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: Vec<User>) -> Self {
        let layer = Self::new();
        for u in users {
            layer.add_user(u);
        }
        layer
    }

    pub fn add_user(&self, user: User) {
        self.users.write().unwrap().insert(user.user_id, user);
    }

    pub fn add_cafe(&self, cafe: Cafe) {
        self.cafes.write().unwrap().insert(cafe.cafe_id, cafe);
    }

    pub fn set_reviews(&self, cafe_id: CafeId, reviews: Vec<Review>) {
        self.reviews.write().unwrap().insert(cafe_id, reviews);
    }
}

#[async_trait]
impl DataAccessLayer for InMemoryDataAccessLayer {
    async fn get_all_users(&self) -> Vec<User> {
        self.users.read().unwrap().values().cloned().collect()
    }

    async fn get_all_cafes(&self) -> Vec<Cafe> {
        self.cafes.read().unwrap().values().cloned().collect()
    }

    async fn get_cafe(&self, id: CafeId) -> Option<Cafe> {
        self.cafes.read().unwrap().get(&id).cloned()
    }

    async fn get_visited(&self, user_id: UserId) -> Vec<CafeId> {
        self.users
            .read()
            .unwrap()
            .get(&user_id)
            .map(|u| u.visit_history.clone())
            .unwrap_or_default()
    }

    async fn get_reviews(&self, cafe_id: CafeId) -> Vec<Review> {
        self.reviews.read().unwrap().get(&cafe_id).cloned().unwrap_or_default()
    }

    async fn invalidate_caches(&self, _clear_sentiment: bool) {
        // No TTL semantics to clear in the fixture.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LikedMenu;

    #[tokio::test]
    async fn test_in_memory_layer_round_trip() {
        let layer = InMemoryDataAccessLayer::new();
        layer.add_user(User {
            user_id: 1,
            liked_menus: vec![LikedMenu {
                cafe_id: 7,
                menu_name: "Latte".into(),
                price: 15000,
            }],
            visit_history: vec![7, 3],
        });
        layer.add_cafe(Cafe {
            cafe_id: 7,
            name: "Kafe A".into(),
            address: "Jl. A".into(),
            rating: 4.5,
            facilities: None,
        });

        let users = layer.get_all_users().await;
        assert_eq!(users.len(), 1);
        assert_eq!(layer.get_visited(1).await, vec![7, 3]);
        assert_eq!(layer.get_cafe(7).await.unwrap().name, "Kafe A");
        assert!(layer.get_cafe(999).await.is_none());
    }
}
