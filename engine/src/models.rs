//! Core data types shared across the engine.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type UserId = i64;
pub type CafeId = i64;

/// A café liked-menu record: what the user likes, where, and at what price.
#[derive(Debug, Clone, PartialEq)]
pub struct LikedMenu {
    pub cafe_id: CafeId,
    pub menu_name: String,
    pub price: i64,
}

/// A user, with their liked menus and chronological visit history.
#[derive(Debug, Clone, Default)]
pub struct User {
    pub user_id: UserId,
    pub liked_menus: Vec<LikedMenu>,
    pub visit_history: Vec<CafeId>,
}

/// A café as returned by the collaborator API.
#[derive(Debug, Clone)]
pub struct Cafe {
    pub cafe_id: CafeId,
    pub name: String,
    pub address: String,
    /// Clamped to [0, 5]; missing upstream rating is treated as 0.
    pub rating: f64,
    pub facilities: Option<String>,
}

/// A single review record, however it arrived upstream.
#[derive(Debug, Clone)]
pub enum Review {
    Probabilistic { p_pos: f64, p_neu: f64, p_neg: f64 },
    Labeled { label: String },
    Unknown,
}

/// `cafe_id -> score`, the universal signal type shared by every extractor
/// and by the fusion stage. Scores are always >= 0.
pub type ScoreMap = HashMap<CafeId, f64>;

/// A final ranked recommendation. Field names on the wire follow the
/// collaborator API's Indonesian naming (`nama_kafe`, `alamat`), matching
/// §6's `GET /recommend/{user_id}` response shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub cafe_id: CafeId,
    #[serde(rename = "nama_kafe")]
    pub name: String,
    #[serde(rename = "alamat")]
    pub address: String,
    pub rating: f64,
    pub sentiment: f64,
    pub score: f64,
    pub matched_menu: Vec<String>,
}

pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(0.123456), 0.12);
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(1.0), 1.0);
    }
}
