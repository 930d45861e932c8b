//! Collaborative-filtering model: interaction matrix, mean-centering,
//! cosine similarity and a KNN index over the resulting distance matrix.
//!
//! Ported from `build_cf_model` in `ubcf_api/main.py`. `ndarray` has no
//! labeled-axis concept (unlike `pandas`'s `DataFrame` index alignment), so
//! the matrix is a plain `Array2<f64>` with parallel `Vec<UserId>` /
//! `Vec<CafeId>` vectors giving row/column identity.

use crate::config::KNN_K_CAP;
use crate::models::{CafeId, UserId};
use ndarray::Array2;
use std::collections::HashMap;

/// One observed (user, café, price) interaction, flattened out of every
/// user's liked-menu list.
pub struct Interaction {
    pub user_id: UserId,
    pub cafe_id: CafeId,
    pub price: f64,
}

pub struct CfModel {
    pub user_ids: Vec<UserId>,
    pub cafe_ids: Vec<CafeId>,
    /// Raw (pre-centering) interaction matrix, rows = users, cols = cafés.
    raw_matrix: Array2<f64>,
    /// Symmetric similarity matrix, `sim[i,j] = sim[j,i]`, diagonal 1.
    similarity: Array2<f64>,
    user_index: HashMap<UserId, usize>,
    cafe_index: HashMap<CafeId, usize>,
}

impl CfModel {
    /// Builds an empty model with no users and no cafés.
    pub fn empty() -> Self {
        Self {
            user_ids: Vec::new(),
            cafe_ids: Vec::new(),
            raw_matrix: Array2::zeros((0, 0)),
            similarity: Array2::zeros((0, 0)),
            user_index: HashMap::new(),
            cafe_index: HashMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.user_ids.is_empty() || self.cafe_ids.is_empty()
    }

    pub fn user_position(&self, user_id: UserId) -> Option<usize> {
        self.user_index.get(&user_id).copied()
    }

    pub fn cafe_position(&self, cafe_id: CafeId) -> Option<usize> {
        self.cafe_index.get(&cafe_id).copied()
    }

    /// Raw (pre-centering) interaction value for `user_id`/`cafe_id`, or 0.0
    /// if either is absent from the model.
    pub fn raw_value(&self, user_id: UserId, cafe_id: CafeId) -> f64 {
        match (self.user_position(user_id), self.cafe_position(cafe_id)) {
            (Some(u), Some(c)) => self.raw_matrix[[u, c]],
            _ => 0.0,
        }
    }

    pub fn similarity(&self, a: usize, b: usize) -> f64 {
        self.similarity[[a, b]]
    }

    /// The up-to-`KNN_K_CAP` nearest other users to `user_idx` by ascending
    /// distance (`1 - similarity`), excluding `user_idx` itself.
    pub fn neighbors(&self, user_idx: usize) -> Vec<usize> {
        let n = self.user_ids.len();
        if n <= 1 {
            return Vec::new();
        }
        let mut others: Vec<(usize, f64)> = (0..n)
            .filter(|&i| i != user_idx)
            .map(|i| (i, 1.0 - self.similarity[[user_idx, i]]))
            .collect();
        others.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        let k = KNN_K_CAP.min(others.len());
        others.into_iter().take(k).map(|(i, _)| i).collect()
    }

    /// Builds the model from the flattened interaction list. Repeated
    /// (user, café) tuples are aggregated by arithmetic mean, matching the
    /// pandas `pivot_table` default.
    pub fn build(interactions: &[Interaction]) -> Self {
        if interactions.is_empty() {
            return Self::empty();
        }

        let mut user_ids: Vec<UserId> = interactions.iter().map(|i| i.user_id).collect();
        user_ids.sort_unstable();
        user_ids.dedup();
        let mut cafe_ids: Vec<CafeId> = interactions.iter().map(|i| i.cafe_id).collect();
        cafe_ids.sort_unstable();
        cafe_ids.dedup();

        let user_index: HashMap<UserId, usize> =
            user_ids.iter().enumerate().map(|(i, &u)| (u, i)).collect();
        let cafe_index: HashMap<CafeId, usize> =
            cafe_ids.iter().enumerate().map(|(i, &c)| (c, i)).collect();

        let n_users = user_ids.len();
        let n_cafes = cafe_ids.len();
        let mut sums = Array2::<f64>::zeros((n_users, n_cafes));
        let mut counts = Array2::<f64>::zeros((n_users, n_cafes));

        for interaction in interactions {
            let u = user_index[&interaction.user_id];
            let c = cafe_index[&interaction.cafe_id];
            sums[[u, c]] += interaction.price;
            counts[[u, c]] += 1.0;
        }

        let mut raw_matrix = Array2::<f64>::zeros((n_users, n_cafes));
        for u in 0..n_users {
            for c in 0..n_cafes {
                if counts[[u, c]] > 0.0 {
                    raw_matrix[[u, c]] = sums[[u, c]] / counts[[u, c]];
                }
            }
        }

        let row_means: Vec<f64> = (0..n_users)
            .map(|u| raw_matrix.row(u).sum() / n_cafes as f64)
            .collect();

        let mut centered = raw_matrix.clone();
        for u in 0..n_users {
            for c in 0..n_cafes {
                centered[[u, c]] -= row_means[u];
            }
        }

        let norms: Vec<f64> = (0..n_users)
            .map(|u| centered.row(u).iter().map(|x| x * x).sum::<f64>().sqrt())
            .collect();

        let mut similarity = Array2::<f64>::zeros((n_users, n_users));
        for i in 0..n_users {
            similarity[[i, i]] = 1.0;
            for j in (i + 1)..n_users {
                let dot = centered.row(i).dot(&centered.row(j));
                let denom = norms[i] * norms[j] + 1e-8;
                let sim = if denom > 0.0 { (dot / denom).clamp(-1.0, 1.0) } else { 0.0 };
                similarity[[i, j]] = sim;
                similarity[[j, i]] = sim;
            }
        }

        Self {
            user_ids,
            cafe_ids,
            raw_matrix,
            similarity,
            user_index,
            cafe_index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_interactions_yield_empty_model() {
        let model = CfModel::build(&[]);
        assert!(model.is_empty());
        assert!(model.neighbors(0).is_empty());
    }

    #[test]
    fn test_single_user_model_has_no_neighbors() {
        let interactions = vec![Interaction {
            user_id: 1,
            cafe_id: 7,
            price: 10000.0,
        }];
        let model = CfModel::build(&interactions);
        assert!(!model.is_empty());
        let u = model.user_position(1).unwrap();
        assert!(model.neighbors(u).is_empty());
        assert_eq!(model.similarity(u, u), 1.0);
    }

    #[test]
    fn test_similarity_is_symmetric_and_bounded() {
        let interactions = vec![
            Interaction { user_id: 1, cafe_id: 1, price: 15000.0 },
            Interaction { user_id: 2, cafe_id: 2, price: 15000.0 },
            Interaction { user_id: 1, cafe_id: 2, price: 5000.0 },
            Interaction { user_id: 2, cafe_id: 1, price: 5000.0 },
        ];
        let model = CfModel::build(&interactions);
        let u1 = model.user_position(1).unwrap();
        let u2 = model.user_position(2).unwrap();
        assert_eq!(model.similarity(u1, u2), model.similarity(u2, u1));
        assert!(model.similarity(u1, u2) >= -1.0 && model.similarity(u1, u2) <= 1.0);
        assert_eq!(model.similarity(u1, u1), 1.0);
    }

    #[test]
    fn test_two_users_sharing_only_own_column_have_zero_similarity() {
        // Each user only has a single nonzero cell, in their own column;
        // mean-centering collapses both rows to an all-zero vector, so
        // similarity falls back to the epsilon-guarded zero case.
        let interactions = vec![
            Interaction { user_id: 1, cafe_id: 1, price: 15000.0 },
            Interaction { user_id: 2, cafe_id: 2, price: 15000.0 },
        ];
        let model = CfModel::build(&interactions);
        let u1 = model.user_position(1).unwrap();
        let u2 = model.user_position(2).unwrap();
        assert_eq!(model.similarity(u1, u2), 0.0);
    }

    #[test]
    fn test_raw_value_aggregates_repeated_tuples_by_mean() {
        let interactions = vec![
            Interaction { user_id: 1, cafe_id: 1, price: 10000.0 },
            Interaction { user_id: 1, cafe_id: 1, price: 20000.0 },
        ];
        let model = CfModel::build(&interactions);
        assert_eq!(model.raw_value(1, 1), 15000.0);
    }

    #[test]
    fn test_neighbors_excludes_self_and_caps_at_knn_k() {
        let interactions: Vec<Interaction> = (1..=10)
            .map(|uid| Interaction {
                user_id: uid,
                cafe_id: uid,
                price: 10000.0 * uid as f64,
            })
            .collect();
        let model = CfModel::build(&interactions);
        let u = model.user_position(1).unwrap();
        let neighbors = model.neighbors(u);
        assert!(!neighbors.contains(&u));
        assert!(neighbors.len() <= KNN_K_CAP);
    }
}
