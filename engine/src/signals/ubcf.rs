//! User-based collaborative filtering scorer.
//!
//! Ported from `rec_ubcf_scores`/`rec_menu_scores` in `ubcf_api/main.py`.

use crate::cf::CfModel;
use crate::models::{ScoreMap, UserId};

/// For every café the target user has no interaction with, predicts a score
/// from the weighted votes of their nearest neighbours. Returns an empty map
/// if the user is absent from the model.
pub fn ubcf_scores(user_id: UserId, model: &CfModel) -> ScoreMap {
    let Some(u) = model.user_position(user_id) else {
        return ScoreMap::new();
    };

    let neighbors = model.neighbors(u);
    if neighbors.is_empty() {
        return ScoreMap::new();
    }

    let mut scores = ScoreMap::new();
    for &cafe_id in &model.cafe_ids {
        if model.raw_value(user_id, cafe_id) != 0.0 {
            continue;
        }
        let mut num = 0.0;
        let mut den = 0.0;
        for &v in &neighbors {
            let sim = model.similarity(u, v);
            let v_id = model.user_ids[v];
            num += sim * model.raw_value(v_id, cafe_id);
            den += sim.abs();
        }
        let score = if den > 0.0 { num / den } else { 0.0 };
        if score > 0.0 {
            scores.insert(cafe_id, score);
        }
    }
    scores
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cf::Interaction;

    #[test]
    fn test_absent_user_returns_empty_map() {
        let model = CfModel::build(&[Interaction {
            user_id: 1,
            cafe_id: 7,
            price: 10000.0,
        }]);
        assert!(ubcf_scores(999, &model).is_empty());
    }

    #[test]
    fn test_single_user_has_no_ubcf_scores() {
        let model = CfModel::build(&[Interaction {
            user_id: 1,
            cafe_id: 7,
            price: 10000.0,
        }]);
        assert!(ubcf_scores(1, &model).is_empty());
    }

    #[test]
    fn test_positive_similarity_propagates_score() {
        let interactions = vec![
            Interaction { user_id: 1, cafe_id: 1, price: 20000.0 },
            Interaction { user_id: 1, cafe_id: 2, price: 10000.0 },
            Interaction { user_id: 2, cafe_id: 1, price: 20000.0 },
            Interaction { user_id: 2, cafe_id: 2, price: 10000.0 },
            Interaction { user_id: 2, cafe_id: 3, price: 30000.0 },
        ];
        let model = CfModel::build(&interactions);
        let scores = ubcf_scores(1, &model);
        // User 1 has an identical profile to user 2 over their shared cafés,
        // so similarity is 1.0 and café 3's score should be positive.
        assert!(scores.get(&3).copied().unwrap_or(0.0) > 0.0);
        // Cafés the user already interacted with are never scored.
        assert!(!scores.contains_key(&1));
        assert!(!scores.contains_key(&2));
    }
}
