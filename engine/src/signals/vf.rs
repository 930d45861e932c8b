//! Visit-transition frequency scorer.
//!
//! Ported from `rec_visited_freq` in `ubcf_api/main.py`: builds a global
//! transition map from every other user's visit sequence, then scores
//! candidates by how often the target's own visited cafés transitioned into
//! them.

use crate::models::{CafeId, ScoreMap, UserId};
use std::collections::HashMap;

/// `users` is the full population (including the target); `target_id`
/// selects whose sequence drives the lookup.
pub fn vf_scores(target_id: UserId, users: &[(UserId, Vec<CafeId>)]) -> ScoreMap {
    let Some((_, target_seq)) = users.iter().find(|(uid, _)| *uid == target_id) else {
        return ScoreMap::new();
    };

    let mut transitions: HashMap<CafeId, Vec<CafeId>> = HashMap::new();
    for (uid, seq) in users {
        if *uid == target_id {
            continue;
        }
        for pair in seq.windows(2) {
            transitions.entry(pair[0]).or_default().push(pair[1]);
        }
    }

    let mut counts: ScoreMap = ScoreMap::new();
    for a in target_seq {
        if let Some(targets) = transitions.get(a) {
            for &b in targets {
                *counts.entry(b).or_insert(0.0) += 1.0;
            }
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_user_returns_empty_map() {
        let users = vec![(1, vec![1, 2])];
        assert!(vf_scores(999, &users).is_empty());
    }

    #[test]
    fn test_no_other_users_yields_empty_map() {
        let users = vec![(1, vec![7, 3, 7])];
        assert!(vf_scores(1, &users).is_empty());
    }

    #[test]
    fn test_counts_transitions_from_other_users() {
        let users = vec![
            (1, vec![1, 2]),
            (2, vec![1, 3]),
            (3, vec![1, 3]),
        ];
        let scores = vf_scores(1, &users);
        // user 1 visited café 1; other users transitioned 1->3 twice.
        assert_eq!(scores.get(&3), Some(&2.0));
    }
}
