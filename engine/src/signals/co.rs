//! Menu co-occurrence scorer.
//!
//! Ported from `rec_menu_cooccur` in `ubcf_api/main.py`: cafés where other
//! users liked a menu whose *name* matches one of the target user's own
//! liked menu names, grouped by café with the matched menu names attached.

use crate::models::{CafeId, LikedMenu, UserId};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Maps candidate café id to the sorted, deduplicated set of menu names the
/// target user shares with other users who liked a menu at that café.
pub type CoMatches = HashMap<CafeId, Vec<String>>;

pub fn co_scores(target_id: UserId, users: &[(UserId, Vec<LikedMenu>)]) -> CoMatches {
    let Some((_, target_menus)) = users.iter().find(|(uid, _)| *uid == target_id) else {
        return CoMatches::new();
    };

    let my_favs: HashSet<&str> = target_menus.iter().map(|m| m.menu_name.as_str()).collect();
    if my_favs.is_empty() {
        return CoMatches::new();
    }

    let mut matched: HashMap<CafeId, BTreeSet<String>> = HashMap::new();
    for (uid, menus) in users {
        if *uid == target_id {
            continue;
        }
        for menu in menus {
            if my_favs.contains(menu.menu_name.as_str()) {
                matched.entry(menu.cafe_id).or_default().insert(menu.menu_name.clone());
            }
        }
    }

    matched
        .into_iter()
        .map(|(cafe_id, names)| (cafe_id, names.into_iter().collect()))
        .collect()
}

/// Co-occurrence counts (`|matched_menu|` per café), used by fusion's
/// per-signal robust normalization — CO is normalized on counts, not sets.
pub fn co_counts(matches: &CoMatches) -> crate::models::ScoreMap {
    matches.iter().map(|(&cafe_id, names)| (cafe_id, names.len() as f64)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn menu(cafe_id: CafeId, name: &str) -> LikedMenu {
        LikedMenu {
            cafe_id,
            menu_name: name.to_string(),
            price: 15000,
        }
    }

    #[test]
    fn test_absent_user_returns_empty_map() {
        let users = vec![(1, vec![menu(1, "Latte")])];
        assert!(co_scores(999, &users).is_empty());
    }

    #[test]
    fn test_shared_menu_name_across_different_cafes() {
        let users = vec![
            (1, vec![menu(1, "Latte")]),
            (2, vec![menu(2, "Latte")]),
        ];
        let matches = co_scores(1, &users);
        assert_eq!(matches.get(&2), Some(&vec!["Latte".to_string()]));
        assert!(!matches.contains_key(&1));
    }

    #[test]
    fn test_co_counts_reflects_match_set_size() {
        let users = vec![
            (1, vec![menu(1, "Latte"), menu(1, "Mocha")]),
            (2, vec![menu(2, "Latte"), menu(2, "Mocha")]),
        ];
        let matches = co_scores(1, &users);
        let counts = co_counts(&matches);
        assert_eq!(counts.get(&2), Some(&2.0));
    }
}
