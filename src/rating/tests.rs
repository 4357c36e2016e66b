use super::*;
use crate::domain::Ratings;

const EPSILON: f64 = 1e-9;

fn rating_of(ratings: &Ratings, key: &str) -> f64 {
    ratings.get(key).copied().unwrap_or(f64::NAN)
}

#[test]
fn unseen_competitors_start_at_default() {
    let ratings = fold([("Rem", "Ram")], Ratings::new(), EloParams::default());
    assert!((rating_of(&ratings, "Rem") - 1015.0).abs() < EPSILON);
    assert!((rating_of(&ratings, "Ram") - 985.0).abs() < EPSILON);
}

#[test]
fn fold_is_deterministic() {
    let games = [("A", "B"), ("B", "C"), ("C", "A"), ("A", "C")];
    let first = fold(games, Ratings::new(), EloParams::default());
    let second = fold(games, Ratings::new(), EloParams::default());
    assert_eq!(first, second);
}

#[test]
fn fold_depends_on_game_order() {
    let forward = fold([("A", "B"), ("B", "C")], Ratings::new(), EloParams::default());
    let reversed = fold([("B", "C"), ("A", "B")], Ratings::new(), EloParams::default());
    assert_ne!(forward, reversed);
    assert!((rating_of(&forward, "A") - rating_of(&reversed, "A")).abs() > 0.1);
}

#[test]
fn fold_continues_from_initial_ratings() {
    let mut initial = Ratings::new();
    initial.insert("A".to_string(), 1200.0);
    initial.insert("Z".to_string(), 900.0);
    let ratings = fold([("B", "A")], initial, EloParams::default());
    // untouched competitors keep their rating
    assert!((rating_of(&ratings, "Z") - 900.0).abs() < EPSILON);
    // an upset moves more than K/2
    assert!(rating_of(&ratings, "B") - 1000.0 > 15.0);
    assert!(1200.0 - rating_of(&ratings, "A") > 15.0);
}

#[test]
fn incremental_fold_matches_full_fold() {
    let games = [("A", "B"), ("B", "C"), ("C", "A"), ("D", "A")];
    let full = fold(games, Ratings::new(), EloParams::default());
    let (head, tail) = games.split_at(2);
    let partial = fold(head.iter().copied(), Ratings::new(), EloParams::default());
    let resumed = fold(tail.iter().copied(), partial, EloParams::default());
    assert_eq!(full, resumed);
}

#[test]
fn self_play_changes_nothing() {
    let ratings = fold([("A", "A")], Ratings::new(), EloParams::default());
    assert!(ratings.is_empty());
}

#[test]
fn expected_scores_sum_to_one() {
    let a = expected_score(1100.0, 950.0);
    let b = expected_score(950.0, 1100.0);
    assert!((a + b - 1.0).abs() < EPSILON);
    assert!((expected_score(1000.0, 1000.0) - 0.5).abs() < EPSILON);
}

#[test]
fn fingerprint_is_stable_and_param_sensitive() {
    let base = fingerprint(&EloParams::default());
    assert_eq!(base, fingerprint(&EloParams::default()));
    assert_eq!(base.len(), 64);
    let tuned = fingerprint(&EloParams {
        k_factor: 32.0,
        ..EloParams::default()
    });
    assert_ne!(base, tuned);
}
