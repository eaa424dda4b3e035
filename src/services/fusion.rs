use std::collections::{BTreeMap, BTreeSet};

use crate::models::{Interaction, Rating, Reservation};

type Pair = (String, String);

/// Score implied by repeat bookings when the user never rated the court
///
/// Only called for pairs with at least one positive booking.
pub fn implicit_score(booking_count: usize) -> f64 {
    match booking_count {
        0 | 1 => 3.5,
        2 => 4.0,
        _ => 5.0,
    }
}

/// Merges implicit and explicit feedback into one score per (user, court)
///
/// Positive reservations are counted per pair and mapped through
/// [`implicit_score`]; an explicit rating for the same pair replaces that
/// estimate entirely. When a pair was rated more than once the last rating
/// wins. Every emitted row is backed by at least one real signal.
///
/// The output is sorted by (user_id, item_id).
pub fn fuse_interactions(reservations: &[Reservation], ratings: &[Rating]) -> Vec<Interaction> {
    let mut booking_counts: BTreeMap<Pair, usize> = BTreeMap::new();
    for reservation in reservations.iter().filter(|r| r.status.is_positive()) {
        *booking_counts
            .entry((reservation.user_id.clone(), reservation.item_id.clone()))
            .or_default() += 1;
    }

    let mut explicit_scores: BTreeMap<Pair, f64> = BTreeMap::new();
    for rating in ratings {
        explicit_scores.insert(
            (rating.user_id.clone(), rating.item_id.clone()),
            rating.overall_rating,
        );
    }

    let pairs: BTreeSet<&Pair> = booking_counts.keys().chain(explicit_scores.keys()).collect();

    pairs
        .into_iter()
        .filter_map(|pair| {
            let score = match explicit_scores.get(pair) {
                Some(score) => *score,
                None => implicit_score(*booking_counts.get(pair)?),
            };
            Some(Interaction::new(pair.0.clone(), pair.1.clone(), score))
        })
        .collect()
}
