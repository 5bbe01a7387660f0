//! Ranking order
//!
//! Finished entries come first, fastest first; unfinished entries follow.
//! Equal durations (including every unfinished entry) fall back to bib order,
//! with bib-less entries ahead of any bib.

use std::cmp::Ordering;

use crate::models::Entry;

/// Total order used to keep the roster sorted
pub fn rank_order(a: &Entry, b: &Entry) -> Ordering {
    if a.duration == b.duration {
        return a.bib.cmp(&b.bib);
    }
    match (a.has_finished(), b.has_finished()) {
        // an unfinished entry never beats a finished one
        (false, _) => Ordering::Greater,
        (_, false) => Ordering::Less,
        _ => a.duration.cmp(&b.duration),
    }
}

/// Stable in-place sort by [`rank_order`]
pub fn sort_entries(entries: &mut [Entry]) {
    entries.sort_by(rank_order);
}

/// Check that a roster is in ranked order
pub fn is_ranked(entries: &[Entry]) -> bool {
    entries
        .windows(2)
        .all(|pair| rank_order(&pair[0], &pair[1]) != Ordering::Greater)
}
