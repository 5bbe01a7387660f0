//! Prize engine
//!
//! Winners are rebuilt from scratch on every trigger by walking the ranked
//! roster. Only the leading run of confirmed entries takes part: anything
//! behind the first unconfirmed entry may still move, so it is withheld.
//!
//! NOTE: this assumes confirmations arrive in finish order. A later finisher
//! confirmed ahead of an earlier one keeps everybody behind the gap out of the
//! prizes until the gap closes.

use crate::models::{Entry, Prize};

/// Clear every prize and replay the confirmed prefix of `entries`
pub fn recompute_all_prizes(prizes: &mut [Prize], entries: &[Entry]) {
    for prize in prizes.iter_mut() {
        prize.winners.clear();
    }
    for entry in entries.iter().take_while(|e| e.confirmed) {
        assign(entry, prizes);
    }
}

/// Offer one entry to each prize in configured order.
///
/// Once the entry has won anything in this pass, only prizes that allow
/// repeat winners are still open to it.
pub fn assign(entry: &Entry, prizes: &mut [Prize]) {
    let mut won = false;
    for prize in prizes.iter_mut() {
        if won && !prize.win_again {
            continue;
        }
        if !prize.admits(entry) || prize.is_full() {
            continue;
        }
        won = true;
        prize.winners.push(entry.id);
        tracing::debug!(
            bib = %entry.bib_display(),
            prize = %prize.title,
            place = prize.winners.len(),
            "Placing entry in prize"
        );
    }
}
