//! Finish-line timing
//!
//! A bib moves Unlinked -> Linked on its first scan (the finish time is taken
//! from the clock) and Linked -> Confirmed on its second. A linked time can be
//! removed again; a confirmed one is final.

use chrono::TimeDelta;
use serde::Serialize;

use crate::error::{RaceError, RaceResult};
use crate::models::{AuditRecord, Bib, BibState, RaceDuration};

use super::Race;

/// Result of a timing action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimingOutcome {
    pub bib: Bib,
    pub state: BibState,
    pub duration: RaceDuration,
}

impl Race {
    /// Link a finish time to `bib`, or confirm the time already linked
    pub fn record_time(&mut self, bib: Bib) -> RaceResult<TimingOutcome> {
        let start = self.started_at.ok_or(RaceError::NotStarted)?;
        let position = *self.bib_index.get(&bib).ok_or(RaceError::BibNotFound(bib))?;
        let now = self.clock.now();
        let elapsed = RaceDuration::from_delta(now - start).truncate_to_centis();

        match self.entries[position].state() {
            BibState::Confirmed => Err(RaceError::AlreadyConfirmed(bib)),
            BibState::Linked => {
                let entry = &mut self.entries[position];
                entry.confirmed = true;
                let duration = entry.duration;
                tracing::info!(bib, duration = %duration, "Confirmed time for bib");

                self.audit_log.push(AuditRecord {
                    duration: elapsed,
                    bib,
                    removal: false,
                });
                // the ranked position is unchanged, only prize eligibility moves
                self.recompute_prizes();
                self.notify_confirmed(&self.entries[position]);

                Ok(TimingOutcome {
                    bib,
                    state: BibState::Confirmed,
                    duration,
                })
            }
            BibState::Unlinked => {
                if now - start <= TimeDelta::zero() || elapsed.is_zero() {
                    return Err(RaceError::NotStarted);
                }
                let entry = &mut self.entries[position];
                entry.duration = elapsed;
                entry.finished_at = Some(now);
                tracing::info!(bib, duration = %elapsed, "Linked time to bib");

                self.resort();
                self.audit_log.push(AuditRecord {
                    duration: elapsed,
                    bib,
                    removal: false,
                });

                Ok(TimingOutcome {
                    bib,
                    state: BibState::Linked,
                    duration: elapsed,
                })
            }
        }
    }

    /// Link and confirm in one step, for scanners that read a bib only once.
    ///
    /// An already linked bib is just confirmed.
    pub fn record_time_scanned(&mut self, bib: Bib) -> RaceResult<TimingOutcome> {
        let outcome = self.record_time(bib)?;
        if outcome.state == BibState::Linked {
            return self.record_time(bib);
        }
        Ok(outcome)
    }

    /// Take back an unconfirmed finish time
    pub fn remove_time(&mut self, bib: Bib) -> RaceResult<TimingOutcome> {
        let start = self.started_at.ok_or(RaceError::NotStarted)?;
        let position = *self.bib_index.get(&bib).ok_or(RaceError::BibNotFound(bib))?;

        match self.entries[position].state() {
            BibState::Confirmed => Err(RaceError::AlreadyConfirmed(bib)),
            BibState::Unlinked => Err(RaceError::NothingToRemove(bib)),
            BibState::Linked => {
                let entry = &mut self.entries[position];
                let removed = entry.duration;
                entry.duration = RaceDuration::ZERO;
                entry.finished_at = None;
                tracing::info!(bib, duration = %removed, "Removed time for bib");

                self.resort();
                let elapsed = RaceDuration::from_delta(self.clock.now() - start).truncate_to_centis();
                self.audit_log.push(AuditRecord {
                    duration: elapsed,
                    bib,
                    removal: true,
                });

                Ok(TimingOutcome {
                    bib,
                    state: BibState::Unlinked,
                    duration: RaceDuration::ZERO,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use tokio::sync::mpsc;

    use super::super::ranking::is_ranked;
    use super::super::test_support::*;
    use super::*;
    use crate::models::{EntryData, Gender, GenderFilter, Prize};
    use crate::services::notification::NotificationSink;

    #[test]
    fn test_link_then_confirm() {
        let (mut race, clock) = race();
        race.add_entry(runner(1)).unwrap();
        race.start(Some(t0())).unwrap();

        clock.advance(secs(95));
        let linked = race.record_time(1).unwrap();
        assert_eq!(linked.state, BibState::Linked);
        assert_eq!(linked.duration, RaceDuration::from_centis(9_500));
        assert_eq!(race.entry_by_bib(1).unwrap().finished_at, Some(t0() + secs(95)));

        clock.advance(secs(5));
        let confirmed = race.record_time(1).unwrap();
        assert_eq!(confirmed.state, BibState::Confirmed);
        // confirming keeps the linked time
        assert_eq!(confirmed.duration, RaceDuration::from_centis(9_500));

        assert_eq!(race.record_time(1), Err(RaceError::AlreadyConfirmed(1)));

        let audit = race.audit_log();
        assert_eq!(audit.len(), 2);
        assert_eq!(audit[1].duration, RaceDuration::from_centis(10_000));
        assert!(audit.iter().all(|r| r.bib == 1 && !r.removal));
    }

    #[test]
    fn test_record_time_requires_start() {
        let (mut race, _) = race();
        race.add_entry(runner(1)).unwrap();
        assert_eq!(race.record_time(1), Err(RaceError::NotStarted));
        assert!(race.audit_log().is_empty());
    }

    #[test]
    fn test_record_time_before_scheduled_start() {
        let (mut race, _) = race();
        race.add_entry(runner(1)).unwrap();
        race.start(Some(t0() + secs(60))).unwrap();
        assert_eq!(race.record_time(1), Err(RaceError::NotStarted));
        assert_eq!(race.entry_by_bib(1).unwrap().state(), BibState::Unlinked);
    }

    #[test]
    fn test_record_time_unknown_bib() {
        let (mut race, _) = race();
        race.start(None).unwrap();
        assert_eq!(race.record_time(9), Err(RaceError::BibNotFound(9)));
    }

    #[test]
    fn test_recorded_time_is_truncated_to_centis() {
        let (mut race, clock) = race();
        race.add_entry(runner(1)).unwrap();
        race.start(Some(t0())).unwrap();
        clock.advance(secs(61) + TimeDelta::milliseconds(239) + TimeDelta::microseconds(900));
        let outcome = race.record_time(1).unwrap();
        assert_eq!(outcome.duration, RaceDuration::from_centis(6_123));
        assert_eq!(outcome.duration.to_string(), "00:01:01.23");
    }

    #[test]
    fn test_scanned_links_and_confirms() {
        let (mut race, clock) = race();
        race.add_entry(runner(1)).unwrap();
        race.add_entry(runner(2)).unwrap();
        race.start(Some(t0())).unwrap();
        clock.advance(secs(10));

        let outcome = race.record_time_scanned(1).unwrap();
        assert_eq!(outcome.state, BibState::Confirmed);
        assert_eq!(race.audit_log().len(), 2);

        race.record_time(2).unwrap();
        assert_eq!(race.record_time_scanned(2).unwrap().state, BibState::Confirmed);
        assert_eq!(race.record_time_scanned(2), Err(RaceError::AlreadyConfirmed(2)));
    }

    #[test]
    fn test_remove_time() {
        let (mut race, clock) = race();
        race.add_entry(runner(1)).unwrap();
        race.add_entry(runner(2)).unwrap();
        assert_eq!(race.remove_time(1), Err(RaceError::NotStarted));

        race.start(Some(t0())).unwrap();
        assert_eq!(race.remove_time(1), Err(RaceError::NothingToRemove(1)));
        assert_eq!(race.remove_time(5), Err(RaceError::BibNotFound(5)));

        clock.advance(secs(20));
        race.record_time(2).unwrap();
        assert_eq!(race.entries()[0].bib, Some(2));

        clock.advance(secs(3));
        let outcome = race.remove_time(2).unwrap();
        assert_eq!(outcome.state, BibState::Unlinked);
        let entry = race.entry_by_bib(2).unwrap();
        assert!(entry.duration.is_zero());
        assert!(entry.finished_at.is_none());
        // back behind bib 1 among the unfinished
        assert_eq!(race.entries()[0].bib, Some(1));

        let last = race.audit_log().last().copied().unwrap();
        assert!(last.removal);
        assert_eq!(last.duration, RaceDuration::from_centis(2_300));

        race.record_time(2).unwrap();
        race.record_time(2).unwrap();
        assert_eq!(race.remove_time(2), Err(RaceError::AlreadyConfirmed(2)));
    }

    #[test]
    fn test_linking_sequence() {
        // (bib, removal, expected order after the step)
        let steps: &[(u32, bool, &[u32])] = &[
            (3, false, &[3, 1, 2, 4, 5]),
            (1, false, &[3, 1, 2, 4, 5]),
            (5, false, &[3, 1, 5, 2, 4]),
            (1, true, &[3, 5, 1, 2, 4]),
            (4, false, &[3, 5, 4, 1, 2]),
            (3, true, &[5, 4, 1, 2, 3]),
        ];

        let (mut race, clock) = race();
        for bib in 1..=5 {
            race.add_entry(runner(bib)).unwrap();
        }
        race.start(Some(t0())).unwrap();

        for (bib, removal, expected) in steps {
            clock.advance(secs(1));
            if *removal {
                race.remove_time(*bib).unwrap();
            } else {
                race.record_time(*bib).unwrap();
            }
            let order: Vec<u32> = race.entries().iter().filter_map(|e| e.bib).collect();
            assert_eq!(&order, expected, "after bib {} removal={}", bib, removal);
            assert!(is_ranked(race.entries()));
            for (position, entry) in race.entries().iter().enumerate() {
                let bib = entry.bib.unwrap();
                assert_eq!(race.bib_index[&bib], position);
            }
        }
    }

    #[test]
    fn test_confirm_awards_prizes_in_order() {
        let (mut race, clock) = race();
        race.set_prizes(vec![Prize::new("Top 2", 0, 200, GenderFilter::Any, 2)])
            .unwrap();
        for bib in 1..=3 {
            race.add_entry(runner(bib)).unwrap();
        }
        race.start(Some(t0())).unwrap();
        for bib in 1..=3 {
            clock.advance(secs(1));
            race.record_time(bib).unwrap();
        }
        assert!(race.prizes()[0].winners.is_empty());

        // bib 2 confirmed ahead of bib 1 waits for the gap to close
        race.record_time(2).unwrap();
        assert!(race.prizes()[0].winners.is_empty());

        race.record_time(1).unwrap();
        let winners: Vec<_> = race.current_prizes()[0]
            .winners
            .iter()
            .map(|w| w.entry.bib)
            .collect();
        assert_eq!(winners, vec![Some(1), Some(2)]);
    }

    #[test]
    fn test_confirm_queues_notification() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (race, clock) = race();
        let mut race = race.with_notifications(NotificationSink::new(tx, "Email"));
        race.set_optional_field_schema(vec!["Club".to_string(), "Email".to_string()])
            .unwrap();
        race.add_entry(
            EntryData::new(Some(1), "Ada", "Lovelace", Gender::Female, 36)
                .with_optional_fields(&["Harriers", "ada@example.com"]),
        )
        .unwrap();
        race.add_entry(
            EntryData::new(Some(2), "Bob", "Nomail", Gender::Male, 40)
                .with_optional_fields(&["Harriers", "not-an-address"]),
        )
        .unwrap();
        race.start(Some(t0())).unwrap();

        clock.advance(secs(75));
        race.record_time(1).unwrap();
        assert!(rx.try_recv().is_err());
        race.record_time(1).unwrap();

        let notice = rx.try_recv().unwrap();
        assert_eq!(notice.email, "ada@example.com");
        assert_eq!(notice.first_name, "Ada");
        assert_eq!(notice.duration, RaceDuration::from_centis(7_500));

        race.record_time_scanned(2).unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_confirm_without_receiver_still_succeeds() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let (race, clock) = race();
        let mut race = race.with_notifications(NotificationSink::new(tx, "Email"));
        race.set_optional_field_schema(vec!["Email".to_string()]).unwrap();
        race.add_entry(runner(1).with_optional_fields(&["runner@example.com"]))
            .unwrap();
        race.start(Some(t0())).unwrap();
        clock.advance(secs(1));
        assert_eq!(race.record_time_scanned(1).unwrap().state, BibState::Confirmed);
    }
}
