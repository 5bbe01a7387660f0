//! Race aggregate
//!
//! A [`Race`] owns the roster, the start instant, the prize table and the
//! audit trail. Every mutation goes through `&mut self` and either succeeds
//! completely or returns a [`RaceError`] with the state untouched. After every
//! successful mutation the roster is in ranked order and the bib index agrees
//! with it.

pub mod edit;
pub mod prizes;
pub mod ranking;
pub mod snapshot;
pub mod timing;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::constants::columns;
use crate::error::{RaceError, RaceResult};
use crate::models::{
    AuditRecord, Bib, BibState, Entry, EntryData, EntryId, Prize, RaceDuration, validate_prizes,
};
use crate::services::notification::{NotificationSink, ResultNotice};
use crate::utils::{Clock, validate_email, validate_name};

pub use snapshot::{ImportSummary, Snapshot};
pub use timing::TimingOutcome;

/// An entry together with its current place in the ranking
#[derive(Debug, Clone, Serialize)]
pub struct RankedEntry {
    /// 1-based
    pub place: usize,
    pub state: BibState,
    /// Token an editor must echo back to modify this entry
    pub fingerprint: String,
    #[serde(flatten)]
    pub entry: Entry,
}

/// A prize and the entries currently holding it, best first
#[derive(Debug, Clone, Serialize)]
pub struct PrizeStanding {
    #[serde(flatten)]
    pub prize: Prize,
    pub winners: Vec<RankedEntry>,
}

/// Start time and roster counters
#[derive(Debug, Clone, Serialize)]
pub struct RaceStatus {
    pub started_at: Option<DateTime<Utc>>,
    /// `HH:MM:SS` since the start, `--` before it
    pub clock: String,
    pub entries: usize,
    pub finished: usize,
    pub confirmed: usize,
    pub optional_fields: Vec<String>,
}

/// State of one race
#[derive(Clone)]
pub struct Race {
    clock: Arc<dyn Clock>,
    started_at: Option<DateTime<Utc>>,
    optional_fields: Vec<String>,
    /// Always sorted by [`ranking::rank_order`]
    entries: Vec<Entry>,
    /// Bib to position in `entries`, rebuilt on every resort
    bib_index: HashMap<Bib, usize>,
    audit_log: Vec<AuditRecord>,
    prizes: Vec<Prize>,
    next_id: u64,
    notifications: Option<NotificationSink>,
}

impl Race {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            started_at: None,
            optional_fields: Vec::new(),
            entries: Vec::new(),
            bib_index: HashMap::new(),
            audit_log: Vec::new(),
            prizes: Vec::new(),
            next_id: 1,
            notifications: None,
        }
    }

    /// Emit a [`ResultNotice`] for every confirmation
    pub fn with_notifications(mut self, sink: NotificationSink) -> Self {
        self.notifications = Some(sink);
        self
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Elapsed time since the start, `None` before it
    pub fn elapsed(&self) -> Option<RaceDuration> {
        self.started_at
            .map(|start| RaceDuration::from_delta(self.clock.now() - start))
    }

    pub fn optional_fields(&self) -> &[String] {
        &self.optional_fields
    }

    /// Roster in ranked order
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn entry_by_bib(&self, bib: Bib) -> Option<&Entry> {
        self.bib_index.get(&bib).map(|&position| &self.entries[position])
    }

    pub fn audit_log(&self) -> &[AuditRecord] {
        &self.audit_log
    }

    pub fn prizes(&self) -> &[Prize] {
        &self.prizes
    }

    pub fn current_ranking(&self) -> Vec<RankedEntry> {
        self.entries
            .iter()
            .enumerate()
            .map(|(position, entry)| ranked(position, entry))
            .collect()
    }

    pub fn current_prizes(&self) -> Vec<PrizeStanding> {
        let positions: HashMap<EntryId, usize> = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (entry.id, position))
            .collect();

        self.prizes
            .iter()
            .map(|prize| PrizeStanding {
                prize: prize.clone(),
                winners: prize
                    .winners
                    .iter()
                    .filter_map(|id| positions.get(id))
                    .map(|&position| ranked(position, &self.entries[position]))
                    .collect(),
            })
            .collect()
    }

    /// Every finisher still waiting for confirmation, plus the last
    /// `confirmed_limit` confirmed finishers. Most recent first.
    pub fn recent_finishers(&self, confirmed_limit: usize) -> Vec<RankedEntry> {
        let mut linked = Vec::new();
        let mut confirmed = Vec::new();
        for (position, entry) in self.entries.iter().enumerate().rev() {
            match entry.state() {
                BibState::Linked => linked.push(ranked(position, entry)),
                BibState::Confirmed if confirmed.len() < confirmed_limit => {
                    confirmed.push(ranked(position, entry))
                }
                _ => {}
            }
        }
        linked.extend(confirmed);
        linked
    }

    pub fn status(&self) -> RaceStatus {
        RaceStatus {
            started_at: self.started_at,
            clock: self.elapsed().unwrap_or_default().clock(),
            entries: self.entries.len(),
            finished: self.entries.iter().filter(|e| e.has_finished()).count(),
            confirmed: self.entries.iter().filter(|e| e.confirmed).count(),
            optional_fields: self.optional_fields.clone(),
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Start the race at `at`, or now.
    ///
    /// Starting again at the exact same instant is a no-op.
    pub fn start(&mut self, at: Option<DateTime<Utc>>) -> RaceResult<DateTime<Utc>> {
        let requested = at.unwrap_or_else(|| self.clock.now());
        match self.started_at {
            Some(current) if current == requested => Ok(current),
            Some(current) => Err(RaceError::AlreadyStarted { current, requested }),
            None => {
                self.started_at = Some(requested);
                tracing::info!(started_at = %requested, "Race started");
                Ok(requested)
            }
        }
    }

    /// Declare the ordered names of the extra per-entry columns.
    ///
    /// Only allowed while the roster is empty, unless the names are
    /// unchanged.
    pub fn set_optional_field_schema(&mut self, names: Vec<String>) -> RaceResult<()> {
        if names == self.optional_fields {
            return Ok(());
        }
        if !self.entries.is_empty() {
            return Err(RaceError::SchemaLocked);
        }

        let mut seen = HashSet::new();
        for name in &names {
            if name.trim().is_empty() {
                return Err(RaceError::Validation("Optional field names cannot be empty".to_string()));
            }
            if columns::ALL.contains(&name.as_str()) {
                return Err(RaceError::Validation(format!(
                    "`{}` is a reserved column name",
                    name
                )));
            }
            if !seen.insert(name.as_str()) {
                return Err(RaceError::Validation(format!("Duplicate optional field `{}`", name)));
            }
        }

        tracing::info!(fields = ?names, "Optional fields set");
        self.optional_fields = names;
        Ok(())
    }

    /// Replace the prize table and recompute winners
    pub fn set_prizes(&mut self, mut prizes: Vec<Prize>) -> RaceResult<()> {
        validate_prizes(&prizes)?;
        for prize in prizes.iter_mut() {
            prize.winners.clear();
        }
        tracing::info!(count = prizes.len(), "Prize table replaced");
        self.prizes = prizes;
        self.recompute_prizes();
        Ok(())
    }

    /// Register a new entry
    pub fn add_entry(&mut self, data: EntryData) -> RaceResult<EntryId> {
        let id = self.admit(data)?;
        self.resort();
        self.recompute_prizes();
        Ok(id)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Validate and append an entry without resorting.
    ///
    /// The bib index stays consistent for duplicate detection, but the roster
    /// is left unsorted; callers must [`Race::resort`] before returning.
    fn admit(&mut self, mut data: EntryData) -> RaceResult<EntryId> {
        let finished_at = self.normalize(&mut data)?;
        match data.bib {
            Some(bib) if self.bib_index.contains_key(&bib) => {
                return Err(RaceError::DuplicateBib(bib));
            }
            None if self.started_at.is_some() => return Err(RaceError::BibRequiredAfterStart),
            _ => {}
        }

        let id = EntryId(self.next_id);
        self.next_id += 1;

        let entry = Entry::new(id, data, finished_at);
        tracing::info!(bib = %entry.bib_display(), name = %entry.full_name(), "Entry added");
        if let Some(bib) = entry.bib {
            self.bib_index.insert(bib, self.entries.len());
        }
        self.entries.push(entry);
        Ok(id)
    }

    /// Bring caller data in line with the race state and return the finish
    /// instant it implies.
    fn normalize(&self, data: &mut EntryData) -> RaceResult<Option<DateTime<Utc>>> {
        validate_name(&data.first_name, "first name").map_err(RaceError::Validation)?;
        validate_name(&data.last_name, "last name").map_err(RaceError::Validation)?;
        data.first_name = data.first_name.trim().to_string();
        data.last_name = data.last_name.trim().to_string();

        if data.optional_fields.len() != self.optional_fields.len() {
            return Err(RaceError::Validation(format!(
                "Entry has {} optional fields, race defines {}",
                data.optional_fields.len(),
                self.optional_fields.len()
            )));
        }

        let Some(start) = self.started_at else {
            data.duration = RaceDuration::ZERO;
            data.confirmed = false;
            return Ok(None);
        };

        if data.duration.is_zero() {
            data.confirmed = false;
            return Ok(None);
        }
        start
            .checked_add_signed(data.duration.as_delta())
            .map(Some)
            .ok_or_else(|| RaceError::Validation(format!("Duration {} is out of range", data.duration)))
    }

    /// Restore ranked order and rebuild the bib index
    fn resort(&mut self) {
        ranking::sort_entries(&mut self.entries);
        self.bib_index = self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(position, entry)| entry.bib.map(|bib| (bib, position)))
            .collect();
    }

    fn recompute_prizes(&mut self) {
        prizes::recompute_all_prizes(&mut self.prizes, &self.entries);
        tracing::debug!(prizes = self.prizes.len(), "Prizes recomputed");
    }

    /// Queue a result notice for a freshly confirmed entry. Never blocks.
    fn notify_confirmed(&self, entry: &Entry) {
        let Some(sink) = &self.notifications else {
            return;
        };
        let Some(column) = self.optional_fields.iter().position(|f| *f == sink.email_field) else {
            return;
        };
        let Some(email) = entry.optional_fields.get(column) else {
            return;
        };
        if let Err(reason) = validate_email(email) {
            tracing::warn!(bib = %entry.bib_display(), email = %email, "Not notifying: {}", reason);
            return;
        }

        let notice = ResultNotice {
            first_name: entry.first_name.clone(),
            last_name: entry.last_name.clone(),
            email: email.trim().to_string(),
            duration: entry.duration,
        };
        if sink.sender.send(notice).is_err() {
            tracing::warn!(bib = %entry.bib_display(), "Notification queue closed, result notice dropped");
        }
    }
}

fn ranked(position: usize, entry: &Entry) -> RankedEntry {
    RankedEntry {
        place: position + 1,
        state: entry.state(),
        fingerprint: entry.fingerprint(),
        entry: entry.clone(),
    }
}
