//! Race service
//!
//! Serializes access to the race: mutations hold the write lock for the whole
//! operation, views hold the read lock.

use std::path::Path;

use chrono::{DateTime, Utc};

use crate::{
    error::{AppError, AppResult},
    models::{AuditRecord, Bib, EntryData, EntryId, Prize, parse_prize_list},
    race::{ImportSummary, PrizeStanding, RaceStatus, RankedEntry, Snapshot, TimingOutcome},
    state::SharedRace,
};

/// Race service for business logic
pub struct RaceService;

impl RaceService {
    /// Start time, clock and counters
    pub async fn status(race: &SharedRace) -> RaceStatus {
        race.read().await.status()
    }

    /// Start the race, now when `at` is absent
    pub async fn start(race: &SharedRace, at: Option<DateTime<Utc>>) -> AppResult<DateTime<Utc>> {
        Ok(race.write().await.start(at)?)
    }

    pub async fn set_optional_fields(race: &SharedRace, names: Vec<String>) -> AppResult<Vec<String>> {
        let mut race = race.write().await;
        race.set_optional_field_schema(names)?;
        Ok(race.optional_fields().to_vec())
    }

    /// Current ranking
    pub async fn list_entries(race: &SharedRace) -> Vec<RankedEntry> {
        race.read().await.current_ranking()
    }

    /// Register an entry and return its ranked view
    pub async fn add_entry(race: &SharedRace, data: EntryData) -> AppResult<RankedEntry> {
        let mut race = race.write().await;
        let id = race.add_entry(data)?;
        Self::find_ranked(&race.current_ranking(), id)
    }

    /// Edit the entry at `place`, guarded by its fingerprint
    pub async fn edit_entry(
        race: &SharedRace,
        fingerprint: &str,
        place: usize,
        data: EntryData,
    ) -> AppResult<RankedEntry> {
        let mut race = race.write().await;
        let id = race.edit_entry(fingerprint, place, data)?;
        Self::find_ranked(&race.current_ranking(), id)
    }

    /// Link or confirm a time; `scanned` does both in one go
    pub async fn record_time(race: &SharedRace, bib: Bib, scanned: bool) -> AppResult<TimingOutcome> {
        let mut race = race.write().await;
        let outcome = if scanned {
            race.record_time_scanned(bib)?
        } else {
            race.record_time(bib)?
        };
        Ok(outcome)
    }

    pub async fn remove_time(race: &SharedRace, bib: Bib) -> AppResult<TimingOutcome> {
        Ok(race.write().await.remove_time(bib)?)
    }

    pub async fn recent_finishers(race: &SharedRace, confirmed_limit: usize) -> Vec<RankedEntry> {
        race.read().await.recent_finishers(confirmed_limit)
    }

    pub async fn prizes(race: &SharedRace) -> Vec<PrizeStanding> {
        race.read().await.current_prizes()
    }

    /// Replace the prize table and return the new standings
    pub async fn set_prizes(race: &SharedRace, prizes: Vec<Prize>) -> AppResult<Vec<PrizeStanding>> {
        let mut race = race.write().await;
        race.set_prizes(prizes)?;
        Ok(race.current_prizes())
    }

    pub async fn audit_log(race: &SharedRace) -> Vec<AuditRecord> {
        race.read().await.audit_log().to_vec()
    }

    pub async fn export_snapshot(race: &SharedRace) -> Snapshot {
        race.read().await.export_snapshot()
    }

    pub async fn import_snapshot(race: &SharedRace, snapshot: Snapshot) -> AppResult<ImportSummary> {
        Ok(race.write().await.import_snapshot(&snapshot.rows)?)
    }

    /// Load the prize table from `path` if the file exists.
    ///
    /// Returns the number of prizes loaded, `None` when there is no file.
    pub async fn load_prize_file(race: &SharedRace, path: &Path) -> AppResult<Option<usize>> {
        let contents = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No prize file, starting without prizes");
                return Ok(None);
            }
            Err(e) => {
                return Err(AppError::Internal(anyhow::anyhow!(
                    "Failed to read prize file {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let prizes = parse_prize_list(&contents)?;
        let count = prizes.len();
        race.write().await.set_prizes(prizes)?;
        tracing::info!(path = %path.display(), count, "Loaded prize file");
        Ok(Some(count))
    }

    fn find_ranked(ranking: &[RankedEntry], id: EntryId) -> AppResult<RankedEntry> {
        ranking
            .iter()
            .find(|ranked| ranked.entry.id == id)
            .cloned()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Entry {:?} missing from ranking", id)))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use tokio::sync::RwLock;

    use super::*;
    use crate::error::RaceError;
    use crate::models::{BibState, Gender};
    use crate::race::Race;
    use crate::utils::ManualClock;

    fn shared() -> (SharedRace, ManualClock) {
        let clock = ManualClock::new(Utc::now());
        let race = Race::new(Arc::new(clock.clone()));
        (Arc::new(RwLock::new(race)), clock)
    }

    #[tokio::test]
    async fn test_add_and_scan() {
        let (race, clock) = shared();
        let ranked = RaceService::add_entry(
            &race,
            EntryData::new(Some(12), "Ada", "Lovelace", Gender::Female, 36),
        )
        .await
        .unwrap();
        assert_eq!(ranked.place, 1);
        assert_eq!(ranked.state, BibState::Unlinked);

        RaceService::start(&race, None).await.unwrap();
        clock.advance(chrono::TimeDelta::seconds(5));
        let outcome = tokio_test::assert_ok!(RaceService::record_time(&race, 12, true).await);
        assert_eq!(outcome.state, BibState::Confirmed);

        let err = tokio_test::assert_err!(RaceService::remove_time(&race, 12).await);
        assert!(matches!(err, AppError::Race(RaceError::AlreadyConfirmed(12))));
        assert_eq!(RaceService::audit_log(&race).await.len(), 2);
    }

    #[tokio::test]
    async fn test_load_prize_file() {
        let (race, _) = shared();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"Title":"Men's Overall","LowAge":0,"HighAge":200,"Gender":"M","Amount":1,"WinAgain":false}}"#
        )
        .unwrap();
        writeln!(
            file,
            r#"{{"Title":"Women's Overall","LowAge":0,"HighAge":200,"Gender":"F","Amount":1,"WinAgain":false}}"#
        )
        .unwrap();

        let loaded = RaceService::load_prize_file(&race, file.path()).await.unwrap();
        assert_eq!(loaded, Some(2));
        assert_eq!(RaceService::prizes(&race).await.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_prize_file_is_skipped() {
        let (race, _) = shared();
        let dir = tempfile::tempdir().unwrap();
        let loaded = RaceService::load_prize_file(&race, &dir.path().join("prizes.json"))
            .await
            .unwrap();
        assert_eq!(loaded, None);
    }

    #[tokio::test]
    async fn test_invalid_prize_file_is_rejected() {
        let (race, _) = shared();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not json").unwrap();
        let err = RaceService::load_prize_file(&race, file.path()).await.unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }
}
