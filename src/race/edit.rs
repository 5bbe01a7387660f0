//! Entry editing with optimistic concurrency
//!
//! Editors address an entry by its 1-based place and must present the
//! fingerprint they read it with. Anything that changed the entry in between
//! (a scan, another edit) changes the fingerprint and the edit is refused.

use crate::error::{RaceError, RaceResult};
use crate::models::{EntryData, EntryId};

use super::Race;

impl Race {
    /// Replace the content of the entry at `place`
    pub fn edit_entry(
        &mut self,
        fingerprint: &str,
        place: usize,
        mut data: EntryData,
    ) -> RaceResult<EntryId> {
        let len = self.entries.len();
        if place == 0 || place > len {
            return Err(RaceError::PlaceOutOfRange { place, len });
        }
        let position = place - 1;

        let current = &self.entries[position];
        if current.fingerprint() != fingerprint {
            return Err(RaceError::StaleEdit { place });
        }
        let id = current.id;
        let current_bib = current.bib;

        let finished_at = self.normalize(&mut data)?;
        match data.bib {
            None if self.started_at.is_some() => return Err(RaceError::BibRequiredAfterStart),
            Some(bib) if Some(bib) != current_bib => {
                if let Some(&holder) = self.bib_index.get(&bib) {
                    return Err(RaceError::BibConflict {
                        bib,
                        holder: self.entries[holder].full_name(),
                    });
                }
            }
            _ => {}
        }

        let entry = &mut self.entries[position];
        entry.apply(data, finished_at);
        tracing::info!(place, bib = %entry.bib_display(), name = %entry.full_name(), "Entry modified");

        self.resort();
        self.recompute_prizes();
        Ok(id)
    }
}
