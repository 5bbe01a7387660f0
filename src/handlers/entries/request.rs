//! Entry request DTOs

use serde::Deserialize;
use validator::Validate;

use crate::{
    constants::{MAX_NAME_LENGTH, MAX_OPTIONAL_FIELDS},
    error::{AppResult, RaceError},
    models::{Bib, EntryData, Gender, RaceDuration},
    utils::validation::check_age,
};

/// Entry content, shared by registration and edits
#[derive(Debug, Deserialize, Validate)]
pub struct EntryRequest {
    pub bib: Option<Bib>,

    #[validate(length(min = 1, max = MAX_NAME_LENGTH))]
    pub first_name: String,

    #[validate(length(min = 1, max = MAX_NAME_LENGTH))]
    pub last_name: String,

    pub gender: Gender,

    /// Range-checked by `check_age`
    pub age: i64,

    #[serde(default)]
    #[validate(length(max = MAX_OPTIONAL_FIELDS))]
    pub optional_fields: Vec<String>,

    /// `HH:MM:SS.CC`; ignored until the race has started
    #[serde(default)]
    pub duration: Option<String>,

    #[serde(default)]
    pub confirmed: bool,
}

impl EntryRequest {
    pub fn into_entry_data(self) -> AppResult<EntryData> {
        let age = check_age(self.age).map_err(RaceError::Validation)?;
        let duration = match self.duration.as_deref() {
            Some(raw) => raw.parse::<RaceDuration>().map_err(RaceError::from)?,
            None => RaceDuration::ZERO,
        };
        Ok(EntryData {
            bib: self.bib,
            first_name: self.first_name,
            last_name: self.last_name,
            gender: self.gender,
            age,
            optional_fields: self.optional_fields,
            duration,
            confirmed: self.confirmed,
        })
    }
}

/// Edit entry request
#[derive(Debug, Deserialize, Validate)]
pub struct EditEntryRequest {
    /// Fingerprint the entry was read with
    #[validate(length(min = 1))]
    pub fingerprint: String,

    #[serde(flatten)]
    #[validate(nested)]
    pub entry: EntryRequest,
}

/// Record time query
#[derive(Debug, Default, Deserialize)]
pub struct RecordTimeQuery {
    /// Link and confirm in one request
    #[serde(default)]
    pub scanned: bool,
}
