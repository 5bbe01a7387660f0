//! Prize model

use serde::{Deserialize, Serialize};

use crate::error::{RaceError, RaceResult};
use crate::models::{Entry, EntryId, Gender};

/// Which genders a prize is open to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenderFilter {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    /// Overall; any unrecognized value in a prize file lands here
    #[default]
    #[serde(rename = "O", other)]
    Any,
}

impl GenderFilter {
    pub fn admits(&self, gender: Gender) -> bool {
        match self {
            Self::Male => gender == Gender::Male,
            Self::Female => gender == Gender::Female,
            Self::Any => true,
        }
    }
}

/// An award bucket and its computed winners.
///
/// Field names follow the prize file format (`Title`, `LowAge`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Prize {
    pub title: String,
    /// Inclusive lower age bound
    #[serde(default)]
    pub low_age: u32,
    /// Inclusive upper age bound
    pub high_age: u32,
    #[serde(default)]
    pub gender: GenderFilter,
    /// Maximum number of winners
    pub amount: u32,
    /// May an entry that already won a prize in this pass win this one too
    #[serde(default)]
    pub win_again: bool,
    /// Recomputed on every trigger, never persisted
    #[serde(skip)]
    pub winners: Vec<EntryId>,
}

impl Prize {
    pub fn new(title: &str, low_age: u32, high_age: u32, gender: GenderFilter, amount: u32) -> Self {
        Self {
            title: title.to_string(),
            low_age,
            high_age,
            gender,
            amount,
            win_again: false,
            winners: Vec::new(),
        }
    }

    pub fn stacking(mut self) -> Self {
        self.win_again = true;
        self
    }

    /// Age and gender filter
    pub fn admits(&self, entry: &Entry) -> bool {
        (self.low_age..=self.high_age).contains(&entry.age) && self.gender.admits(entry.gender)
    }

    pub fn is_full(&self) -> bool {
        self.winners.len() >= self.amount as usize
    }

    fn validate(&self) -> RaceResult<()> {
        if self.title.trim().is_empty() {
            return Err(RaceError::Validation("Prize title cannot be empty".to_string()));
        }
        if self.low_age > self.high_age {
            return Err(RaceError::Validation(format!(
                "Prize `{}` has LowAge {} above HighAge {}",
                self.title, self.low_age, self.high_age
            )));
        }
        Ok(())
    }
}

/// Validate a full prize configuration before it replaces the current one
pub fn validate_prizes(prizes: &[Prize]) -> RaceResult<()> {
    prizes.iter().try_for_each(Prize::validate)
}

/// Parse a prize configuration: either a JSON array or a stream of
/// concatenated JSON objects, in configured order.
pub fn parse_prize_list(input: &str) -> RaceResult<Vec<Prize>> {
    let trimmed = input.trim_start();
    let prizes = if trimmed.starts_with('[') {
        serde_json::from_str::<Vec<Prize>>(trimmed)
            .map_err(|e| RaceError::Validation(format!("Error reading prize configuration - {}", e)))?
    } else {
        serde_json::Deserializer::from_str(trimmed)
            .into_iter::<Prize>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| RaceError::Validation(format!("Error reading prize configuration - {}", e)))?
    };
    validate_prizes(&prizes)?;
    Ok(prizes)
}
