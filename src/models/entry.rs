//! Entry model

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::UNSET_DISPLAY;
use crate::models::RaceDuration;
use crate::utils::crypto::hash_string;

/// Race number printed on a competitor's bib
pub type Bib = u32;

/// Stable handle of an entry inside one race, independent of its rank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryId(pub u64);

/// Gender of a competitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M", alias = "m")]
    Male,
    #[serde(rename = "F", alias = "f")]
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
        }
    }

    /// Parse `M`/`Male`/`F`/`Female`, case-insensitively
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "m" | "male" => Some(Self::Male),
            "f" | "female" => Some(Self::Female),
            _ => None,
        }
    }

    pub fn is_male(&self) -> bool {
        matches!(self, Self::Male)
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position of an entry in the bib confirmation workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BibState {
    /// No finish time recorded
    Unlinked,
    /// Finish time recorded, waiting for a second scan
    Linked,
    /// Finish time is final and prize-eligible
    Confirmed,
}

impl fmt::Display for BibState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unlinked => write!(f, "unlinked"),
            Self::Linked => write!(f, "linked"),
            Self::Confirmed => write!(f, "confirmed"),
        }
    }
}

/// One registrant and their result.
///
/// Invariant: `confirmed` implies a non-zero `duration`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub bib: Option<Bib>,
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    pub age: u32,
    pub optional_fields: Vec<String>,
    pub duration: RaceDuration,
    pub finished_at: Option<DateTime<Utc>>,
    pub confirmed: bool,
}

impl Entry {
    pub(crate) fn new(id: EntryId, data: EntryData, finished_at: Option<DateTime<Utc>>) -> Self {
        Self {
            id,
            bib: data.bib,
            first_name: data.first_name,
            last_name: data.last_name,
            gender: data.gender,
            age: data.age,
            optional_fields: data.optional_fields,
            duration: data.duration,
            finished_at,
            confirmed: data.confirmed,
        }
    }

    pub fn has_finished(&self) -> bool {
        !self.duration.is_zero()
    }

    pub fn state(&self) -> BibState {
        if self.confirmed {
            BibState::Confirmed
        } else if self.has_finished() {
            BibState::Linked
        } else {
            BibState::Unlinked
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Bib as displayed and exported, `--` when absent
    pub fn bib_display(&self) -> String {
        display_bib(self.bib)
    }

    /// Content hash over every field an editor can change.
    ///
    /// Recomputed on demand; two reads return the same value until the
    /// entry is mutated.
    pub fn fingerprint(&self) -> String {
        let fields = FingerprintFields {
            age: self.age,
            bib: self.bib,
            confirmed: self.confirmed,
            duration_nanos: self.duration.as_std().as_nanos() as u64,
            first_name: &self.first_name,
            last_name: &self.last_name,
            male: self.gender.is_male(),
            optional_fields: &self.optional_fields,
        };
        // Serializing plain scalars and strings cannot fail.
        let canonical = serde_json::to_string(&fields).unwrap_or_default();
        hash_string(&canonical)
    }

    /// Overwrite the editable content, keeping the entry's identity
    pub(crate) fn apply(&mut self, data: EntryData, finished_at: Option<DateTime<Utc>>) {
        self.bib = data.bib;
        self.first_name = data.first_name;
        self.last_name = data.last_name;
        self.gender = data.gender;
        self.age = data.age;
        self.optional_fields = data.optional_fields;
        self.duration = data.duration;
        self.confirmed = data.confirmed;
        self.finished_at = finished_at;
    }
}

#[derive(Serialize)]
struct FingerprintFields<'a> {
    age: u32,
    bib: Option<Bib>,
    confirmed: bool,
    duration_nanos: u64,
    first_name: &'a str,
    last_name: &'a str,
    male: bool,
    optional_fields: &'a [String],
}

/// Caller-supplied content for a new or edited entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryData {
    pub bib: Option<Bib>,
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    pub age: u32,
    #[serde(default)]
    pub optional_fields: Vec<String>,
    #[serde(default)]
    pub duration: RaceDuration,
    #[serde(default)]
    pub confirmed: bool,
}

impl EntryData {
    pub fn new(bib: Option<Bib>, first_name: &str, last_name: &str, gender: Gender, age: u32) -> Self {
        Self {
            bib,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            gender,
            age,
            optional_fields: Vec::new(),
            duration: RaceDuration::ZERO,
            confirmed: false,
        }
    }

    pub fn with_optional_fields(mut self, fields: &[&str]) -> Self {
        self.optional_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn with_result(mut self, duration: RaceDuration, confirmed: bool) -> Self {
        self.duration = duration;
        self.confirmed = confirmed;
        self
    }
}

impl From<&Entry> for EntryData {
    fn from(entry: &Entry) -> Self {
        Self {
            bib: entry.bib,
            first_name: entry.first_name.clone(),
            last_name: entry.last_name.clone(),
            gender: entry.gender,
            age: entry.age,
            optional_fields: entry.optional_fields.clone(),
            duration: entry.duration,
            confirmed: entry.confirmed,
        }
    }
}

pub fn display_bib(bib: Option<Bib>) -> String {
    bib.map(|b| b.to_string())
        .unwrap_or_else(|| UNSET_DISPLAY.to_string())
}
