//! Tabular snapshot export and import
//!
//! A snapshot is a header row followed by data rows. When the race has
//! started, the first row after the header is a start marker: every fixed
//! column empty except `Time Finished`, which carries the start instant.
//! Columns the header names beyond the fixed set are the optional fields.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{UNSET_DISPLAY, columns};
use crate::error::{RaceError, RaceResult};
use crate::models::{Bib, EntryData, Gender, RaceDuration};
use crate::utils::validation::parse_age;
use crate::utils::{format_timestamp, parse_datetime};

use super::Race;

/// Snapshot rows, header first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub rows: Vec<Vec<String>>,
}

/// What an import loaded
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub started_at: Option<DateTime<Utc>>,
    pub optional_fields: Vec<String>,
}

/// Where each column lives in an imported header
struct ColumnMap {
    width: usize,
    first_name: usize,
    last_name: usize,
    age: usize,
    gender: usize,
    bib: Option<usize>,
    duration: Option<usize>,
    time_finished: Option<usize>,
    confirmed: Option<usize>,
    /// Fixed columns present in the header, other than `Time Finished`
    fixed: Vec<usize>,
    /// (name, index) of every optional column, in header order
    optional: Vec<(String, usize)>,
}

impl ColumnMap {
    fn from_header(header: &[String]) -> RaceResult<Self> {
        let names: Vec<&str> = header.iter().map(|h| h.trim()).collect();

        let mut seen = HashSet::new();
        for name in &names {
            if name.is_empty() {
                return Err(RaceError::Validation("Snapshot header has an empty column name".to_string()));
            }
            if !seen.insert(*name) {
                return Err(RaceError::Validation(format!("Snapshot header repeats column `{}`", name)));
            }
        }

        let find = |column: &str| names.iter().position(|name| *name == column);

        let missing: Vec<String> = columns::MANDATORY
            .iter()
            .filter(|column| find(**column).is_none())
            .map(|column| column.to_string())
            .collect();
        let (Some(first_name), Some(last_name), Some(age), Some(gender)) = (
            find(columns::FIRST_NAME),
            find(columns::LAST_NAME),
            find(columns::AGE),
            find(columns::GENDER),
        ) else {
            return Err(RaceError::MissingColumns(missing));
        };

        let fixed = columns::ALL
            .iter()
            .filter(|column| **column != columns::TIME_FINISHED)
            .filter_map(|column| find(*column))
            .collect();
        let optional = names
            .iter()
            .enumerate()
            .filter(|(_, name)| !columns::ALL.contains(*name))
            .map(|(index, name)| (name.to_string(), index))
            .collect();

        Ok(Self {
            width: names.len(),
            first_name,
            last_name,
            age,
            gender,
            bib: find(columns::BIB),
            duration: find(columns::DURATION),
            time_finished: find(columns::TIME_FINISHED),
            confirmed: find(columns::CONFIRMED),
            fixed,
            optional,
        })
    }

    /// Start instant if `row` is a start marker
    fn start_marker(&self, row: &[String], line: usize) -> RaceResult<Option<DateTime<Utc>>> {
        let Some(time_finished) = self.time_finished else {
            return Ok(None);
        };
        let cell = row[time_finished].trim();
        if cell.is_empty() || self.fixed.iter().any(|&index| !row[index].trim().is_empty()) {
            return Ok(None);
        }
        parse_datetime(cell).map(Some).ok_or_else(|| {
            RaceError::Validation(format!("Row {}: invalid race start time `{}`", line, cell))
        })
    }

    fn parse_row(&self, row: &[String], line: usize) -> RaceResult<EntryData> {
        let invalid = |msg: String| RaceError::Validation(format!("Row {}: {}", line, msg));
        let cell = |index: Option<usize>| index.map(|i| row[i].trim()).unwrap_or("");

        let age = parse_age(&row[self.age]).map_err(invalid)?;
        let gender = Gender::parse(&row[self.gender])
            .ok_or_else(|| invalid(format!("invalid gender `{}`", row[self.gender].trim())))?;
        let bib = parse_bib(cell(self.bib)).map_err(invalid)?;
        let duration = cell(self.duration)
            .parse::<RaceDuration>()
            .map_err(|e| invalid(e.to_string()))?;
        let confirmed = cell(self.confirmed).eq_ignore_ascii_case("true");

        Ok(EntryData {
            bib,
            first_name: row[self.first_name].trim().to_string(),
            last_name: row[self.last_name].trim().to_string(),
            gender,
            age,
            optional_fields: self
                .optional
                .iter()
                .map(|(_, index)| row[*index].clone())
                .collect(),
            duration,
            confirmed,
        })
    }
}

fn parse_bib(cell: &str) -> Result<Option<Bib>, String> {
    if cell.is_empty() || cell == UNSET_DISPLAY {
        return Ok(None);
    }
    cell.parse::<Bib>()
        .map(Some)
        .map_err(|_| format!("invalid bib `{}`", cell))
}

impl Race {
    /// Export the race as rows in ranked order
    pub fn export_snapshot(&self) -> Snapshot {
        let header: Vec<String> = columns::ALL
            .iter()
            .map(|column| column.to_string())
            .chain(self.optional_fields.iter().cloned())
            .collect();
        let width = header.len();

        let mut rows = Vec::with_capacity(self.entries.len() + 2);
        rows.push(header);

        if let Some(start) = self.started_at {
            let mut marker = vec![String::new(); width];
            if let Some(index) = columns::ALL.iter().position(|c| *c == columns::TIME_FINISHED) {
                marker[index] = format_timestamp(start);
            }
            rows.push(marker);
        }

        for (position, entry) in self.entries.iter().enumerate() {
            let mut row = Vec::with_capacity(width);
            row.push(entry.first_name.clone());
            row.push(entry.last_name.clone());
            row.push(entry.age.to_string());
            row.push(entry.gender.to_string());
            row.push(entry.bib_display());
            row.push((position + 1).to_string());
            row.push(entry.duration.to_string());
            row.push(
                entry
                    .finished_at
                    .map(format_timestamp)
                    .unwrap_or_else(|| UNSET_DISPLAY.to_string()),
            );
            row.push(entry.confirmed.to_string());
            row.extend(entry.optional_fields.iter().cloned());
            rows.push(row);
        }

        Snapshot { rows }
    }

    /// Load a snapshot into this race.
    ///
    /// All or nothing: the rows are applied to a copy of the race, which only
    /// replaces `self` once every row went in.
    pub fn import_snapshot(&mut self, rows: &[Vec<String>]) -> RaceResult<ImportSummary> {
        let Some((header, body)) = rows.split_first() else {
            return Err(RaceError::Validation("Snapshot is empty".to_string()));
        };
        if body.is_empty() {
            return Err(RaceError::Validation("Snapshot contains only a header".to_string()));
        }

        let map = ColumnMap::from_header(header)?;
        for (offset, row) in body.iter().enumerate() {
            if row.len() != map.width {
                return Err(RaceError::Validation(format!(
                    "Row {} has {} fields, header has {}",
                    offset + 2,
                    row.len(),
                    map.width
                )));
            }
        }

        let start = map.start_marker(&body[0], 2)?;
        let (first_line, data_rows) = match start {
            Some(_) => (3, &body[1..]),
            None => (2, body),
        };
        let entries = data_rows
            .iter()
            .enumerate()
            .map(|(offset, row)| map.parse_row(row, first_line + offset))
            .collect::<RaceResult<Vec<_>>>()?;

        let optional_fields: Vec<String> = map.optional.into_iter().map(|(name, _)| name).collect();

        let mut staged = self.clone();
        if let Some(at) = start {
            staged.start(Some(at))?;
        }
        staged.set_optional_field_schema(optional_fields.clone())?;
        let imported = entries.len();
        for data in entries {
            staged.admit(data)?;
        }
        staged.resort();
        staged.recompute_prizes();

        tracing::info!(imported, started_at = ?staged.started_at, "Snapshot imported");
        *self = staged;

        Ok(ImportSummary {
            imported,
            started_at: self.started_at,
            optional_fields,
        })
    }
}
