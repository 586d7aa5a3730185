//! Dataset normalization: raw tabular anime records into combined text.
//!
//! The raw dataset is a CSV with `Name`, `Genres`, and `sypnopsis` columns
//! (the synopsis header is misspelled in the source data and is matched
//! as-is). Each valid row becomes one [`CombinedRecord`] whose
//! `combined_info` text is what gets chunked and embedded downstream.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Accepted header spellings for each required field, in match order.
const NAME_COLUMNS: &[&str] = &["Name", "name"];
const GENRES_COLUMNS: &[&str] = &["Genres", "genres"];
const SYNOPSIS_COLUMNS: &[&str] = &["sypnopsis", "synopsis", "Synopsis"];

/// A normalized record carrying the single combined text field used for
/// chunking and retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedRecord {
    /// Anime title, kept for chunk provenance.
    pub name: String,
    /// `"{name}. Overview: {synopsis} Genres: {genres}"`. The format is
    /// fixed; retrieval reproducibility depends on it staying stable.
    pub combined_info: String,
}

impl CombinedRecord {
    fn from_fields(name: &str, synopsis: &str, genres: &str) -> Self {
        Self {
            name: name.to_string(),
            combined_info: format!("{name}. Overview: {synopsis} Genres: {genres}"),
        }
    }
}

/// Normalizes raw rows from an open CSV reader.
///
/// Rows with an empty name, genres, or synopsis value are dropped and
/// counted; a required column missing from the header entirely fails the
/// whole load with [`CoreError::Schema`]. Identical input always yields
/// identical output.
pub fn normalize<R: std::io::Read>(reader: &mut csv::Reader<R>) -> Result<Vec<CombinedRecord>> {
    let headers = reader.headers()?.clone();
    let name_idx = find_column(&headers, NAME_COLUMNS, "Name")?;
    let genres_idx = find_column(&headers, GENRES_COLUMNS, "Genres")?;
    let synopsis_idx = find_column(&headers, SYNOPSIS_COLUMNS, "sypnopsis")?;

    let mut records = Vec::new();
    let mut dropped = 0usize;
    for row in reader.records() {
        let row = row?;
        let name = row.get(name_idx).map(str::trim).unwrap_or("");
        let genres = row.get(genres_idx).map(str::trim).unwrap_or("");
        let synopsis = row.get(synopsis_idx).map(str::trim).unwrap_or("");

        if name.is_empty() || genres.is_empty() || synopsis.is_empty() {
            dropped += 1;
            tracing::debug!(
                line = row.position().map(|p| p.line()),
                "dropping row with missing required fields"
            );
            continue;
        }
        records.push(CombinedRecord::from_fields(name, synopsis, genres));
    }

    tracing::info!(kept = records.len(), dropped, "normalized dataset");
    Ok(records)
}

/// Reads and normalizes the dataset file at `path`.
pub fn load_dataset<P: AsRef<Path>>(path: P) -> Result<Vec<CombinedRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    normalize(&mut reader)
}

/// Persists the reduced one-column dataset artifact for reuse and
/// inspection. Normalization itself never writes; this is the caller's
/// explicit step.
pub fn write_combined<P: AsRef<Path>>(records: &[CombinedRecord], path: P) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["combined_info"])?;
    for record in records {
        writer.write_record([record.combined_info.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

fn find_column(
    headers: &csv::StringRecord,
    candidates: &[&str],
    canonical: &str,
) -> Result<usize> {
    candidates
        .iter()
        .find_map(|candidate| headers.iter().position(|header| header == *candidate))
        .ok_or_else(|| CoreError::Schema {
            column: canonical.to_string(),
        })
}
