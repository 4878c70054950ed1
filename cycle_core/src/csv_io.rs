//! CSV import and export of period history.
//!
//! Export writes the history newest first. Import tolerates bad rows: they
//! are logged and skipped so one typo does not lose the whole file.

use crate::{Error, Flow, PeriodEntry, Result};
use chrono::NaiveDate;
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;
use uuid::Uuid;

/// A row in the CSV file
#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    #[serde(default)]
    id: Option<String>,
    start_date: String,
    #[serde(default)]
    end_date: Option<String>,
    #[serde(default)]
    flow: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

impl From<&PeriodEntry> for CsvRow {
    fn from(entry: &PeriodEntry) -> Self {
        CsvRow {
            id: Some(entry.id.clone()),
            start_date: entry.start_date.to_string(),
            end_date: entry.end_date.map(|d| d.to_string()),
            flow: Some(entry.flow.to_string()),
            notes: entry.notes.clone(),
        }
    }
}

impl TryFrom<CsvRow> for PeriodEntry {
    type Error = Error;

    fn try_from(row: CsvRow) -> Result<Self> {
        let start_date = parse_date(&row.start_date)?;
        let end_date = non_blank(row.end_date).map(|s| parse_date(&s)).transpose()?;
        let flow = match non_blank(row.flow) {
            Some(s) => s.parse()?,
            None => Flow::default(),
        };
        let id = non_blank(row.id)
            .unwrap_or_else(|| derived_id(start_date, end_date, flow).to_string());

        let entry = PeriodEntry {
            id,
            start_date,
            end_date,
            flow,
            notes: non_blank(row.notes),
        };
        entry.validate()?;
        Ok(entry)
    }
}

/// Stable id for a row that has none, so re-importing it is a no-op
fn derived_id(start_date: NaiveDate, end_date: Option<NaiveDate>, flow: Flow) -> Uuid {
    let end = end_date.map(|d| d.to_string()).unwrap_or_default();
    let name = format!("{}|{}|{}", start_date, end, flow);
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    s.trim()
        .parse::<NaiveDate>()
        .map_err(|e| Error::InvalidDate(format!("'{}': {}", s, e)))
}

/// Write `entries` to `path` newest first, replacing any existing file
///
/// Returns the number of rows written.
pub fn export_csv(entries: &[PeriodEntry], path: &Path) -> Result<usize> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let file = File::create(path)?;
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);

    let rows = crate::store::history(entries);
    for entry in &rows {
        writer.serialize(CsvRow::from(entry))?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| Error::Io(std::io::Error::other(e.to_string())))?;
    file.sync_all()?;

    tracing::info!("Exported {} entries to {:?}", rows.len(), path);
    Ok(rows.len())
}

/// Read entries from a CSV file, skipping rows that fail to parse
pub fn import_csv(path: &Path) -> Result<Vec<PeriodEntry>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut entries = Vec::new();
    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        // Header is line 1
        let line = index + 2;
        match result {
            Ok(row) => match PeriodEntry::try_from(row) {
                Ok(entry) => entries.push(entry),
                Err(e) => tracing::warn!("Skipping CSV line {}: {}", line, e),
            },
            Err(e) => tracing::warn!("Failed to deserialize CSV line {}: {}", line, e),
        }
    }

    tracing::debug!("Read {} entries from {:?}", entries.len(), path);
    Ok(entries)
}

/// Append `incoming` entries whose id is not already in `existing`
///
/// Returns the merged collection and how many entries were added.
pub fn merge_entries(
    existing: Vec<PeriodEntry>,
    incoming: Vec<PeriodEntry>,
) -> (Vec<PeriodEntry>, usize) {
    let mut seen: HashSet<String> = existing.iter().map(|e| e.id.clone()).collect();
    let mut merged = existing;
    let mut added = 0;

    for entry in incoming {
        if seen.insert(entry.id.clone()) {
            merged.push(entry);
            added += 1;
        }
    }

    (merged, added)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_export_then_import() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("history.csv");

        let entries = vec![
            PeriodEntry::new(date("2024-01-01"), Some(date("2024-01-05")), Flow::Heavy, None),
            PeriodEntry::new(
                date("2024-01-29"),
                None,
                Flow::Light,
                Some("short, light".into()),
            ),
        ];

        assert_eq!(export_csv(&entries, &path).unwrap(), 2);

        let imported = import_csv(&path).unwrap();
        assert_eq!(imported.len(), 2);
        // Newest first on disk
        assert_eq!(imported[0].id, entries[1].id);
        assert_eq!(imported[0].notes.as_deref(), Some("short, light"));
        assert_eq!(imported[1].end_date, Some(date("2024-01-05")));
        assert_eq!(imported[1].flow, Flow::Heavy);
    }

    #[test]
    fn test_import_skips_bad_rows() {
        crate::logging::init_test();
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("history.csv");

        let csv = "\
id,start_date,end_date,flow,notes
a,2024-01-01,2024-01-05,heavy,
b,not-a-date,,light,
c,2024-02-10,2024-02-01,medium,
d,2024-01-29,,spotting,
,2024-02-26,,,first of month
";
        std::fs::write(&path, csv).unwrap();

        let imported = import_csv(&path).unwrap();
        assert_eq!(imported.len(), 2);
        assert_eq!(imported[0].id, "a");
        assert_eq!(imported[0].notes, None);

        // Missing id and flow get filled in
        assert!(!imported[1].id.is_empty());
        assert_eq!(imported[1].flow, Flow::Medium);
        assert_eq!(imported[1].notes.as_deref(), Some("first of month"));
    }

    #[test]
    fn test_rows_without_id_reimport_without_duplicates() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("history.csv");
        std::fs::write(
            &path,
            "start_date,end_date,flow\n2024-01-01,2024-01-05,heavy\n2024-01-29,,\n",
        )
        .unwrap();

        let first = import_csv(&path).unwrap();
        let (merged, added) = merge_entries(Vec::new(), first);
        assert_eq!(added, 2);

        let (merged, added) = merge_entries(merged, import_csv(&path).unwrap());
        assert_eq!(added, 0);
        assert_eq!(merged.len(), 2);
        assert_ne!(merged[0].id, merged[1].id);
    }

    #[test]
    fn test_merge_skips_known_ids() {
        let a = PeriodEntry::new(date("2024-01-01"), None, Flow::Light, None);
        let b = PeriodEntry::new(date("2024-01-29"), None, Flow::Light, None);

        let (merged, added) = merge_entries(vec![a.clone()], vec![a.clone(), b.clone()]);
        assert_eq!(added, 1);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[1].id, b.id);
    }
}
