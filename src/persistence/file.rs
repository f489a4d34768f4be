use super::{ImportError, ImportResult};
use crate::activity::ActivityRow;
use crate::wbs::WbsRow;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub const WBS_COLUMNS: [&str; 3] = ["WBS Short Name", "WBS Name", "Parent WBS Name"];
pub const ACTIVITY_COLUMNS: [&str; 4] =
    ["Activity_ID", "Activity_Name", "Duration_Days", "Predecessors"];
pub const ACTIVITY_WBS_COLUMN: &str = "WBS_Name";

#[derive(Deserialize)]
struct WbsCsvRecord {
    #[serde(rename = "WBS Short Name")]
    short_name: String,
    #[serde(rename = "WBS Name")]
    name: String,
    #[serde(rename = "Parent WBS Name")]
    parent_name: String,
}

#[derive(Deserialize)]
struct ActivityCsvRecord {
    #[serde(rename = "Activity_ID")]
    activity_id: String,
    #[serde(rename = "Activity_Name")]
    activity_name: String,
    #[serde(rename = "Duration_Days")]
    duration_days: String,
    #[serde(rename = "WBS_Name", default)]
    wbs_name: String,
    #[serde(rename = "Predecessors")]
    predecessors: String,
}

impl ActivityCsvRecord {
    fn into_row(self, path: &Path, row: usize) -> ImportResult<ActivityRow> {
        let invalid = |message: String| ImportError::InvalidRow {
            file: path.to_path_buf(),
            row,
            message,
        };
        if self.activity_id.is_empty() {
            return Err(invalid("Activity_ID is empty".into()));
        }
        let duration_days = parse_duration(&self.duration_days).map_err(invalid)?;
        Ok(ActivityRow {
            activity_id: self.activity_id,
            activity_name: self.activity_name,
            duration_days,
            wbs_name: self.wbs_name,
            predecessors: self.predecessors,
        })
    }
}

fn parse_duration(input: &str) -> Result<f64, String> {
    if input.is_empty() {
        return Ok(0.0);
    }
    let value = input
        .parse::<f64>()
        .map_err(|e| format!("invalid Duration_Days '{input}': {e}"))?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!(
            "Duration_Days must be a non-negative number (got {input})"
        ));
    }
    Ok(value)
}

fn open_reader(path: &Path, required: &[&str]) -> ImportResult<csv::Reader<File>> {
    let file = File::open(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);
    check_columns(&mut reader, path, required)?;
    Ok(reader)
}

fn check_columns<R: Read>(
    reader: &mut csv::Reader<R>,
    path: &Path,
    required: &[&str],
) -> ImportResult<()> {
    let headers = reader.headers()?;
    let missing: Vec<String> = required
        .iter()
        .filter(|column| !headers.iter().any(|h| h == **column))
        .map(|column| column.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ImportError::MissingColumns {
            file: path.to_path_buf(),
            columns: missing,
        })
    }
}

/// Reads a WBS file. Rows are returned in file order, which must list
/// parents before their children.
pub fn read_wbs_csv<P: AsRef<Path>>(path: P) -> ImportResult<Vec<WbsRow>> {
    let path = path.as_ref();
    let mut reader = open_reader(path, &WBS_COLUMNS)?;
    let mut rows = Vec::new();
    for (idx, record) in reader.deserialize::<WbsCsvRecord>().enumerate() {
        let record = record?;
        // A row without a short name is skipped by the resolver; one with a
        // short name must also carry the full name it is looked up by.
        if !record.short_name.is_empty() && record.name.is_empty() {
            return Err(ImportError::InvalidRow {
                file: path.to_path_buf(),
                row: idx + 1,
                message: format!("WBS Name is empty for WBS '{}'", record.short_name),
            });
        }
        rows.push(WbsRow {
            short_name: record.short_name,
            name: record.name,
            parent_name: record.parent_name,
        });
    }
    Ok(rows)
}

/// Reads an activity file. `WBS_Name` is optional; without it every
/// activity lands under the project root.
pub fn read_activity_csv<P: AsRef<Path>>(path: P) -> ImportResult<Vec<ActivityRow>> {
    let path = path.as_ref();
    let mut reader = open_reader(path, &ACTIVITY_COLUMNS)?;
    let mut rows = Vec::new();
    for (idx, record) in reader.deserialize::<ActivityCsvRecord>().enumerate() {
        rows.push(record?.into_row(path, idx + 1)?);
    }
    Ok(rows)
}
