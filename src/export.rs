use crate::models::ReconciledGrades;
use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    student: &'a str,
    grade: i64,
}

/// Export reconciled grades of one table to a CSV file in `out_dir`
pub fn export_to_csv(
    grades: &ReconciledGrades,
    class_name: &str,
    table_name: &str,
    out_dir: &Path,
) -> Result<PathBuf> {
    if grades.is_empty() {
        anyhow::bail!("No grades to export");
    }

    // Generate filename with timestamp
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let stem = Path::new(table_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(table_name);
    let filename = format!("results_{}_{}_{}.csv", class_name, stem, timestamp);
    let filepath = out_dir.join(filename);

    let mut wtr = csv::Writer::from_path(&filepath).context("Failed to create CSV file")?;

    // Header comes from the row struct's field names
    for (student, grade) in grades {
        wtr.serialize(ExportRow {
            student,
            grade: *grade,
        })
        .context("Failed to write CSV record")?;
    }

    wtr.flush().context("Failed to flush CSV writer")?;

    Ok(filepath)
}
