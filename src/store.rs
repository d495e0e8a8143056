use crate::error::{GradeError, GradeResult};
use crate::models::GradeTable;
use crate::parser::{self, Dialect};
use crate::roster::{ensure_dir_not_empty, files_with_extension};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tracing::info;

/// Exported grade tables stored as `*.csv` files in one directory.
#[derive(Debug, Clone)]
pub struct GradeStore {
    dir: PathBuf,
    dialect: Dialect,
}

impl GradeStore {
    pub fn new(dir: impl Into<PathBuf>, dialect: Dialect) -> Self {
        Self {
            dir: dir.into(),
            dialect,
        }
    }

    /// List grade file names, sorted.
    pub fn list_files(&self) -> GradeResult<Vec<String>> {
        ensure_dir_not_empty(
            &self.dir,
            format!(
                "Grades directory {} not found. Consider creating a /grades directory in the root directory of the program.",
                self.dir.display()
            ),
            "No grade files found.",
        )?;

        let mut files = files_with_extension(&self.dir, "csv")?;
        if files.is_empty() {
            return Err(GradeError::missing(format!(
                "No .csv grade files found in {}.",
                self.dir.display()
            )));
        }
        files.sort();
        Ok(files)
    }

    pub fn load(&self, file_name: &str) -> GradeResult<GradeTable> {
        let path = self.dir.join(file_name);
        if !path.is_file() {
            return Err(GradeError::missing(format!(
                "Grade file {} not found. Consider creating a file with the grade name in the /grades directory in the root directory of the program.",
                file_name
            )));
        }

        let reader = BufReader::new(File::open(&path)?);
        let table = parser::parse_grade_table(file_name, reader, self.dialect)?;
        info!(file = file_name, rows = table.rows.len(), "loaded grade table");
        Ok(table)
    }
}
