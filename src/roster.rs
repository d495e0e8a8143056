use crate::collate;
use crate::error::{GradeError, GradeResult};
use crate::models::Roster;
use indexmap::IndexSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const ROSTER_EXTENSION: &str = "txt";

/// Class rosters stored as `<class>.txt` files, one student per line.
#[derive(Debug, Clone)]
pub struct RosterStore {
    dir: PathBuf,
}

impl RosterStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// List the class names that have a roster file, sorted by name.
    pub fn list_classes(&self) -> GradeResult<Vec<String>> {
        ensure_dir_not_empty(
            &self.dir,
            format!(
                "Classes directory {} not found. Consider creating a /classes directory in the root directory of the program.",
                self.dir.display()
            ),
            "No class files found. Consider creating a file with the class name in the /classes directory in the root directory of the program.",
        )?;

        let mut classes: Vec<String> = files_with_extension(&self.dir, ROSTER_EXTENSION)?
            .iter()
            .filter_map(|file| Path::new(file).file_stem()?.to_str().map(str::to_string))
            .collect();
        if classes.is_empty() {
            return Err(GradeError::missing(format!(
                "No .{} class files found in {}.",
                ROSTER_EXTENSION,
                self.dir.display()
            )));
        }
        classes.sort();
        Ok(classes)
    }

    /// Load the roster of a class, ordered for display.
    pub fn load(&self, class_name: &str) -> GradeResult<Roster> {
        let path = self.dir.join(format!("{}.{}", class_name, ROSTER_EXTENSION));
        if !path.is_file() {
            return Err(GradeError::missing(format!(
                "Class file {}.{} not found. Consider creating a file with the class name in the /classes directory in the root directory of the program.",
                class_name, ROSTER_EXTENSION
            )));
        }

        let content = fs::read_to_string(&path)?;
        let roster = parse_roster(class_name, &content);
        if roster.is_empty() {
            warn!(class = class_name, "roster has no students");
        }
        info!(class = class_name, students = roster.len(), "loaded roster");
        Ok(roster)
    }
}

/// Build a roster from file content: trimmed non-empty lines, first occurrence
/// of a duplicate kept, sorted for display.
pub fn parse_roster(class_name: &str, content: &str) -> Roster {
    let mut names: IndexSet<String> = IndexSet::new();
    for line in content.lines() {
        let name = line.trim().trim_start_matches('\u{feff}');
        if name.is_empty() {
            continue;
        }
        if !names.insert(name.to_string()) {
            warn!(class = class_name, name, "duplicate name in roster, ignoring");
        }
    }

    let mut names: Vec<String> = names.into_iter().collect();
    collate::sort_names(&mut names);
    Roster::new(class_name, names)
}

/// Fail with a remediation hint when `dir` is missing or has no entries.
pub(crate) fn ensure_dir_not_empty(
    dir: &Path,
    missing_message: String,
    empty_message: &str,
) -> GradeResult<()> {
    if !dir.is_dir() {
        return Err(GradeError::missing(missing_message));
    }
    if fs::read_dir(dir)?.next().is_none() {
        return Err(GradeError::missing(empty_message));
    }
    Ok(())
}

/// File names in `dir` with the given extension, unsorted.
pub(crate) fn files_with_extension(dir: &Path, extension: &str) -> GradeResult<Vec<String>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case(extension))
            .unwrap_or(false);
        if !matches {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            files.push(name.to_string());
        }
    }
    Ok(files)
}
