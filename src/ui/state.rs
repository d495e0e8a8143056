use crate::models::{ReconciledGrades, Roster};

#[derive(Debug, Clone)]
pub enum AppState {
    ClassSelection {
        classes: Vec<String>,
        selected_index: usize,
    },
    Summary {
        session: Session,
        file_index: usize,
        grades: ReconciledGrades,
        show_stats: bool,
        scroll: u16,
        status: Option<String>,
    },
    FileError {
        session: Session,
        file_index: usize,
        message: String,
    },
    Complete {
        session: Session,
    },
    Error {
        message: String,
    },
}

/// The class chosen for this run and the grade files to walk through.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub roster: Roster,
    pub files: Vec<String>,
}

impl Session {
    pub fn file(&self, index: usize) -> &str {
        self.files.get(index).map(String::as_str).unwrap_or("")
    }

    pub fn progress(&self, index: usize) -> String {
        format!("{}/{}", index + 1, self.files.len())
    }
}
