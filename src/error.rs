use thiserror::Error;

/// Failures raised while loading rosters and grade tables or reconciling them.
#[derive(Debug, Error)]
pub enum GradeError {
    /// A required directory or file is absent, or a directory holds nothing usable.
    #[error("{message}")]
    ResourceMissing { message: String },

    /// A grade table row names someone who is not on the roster.
    #[error("Student {name} not found in the class file. Perhaps you've chosen the wrong class.")]
    NameMismatch { name: String },

    /// A field could not be interpreted (non-numeric score, missing column, ...).
    /// `line` is the line of the CSV file the record was read from.
    #[error("{file}: line {line}: {reason}")]
    Malformed {
        file: String,
        line: usize,
        reason: String,
    },

    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GradeError {
    pub fn missing(message: impl Into<String>) -> Self {
        GradeError::ResourceMissing {
            message: message.into(),
        }
    }

    pub fn malformed(file: &str, line: usize, reason: impl Into<String>) -> Self {
        GradeError::Malformed {
            file: file.to_string(),
            line,
            reason: reason.into(),
        }
    }
}

pub type GradeResult<T> = std::result::Result<T, GradeError>;
