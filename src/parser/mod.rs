use crate::error::{GradeError, GradeResult};
use crate::models::{
    GradeRow, GradeTable, QuestionScore, SubmissionState, TableRow, NOT_ATTEMPTED, OVERALL_AVERAGE,
};
use csv::{ReaderBuilder, StringRecord};
use std::io::Read;
use std::str::FromStr;
use tracing::debug;

const SURNAME_HEADER: &str = "Surname";
const FIRST_NAME_HEADER: &str = "First name";
const STATE_HEADER: &str = "State";
const TOTAL_HEADER_PREFIX: &str = "Grade";
const QUESTION_HEADER_PREFIX: &str = "Q. ";

/// Column layout of an exported grade table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Dialect {
    /// Pick `header` when the header row names the student columns, `positional` otherwise.
    #[default]
    Auto,
    /// Fixed columns: surname 0, first name 1, state 3, total 7, questions from 8.
    Positional,
    /// Columns looked up by header name.
    Header,
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Dialect::Auto),
            "positional" => Ok(Dialect::Positional),
            "header" => Ok(Dialect::Header),
            other => Err(format!(
                "unknown dialect '{}', expected auto, positional or header",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum QuestionColumns {
    From(usize),
    Listed(Vec<usize>),
}

#[derive(Debug, Clone, PartialEq)]
struct Layout {
    surname: usize,
    first_name: usize,
    state: usize,
    total: usize,
    questions: QuestionColumns,
}

impl Layout {
    fn positional() -> Self {
        Self {
            surname: 0,
            first_name: 1,
            state: 3,
            total: 7,
            questions: QuestionColumns::From(8),
        }
    }

    fn from_headers(file_name: &str, headers: &[String]) -> GradeResult<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| GradeError::malformed(file_name, 1, format!("missing column '{}'", name)))
        };

        let total = headers
            .iter()
            .position(|h| h.starts_with(TOTAL_HEADER_PREFIX))
            .ok_or_else(|| {
                GradeError::malformed(
                    file_name,
                    1,
                    format!("missing total column '{}/...'", TOTAL_HEADER_PREFIX),
                )
            })?;

        let questions = headers
            .iter()
            .enumerate()
            .filter(|(_, h)| h.starts_with(QUESTION_HEADER_PREFIX))
            .map(|(i, _)| i)
            .collect();

        Ok(Self {
            surname: find(SURNAME_HEADER)?,
            first_name: find(FIRST_NAME_HEADER)?,
            state: find(STATE_HEADER)?,
            total,
            questions: QuestionColumns::Listed(questions),
        })
    }
}

fn looks_header_keyed(headers: &[String]) -> bool {
    [SURNAME_HEADER, FIRST_NAME_HEADER, STATE_HEADER]
        .iter()
        .all(|name| headers.iter().any(|h| h == name))
}

/// Interpret a score cell. `-` and empty cells are not-attempted.
pub fn parse_score(value: &str) -> Option<QuestionScore> {
    let value = value.trim();
    if value.is_empty() || value == NOT_ATTEMPTED {
        return Some(QuestionScore::NotAttempted);
    }

    let normalized = if value.contains(',') && !value.contains('.') {
        value.replace(',', ".")
    } else {
        value.to_string()
    };

    normalized
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(QuestionScore::Scored)
}

/// Parse an exported grade table into normalized rows.
///
/// Reading stops at the "Overall average" row; it is kept as the table's
/// last row so the end of student data stays visible to callers.
pub fn parse_grade_table<R: Read>(
    file_name: &str,
    reader: R,
    dialect: Dialect,
) -> GradeResult<GradeTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let dialect = match dialect {
        Dialect::Auto if looks_header_keyed(&headers) => Dialect::Header,
        Dialect::Auto => Dialect::Positional,
        other => other,
    };
    let layout = match dialect {
        Dialect::Header => Layout::from_headers(file_name, &headers)?,
        _ => Layout::positional(),
    };
    debug!(file = file_name, ?dialect, "parsing grade table");

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let line = record.position().map(|p| p.line() as usize).unwrap_or(0);

        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        let surname = field(&record, layout.surname, file_name, line, SURNAME_HEADER)?;
        if surname == OVERALL_AVERAGE {
            rows.push(TableRow::OverallAverage);
            break;
        }

        rows.push(TableRow::Submission(parse_row(
            &record, &layout, file_name, line, surname,
        )?));
    }

    Ok(GradeTable {
        file_name: file_name.to_string(),
        rows,
    })
}

fn parse_row(
    record: &StringRecord,
    layout: &Layout,
    file_name: &str,
    line: usize,
    surname: &str,
) -> GradeResult<GradeRow> {
    let first_name = field(record, layout.first_name, file_name, line, FIRST_NAME_HEADER)?;
    let state = SubmissionState::parse(field(record, layout.state, file_name, line, STATE_HEADER)?);

    // Scores are only read where the reconciler will use them
    let mut total = None;
    let mut questions = Vec::new();
    match state {
        SubmissionState::Finished => {
            let raw = field(record, layout.total, file_name, line, TOTAL_HEADER_PREFIX)?;
            match score(raw, file_name, line)? {
                QuestionScore::Scored(v) => total = Some(v),
                QuestionScore::NotAttempted => {
                    return Err(GradeError::malformed(
                        file_name,
                        line,
                        format!("finished attempt of {} {} has no total grade", surname, first_name),
                    ));
                }
            }
        }
        SubmissionState::InProgress => {
            let columns: Vec<usize> = match &layout.questions {
                QuestionColumns::From(start) => (*start..record.len()).collect(),
                QuestionColumns::Listed(columns) => columns.clone(),
            };
            for column in columns {
                let raw = record.get(column).unwrap_or(NOT_ATTEMPTED);
                questions.push(score(raw, file_name, line)?);
            }
        }
        SubmissionState::Other => {}
    }

    Ok(GradeRow {
        line,
        surname: surname.to_string(),
        first_name: first_name.to_string(),
        state,
        total,
        questions,
    })
}

fn field<'r>(
    record: &'r StringRecord,
    index: usize,
    file_name: &str,
    line: usize,
    column: &str,
) -> GradeResult<&'r str> {
    record.get(index).map(str::trim).ok_or_else(|| {
        GradeError::malformed(
            file_name,
            line,
            format!("missing column '{}' (index {})", column, index),
        )
    })
}

fn score(raw: &str, file_name: &str, line: usize) -> GradeResult<QuestionScore> {
    parse_score(raw).ok_or_else(|| {
        GradeError::malformed(file_name, line, format!("score '{}' is not a number", raw.trim()))
    })
}
