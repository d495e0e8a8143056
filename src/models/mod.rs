use indexmap::IndexMap;
use serde::Serialize;

/// Surname field of the row that opens the aggregate statistics block of an export.
pub const OVERALL_AVERAGE: &str = "Overall average";

/// Field value marking a question that was not answered.
pub const NOT_ATTEMPTED: &str = "-";

// ============================================================================
// Roster Models
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Roster {
    pub class_name: String,
    pub names: Vec<String>,
}

impl Roster {
    pub fn new(class_name: impl Into<String>, names: Vec<String>) -> Self {
        Self {
            class_name: class_name.into(),
            names,
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

// ============================================================================
// Grade Table Models
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SubmissionState {
    Finished,
    InProgress,
    Other,
}

impl SubmissionState {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "Finished" => SubmissionState::Finished,
            "In progress" => SubmissionState::InProgress,
            _ => SubmissionState::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QuestionScore {
    Scored(f64),
    NotAttempted,
}

impl QuestionScore {
    pub fn value(&self) -> f64 {
        match self {
            QuestionScore::Scored(v) => *v,
            QuestionScore::NotAttempted => 0.0,
        }
    }
}

/// One submission record, normalized from whichever CSV dialect it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeRow {
    /// Line of the source CSV file, for error messages.
    pub line: usize,
    pub surname: String,
    pub first_name: String,
    pub state: SubmissionState,
    /// `None` when the export shows the not-attempted marker in the total column.
    pub total: Option<f64>,
    pub questions: Vec<QuestionScore>,
}

impl GradeRow {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.surname, self.first_name)
    }

    pub fn reversed_name(&self) -> String {
        format!("{} {}", self.first_name, self.surname)
    }

    /// Sum of answered questions; not-attempted questions contribute nothing.
    pub fn question_sum(&self) -> f64 {
        self.questions.iter().map(QuestionScore::value).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableRow {
    Submission(GradeRow),
    /// Start of the aggregate statistics block; nothing after it is student data.
    OverallAverage,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradeTable {
    pub file_name: String,
    pub rows: Vec<TableRow>,
}

// ============================================================================
// Result Models
// ============================================================================

/// Roster name -> whole-number grade, iterating in roster order.
pub type ReconciledGrades = IndexMap<String, i64>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeStats {
    pub graded: usize,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub mode: Option<i64>,
    pub std_dev: Option<f64>,
}

impl GradeStats {
    /// Statistics over the non-zero grades only; zero means "no submission".
    pub fn calculate(grades: &ReconciledGrades) -> Self {
        let values: Vec<i64> = grades.values().copied().filter(|g| *g != 0).collect();
        let graded = values.len();

        if graded == 0 {
            return Self {
                graded,
                mean: None,
                median: None,
                mode: None,
                std_dev: None,
            };
        }

        // Summed as f64 so large grades cannot overflow
        let mean = values.iter().map(|v| *v as f64).sum::<f64>() / graded as f64;

        let mut sorted = values.clone();
        sorted.sort_unstable();
        let mid = graded / 2;
        let median = if graded % 2 == 0 {
            (sorted[mid - 1] as f64 + sorted[mid] as f64) / 2.0
        } else {
            sorted[mid] as f64
        };

        // Ties go to the value seen first in roster order
        let mut counts: IndexMap<i64, usize> = IndexMap::new();
        for v in &values {
            *counts.entry(*v).or_insert(0) += 1;
        }
        let mut mode = None;
        let mut best = 0;
        for (value, count) in &counts {
            if *count > best {
                best = *count;
                mode = Some(*value);
            }
        }

        let std_dev = if graded > 1 {
            let variance = values
                .iter()
                .map(|v| {
                    let d = *v as f64 - mean;
                    d * d
                })
                .sum::<f64>()
                / (graded - 1) as f64;
            Some(variance.sqrt())
        } else {
            None
        };

        Self {
            graded,
            mean: Some(mean),
            median: Some(median),
            mode,
            std_dev,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grades(pairs: &[(&str, i64)]) -> ReconciledGrades {
        pairs.iter().map(|(n, g)| (n.to_string(), *g)).collect()
    }

    #[test]
    fn test_state_parse() {
        assert_eq!(SubmissionState::parse("Finished"), SubmissionState::Finished);
        assert_eq!(SubmissionState::parse(" In progress "), SubmissionState::InProgress);
        assert_eq!(SubmissionState::parse("Never submitted"), SubmissionState::Other);
    }

    #[test]
    fn test_question_sum_skips_not_attempted() {
        let row = GradeRow {
            line: 2,
            surname: "Smith".to_string(),
            first_name: "John".to_string(),
            state: SubmissionState::InProgress,
            total: None,
            questions: vec![
                QuestionScore::Scored(3.0),
                QuestionScore::NotAttempted,
                QuestionScore::Scored(2.0),
            ],
        };
        assert_eq!(row.full_name(), "Smith John");
        assert_eq!(row.reversed_name(), "John Smith");
        assert_eq!(row.question_sum(), 5.0);
    }

    #[test]
    fn test_stats_ignore_zero_grades() {
        let stats = GradeStats::calculate(&grades(&[
            ("A", 4),
            ("B", 0),
            ("C", 8),
            ("D", 8),
            ("E", 0),
        ]));
        assert_eq!(stats.graded, 3);
        assert!((stats.mean.unwrap() - 20.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.median, Some(8.0));
        assert_eq!(stats.mode, Some(8));
        // sample deviation of [4, 8, 8]
        assert!((stats.std_dev.unwrap() - 2.309_401_076_758_503).abs() < 1e-9);
    }

    #[test]
    fn test_stats_even_count_median_and_mode_tie() {
        let stats = GradeStats::calculate(&grades(&[("A", 6), ("B", 2), ("C", 9), ("D", 5)]));
        assert_eq!(stats.median, Some(5.5));
        assert_eq!(stats.mode, Some(6));
    }

    #[test]
    fn test_stats_single_grade_has_no_deviation() {
        let stats = GradeStats::calculate(&grades(&[("A", 7), ("B", 0)]));
        assert_eq!(stats.graded, 1);
        assert_eq!(stats.mean, Some(7.0));
        assert_eq!(stats.std_dev, None);
    }

    #[test]
    fn test_stats_with_huge_grades() {
        let stats = GradeStats::calculate(&grades(&[("A", i64::MAX), ("B", i64::MAX - 1)]));
        assert_eq!(stats.graded, 2);
        let mean = stats.mean.unwrap();
        assert!(mean.is_finite() && mean > 9.0e18);
        assert_eq!(stats.median, stats.mean);
    }

    #[test]
    fn test_stats_all_zero() {
        let stats = GradeStats::calculate(&grades(&[("A", 0)]));
        assert_eq!(stats.graded, 0);
        assert_eq!(stats.mean, None);
        assert_eq!(stats.mode, None);
    }
}
