use crate::error::{GradeError, GradeResult};
use crate::models::{GradeRow, GradeTable, ReconciledGrades, Roster, SubmissionState, TableRow};
use indexmap::IndexMap;
use tracing::debug;

/// Round to the nearest whole grade, ties to even (7.5 -> 8, 8.5 -> 8).
///
/// Returns `None` when the score does not fit a whole-number grade.
pub fn round_grade(score: f64) -> Option<i64> {
    let rounded = score.round_ties_even();
    // i64::MAX as f64 rounds up to 2^63, which is already out of range
    if rounded.is_finite() && rounded >= i64::MIN as f64 && rounded < i64::MAX as f64 {
        Some(rounded as i64)
    } else {
        None
    }
}

fn rounded(score: f64, row: &GradeRow) -> GradeResult<i64> {
    round_grade(score).ok_or_else(|| {
        GradeError::malformed(
            "",
            row.line,
            format!("score {} of {} is out of range", score, row.full_name()),
        )
    })
}

/// Reconcile one grade table against a class roster.
///
/// Every roster name gets an entry, starting at 0. A finished attempt sets the
/// grade from its total and locks it against later in-progress attempts; an
/// in-progress attempt only ever raises the grade to the rounded sum of its
/// answered questions. When a name has several finished attempts the last one
/// wins. Rows after the "Overall average" sentinel are ignored.
pub fn reconcile<S: AsRef<str>>(roster: &[S], rows: &[TableRow]) -> GradeResult<ReconciledGrades> {
    let mut grades: ReconciledGrades = roster
        .iter()
        .map(|name| (name.as_ref().to_string(), 0))
        .collect();
    let mut finished: IndexMap<&str, bool> = roster
        .iter()
        .map(|name| (name.as_ref(), false))
        .collect();

    for row in rows {
        let row = match row {
            TableRow::OverallAverage => {
                debug!("reached overall average, stopping");
                break;
            }
            TableRow::Submission(row) => row,
        };

        let name = resolve_name(&finished, row)?;
        let Some(is_finished) = finished.get_mut(name.as_str()) else {
            return Err(GradeError::NameMismatch { name });
        };

        if row.state != SubmissionState::Finished && *is_finished {
            debug!(%name, "skipping attempt after a finished one");
            continue;
        }

        match row.state {
            SubmissionState::Finished => {
                let total = row.total.ok_or_else(|| {
                    GradeError::malformed(
                        "",
                        row.line,
                        format!("finished attempt of {} has no total grade", name),
                    )
                })?;
                let grade = rounded(total, row)?;
                *is_finished = true;
                grades.insert(name, grade);
            }
            SubmissionState::InProgress => {
                let computed = rounded(row.question_sum(), row)?;
                if let Some(current) = grades.get_mut(&name) {
                    if computed > *current {
                        *current = computed;
                    }
                }
            }
            SubmissionState::Other => {}
        }
    }

    Ok(grades)
}

/// Find the roster entry a row belongs to. Rosters are matched as
/// "Surname First" first and "First Surname" second.
fn resolve_name(known: &IndexMap<&str, bool>, row: &GradeRow) -> GradeResult<String> {
    let name = row.full_name();
    if known.contains_key(name.as_str()) {
        return Ok(name);
    }
    let reversed = row.reversed_name();
    if known.contains_key(reversed.as_str()) {
        return Ok(reversed);
    }
    Err(GradeError::NameMismatch { name })
}

/// Reconcile a loaded table, attributing malformed rows to its file.
pub fn reconcile_table(roster: &Roster, table: &GradeTable) -> GradeResult<ReconciledGrades> {
    reconcile(&roster.names, &table.rows).map_err(|err| match err {
        GradeError::Malformed { line, reason, .. } => GradeError::Malformed {
            file: table.file_name.clone(),
            line,
            reason,
        },
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QuestionScore;

    fn roster() -> Vec<String> {
        vec!["Jane Doe".to_string(), "John Smith".to_string()]
    }

    fn finished(surname: &str, first: &str, total: f64) -> TableRow {
        TableRow::Submission(GradeRow {
            line: 2,
            surname: surname.to_string(),
            first_name: first.to_string(),
            state: SubmissionState::Finished,
            total: Some(total),
            questions: Vec::new(),
        })
    }

    fn in_progress(surname: &str, first: &str, scores: &[Option<f64>]) -> TableRow {
        TableRow::Submission(GradeRow {
            line: 2,
            surname: surname.to_string(),
            first_name: first.to_string(),
            state: SubmissionState::InProgress,
            total: None,
            questions: scores
                .iter()
                .map(|s| match s {
                    Some(v) => QuestionScore::Scored(*v),
                    None => QuestionScore::NotAttempted,
                })
                .collect(),
        })
    }

    #[test]
    fn test_empty_table_gives_zero_for_everyone() {
        let grades = reconcile(&roster(), &[]).unwrap();
        assert_eq!(grades.len(), 2);
        assert!(grades.values().all(|g| *g == 0));
        let names: Vec<&String> = grades.keys().collect();
        assert_eq!(names, vec!["Jane Doe", "John Smith"]);
    }

    #[test]
    fn test_finished_and_in_progress_example() {
        let rows = vec![
            finished("Doe", "Jane", 8.4),
            in_progress("Smith", "John", &[Some(3.0), None, Some(2.0)]),
        ];
        let grades = reconcile(&roster(), &rows).unwrap();
        assert_eq!(grades["Jane Doe"], 8);
        assert_eq!(grades["John Smith"], 5);
    }

    #[test]
    fn test_finished_overwrites_higher_in_progress() {
        let rows = vec![
            in_progress("Doe", "Jane", &[Some(4.0), Some(4.0)]),
            finished("Doe", "Jane", 9.0),
        ];
        let grades = reconcile(&roster(), &rows).unwrap();
        assert_eq!(grades["Jane Doe"], 9);
        assert_eq!(grades["John Smith"], 0);

        let rows = vec![
            in_progress("Doe", "Jane", &[Some(6.0), Some(4.0)]),
            finished("Doe", "Jane", 7.0),
        ];
        let grades = reconcile(&roster(), &rows).unwrap();
        assert_eq!(grades["Jane Doe"], 7);
    }

    #[test]
    fn test_in_progress_after_finished_is_ignored() {
        let rows = vec![
            finished("Doe", "Jane", 3.0),
            in_progress("Doe", "Jane", &[Some(9.0), Some(1.0)]),
        ];
        let grades = reconcile(&roster(), &rows).unwrap();
        assert_eq!(grades["Jane Doe"], 3);
    }

    #[test]
    fn test_in_progress_keeps_best_attempt() {
        let rows = vec![
            in_progress("Smith", "John", &[Some(2.0), Some(2.0)]),
            in_progress("Smith", "John", &[Some(6.0)]),
            in_progress("Smith", "John", &[Some(1.0), None]),
        ];
        let grades = reconcile(&roster(), &rows).unwrap();
        assert_eq!(grades["John Smith"], 6);
    }

    #[test]
    fn test_in_progress_sums_are_not_accumulated_across_rows() {
        let rows = vec![
            in_progress("Smith", "John", &[Some(3.0)]),
            in_progress("Smith", "John", &[Some(3.0)]),
        ];
        let grades = reconcile(&roster(), &rows).unwrap();
        assert_eq!(grades["John Smith"], 3);
    }

    #[test]
    fn test_all_questions_not_attempted_scores_zero() {
        let rows = vec![in_progress("Smith", "John", &[None, None, None])];
        let grades = reconcile(&roster(), &rows).unwrap();
        assert_eq!(grades["John Smith"], 0);
    }

    #[test]
    fn test_last_finished_attempt_wins() {
        let rows = vec![finished("Doe", "Jane", 9.0), finished("Doe", "Jane", 6.0)];
        let grades = reconcile(&roster(), &rows).unwrap();
        assert_eq!(grades["Jane Doe"], 6);
    }

    #[test]
    fn test_rows_after_sentinel_are_ignored() {
        let rows = vec![
            finished("Doe", "Jane", 5.0),
            TableRow::OverallAverage,
            finished("Smith", "John", 10.0),
            finished("Nobody", "Known", 10.0),
        ];
        let grades = reconcile(&roster(), &rows).unwrap();
        assert_eq!(grades["Jane Doe"], 5);
        assert_eq!(grades["John Smith"], 0);
    }

    #[test]
    fn test_unknown_name_is_rejected() {
        let rows = vec![finished("Doe", "Jane", 5.0), finished("Lee", "Ann", 4.0)];
        let err = reconcile(&roster(), &rows).unwrap_err();
        match err {
            GradeError::NameMismatch { name } => assert_eq!(name, "Lee Ann"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_surname_first_roster_matches_directly() {
        let roster = vec!["Doe Jane".to_string(), "Jane Doe".to_string()];
        let rows = vec![finished("Doe", "Jane", 4.0)];
        let grades = reconcile(&roster, &rows).unwrap();
        assert_eq!(grades["Doe Jane"], 4);
        assert_eq!(grades["Jane Doe"], 0);
    }

    #[test]
    fn test_other_states_contribute_nothing() {
        let rows = vec![TableRow::Submission(GradeRow {
            line: 2,
            surname: "Doe".to_string(),
            first_name: "Jane".to_string(),
            state: SubmissionState::Other,
            total: Some(10.0),
            questions: vec![QuestionScore::Scored(10.0)],
        })];
        let grades = reconcile(&roster(), &rows).unwrap();
        assert_eq!(grades["Jane Doe"], 0);
    }

    #[test]
    fn test_finished_without_total_is_malformed() {
        let rows = vec![TableRow::Submission(GradeRow {
            line: 5,
            surname: "Doe".to_string(),
            first_name: "Jane".to_string(),
            state: SubmissionState::Finished,
            total: None,
            questions: Vec::new(),
        })];
        let err = reconcile(&roster(), &rows).unwrap_err();
        assert!(matches!(err, GradeError::Malformed { line: 5, .. }));

        let table = GradeTable {
            file_name: "quiz.csv".to_string(),
            rows,
        };
        let roster = Roster::new("10.8", roster());
        let err = reconcile_table(&roster, &table).unwrap_err();
        assert_eq!(
            err.to_string(),
            "quiz.csv: line 5: finished attempt of Jane Doe has no total grade"
        );
    }

    #[test]
    fn test_rounding_ties_to_even() {
        assert_eq!(round_grade(7.5), Some(8));
        assert_eq!(round_grade(8.5), Some(8));
        assert_eq!(round_grade(8.4), Some(8));
        assert_eq!(round_grade(8.6), Some(9));
        assert_eq!(round_grade(0.5), Some(0));

        let rows = vec![finished("Doe", "Jane", 7.5), finished("Smith", "John", 8.5)];
        let grades = reconcile(&roster(), &rows).unwrap();
        assert_eq!(grades["Jane Doe"], 8);
        assert_eq!(grades["John Smith"], 8);
    }

    #[test]
    fn test_grades_beyond_whole_number_range_are_rejected() {
        assert_eq!(round_grade(1e300), None);
        assert_eq!(round_grade(-1e300), None);
        assert_eq!(round_grade(9.3e18), None);

        let rows = vec![finished("Doe", "Jane", 1e300)];
        let err = reconcile(&roster(), &rows).unwrap_err();
        assert!(matches!(err, GradeError::Malformed { line: 2, .. }));
        assert!(err.to_string().contains("out of range"));

        let rows = vec![in_progress("Smith", "John", &[Some(1e300), Some(1e300)])];
        assert!(reconcile(&roster(), &rows).is_err());
    }
}
