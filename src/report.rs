use crate::models::{GradeStats, ReconciledGrades};
use anyhow::{Context, Result};
use serde::Serialize;

/// Reconciled grades of one table, ready to be shown.
#[derive(Debug, Clone, Serialize)]
pub struct TableReport<'a> {
    pub file: &'a str,
    pub class: &'a str,
    pub grades: &'a ReconciledGrades,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<GradeStats>,
}

impl<'a> TableReport<'a> {
    pub fn new(file: &'a str, class: &'a str, grades: &'a ReconciledGrades, with_stats: bool) -> Self {
        Self {
            file,
            class,
            grades,
            stats: with_stats.then(|| GradeStats::calculate(grades)),
        }
    }

    pub fn to_text(&self) -> String {
        let banner = "#".repeat(10);
        let mut out = format!("{} {} {}\nClass: {}\n\n", banner, self.file, banner, self.class);

        for (name, grade) in self.grades {
            out.push_str(&format!("{:<3} {}\n", grade, name));
        }

        if let Some(stats) = &self.stats {
            out.push('\n');
            out.push_str(&stats_lines(stats).join("\n"));
            out.push('\n');
        }

        out
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize grade report")
    }
}

/// Human-readable statistics, one line per measure.
pub fn stats_lines(stats: &GradeStats) -> Vec<String> {
    let fmt = |v: Option<f64>| v.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".to_string());

    vec![
        format!("Graded: {}", stats.graded),
        format!("Mean: {}", fmt(stats.mean)),
        format!("Median: {}", fmt(stats.median)),
        format!(
            "Mode: {}",
            stats.mode.map(|m| m.to_string()).unwrap_or_else(|| "-".to_string())
        ),
        format!("Standard deviation: {}", fmt(stats.std_dev)),
    ]
}
