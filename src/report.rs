//! Serializable debug reports
//!
//! Field names and nesting are stable: report consumers and the
//! suggestion tooling key off exact field paths, so changes here are
//! wire-format changes.

use crate::analysis::AnalysisResult;
use crate::fixer::RemediationResult;
use crate::sandbox::ExecutionTelemetry;
use crate::score::HealthScore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Per-kind finding and fix counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryDetails {
    pub issues_by_type: BTreeMap<String, usize>,
    pub warnings_by_type: BTreeMap<String, usize>,
    pub fixes_by_type: BTreeMap<String, usize>,
}

/// Health metrics for one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_issues: usize,
    pub total_warnings: usize,
    pub execution_errors: usize,
    pub fixes_applied: usize,
    pub suggestions: usize,
    pub code_health: HealthScore,
    pub details: SummaryDetails,
}

impl ReportSummary {
    pub fn from_parts(
        analysis: &AnalysisResult,
        execution: &ExecutionTelemetry,
        remediation: &RemediationResult,
    ) -> Self {
        let code_health = HealthScore::calculate(
            analysis.issues.len(),
            analysis.warnings.len(),
            execution.execution_errors.len(),
        );

        Self {
            total_issues: analysis.issues.len(),
            total_warnings: analysis.warnings.len(),
            execution_errors: execution.execution_errors.len(),
            fixes_applied: remediation.fixes_applied.len(),
            suggestions: remediation.suggestions.len(),
            code_health,
            details: SummaryDetails {
                issues_by_type: count_by(analysis.issues.iter().map(|f| f.kind.name())),
                warnings_by_type: count_by(analysis.warnings.iter().map(|f| f.kind.name())),
                fixes_by_type: count_by(remediation.fixes_applied.iter().map(|f| f.name())),
            },
        }
    }
}

/// The complete debug report for one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugReport {
    pub file_name: String,
    pub file_path: PathBuf,
    pub analysis: AnalysisResult,
    pub execution: ExecutionTelemetry,
    pub remediation: RemediationResult,
    pub summary: ReportSummary,
    pub timestamp: DateTime<Utc>,
}

/// Per-file record when a batch entry could not be processed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileError {
    pub file_path: PathBuf,
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

/// One batch entry: a full report, or an error record for that path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileOutcome {
    Report(Box<DebugReport>),
    Error(FileError),
}

impl FileOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, FileOutcome::Error(_))
    }

    pub fn report(&self) -> Option<&DebugReport> {
        match self {
            FileOutcome::Report(report) => Some(report),
            FileOutcome::Error(_) => None,
        }
    }
}

/// Aggregate rollup over a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_files: usize,
    pub successful: usize,
    pub failed: usize,
    pub total_issues: usize,
    pub total_warnings: usize,
    pub total_execution_errors: usize,
    pub total_fixes: usize,
    /// Mean per-file health over successfully processed files only.
    pub code_health: u8,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: &[FileOutcome]) -> Self {
        let reports: Vec<&DebugReport> = outcomes.iter().filter_map(|o| o.report()).collect();
        let successful = reports.len();

        let code_health = if successful > 0 {
            let sum: u64 = reports
                .iter()
                .map(|r| r.summary.code_health.value as u64)
                .sum();
            (sum as f64 / successful as f64).round() as u8
        } else {
            0
        };

        Self {
            total_files: outcomes.len(),
            successful,
            failed: outcomes.len() - successful,
            total_issues: reports.iter().map(|r| r.summary.total_issues).sum(),
            total_warnings: reports.iter().map(|r| r.summary.total_warnings).sum(),
            total_execution_errors: reports.iter().map(|r| r.summary.execution_errors).sum(),
            total_fixes: reports.iter().map(|r| r.summary.fixes_applied).sum(),
            code_health,
        }
    }
}

/// Report covering a whole batch: one outcome per input path, in input
/// order, plus the aggregate summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub files: Vec<FileOutcome>,
    pub summary: BatchSummary,
    pub timestamp: DateTime<Utc>,
}

fn count_by<'a>(names: impl Iterator<Item = &'a str>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for name in names {
        *counts.entry(name.to_string()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Analyzer;
    use crate::fixer::Fixer;

    fn report_for(source: &str) -> DebugReport {
        let analysis = Analyzer::new().analyze(source, "test.js");
        let execution = ExecutionTelemetry::default();
        let remediation = Fixer::new().fix(source, &analysis.issues, &analysis.warnings);
        let summary = ReportSummary::from_parts(&analysis, &execution, &remediation);
        DebugReport {
            file_name: "test.js".to_string(),
            file_path: PathBuf::from("test.js"),
            analysis,
            execution,
            remediation,
            summary,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_summary_counts_by_kind() {
        let report = report_for("setInterval(a, 1);\nsetTimeout(b, 2);\n");
        assert_eq!(
            report.summary.details.warnings_by_type["potential_timer_leak"],
            2
        );
        assert_eq!(
            report.summary.details.fixes_by_type["timer_leak_warning"],
            1
        );
    }

    #[test]
    fn test_batch_summary_excludes_failures_from_health_mean() {
        let good = report_for("let x = 0;");
        let health = good.summary.code_health.value;
        let outcomes = vec![
            FileOutcome::Report(Box::new(good)),
            FileOutcome::Error(FileError {
                file_path: PathBuf::from("missing.js"),
                error: "not found".to_string(),
                timestamp: Utc::now(),
            }),
        ];
        let summary = BatchSummary::from_outcomes(&outcomes);
        assert_eq!(summary.total_files, 2);
        assert_eq!(summary.successful, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.code_health, health);
    }

    #[test]
    fn test_empty_batch_health_is_zero() {
        let summary = BatchSummary::from_outcomes(&[]);
        assert_eq!(summary.code_health, 0);
        assert_eq!(summary.total_files, 0);
    }

    #[test]
    fn test_report_round_trips_through_json() {
        let report = report_for("fetch(url);");
        let json = serde_json::to_string(&report).unwrap();
        let parsed: DebugReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.file_name, report.file_name);
        assert_eq!(parsed.summary.total_warnings, report.summary.total_warnings);
    }
}
