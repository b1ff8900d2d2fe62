//! Static analysis of AI-generated source files
//!
//! Pattern heuristics, not a type checker: the passes over-report on
//! purpose (shadowed names, import-bound identifiers) so a human still
//! looks at the output. Findings carry byte offsets into the original,
//! pre-remediation text.

pub mod detector;
pub mod lint;

pub use detector::Analyzer;
pub use lint::{Dialect, LintRule, Linter, RuleSeverity};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of a finding. Issues block; warnings advise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Issue,
    Warning,
}

/// What a detector pass matched, with the pass-specific capture data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FindingKind {
    PotentialUndefinedVariable { variable: String },
    UnreachableCode { code: String },
    PotentialInfiniteLoop,
    PotentialEventListenerLeak { event: String, handler: String },
    PotentialResourceLeak { resource: String },
    PotentialTimerLeak { timer: String },
    MissingErrorHandling,
    PotentialArrayIndexOob { array: String, index: String },
    FunctionComplexity { function: String, lines: usize },
}

impl FindingKind {
    /// Stable tag used for grouping in report summaries.
    pub fn name(&self) -> &'static str {
        match self {
            FindingKind::PotentialUndefinedVariable { .. } => "potential_undefined_variable",
            FindingKind::UnreachableCode { .. } => "unreachable_code",
            FindingKind::PotentialInfiniteLoop => "potential_infinite_loop",
            FindingKind::PotentialEventListenerLeak { .. } => "potential_event_listener_leak",
            FindingKind::PotentialResourceLeak { .. } => "potential_resource_leak",
            FindingKind::PotentialTimerLeak { .. } => "potential_timer_leak",
            FindingKind::MissingErrorHandling => "missing_error_handling",
            FindingKind::PotentialArrayIndexOob { .. } => "potential_array_index_oob",
            FindingKind::FunctionComplexity { .. } => "function_complexity",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            FindingKind::UnreachableCode { .. } => Severity::Issue,
            _ => Severity::Warning,
        }
    }
}

/// A single detected problem.
///
/// `position` is a byte offset into the original source; file-level
/// findings (missing error handling) carry no position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    #[serde(flatten)]
    pub kind: FindingKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    pub message: String,
}

impl Finding {
    pub fn at(kind: FindingKind, position: usize, message: String) -> Self {
        Self {
            kind,
            position: Some(position),
            message,
        }
    }

    pub fn file_level(kind: FindingKind, message: String) -> Self {
        Self {
            kind,
            position: None,
            message,
        }
    }
}

/// Output of one analysis pass over one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub file_name: String,
    pub issues: Vec<Finding>,
    pub warnings: Vec<Finding>,
    pub timestamp: DateTime<Utc>,
}

impl AnalysisResult {
    pub fn new(file_name: &str, issues: Vec<Finding>, warnings: Vec<Finding>) -> Self {
        Self {
            file_name: file_name.to_string(),
            issues,
            warnings,
            timestamp: Utc::now(),
        }
    }
}
