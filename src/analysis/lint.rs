//! External detector boundary
//!
//! The session can delegate detection to a higher-fidelity rule-based
//! linting engine, configured per file dialect with a fixed rule table.
//! When the engine errors or is absent, the built-in [`Analyzer`]
//! (`detector` module) runs instead and produces a result of the same
//! shape, so downstream consumers never see the difference.
//!
//! [`Analyzer`]: super::Analyzer

use super::{AnalysisResult, Severity};
use anyhow::Result;
use std::path::Path;

/// Source dialect, keyed off file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Plain procedural script (`.js` and anything unrecognized).
    Script,
    /// Typed script dialect (`.ts`).
    TypedScript,
    /// Component-markup dialect (`.jsx`).
    Markup,
    /// Typed component-markup dialect (`.tsx`).
    TypedMarkup,
}

impl Dialect {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("ts") => Dialect::TypedScript,
            Some("jsx") => Dialect::Markup,
            Some("tsx") => Dialect::TypedMarkup,
            _ => Dialect::Script,
        }
    }

    /// The fixed rule set an external engine is expected to run for this
    /// dialect. Typed dialects add the type-annotation rules on top of
    /// the shared script set.
    pub fn rules(&self) -> &'static [LintRule] {
        match self {
            Dialect::Script | Dialect::Markup => SCRIPT_RULES,
            Dialect::TypedScript | Dialect::TypedMarkup => TYPED_RULES,
        }
    }
}

/// Severity an external rule maps to in our report model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleSeverity {
    Advisory,
    Blocking,
}

impl From<RuleSeverity> for Severity {
    fn from(value: RuleSeverity) -> Self {
        match value {
            RuleSeverity::Advisory => Severity::Warning,
            RuleSeverity::Blocking => Severity::Issue,
        }
    }
}

/// One rule-id-to-severity mapping in the fixed table.
#[derive(Debug, Clone, Copy)]
pub struct LintRule {
    pub id: &'static str,
    pub severity: RuleSeverity,
}

const SCRIPT_RULES: &[LintRule] = &[
    LintRule {
        id: "no-undef",
        severity: RuleSeverity::Advisory,
    },
    LintRule {
        id: "no-unreachable",
        severity: RuleSeverity::Blocking,
    },
    LintRule {
        id: "no-constant-condition",
        severity: RuleSeverity::Advisory,
    },
    LintRule {
        id: "no-unused-vars",
        severity: RuleSeverity::Advisory,
    },
    LintRule {
        id: "no-async-promise-executor",
        severity: RuleSeverity::Advisory,
    },
];

const TYPED_RULES: &[LintRule] = &[
    LintRule {
        id: "no-undef",
        severity: RuleSeverity::Advisory,
    },
    LintRule {
        id: "no-unreachable",
        severity: RuleSeverity::Blocking,
    },
    LintRule {
        id: "no-constant-condition",
        severity: RuleSeverity::Advisory,
    },
    LintRule {
        id: "no-unused-vars",
        severity: RuleSeverity::Advisory,
    },
    LintRule {
        id: "no-async-promise-executor",
        severity: RuleSeverity::Advisory,
    },
    LintRule {
        id: "no-explicit-any",
        severity: RuleSeverity::Advisory,
    },
    LintRule {
        id: "no-non-null-assertion",
        severity: RuleSeverity::Advisory,
    },
];

/// A pluggable external detection engine.
///
/// Implementations must return findings in the same `AnalysisResult`
/// shape the built-in detector produces. Errors are a fallback signal,
/// never surfaced to the caller of the pipeline.
pub trait Linter: Send + Sync {
    fn lint(&self, source: &str, file_name: &str, dialect: Dialect) -> Result<AnalysisResult>;
}
