//! Remediation engine
//!
//! Text-patching auto-fixer. Mutation passes run in a fixed order, and
//! every insertion is applied left-to-right with a running length delta
//! so decisions stay keyed to original finding offsets while splices
//! land in the mutating buffer. The whole-buffer try/catch wrap runs
//! last, after every positional pass, so it can never invalidate an
//! offset another pass still needs.

use crate::analysis::{Finding, FindingKind};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// An actually-applied textual mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FixRecord {
    UnreachableCodeAnnotated { position: usize, message: String },
    EventListenerLeakWarning { count: usize, message: String },
    ResourceLeakWarning { count: usize, message: String },
    TimerLeakWarning { count: usize, message: String },
    ArrayBoundsWarning { count: usize, message: String },
    VariableInitializationFixed { variable: String, message: String },
    ErrorHandlingAdded { message: String },
}

impl FixRecord {
    /// Stable tag used for grouping in report summaries.
    pub fn name(&self) -> &'static str {
        match self {
            FixRecord::UnreachableCodeAnnotated { .. } => "unreachable_code_annotated",
            FixRecord::EventListenerLeakWarning { .. } => "event_listener_leak_warning",
            FixRecord::ResourceLeakWarning { .. } => "resource_leak_warning",
            FixRecord::TimerLeakWarning { .. } => "timer_leak_warning",
            FixRecord::ArrayBoundsWarning { .. } => "array_bounds_warning",
            FixRecord::VariableInitializationFixed { .. } => "variable_initialization_fixed",
            FixRecord::ErrorHandlingAdded { .. } => "error_handling_added",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexFunction {
    pub name: String,
    pub lines: usize,
}

/// Non-mutating guidance grouped by finding kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Suggestion {
    UndefinedVariables {
        variables: Vec<String>,
        message: String,
    },
    InfiniteLoops {
        count: usize,
        message: String,
    },
    FunctionComplexity {
        functions: Vec<ComplexFunction>,
        message: String,
    },
    ManualReview {
        issues: usize,
        message: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemediationResult {
    pub fixed_code: String,
    pub fixes_applied: Vec<FixRecord>,
    pub suggestions: Vec<Suggestion>,
    pub timestamp: DateTime<Utc>,
}

const UNREACHABLE_COMMENT: &str = "\n    // medic: flagged unreachable code for manual review\n    ";
const WRAPPER_HEADER: &str = "// medic: added error handling wrapper";

/// Applies automatic fixes and derives suggestions from findings.
pub struct Fixer {
    try_catch: Regex,
    uninitialized_decl: Regex,
}

impl Fixer {
    pub fn new() -> Self {
        Self {
            try_catch: Regex::new(r"(?s)try\s*\{.*?\}\s*catch\s*\(").unwrap(),
            uninitialized_decl: Regex::new(r"\b(let|var)\s+(\w+)\s*;").unwrap(),
        }
    }

    /// Mutate `source` according to the findings and collect suggestions.
    ///
    /// With zero findings this is the identity: `fixed_code == source`
    /// and both record lists come back empty.
    pub fn fix(
        &self,
        source: &str,
        issues: &[Finding],
        warnings: &[Finding],
    ) -> RemediationResult {
        let mut buffer = source.to_string();
        let mut fixes = Vec::new();

        self.annotate_unreachable(&mut buffer, issues, &mut fixes);
        self.annotate_leaks(&mut buffer, warnings, &mut fixes);
        self.annotate_array_bounds(&mut buffer, warnings, &mut fixes);
        self.initialize_accumulators(&mut buffer, &mut fixes);
        self.wrap_error_handling(&mut buffer, warnings, &mut fixes);

        let suggestions = self.collect_suggestions(issues, warnings);

        RemediationResult {
            fixed_code: buffer,
            fixes_applied: fixes,
            suggestions,
            timestamp: Utc::now(),
        }
    }

    /// Insert an advisory comment at each unreachable-code offset,
    /// left-to-right, carrying the drift forward.
    fn annotate_unreachable(
        &self,
        buffer: &mut String,
        issues: &[Finding],
        fixes: &mut Vec<FixRecord>,
    ) {
        let mut delta: i64 = 0;
        for finding in issues
            .iter()
            .filter(|f| matches!(f.kind, FindingKind::UnreachableCode { .. }))
        {
            let Some(position) = finding.position else {
                continue;
            };
            let insert_at = (position as i64 + delta) as usize;
            buffer.insert_str(insert_at, UNREACHABLE_COMMENT);
            delta += UNREACHABLE_COMMENT.len() as i64;
            fixes.push(FixRecord::UnreachableCodeAnnotated {
                position,
                message: format!("Annotated unreachable code at offset {}", position),
            });
        }
    }

    /// One comment block per leak category, concatenated into a single
    /// leading block when several categories are present.
    fn annotate_leaks(
        &self,
        buffer: &mut String,
        warnings: &[Finding],
        fixes: &mut Vec<FixRecord>,
    ) {
        let mut block = String::new();

        let listeners = count_kind(warnings, "potential_event_listener_leak");
        if listeners > 0 {
            block.push_str(&format!(
                "// medic: found {} potential event listener leaks\n// make sure each listener is removed when its owner goes away\n",
                listeners
            ));
            fixes.push(FixRecord::EventListenerLeakWarning {
                count: listeners,
                message: format!(
                    "Added warning comment for {} potential event listener leaks",
                    listeners
                ),
            });
        }

        let resources = count_kind(warnings, "potential_resource_leak");
        if resources > 0 {
            block.push_str(&format!(
                "// medic: found {} potential resource leaks\n// make sure requests and handles are released\n",
                resources
            ));
            fixes.push(FixRecord::ResourceLeakWarning {
                count: resources,
                message: format!(
                    "Added warning comment for {} potential resource leaks",
                    resources
                ),
            });
        }

        let timers = count_kind(warnings, "potential_timer_leak");
        if timers > 0 {
            block.push_str(&format!(
                "// medic: found {} potential timer leaks\n// make sure timers are cleared with clearTimeout or clearInterval\n",
                timers
            ));
            fixes.push(FixRecord::TimerLeakWarning {
                count: timers,
                message: format!("Added warning comment for {} potential timer leaks", timers),
            });
        }

        if !block.is_empty() {
            buffer.insert_str(0, &block);
        }
    }

    fn annotate_array_bounds(
        &self,
        buffer: &mut String,
        warnings: &[Finding],
        fixes: &mut Vec<FixRecord>,
    ) {
        let count = count_kind(warnings, "potential_array_index_oob");
        if count == 0 {
            return;
        }
        buffer.insert_str(
            0,
            &format!(
                "// medic: found {} potential array index out of bounds accesses\n// add bounds checks before indexing\n",
                count
            ),
        );
        fixes.push(FixRecord::ArrayBoundsWarning {
            count,
            message: format!(
                "Added warning comment for {} potential array index accesses",
                count
            ),
        });
    }

    /// Rewrite `let x;` to `let x = 0;` when the variable's later use is
    /// a compound addition. Scans the current buffer and tracks its own
    /// drift across multiple occurrences.
    fn initialize_accumulators(&self, buffer: &mut String, fixes: &mut Vec<FixRecord>) {
        let snapshot = buffer.clone();
        let mut delta: i64 = 0;

        for cap in self.uninitialized_decl.captures_iter(&snapshot) {
            let whole = cap.get(0).unwrap();
            let keyword = cap.get(1).unwrap().as_str();
            let name = cap.get(2).unwrap().as_str();

            let rest = &snapshot[whole.end()..];
            let compound_add =
                Regex::new(&format!(r"\b{}\s*\+=", regex::escape(name))).unwrap();
            if !compound_add.is_match(rest) {
                continue;
            }

            let replacement = format!("{} {} = 0;", keyword, name);
            let start = (whole.start() as i64 + delta) as usize;
            let end = (whole.end() as i64 + delta) as usize;
            buffer.replace_range(start..end, &replacement);
            delta += replacement.len() as i64 - whole.len() as i64;

            fixes.push(FixRecord::VariableInitializationFixed {
                variable: name.to_string(),
                message: format!(
                    "Initialized variable '{}' to 0 before compound addition",
                    name
                ),
            });
        }
    }

    /// Whole-buffer wrap; runs after every positional pass. Skipped when
    /// the buffer already carries a full try/catch block.
    fn wrap_error_handling(
        &self,
        buffer: &mut String,
        warnings: &[Finding],
        fixes: &mut Vec<FixRecord>,
    ) {
        let missing = warnings
            .iter()
            .any(|w| matches!(w.kind, FindingKind::MissingErrorHandling));
        if !missing || self.try_catch.is_match(buffer) {
            return;
        }

        let indented: String = buffer
            .lines()
            .map(|line| format!("  {}", line))
            .collect::<Vec<_>>()
            .join("\n");
        *buffer = format!(
            "{}\ntry {{\n{}\n}} catch (error) {{\n  console.error('medic: caught error:', error);\n}}",
            WRAPPER_HEADER, indented
        );

        fixes.push(FixRecord::ErrorHandlingAdded {
            message: "Wrapped source in a try/catch block".to_string(),
        });
    }

    fn collect_suggestions(&self, issues: &[Finding], warnings: &[Finding]) -> Vec<Suggestion> {
        let mut suggestions = Vec::new();

        let mut seen = HashSet::new();
        let mut variables = Vec::new();
        for warning in warnings {
            if let FindingKind::PotentialUndefinedVariable { variable } = &warning.kind {
                if seen.insert(variable.clone()) {
                    variables.push(variable.clone());
                }
            }
        }
        if !variables.is_empty() {
            suggestions.push(Suggestion::UndefinedVariables {
                variables,
                message: "Consider declaring these variables or checking they exist before use"
                    .to_string(),
            });
        }

        let loops = count_kind(warnings, "potential_infinite_loop");
        if loops > 0 {
            suggestions.push(Suggestion::InfiniteLoops {
                count: loops,
                message: "Add explicit exit conditions to prevent infinite loops".to_string(),
            });
        }

        let functions: Vec<ComplexFunction> = warnings
            .iter()
            .filter_map(|w| match &w.kind {
                FindingKind::FunctionComplexity { function, lines } => Some(ComplexFunction {
                    name: function.clone(),
                    lines: *lines,
                }),
                _ => None,
            })
            .collect();
        if !functions.is_empty() {
            suggestions.push(Suggestion::FunctionComplexity {
                functions,
                message: "Consider splitting these functions into smaller pieces".to_string(),
            });
        }

        if !issues.is_empty() {
            suggestions.push(Suggestion::ManualReview {
                issues: issues.len(),
                message: "Manual code review recommended for the identified blocking issues"
                    .to_string(),
            });
        }

        suggestions
    }
}

impl Default for Fixer {
    fn default() -> Self {
        Self::new()
    }
}

fn count_kind(findings: &[Finding], name: &str) -> usize {
    findings.iter().filter(|f| f.kind.name() == name).count()
}
