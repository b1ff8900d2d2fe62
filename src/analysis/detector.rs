//! Built-in detector engine
//!
//! Seven independent passes over the raw text, each appending findings
//! in offset order. The passes are token-level and syntax-insensitive;
//! keeping them cheap matters more than precision here.

use super::{AnalysisResult, Finding, FindingKind};
use crate::util::truncate;
use regex::Regex;
use std::collections::HashSet;

/// Identifiers the undeclared-reference scan never flags: statement
/// keywords, declaration keywords, and the console builtins.
const ALLOWED_NAMES: &[&str] = &[
    "if",
    "else",
    "for",
    "while",
    "do",
    "function",
    "return",
    "let",
    "const",
    "var",
    "new",
    "try",
    "catch",
    "finally",
    "throw",
    "console",
    "log",
    "error",
    "warn",
    "true",
    "false",
    "null",
    "undefined",
    "this",
    "typeof",
    "instanceof",
];

/// Maximum function body length before the complexity pass flags it.
const MAX_FUNCTION_LINES: usize = 50;

/// Maximum characters of trailing code kept in an unreachable-code snippet.
const SNIPPET_LEN: usize = 50;

/// Pattern-based detector for AI-generated source. Pure: `analyze` is a
/// function of its inputs and keeps no state across calls.
pub struct Analyzer {
    declaration: Regex,
    identifier: Regex,
    terminator: Regex,
    bare_loop: Regex,
    constant_loop: Regex,
    event_listener: Regex,
    xhr_construction: Regex,
    timer_call: Regex,
    async_markers: Vec<Regex>,
    catch_clause: Regex,
    try_catch: Regex,
    array_access: Regex,
    integer_literal: Regex,
    function_def: Regex,
}

impl Analyzer {
    pub fn new() -> Self {
        Self {
            declaration: Regex::new(r"\b(let|const|var)\s+(\w+)\b").unwrap(),
            identifier: Regex::new(r"[A-Za-z_$][A-Za-z0-9_$]*").unwrap(),
            terminator: Regex::new(r"\b(return|throw)\b[^;\n]*;?").unwrap(),
            bare_loop: Regex::new(r"for\s*\(\s*;\s*;\s*\)").unwrap(),
            constant_loop: Regex::new(r"while\s*\(\s*true\s*\)").unwrap(),
            event_listener: Regex::new(r#"addEventListener\s*\(\s*['"](\w+)['"]\s*,\s*(\w+)\s*\)"#)
                .unwrap(),
            xhr_construction: Regex::new(r"new\s+XMLHttpRequest\s*\(\s*\)").unwrap(),
            timer_call: Regex::new(r"(setInterval|setTimeout)\s*\(").unwrap(),
            async_markers: vec![
                Regex::new(r"fetch\s*\(").unwrap(),
                Regex::new(r"new\s+Promise\s*\(").unwrap(),
                Regex::new(r"\basync\b").unwrap(),
            ],
            catch_clause: Regex::new(r"catch\s*\(").unwrap(),
            try_catch: Regex::new(r"(?s)try\s*\{.*?\}\s*catch\s*\(").unwrap(),
            array_access: Regex::new(r"(\w+)\[([^\]]+)\]").unwrap(),
            integer_literal: Regex::new(r"^\d+$").unwrap(),
            function_def: Regex::new(r"function\s+(\w+)\s*\(([^)]*)\)\s*\{([^}]*)\}").unwrap(),
        }
    }

    /// Run every pass over `source` and collect the findings.
    ///
    /// Issues and warnings come back grouped by pass, offset-ordered
    /// within each pass, so the sequences are stable for identical input.
    pub fn analyze(&self, source: &str, file_name: &str) -> AnalysisResult {
        let mut issues = Vec::new();
        let mut warnings = Vec::new();

        self.scan_undeclared_references(source, &mut warnings);
        self.scan_unreachable_code(source, &mut issues);
        self.scan_unbounded_loops(source, &mut warnings);
        self.scan_resource_leaks(source, &mut warnings);
        self.scan_error_handling(source, &mut warnings);
        self.scan_array_indexing(source, &mut warnings);
        self.scan_function_complexity(source, &mut warnings);

        AnalysisResult::new(file_name, issues, warnings)
    }

    /// Token-level undeclared-name heuristic. Not scope-aware: shadowed
    /// and import-bound names over-report, and that is intentional.
    fn scan_undeclared_references(&self, source: &str, warnings: &mut Vec<Finding>) {
        let declared: HashSet<&str> = self
            .declaration
            .captures_iter(source)
            .map(|cap| cap.get(2).unwrap().as_str())
            .collect();

        let mut reported: HashSet<&str> = HashSet::new();
        for m in self.identifier.find_iter(source) {
            let name = m.as_str();
            if declared.contains(name) || ALLOWED_NAMES.contains(&name) {
                continue;
            }
            if !reported.insert(name) {
                continue;
            }
            warnings.push(Finding::at(
                FindingKind::PotentialUndefinedVariable {
                    variable: name.to_string(),
                },
                m.start(),
                format!("Variable '{}' might be undefined", name),
            ));
        }
    }

    /// Flags non-whitespace text between a `return`/`throw` statement and
    /// the next closing brace.
    fn scan_unreachable_code(&self, source: &str, issues: &mut Vec<Finding>) {
        for m in self.terminator.find_iter(source) {
            let after = &source[m.end()..];
            let Some(brace) = after.find('}') else {
                continue;
            };
            let trailing = after[..brace].trim();
            if trailing.is_empty() {
                continue;
            }
            issues.push(Finding::at(
                FindingKind::UnreachableCode {
                    code: truncate(trailing, SNIPPET_LEN),
                },
                m.start(),
                "Unreachable code detected".to_string(),
            ));
        }
    }

    fn scan_unbounded_loops(&self, source: &str, warnings: &mut Vec<Finding>) {
        let mut offsets: Vec<usize> = self
            .bare_loop
            .find_iter(source)
            .chain(self.constant_loop.find_iter(source))
            .map(|m| m.start())
            .collect();
        offsets.sort_unstable();

        for offset in offsets {
            warnings.push(Finding::at(
                FindingKind::PotentialInfiniteLoop,
                offset,
                "Potentially infinite loop detected".to_string(),
            ));
        }
    }

    fn scan_resource_leaks(&self, source: &str, warnings: &mut Vec<Finding>) {
        for cap in self.event_listener.captures_iter(source) {
            let event = cap.get(1).unwrap().as_str();
            warnings.push(Finding::at(
                FindingKind::PotentialEventListenerLeak {
                    event: event.to_string(),
                    handler: cap.get(2).unwrap().as_str().to_string(),
                },
                cap.get(0).unwrap().start(),
                format!(
                    "Event listener '{}' may cause memory leaks if not properly removed",
                    event
                ),
            ));
        }

        for m in self.xhr_construction.find_iter(source) {
            warnings.push(Finding::at(
                FindingKind::PotentialResourceLeak {
                    resource: "XMLHttpRequest".to_string(),
                },
                m.start(),
                "XMLHttpRequest may cause resource leaks if not properly handled".to_string(),
            ));
        }

        for cap in self.timer_call.captures_iter(source) {
            let timer = cap.get(1).unwrap().as_str();
            warnings.push(Finding::at(
                FindingKind::PotentialTimerLeak {
                    timer: timer.to_string(),
                },
                cap.get(0).unwrap().start(),
                format!("{} may cause resource leaks if not properly cleared", timer),
            ));
        }
    }

    /// File-level: async-looking code with neither a `catch` clause nor a
    /// full try/catch block anywhere in the text.
    fn scan_error_handling(&self, source: &str, warnings: &mut Vec<Finding>) {
        let has_async = self.async_markers.iter().any(|p| p.is_match(source));
        if !has_async {
            return;
        }
        if self.catch_clause.is_match(source) || self.try_catch.is_match(source) {
            return;
        }
        warnings.push(Finding::file_level(
            FindingKind::MissingErrorHandling,
            "Asynchronous code detected without error handling".to_string(),
        ));
    }

    fn scan_array_indexing(&self, source: &str, warnings: &mut Vec<Finding>) {
        for cap in self.array_access.captures_iter(source) {
            let index = cap.get(2).unwrap().as_str();
            if self.integer_literal.is_match(index) {
                continue;
            }
            let array = cap.get(1).unwrap().as_str();
            warnings.push(Finding::at(
                FindingKind::PotentialArrayIndexOob {
                    array: array.to_string(),
                    index: index.to_string(),
                },
                cap.get(0).unwrap().start(),
                format!(
                    "Potential array index out of bounds for {}[{}]",
                    array, index
                ),
            ));
        }
    }

    /// Brace-free body capture only; nested blocks end the match early.
    /// Good enough to catch the long flat functions code producers emit.
    fn scan_function_complexity(&self, source: &str, warnings: &mut Vec<Finding>) {
        for cap in self.function_def.captures_iter(source) {
            let body = cap.get(3).unwrap().as_str();
            let lines = body.split('\n').count();
            if lines <= MAX_FUNCTION_LINES {
                continue;
            }
            let function = cap.get(1).unwrap().as_str();
            warnings.push(Finding::at(
                FindingKind::FunctionComplexity {
                    function: function.to_string(),
                    lines,
                },
                cap.get(0).unwrap().start(),
                format!("Function {} is overly complex with {} lines", function, lines),
            ));
        }
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}
