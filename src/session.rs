//! Session controller
//!
//! Owns one debugging session end to end: read the source, run the
//! detectors (external linter first when configured, built-in engine as
//! fallback), the sandbox, and the fixer, then aggregate the report.
//! Sessions are explicitly owned by the caller; there is no process-wide
//! "last result" state.

use crate::analysis::{AnalysisResult, Analyzer, Dialect, Linter};
use crate::fixer::Fixer;
use crate::report::{BatchReport, BatchSummary, DebugReport, FileError, FileOutcome, ReportSummary};
use crate::sandbox::Sandbox;
use chrono::Utc;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// IO failures surfaced by a session. Pipeline internals never produce
/// these; anything else going wrong in a pass is a bug, not an error
/// category.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Options shaping one session, mirroring the CLI surface.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub save_report: bool,
    pub save_fixed_code: bool,
    pub output_dir: PathBuf,
    pub report_name: String,
    pub fixed_name: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            save_report: true,
            save_fixed_code: true,
            output_dir: PathBuf::from("."),
            report_name: "debug-report.json".to_string(),
            fixed_name: "fixed-code.js".to_string(),
        }
    }
}

impl SessionOptions {
    /// In-memory only; nothing is persisted. Handy for tests and for
    /// embedding the pipeline.
    pub fn ephemeral() -> Self {
        Self {
            save_report: false,
            save_fixed_code: false,
            ..Self::default()
        }
    }
}

const BATCH_REPORT_NAME: &str = "multi-file-debug-report.json";

/// One debugging session over one or more files.
pub struct DebugSession {
    analyzer: Analyzer,
    sandbox: Sandbox,
    fixer: Fixer,
    linter: Option<Box<dyn Linter>>,
    options: SessionOptions,
}

impl DebugSession {
    pub fn new(options: SessionOptions) -> Self {
        Self {
            analyzer: Analyzer::new(),
            sandbox: Sandbox::new(),
            fixer: Fixer::new(),
            linter: None,
            options,
        }
    }

    /// Replace the sandbox, e.g. with a pinned configuration.
    pub fn with_sandbox(mut self, sandbox: Sandbox) -> Self {
        self.sandbox = sandbox;
        self
    }

    /// Delegate detection to an external linting engine. The built-in
    /// analyzer stays as the fallback when the engine errors.
    pub fn with_linter(mut self, linter: Box<dyn Linter>) -> Self {
        self.linter = Some(linter);
        self
    }

    /// Debug a single file: detectors, sandbox, fixer, in that fixed
    /// order, then summary and optional persistence.
    pub async fn debug_file(&self, path: &Path) -> Result<DebugReport, SessionError> {
        info!(path = %path.display(), "starting debug pass");

        let source = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| SessionError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        info!("running static analysis");
        let analysis = self.run_detectors(&source, &file_name, path);

        info!("running sandboxed simulation");
        let execution = self.sandbox.run(&source, &file_name).await;

        info!("applying automatic fixes");
        let remediation = self.fixer.fix(&source, &analysis.issues, &analysis.warnings);

        let summary = ReportSummary::from_parts(&analysis, &execution, &remediation);
        let report = DebugReport {
            file_name,
            file_path: path.to_path_buf(),
            analysis,
            execution,
            remediation,
            summary,
            timestamp: Utc::now(),
        };

        if self.options.save_report {
            let out = self.options.output_dir.join(&self.options.report_name);
            self.write_json(&out, &report).await?;
            info!(path = %out.display(), "report saved");
        }
        if self.options.save_fixed_code {
            let out = self.options.output_dir.join(&self.options.fixed_name);
            self.write_text(&out, &report.remediation.fixed_code).await?;
            info!(path = %out.display(), "fixed code saved");
        }

        Ok(report)
    }

    /// Debug files strictly sequentially. Per-file failures become error
    /// records; every input path gets exactly one entry, in input order.
    pub async fn debug_files(&self, paths: &[PathBuf]) -> BatchReport {
        info!(count = paths.len(), "starting batch debug pass");

        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            match self.debug_file(path).await {
                Ok(report) => files.push(FileOutcome::Report(Box::new(report))),
                Err(err) => {
                    warn!(path = %path.display(), %err, "file failed, recording and continuing");
                    files.push(FileOutcome::Error(FileError {
                        file_path: path.clone(),
                        error: err.to_string(),
                        timestamp: Utc::now(),
                    }));
                }
            }
        }

        let summary = BatchSummary::from_outcomes(&files);
        let report = BatchReport {
            files,
            summary,
            timestamp: Utc::now(),
        };

        if self.options.save_report {
            let out = self.options.output_dir.join(BATCH_REPORT_NAME);
            // batch mode always returns a result, even if persistence fails
            match self.write_json(&out, &report).await {
                Ok(()) => info!(path = %out.display(), "batch report saved"),
                Err(err) => warn!(%err, "could not persist batch report"),
            }
        }

        report
    }

    fn run_detectors(&self, source: &str, file_name: &str, path: &Path) -> AnalysisResult {
        if let Some(linter) = &self.linter {
            match linter.lint(source, file_name, Dialect::from_path(path)) {
                Ok(result) => return result,
                Err(err) => {
                    warn!(%err, "external linter failed, falling back to built-in detectors");
                }
            }
        }
        self.analyzer.analyze(source, file_name)
    }

    async fn write_json<T: serde::Serialize>(
        &self,
        path: &Path,
        value: &T,
    ) -> Result<(), SessionError> {
        let json = serde_json::to_string_pretty(value).map_err(|e| SessionError::Write {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })?;
        self.write_text(path, &json).await
    }

    async fn write_text(&self, path: &Path, text: &str) -> Result<(), SessionError> {
        tokio::fs::write(path, text)
            .await
            .map_err(|source| SessionError::Write {
                path: path.to_path_buf(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::FindingKind;
    use crate::sandbox::SandboxConfig;
    use anyhow::anyhow;
    use std::fs;

    fn pinned_session(options: SessionOptions) -> DebugSession {
        DebugSession::new(options).with_sandbox(Sandbox::with_config(SandboxConfig::pinned(1.0, 7)))
    }

    #[tokio::test]
    async fn test_debug_file_produces_complete_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("buggy.js");
        fs::write(
            &path,
            "let s; for(let i=0;i<a.length;i++){ s += a[i]; }\nfor(;;){}\n",
        )
        .unwrap();

        let session = pinned_session(SessionOptions::ephemeral());
        let report = session.debug_file(&path).await.unwrap();

        assert_eq!(report.file_name, "buggy.js");
        assert!(report
            .analysis
            .warnings
            .iter()
            .any(|w| w.kind == FindingKind::PotentialInfiniteLoop));
        assert!(report.remediation.fixed_code.contains("let s = 0;"));
        assert!(report.summary.code_health.value < 100);
    }

    #[tokio::test]
    async fn test_missing_file_is_a_read_error() {
        let session = pinned_session(SessionOptions::ephemeral());
        let err = session
            .debug_file(Path::new("/nonexistent/never.js"))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Read { .. }));
    }

    #[tokio::test]
    async fn test_batch_downgrades_missing_file_to_error_record() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.js");
        let b = dir.path().join("b.js");
        fs::write(&a, "let x = 1;").unwrap();
        fs::write(&b, "let y = 2;").unwrap();
        let missing = dir.path().join("missing.js");

        let session = pinned_session(SessionOptions::ephemeral());
        let batch = session
            .debug_files(&[a, missing.clone(), b])
            .await;

        assert_eq!(batch.files.len(), 3);
        assert_eq!(batch.summary.successful, 2);
        assert_eq!(batch.summary.failed, 1);
        assert_eq!(
            batch.files.iter().filter(|f| f.is_error()).count(),
            1
        );
        // entries stay in input order
        assert!(batch.files[1].is_error());
    }

    #[tokio::test]
    async fn test_persistence_writes_report_and_fixed_code() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.js");
        fs::write(&path, "setTimeout(tick, 100);").unwrap();

        let options = SessionOptions {
            output_dir: dir.path().to_path_buf(),
            ..SessionOptions::default()
        };
        let session = pinned_session(options);
        session.debug_file(&path).await.unwrap();

        let report_json = fs::read_to_string(dir.path().join("debug-report.json")).unwrap();
        let parsed: DebugReport = serde_json::from_str(&report_json).unwrap();
        assert_eq!(parsed.file_name, "app.js");

        let fixed = fs::read_to_string(dir.path().join("fixed-code.js")).unwrap();
        assert!(fixed.contains("potential timer leaks"));
    }

    struct FailingLinter;

    impl Linter for FailingLinter {
        fn lint(&self, _: &str, _: &str, _: Dialect) -> anyhow::Result<AnalysisResult> {
            Err(anyhow!("engine unavailable"))
        }
    }

    struct EmptyLinter;

    impl Linter for EmptyLinter {
        fn lint(
            &self,
            _: &str,
            file_name: &str,
            _: Dialect,
        ) -> anyhow::Result<AnalysisResult> {
            Ok(AnalysisResult::new(file_name, Vec::new(), Vec::new()))
        }
    }

    #[tokio::test]
    async fn test_failing_linter_falls_back_to_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loop.js");
        fs::write(&path, "while(true) {}").unwrap();

        let session =
            pinned_session(SessionOptions::ephemeral()).with_linter(Box::new(FailingLinter));
        let report = session.debug_file(&path).await.unwrap();
        // fallback engine still reports the loop
        assert!(report
            .analysis
            .warnings
            .iter()
            .any(|w| w.kind == FindingKind::PotentialInfiniteLoop));
    }

    #[tokio::test]
    async fn test_working_linter_replaces_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loop.js");
        fs::write(&path, "while(true) {}").unwrap();

        let session =
            pinned_session(SessionOptions::ephemeral()).with_linter(Box::new(EmptyLinter));
        let report = session.debug_file(&path).await.unwrap();
        assert!(report.analysis.warnings.is_empty());
        assert_eq!(report.summary.code_health.value, 100);
    }
}
