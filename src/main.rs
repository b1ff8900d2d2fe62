use anyhow::Result;
use clap::Parser;
use medic::report::{BatchReport, DebugReport};
use medic::session::{DebugSession, SessionOptions};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "medic",
    about = "An automated triage and remediation companion for AI-generated code",
    version
)]
struct Args {
    /// Source files to debug
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Output directory for reports and fixed code
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Report filename
    #[arg(short, long, default_value = "debug-report.json")]
    report: String,

    /// Fixed code filename
    #[arg(short, long, default_value = "fixed-code.js")]
    fixed: String,

    /// Force batch mode even for a single path
    #[arg(short, long)]
    multiple: bool,

    /// Skip writing the debug report
    #[arg(long)]
    no_report: bool,

    /// Skip writing the fixed code
    #[arg(long)]
    no_fixed: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    for path in &args.paths {
        if !path.exists() {
            eprintln!("Error: file not found - {}", path.display());
            std::process::exit(1);
        }
    }

    if args.output != PathBuf::from(".") {
        std::fs::create_dir_all(&args.output)?;
    }

    let options = SessionOptions {
        save_report: !args.no_report,
        save_fixed_code: !args.no_fixed,
        output_dir: args.output,
        report_name: args.report,
        fixed_name: args.fixed,
    };
    let session = DebugSession::new(options);

    if args.multiple || args.paths.len() > 1 {
        let batch = session.debug_files(&args.paths).await;
        print_batch_summary(&batch);
        if batch.summary.failed > 0 {
            std::process::exit(1);
        }
    } else {
        let report = session.debug_file(&args.paths[0]).await?;
        print_summary(&report);
    }

    Ok(())
}

fn print_summary(report: &DebugReport) {
    let health = &report.summary.code_health;
    println!();
    println!("  {} - {}", report.file_name, health.display());
    println!("  {}", health.grade.description());
    println!();
    println!(
        "  issues: {}  warnings: {}  execution errors: {}",
        report.summary.total_issues,
        report.summary.total_warnings,
        report.summary.execution_errors
    );
    println!(
        "  fixes applied: {}  suggestions: {}",
        report.summary.fixes_applied, report.summary.suggestions
    );
    println!();
}

fn print_batch_summary(batch: &BatchReport) {
    println!();
    println!(
        "  {} files - {} debugged, {} failed",
        batch.summary.total_files, batch.summary.successful, batch.summary.failed
    );
    println!(
        "  issues: {}  warnings: {}  execution errors: {}  fixes: {}",
        batch.summary.total_issues,
        batch.summary.total_warnings,
        batch.summary.total_execution_errors,
        batch.summary.total_fixes
    );
    println!("  aggregate health: {}/100", batch.summary.code_health);
    println!();
}
