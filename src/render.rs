use crate::collect::CollectOutcome;
use crate::error::Result;
use crate::model::{ReportModel, TimeWindow};
use crate::util::{short_hash, single_line};
use console::style;
use std::fmt::Write as _;
use std::path::Path;

pub const DEFAULT_REPORT_FILE: &str = "WeeklyReport.md";

pub fn render_markdown(report: &ReportModel, window: &TimeWindow) -> String {
    let mut out = String::from("# Weekly Report\n");
    for section in report.sections() {
        let _ = writeln!(out, "## {}", section.name);
        for commit in &section.commits {
            let _ = writeln!(
                out,
                "- [{}@{}]({}) {}",
                commit.branch_label,
                short_hash(&commit.url),
                commit.url,
                single_line(&commit.message)
            );
        }
    }
    out.push('\n');
    let _ = writeln!(out, "Collected from {} to {}", window.since_str(), window.until_str());
    out
}

/// Overwrites `path` with the rendered report.
pub fn write_report(path: &Path, report: &ReportModel, window: &TimeWindow) -> Result<()> {
    std::fs::write(path, render_markdown(report, window))?;
    Ok(())
}

pub fn output_summary(outcome: &CollectOutcome, window: &TimeWindow, path: &Path) {
    println!("{}", style("Weekly Report").bold());
    println!("{}", "─".repeat(50));

    let report = &outcome.report;
    for section in report.sections() {
        let latest = section
            .commits
            .iter()
            .map(|c| c.committed_date.as_str())
            .max()
            .unwrap_or("-");
        println!(
            "{:<40} {:>6}  {}",
            section.name,
            style(section.commits.len()).cyan(),
            style(latest).dim()
        );
    }
    if report.is_empty() {
        println!("No contributed repositories in this window");
    }

    println!(
        "Total commits: {} across {} repositories",
        style(report.commit_count()).green(),
        report.sections().len()
    );
    println!(
        "Window: {} to {}",
        style(window.since_str()).dim(),
        style(window.until_str()).dim()
    );

    if !outcome.failures.is_empty() {
        println!("\n{}", style("Skipped").yellow().bold());
        for failure in &outcome.failures {
            match &failure.branch {
                Some(branch) => println!("  {}@{}: {}", failure.repository, branch, failure.reason),
                None => println!("  {}: {}", failure.repository, failure.reason),
            }
        }
    }

    println!("\nWritten to {}", style(path.display()).bold());
}
