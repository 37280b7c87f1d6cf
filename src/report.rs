use crate::collect::{collect_commits, CollectOptions};
use crate::github::ReportClient;
use crate::model::ReportConfig;
use crate::render::{output_summary, write_report};
use crate::util::time_window;
use anyhow::Context;
use chrono::Utc;
use tracing::info;

pub fn exec(config: ReportConfig) -> anyhow::Result<()> {
    let window = time_window(config.days, Utc::now()).context("Failed to compute time window")?;
    info!(
        account = %config.account_name,
        since = %window.since_str(),
        until = %window.until_str(),
        scope = ?config.scope,
        "collecting weekly report"
    );

    let client = ReportClient::from_config(&config);
    let options = CollectOptions {
        scope: config.scope,
        dedupe: config.dedupe,
        show_progress: config.show_progress,
    };
    let outcome = collect_commits(&client, &config.account_name, &window, options)
        .with_context(|| format!("Failed to collect commits from {}", config.endpoint))?;

    write_report(&config.output, &outcome.report, &window)
        .with_context(|| format!("Failed to write {}", config.output.display()))?;

    if config.show_progress {
        output_summary(&outcome, &window, &config.output);
    }
    Ok(())
}
