use crate::model::{BranchScope, ReportConfig, DEFAULT_BRANCH_PAGE_SIZE, DEFAULT_ENDPOINT};
use crate::render::DEFAULT_REPORT_FILE;
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "weekly-report")]
#[command(about = "Generate a markdown report of your GitHub commits over the last few days")]
#[command(version)]
pub struct Cli {
    #[arg(long, env = "WR_ACCOUNT_NAME", help = "GitHub account login")]
    pub account_name: String,

    #[arg(long, env = "WR_USER_NAME", help = "Display name shown on your commits, if it differs from the login")]
    pub user_name: Option<String>,

    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, help = "Personal access token")]
    pub token: String,

    #[arg(long, default_value = DEFAULT_ENDPOINT, help = "GitHub GraphQL endpoint")]
    pub endpoint: String,

    #[arg(long, default_value_t = 7, help = "Number of days covered by the report")]
    pub days: u32,

    #[arg(long, value_enum, default_value_t = BranchScope::All, help = "Which branches to scan")]
    pub branch: BranchScope,

    #[arg(
        long,
        default_value_t = DEFAULT_BRANCH_PAGE_SIZE,
        value_parser = clap::value_parser!(u32).range(1..=100),
        help = "Maximum branches fetched per repository"
    )]
    pub max_branches: u32,

    #[arg(long, help = "Query each contributed repository only once", default_value_t = false)]
    pub dedupe: bool,

    #[arg(long, default_value = DEFAULT_REPORT_FILE, help = "Path of the generated report")]
    pub output: PathBuf,

    #[arg(long, default_value = "30s", value_parser = humantime::parse_duration, help = "Timeout per API call (e.g. 30s, 2m)")]
    pub timeout: Duration,

    #[arg(short, long, help = "No progress spinner or summary", default_value_t = false)]
    pub quiet: bool,

    #[arg(short, long, action = clap::ArgAction::Count, help = "Increase log verbosity (-v, -vv)")]
    pub verbose: u8,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Log to stderr. `RUST_LOG` overrides the level picked by `-v`.
    pub fn init_logging(&self) {
        let level = match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }

    pub fn config(&self) -> ReportConfig {
        ReportConfig {
            account_name: self.account_name.clone(),
            user_name: self.user_name.clone(),
            token: self.token.clone(),
            endpoint: self.endpoint.clone(),
            days: self.days,
            scope: self.branch,
            max_branches: self.max_branches,
            dedupe: self.dedupe,
            output: self.output.clone(),
            timeout: self.timeout,
            show_progress: !self.quiet,
        }
    }

    pub fn execute(self) -> Result<()> {
        crate::report::exec(self.config())
    }
}
