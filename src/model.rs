use crate::error::{ReportError, Result};
use crate::util::format_api_timestamp;
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://api.github.com/graphql";
pub const DEFAULT_BRANCH_PAGE_SIZE: u32 = 10;
pub const DEFAULT_BRANCH_LABEL: &str = "default";

/// Collection window. Queries filter on `since`; `until` is the instant the
/// window was computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub since: DateTime<Utc>,
    pub until: DateTime<Utc>,
}

impl TimeWindow {
    pub fn since_str(&self) -> String {
        format_api_timestamp(&self.since)
    }

    pub fn until_str(&self) -> String {
        format_api_timestamp(&self.until)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryRef {
    pub owner: String,
    pub name: String,
}

impl RepositoryRef {
    /// Derive owner and name from the last two path segments of a repository
    /// URL. The shape of the rest of the URL is not checked.
    pub fn from_url(url: &str) -> Result<Self> {
        let mut segments = url.trim_end_matches('/').rsplit('/');
        let name = segments.next().filter(|s| !s.is_empty());
        let owner = segments.next().filter(|s| !s.is_empty());
        match (owner, name) {
            (Some(owner), Some(name)) => Ok(Self {
                owner: owner.to_string(),
                name: name.to_string(),
            }),
            _ => Err(ReportError::InvalidRepositoryUrl(url.to_string())),
        }
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub message: String,
    pub url: String,
    pub branch_label: String,
    pub committed_date: String,
}

/// Author display names treated as "mine". Matching is exact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorIdentity {
    pub account_name: String,
    pub user_name: Option<String>,
}

impl AuthorIdentity {
    pub fn new(account_name: impl Into<String>, user_name: Option<String>) -> Self {
        Self {
            account_name: account_name.into(),
            user_name,
        }
    }

    pub fn matches(&self, author_name: Option<&str>) -> bool {
        match author_name {
            Some(name) => name == self.account_name || self.user_name.as_deref() == Some(name),
            None => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BranchScope {
    /// Every branch returned by the branch listing
    All,
    /// Only the repository's default branch
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchSelector {
    Default,
    Named(String),
}

impl BranchSelector {
    pub fn label(&self) -> &str {
        match self {
            BranchSelector::Default => DEFAULT_BRANCH_LABEL,
            BranchSelector::Named(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositorySection {
    pub name: String,
    pub commits: Vec<CommitRecord>,
}

/// Repository name to commits, kept in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportModel {
    sections: Vec<RepositorySection>,
}

impl ReportModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the commits of an existing section in place, so a repeated
    /// name keeps its first position.
    pub fn insert(&mut self, name: impl Into<String>, commits: Vec<CommitRecord>) {
        let name = name.into();
        if let Some(section) = self.sections.iter_mut().find(|s| s.name == name) {
            section.commits = commits;
        } else {
            self.sections.push(RepositorySection { name, commits });
        }
    }

    pub fn get(&self, name: &str) -> Option<&[CommitRecord]> {
        self.sections
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.commits.as_slice())
    }

    pub fn sections(&self) -> &[RepositorySection] {
        &self.sections
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn commit_count(&self) -> usize {
        self.sections.iter().map(|s| s.commits.len()).sum()
    }
}

/// Everything one run needs, resolved from the command line.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub account_name: String,
    pub user_name: Option<String>,
    pub token: String,
    pub endpoint: String,
    pub days: u32,
    pub scope: BranchScope,
    pub max_branches: u32,
    pub dedupe: bool,
    pub output: PathBuf,
    pub timeout: Duration,
    pub show_progress: bool,
}

impl ReportConfig {
    pub fn identity(&self) -> AuthorIdentity {
        AuthorIdentity::new(self.account_name.clone(), self.user_name.clone())
    }
}
