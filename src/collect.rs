use crate::error::Result;
use crate::github::{ReportClient, Transport};
use crate::model::{BranchScope, BranchSelector, CommitRecord, ReportModel, RepositoryRef, TimeWindow};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy)]
pub struct CollectOptions {
    pub scope: BranchScope,
    pub dedupe: bool,
    pub show_progress: bool,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            scope: BranchScope::All,
            dedupe: false,
            show_progress: false,
        }
    }
}

/// A repository, or one branch of it, that was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryFailure {
    pub repository: String,
    pub branch: Option<String>,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct CollectOutcome {
    pub report: ReportModel,
    pub failures: Vec<RepositoryFailure>,
}

/// Build the report for `account` over `window`.
///
/// Repositories come from the contributions query, then branches per the
/// scope, then filtered history per branch. Response-shape problems for one
/// repository or branch are logged and recorded in `failures`; anything else
/// aborts the whole collection.
pub fn collect_commits<T: Transport>(
    client: &ReportClient<T>,
    account: &str,
    window: &TimeWindow,
    options: CollectOptions,
) -> Result<CollectOutcome> {
    let since = window.since_str();
    let urls = discover_repositories(client, account, &since, options.dedupe)?;

    let pb = progress_bar(options.show_progress, urls.len());
    let mut outcome = CollectOutcome::default();

    for url in &urls {
        let repo = match RepositoryRef::from_url(url) {
            Ok(repo) => repo,
            Err(e) => {
                warn!(url = %url, error = %e, "skipping repository");
                outcome.failures.push(RepositoryFailure {
                    repository: url.clone(),
                    branch: None,
                    reason: e.to_string(),
                });
                pb.inc(1);
                continue;
            }
        };
        pb.set_message(repo.to_string());

        if let Some(commits) = collect_repository(client, &repo, &since, options.scope, &mut outcome.failures)? {
            info!(repository = %repo, commits = commits.len(), "collected");
            outcome.report.insert(repo.name.clone(), commits);
        }
        pb.inc(1);
    }

    pb.finish_with_message("Commits collected");
    Ok(outcome)
}

fn discover_repositories<T: Transport>(
    client: &ReportClient<T>,
    account: &str,
    since: &str,
    dedupe: bool,
) -> Result<Vec<String>> {
    let mut urls = client.list_contributed_repositories(account, since)?;
    if dedupe {
        let mut seen = HashSet::new();
        urls.retain(|url| seen.insert(url.clone()));
    }
    info!(account, repositories = urls.len(), "discovered repositories");
    Ok(urls)
}

fn branch_selectors<T: Transport>(
    client: &ReportClient<T>,
    repo: &RepositoryRef,
    scope: BranchScope,
) -> Result<Vec<BranchSelector>> {
    match scope {
        BranchScope::Default => Ok(vec![BranchSelector::Default]),
        BranchScope::All => Ok(client
            .list_branches(repo)?
            .into_iter()
            .map(BranchSelector::Named)
            .collect()),
    }
}

/// Commits for one repository, or `None` when its branches could not be
/// listed. A failing branch contributes zero commits and is recorded, so a
/// repository whose every branch fails still gets an empty section.
fn collect_repository<T: Transport>(
    client: &ReportClient<T>,
    repo: &RepositoryRef,
    since: &str,
    scope: BranchScope,
    failures: &mut Vec<RepositoryFailure>,
) -> Result<Option<Vec<CommitRecord>>> {
    let selectors = match branch_selectors(client, repo, scope) {
        Ok(selectors) => selectors,
        Err(e) if e.is_recoverable() => {
            warn!(repository = %repo, error = %e, "cannot list branches, skipping repository");
            failures.push(RepositoryFailure {
                repository: repo.to_string(),
                branch: None,
                reason: e.to_string(),
            });
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    let mut commits = Vec::new();
    for selector in &selectors {
        match client.branch_commit_history(repo, since, selector) {
            Ok(records) => commits.extend(records),
            Err(e) if e.is_recoverable() => {
                warn!(repository = %repo, branch = selector.label(), error = %e, "treating branch as empty");
                failures.push(RepositoryFailure {
                    repository: repo.to_string(),
                    branch: Some(selector.label().to_string()),
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }

    Ok(Some(commits))
}

fn progress_bar(show: bool, len: usize) -> ProgressBar {
    if !show {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{pos}/{len}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message("Collecting commits...");
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReportError;
    use crate::github::transport::testing::ScriptedTransport;
    use crate::model::AuthorIdentity;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn window() -> TimeWindow {
        TimeWindow {
            since: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            until: Utc.with_ymd_and_hms(2024, 3, 8, 0, 0, 0).unwrap(),
        }
    }

    fn repos(urls: &[&str]) -> Value {
        let nodes: Vec<Value> = urls.iter().map(|u| json!({"repository": {"url": u}})).collect();
        json!({"data": {"user": {"contributionsCollection": {"commitContributionsByRepository": nodes}}}})
    }

    fn branches(names: &[&str]) -> Value {
        let edges: Vec<Value> = names.iter().map(|n| json!({"node": {"name": n}})).collect();
        json!({"data": {"repository": {"refs": {"edges": edges}}}})
    }

    fn history(nodes: Vec<Value>) -> Value {
        json!({"data": {"repository": {"branch": {"target": {"history": {"nodes": nodes, "totalCount": 0}}}}}})
    }

    fn commit(author: &str, sha: &str, message: &str) -> Value {
        json!({
            "author": {"name": author},
            "commitUrl": format!("https://github.com/org/proj/commit/{sha}"),
            "message": message,
            "committedDate": "2024-03-05T09:00:00Z"
        })
    }

    fn kind(query: &str) -> &'static str {
        if query.contains("contributionsCollection") {
            "repos"
        } else if query.contains("refs(") {
            "branches"
        } else {
            "history"
        }
    }

    fn client(transport: &ScriptedTransport) -> ReportClient<&ScriptedTransport> {
        ReportClient::new(transport, AuthorIdentity::new("alice", None))
    }

    #[test]
    fn all_branches_are_concatenated_in_branch_order() {
        let transport = ScriptedTransport::new(|q, vars| {
            Ok(match kind(q) {
                "repos" => repos(&["https://github.com/org/proj"]),
                "branches" => branches(&["main", "dev"]),
                _ => match vars["qualifiedName"].as_str() {
                    Some("main") => history(vec![commit("alice", "1111111111", "on main"), commit("bob", "2222", "x")]),
                    _ => history(vec![commit("alice", "3333333333", "on dev")]),
                },
            })
        });
        let outcome = collect_commits(&client(&transport), "alice", &window(), CollectOptions::default()).unwrap();

        let commits = outcome.report.get("proj").unwrap();
        let labels: Vec<_> = commits.iter().map(|c| (c.branch_label.as_str(), c.message.as_str())).collect();
        assert_eq!(labels, vec![("main", "on main"), ("dev", "on dev")]);
        assert!(outcome.failures.is_empty());
        assert_eq!(transport.calls().len(), 4);
    }

    #[test]
    fn default_scope_skips_branch_listing() {
        let transport = ScriptedTransport::new(|q, _| {
            Ok(match kind(q) {
                "repos" => repos(&["https://github.com/org/proj"]),
                "branches" => panic!("branch listing not expected"),
                _ => history(vec![commit("alice", "abcdef0123", "fix")]),
            })
        });
        let options = CollectOptions { scope: BranchScope::Default, ..CollectOptions::default() };
        let outcome = collect_commits(&client(&transport), "alice", &window(), options).unwrap();
        assert_eq!(outcome.report.get("proj").unwrap()[0].branch_label, "default");
    }

    #[test]
    fn no_repositories_gives_empty_report() {
        let transport = ScriptedTransport::new(|_, _| Ok(repos(&[])));
        let outcome = collect_commits(&client(&transport), "alice", &window(), CollectOptions::default()).unwrap();
        assert!(outcome.report.is_empty());
        assert_eq!(transport.calls().len(), 1);
    }

    #[test]
    fn since_is_the_window_start() {
        let transport = ScriptedTransport::new(|_, _| Ok(repos(&[])));
        collect_commits(&client(&transport), "alice", &window(), CollectOptions::default()).unwrap();
        assert_eq!(transport.calls()[0].1["since"], json!("2024-03-01T00:00:00Z"));
    }

    #[test]
    fn duplicate_urls_are_refetched_unless_deduped() {
        let handler = |q: &str, _: &Value| -> crate::error::Result<Value> {
            Ok(match kind(q) {
                "repos" => repos(&["https://github.com/org/proj", "https://github.com/org/proj"]),
                "branches" => branches(&["main"]),
                _ => history(vec![commit("alice", "1234567890", "once")]),
            })
        };

        let transport = ScriptedTransport::new(handler);
        let outcome = collect_commits(&client(&transport), "alice", &window(), CollectOptions::default()).unwrap();
        assert_eq!(transport.calls().len(), 5);
        assert_eq!(outcome.report.sections().len(), 1);
        assert_eq!(outcome.report.commit_count(), 1);

        let transport = ScriptedTransport::new(handler);
        let options = CollectOptions { dedupe: true, ..CollectOptions::default() };
        collect_commits(&client(&transport), "alice", &window(), options).unwrap();
        assert_eq!(transport.calls().len(), 3);
    }

    #[test]
    fn same_name_from_different_owners_overwrites() {
        let transport = ScriptedTransport::new(|q, vars| {
            Ok(match kind(q) {
                "repos" => repos(&["https://github.com/org/proj", "https://github.com/alice/proj"]),
                "branches" => branches(&["main"]),
                _ => history(vec![commit("alice", "1234567890", vars["owner"].as_str().unwrap_or(""))]),
            })
        });
        let outcome = collect_commits(&client(&transport), "alice", &window(), CollectOptions::default()).unwrap();
        assert_eq!(outcome.report.sections().len(), 1);
        assert_eq!(outcome.report.get("proj").unwrap()[0].message, "alice");
    }

    #[test]
    fn missing_repository_is_skipped_and_recorded() {
        let transport = ScriptedTransport::new(|q, vars| {
            Ok(match (kind(q), vars["repo"].as_str()) {
                ("repos", _) => repos(&["https://github.com/org/gone", "https://github.com/org/proj"]),
                ("branches", Some("gone")) => json!({"data": {"repository": null}}),
                ("branches", _) => branches(&["main"]),
                _ => history(vec![commit("alice", "1234567890", "kept")]),
            })
        });
        let outcome = collect_commits(&client(&transport), "alice", &window(), CollectOptions::default()).unwrap();

        assert!(outcome.report.get("gone").is_none());
        assert_eq!(outcome.report.get("proj").unwrap().len(), 1);
        assert_eq!(
            outcome.failures,
            vec![RepositoryFailure {
                repository: "org/gone".into(),
                branch: None,
                reason: "Missing field in response: data.repository".into(),
            }]
        );
    }

    #[test]
    fn empty_branch_counts_as_zero_commits() {
        let transport = ScriptedTransport::new(|q, vars| {
            Ok(match kind(q) {
                "repos" => repos(&["https://github.com/org/proj"]),
                "branches" => branches(&["main", "empty"]),
                _ if vars["qualifiedName"] == json!("empty") => {
                    json!({"data": {"repository": {"branch": {"target": {}}}}})
                }
                _ => history(vec![commit("alice", "1234567890", "kept")]),
            })
        });
        let outcome = collect_commits(&client(&transport), "alice", &window(), CollectOptions::default()).unwrap();
        assert_eq!(outcome.report.get("proj").unwrap().len(), 1);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].branch.as_deref(), Some("empty"));
    }

    #[test]
    fn repository_without_matching_commits_keeps_its_section() {
        let transport = ScriptedTransport::new(|q, _| {
            Ok(match kind(q) {
                "repos" => repos(&["https://github.com/org/proj"]),
                "branches" => branches(&["main"]),
                _ => history(vec![commit("bob", "1234567890", "theirs")]),
            })
        });
        let outcome = collect_commits(&client(&transport), "alice", &window(), CollectOptions::default()).unwrap();
        assert_eq!(outcome.report.get("proj").map(|c| c.len()), Some(0));
    }

    #[test]
    fn null_history_on_default_branch_gives_empty_section() {
        let transport = ScriptedTransport::new(|q, _| {
            Ok(match kind(q) {
                "repos" => repos(&["https://github.com/org/proj"]),
                _ => json!({"data": {"repository": {"branch": {"target": {"history": null}}}}}),
            })
        });
        let options = CollectOptions { scope: BranchScope::Default, ..CollectOptions::default() };
        let outcome = collect_commits(&client(&transport), "alice", &window(), options).unwrap();

        assert_eq!(outcome.report.get("proj").map(|c| c.len()), Some(0));
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].branch.as_deref(), Some("default"));
        assert_eq!(
            outcome.failures[0].reason,
            "Missing field in response: data.repository.branch.target.history"
        );
    }

    #[test]
    fn null_and_empty_history_render_the_same_section() {
        fn run(history_value: Value) -> Vec<String> {
            let transport = ScriptedTransport::new(move |q, _| {
                Ok(match kind(q) {
                    "repos" => repos(&["https://github.com/org/proj"]),
                    _ => json!({"data": {"repository": {"branch": {"target": {"history": history_value.clone()}}}}}),
                })
            });
            let options = CollectOptions { scope: BranchScope::Default, ..CollectOptions::default() };
            let outcome = collect_commits(&client(&transport), "alice", &window(), options).unwrap();
            outcome.report.sections().iter().map(|s| s.name.clone()).collect()
        }

        assert_eq!(run(json!({"nodes": [], "totalCount": 0})), vec!["proj".to_string()]);
        assert_eq!(run(Value::Null), vec!["proj".to_string()]);
    }

    #[test]
    fn malformed_url_is_skipped() {
        let transport = ScriptedTransport::new(|q, _| {
            Ok(match kind(q) {
                "repos" => repos(&["proj"]),
                _ => panic!("no further calls expected"),
            })
        });
        let outcome = collect_commits(&client(&transport), "alice", &window(), CollectOptions::default()).unwrap();
        assert!(outcome.report.is_empty());
        assert_eq!(outcome.failures[0].repository, "proj");
    }

    #[test]
    fn transport_failure_aborts() {
        let transport = ScriptedTransport::new(|q, _| match kind(q) {
            "repos" => Ok(repos(&["https://github.com/org/proj"])),
            _ => Err(ReportError::Status { status: 500, body: "boom".into() }),
        });
        let result = collect_commits(&client(&transport), "alice", &window(), CollectOptions::default());
        assert!(matches!(result, Err(ReportError::Status { status: 500, .. })));
    }
}
