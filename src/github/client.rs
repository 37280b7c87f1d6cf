use super::query::{self, ContributionNode, HistoryNode, RefEdge};
use super::transport::{HttpTransport, Transport};
use crate::error::{ReportError, Result};
use crate::model::{
    AuthorIdentity, BranchSelector, CommitRecord, ReportConfig, RepositoryRef,
    DEFAULT_BRANCH_PAGE_SIZE,
};
use serde_json::{json, Value};
use tracing::{debug, warn};

/// Handle on the GraphQL API. Holds the transport (endpoint and credentials)
/// and the author identity used to filter commit history.
pub struct ReportClient<T = HttpTransport> {
    transport: T,
    identity: AuthorIdentity,
    branch_page_size: u32,
}

impl ReportClient<HttpTransport> {
    pub fn from_config(config: &ReportConfig) -> Self {
        let transport = HttpTransport::new(&config.endpoint, &config.token, config.timeout);
        Self::new(transport, config.identity()).with_branch_page_size(config.max_branches)
    }
}

impl<T: Transport> ReportClient<T> {
    pub fn new(transport: T, identity: AuthorIdentity) -> Self {
        Self {
            transport,
            identity,
            branch_page_size: DEFAULT_BRANCH_PAGE_SIZE,
        }
    }

    /// Maximum branches fetched per repository. No further pages are requested.
    pub fn with_branch_page_size(mut self, page_size: u32) -> Self {
        self.branch_page_size = page_size;
        self
    }

    /// Raw call. A response carrying `errors` without any `data` is a
    /// `GraphQl` error; errors alongside data are logged and the data kept.
    pub fn run_query(&self, query: &str, variables: Value) -> Result<Value> {
        let response = self.transport.execute(query, &variables)?;
        if let Some(errors) = response.get("errors").and_then(Value::as_array) {
            let messages = errors
                .iter()
                .map(|e| e.get("message").and_then(Value::as_str).unwrap_or("unknown error"))
                .collect::<Vec<_>>()
                .join("; ");
            match response.get("data") {
                Some(Value::Null) | None => return Err(ReportError::GraphQl(messages)),
                Some(_) => warn!(%messages, "GraphQL response carried errors"),
            }
        }
        Ok(response)
    }

    /// URLs of repositories `user` committed to since `since`, in API order.
    pub fn list_contributed_repositories(&self, user: &str, since: &str) -> Result<Vec<String>> {
        debug!(user, since, "listing contributed repositories");
        let response = self.run_query(
            query::CONTRIBUTED_REPOSITORIES,
            json!({ "user": user, "since": since }),
        )?;
        let nodes: Vec<ContributionNode> =
            query::extract(&response, query::CONTRIBUTED_REPOSITORIES_PATH)?;
        Ok(nodes.into_iter().map(|n| n.repository.url).collect())
    }

    /// First page of branch names under `refs/heads/`.
    pub fn list_branches(&self, repo: &RepositoryRef) -> Result<Vec<String>> {
        debug!(repository = %repo, first = self.branch_page_size, "listing branches");
        let response = self.run_query(
            query::BRANCHES,
            json!({ "owner": repo.owner, "repo": repo.name, "first": self.branch_page_size }),
        )?;
        let edges: Vec<RefEdge> = query::extract(&response, query::BRANCHES_PATH)?;
        Ok(edges.into_iter().map(|e| e.node.name).collect())
    }

    /// Commit history of one branch since `since`, keeping only commits
    /// whose author name matches the identity.
    pub fn branch_commit_history(
        &self,
        repo: &RepositoryRef,
        since: &str,
        selector: &BranchSelector,
    ) -> Result<Vec<CommitRecord>> {
        debug!(repository = %repo, branch = selector.label(), "fetching history");
        let mut variables = json!({ "owner": repo.owner, "repo": repo.name, "since": since });
        if let BranchSelector::Named(name) = selector {
            variables["qualifiedName"] = Value::String(name.clone());
        }
        let response = self.run_query(&query::history_query(selector), variables)?;
        let nodes: Vec<HistoryNode> = query::extract(&response, query::HISTORY_PATH)?;

        let total = nodes.len();
        let records: Vec<CommitRecord> = nodes
            .into_iter()
            .filter(|node| self.identity.matches(node.author_name()))
            .map(|node| CommitRecord {
                message: node.message,
                url: node.commit_url,
                branch_label: selector.label().to_string(),
                committed_date: node.committed_date,
            })
            .collect();
        debug!(repository = %repo, branch = selector.label(), total, kept = records.len(), "history filtered");
        Ok(records)
    }
}
