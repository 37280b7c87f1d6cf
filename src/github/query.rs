use crate::error::{ReportError, Result};
use crate::model::BranchSelector;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

pub const CONTRIBUTED_REPOSITORIES: &str = r#"
query($user: String!, $since: DateTime!) {
  user(login: $user) {
    contributionsCollection(from: $since) {
      commitContributionsByRepository {
        repository {
          url
        }
      }
    }
  }
}
"#;

pub const BRANCHES: &str = r#"
query($owner: String!, $repo: String!, $first: Int!) {
  repository(owner: $owner, name: $repo) {
    refs(refPrefix: "refs/heads/", first: $first) {
      edges {
        node {
          name
        }
      }
    }
  }
}
"#;

const HISTORY_TEMPLATE: &str = r#"
query($owner: String!, $repo: String!, $since: GitTimestamp!__EXTRA_VARS__) {
  repository(owner: $owner, name: $repo) {
    branch: __REF__ {
      target {
        ... on Commit {
          history(since: $since) {
            nodes {
              author {
                name
              }
              commitUrl
              message
              committedDate
            }
            totalCount
          }
        }
      }
    }
  }
}
"#;

pub const CONTRIBUTED_REPOSITORIES_PATH: &[&str] = &[
    "data",
    "user",
    "contributionsCollection",
    "commitContributionsByRepository",
];
pub const BRANCHES_PATH: &[&str] = &["data", "repository", "refs", "edges"];
pub const HISTORY_PATH: &[&str] = &["data", "repository", "branch", "target", "history", "nodes"];

/// History document for a branch selector. Both variants alias the ref as
/// `branch` so the response is read from one path.
pub fn history_query(selector: &BranchSelector) -> String {
    let (extra_vars, reference) = match selector {
        BranchSelector::Default => ("", "defaultBranchRef"),
        BranchSelector::Named(_) => (", $qualifiedName: String!", "ref(qualifiedName: $qualifiedName)"),
    };
    HISTORY_TEMPLATE
        .replace("__EXTRA_VARS__", extra_vars)
        .replace("__REF__", reference)
}

#[derive(Debug, Deserialize)]
pub struct ContributionNode {
    pub repository: RepositoryNode,
}

#[derive(Debug, Deserialize)]
pub struct RepositoryNode {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct RefEdge {
    pub node: RefNode,
}

#[derive(Debug, Deserialize)]
pub struct RefNode {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryNode {
    pub author: Option<AuthorNode>,
    pub commit_url: String,
    pub message: String,
    pub committed_date: String,
}

#[derive(Debug, Deserialize)]
pub struct AuthorNode {
    pub name: Option<String>,
}

impl HistoryNode {
    pub fn author_name(&self) -> Option<&str> {
        self.author.as_ref().and_then(|a| a.name.as_deref())
    }
}

/// Walk `path` from the response root. An absent or null step is a
/// `MissingField` naming the path up to that step.
pub fn lookup<'a>(root: &'a Value, path: &[&str]) -> Result<&'a Value> {
    let mut current = root;
    for (depth, key) in path.iter().enumerate() {
        current = match current.get(key) {
            Some(Value::Null) | None => {
                return Err(ReportError::MissingField(path[..=depth].join(".")));
            }
            Some(next) => next,
        };
    }
    Ok(current)
}

pub fn extract<T: DeserializeOwned>(root: &Value, path: &[&str]) -> Result<T> {
    let value = lookup(root, path)?;
    T::deserialize(value).map_err(|e| ReportError::UnexpectedShape {
        path: path.join("."),
        message: e.to_string(),
    })
}
