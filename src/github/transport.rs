use crate::error::{ReportError, Result};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("weekly-report/", env!("CARGO_PKG_VERSION"));
const ERROR_BODY_LIMIT: usize = 200;

/// One GraphQL round trip: send a document with variables, get the decoded
/// response body back.
pub trait Transport {
    fn execute(&self, query: &str, variables: &Value) -> Result<Value>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, query: &str, variables: &Value) -> Result<Value> {
        (**self).execute(query, variables)
    }
}

pub struct HttpTransport {
    agent: ureq::Agent,
    endpoint: String,
    token: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self {
            agent,
            endpoint: endpoint.into(),
            token: token.into(),
        }
    }
}

impl Transport for HttpTransport {
    fn execute(&self, query: &str, variables: &Value) -> Result<Value> {
        let payload = json!({ "query": query, "variables": variables });
        debug!(endpoint = %self.endpoint, "POST graphql");

        let mut response = self
            .agent
            .post(&self.endpoint)
            .header("Accept", "application/json")
            .header("Content-Type", "application/json")
            .header("Authorization", &format!("bearer {}", self.token))
            .header("User-Agent", USER_AGENT)
            .send(payload.to_string())?;

        let status = response.status();
        let body = response.body_mut().read_to_string()?;
        if !status.is_success() {
            return Err(ReportError::Status {
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }
        Ok(serde_json::from_str(&body)?)
    }
}
