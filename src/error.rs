use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReportError>;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Transport error: {0}")]
    Transport(#[from] Box<ureq::Error>),
    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("GraphQL error: {0}")]
    GraphQl(String),
    #[error("Missing field in response: {0}")]
    MissingField(String),
    #[error("Unexpected response shape at {path}: {message}")]
    UnexpectedShape { path: String, message: String },
    #[error("Invalid repository URL: {0}")]
    InvalidRepositoryUrl(String),
    #[error("Invalid time window: {0}")]
    InvalidWindow(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReportError {
    /// Errors describing a single repository or branch rather than the
    /// connection itself. Collection skips past these.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ReportError::GraphQl(_)
                | ReportError::MissingField(_)
                | ReportError::UnexpectedShape { .. }
                | ReportError::InvalidRepositoryUrl(_)
        )
    }
}

// ureq::Error is large; boxing keeps Result<T> small on every call path.
impl From<ureq::Error> for ReportError {
    fn from(err: ureq::Error) -> Self {
        ReportError::Transport(Box::new(err))
    }
}
