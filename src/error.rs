use thiserror::Error;

/// Errors surfaced by the analysis entry points.
///
/// Provider failures are deliberately absent here: they are recovered inside the
/// walker and never abort a traversal.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The repository URL does not have the `github.com/<owner>/<repo>` shape
    #[error("invalid GitHub repository URL: {0}")]
    InvalidUrl(String),

    /// Traversal finished without a single eligible file
    #[error("no files found or failed to fetch repository contents for {repository}")]
    NoFilesFound { repository: String },

    /// The HTTP client could not be built
    #[error("failed to build GitHub client: {0}")]
    Client(String),

    /// Configuration could not be read or parsed
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl AnalysisError {
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl(url.into())
    }

    pub fn no_files(repository: impl Into<String>) -> Self {
        Self::NoFilesFound {
            repository: repository.into(),
        }
    }
}

/// Failures reported by a [`crate::provider::FileTreeProvider`].
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Non-success HTTP status
    #[error("request failed with status {0}")]
    Status(u16),

    /// The per-call timeout elapsed
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// Network or client-side failure
    #[error("transport error: {0}")]
    Transport(String),

    /// The path does not exist or has no content
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<std::io::Error> for ProviderError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(err.to_string()),
            _ => Self::Transport(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
