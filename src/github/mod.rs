use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use octocrab::Octocrab;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::time::{Duration, sleep};

use crate::config::Credentials;
use crate::error::{AnalysisError, ProviderError};
use crate::provider::{EntryKind, FileTreeProvider, TreeEntry};

const MAX_RETRIES: u32 = 3;
const USER_AGENT: &str = concat!("mcp-lens-rs/", env!("CARGO_PKG_VERSION"));

static REPO_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:https?://)?(?:www\.)?github\.com/([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+)")
        .expect("valid regex")
});

/// `owner/repo` pair identifying a GitHub repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Parse `https://github.com/<owner>/<repo>[/...]`. A trailing `.git` is dropped.
    pub fn parse_url(url: &str) -> Result<Self, AnalysisError> {
        let caps = REPO_URL
            .captures(url.trim())
            .ok_or_else(|| AnalysisError::invalid_url(url))?;
        let repo = caps[2].trim_end_matches(".git");
        if repo.is_empty() {
            return Err(AnalysisError::invalid_url(url));
        }
        Ok(Self::new(&caps[1], repo))
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// GitHub contents API provider
#[derive(Clone)]
pub struct GitHubProvider {
    client: Arc<Octocrab>,
    http: reqwest::Client,
    repo: RepoRef,
    credentials: Credentials,
    /// Requests sent so far, attempts included
    request_count: Arc<AtomicUsize>,
}

impl GitHubProvider {
    pub async fn new(repo: RepoRef, credentials: Credentials) -> Result<Self, AnalysisError> {
        if repo.owner.trim().is_empty() {
            return Err(AnalysisError::invalid_url("owner cannot be empty"));
        }
        if repo.repo.trim().is_empty() {
            return Err(AnalysisError::invalid_url("repository name cannot be empty"));
        }

        let mut builder = Octocrab::builder();
        if let Some(token) = credentials.bearer() {
            tracing::info!("Using personal access token for GitHub API");
            builder = builder.personal_token(token.to_string());
        }
        let client = builder
            .build()
            .map_err(|e| AnalysisError::Client(e.to_string()))?;
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AnalysisError::Client(e.to_string()))?;

        Ok(Self {
            client: Arc::new(client),
            http,
            repo,
            credentials,
            request_count: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Run `op` with exponential backoff. Status errors other than rate limiting
    /// are returned immediately.
    async fn with_retry<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, ProviderError>>,
    {
        let mut delay = Duration::from_millis(100);
        let mut attempt = 0;
        loop {
            // Retries count against the rate limit too
            let sent = self.request_count.fetch_add(1, Ordering::SeqCst) + 1;
            tracing::debug!(request = sent, what, "GitHub API request");
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt + 1 < MAX_RETRIES && is_retryable(&e) => {
                    attempt += 1;
                    tracing::warn!("Retry {}/{} for {}: {}", attempt, MAX_RETRIES, what, e);
                    sleep(delay).await;
                    delay *= 2;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        let mut request = self.http.get(url);
        if let Some(token) = self.credentials.bearer() {
            request = request.header(reqwest::header::AUTHORIZATION, format!("token {token}"));
        }
        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status().as_u16()));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    /// Contents API fallback when an entry carries no download URL
    async fn fetch_encoded(&self, path: &str) -> Result<Vec<u8>, ProviderError> {
        let content = self
            .client
            .repos(&self.repo.owner, &self.repo.repo)
            .get_content()
            .path(path)
            .send()
            .await
            .map_err(provider_error)?;

        let encoded = content
            .items
            .first()
            .and_then(|file| file.content.as_ref())
            .ok_or_else(|| ProviderError::NotFound(path.to_string()))?;
        STANDARD
            .decode(encoded.replace('\n', ""))
            .map_err(|e| ProviderError::Transport(format!("invalid base64 content: {e}")))
    }
}

/// Keep the HTTP status of GitHub API failures so 4xx answers are not retried.
fn provider_error(err: octocrab::Error) -> ProviderError {
    match err {
        octocrab::Error::GitHub { source, .. } => {
            ProviderError::Status(source.status_code.as_u16())
        }
        other => ProviderError::Transport(other.to_string()),
    }
}

fn is_retryable(err: &ProviderError) -> bool {
    match err {
        ProviderError::Status(code) => *code == 429 || *code >= 500,
        ProviderError::Transport(_) => true,
        ProviderError::Timeout(_) | ProviderError::NotFound(_) => false,
    }
}

#[async_trait]
impl FileTreeProvider for GitHubProvider {
    async fn list(&self, path: &str) -> Result<Vec<TreeEntry>, ProviderError> {
        let path = path.trim_start_matches('/');
        let content = self
            .with_retry(path, || async {
                self.client
                    .repos(&self.repo.owner, &self.repo.repo)
                    .get_content()
                    .path(path)
                    .send()
                    .await
                    .map_err(provider_error)
            })
            .await?;

        let entries = content
            .items
            .into_iter()
            .filter_map(|item| {
                let kind = match item.r#type.as_str() {
                    "file" => EntryKind::File,
                    "dir" => EntryKind::Dir,
                    // symlinks and submodules are not followed
                    _ => return None,
                };
                Some(TreeEntry {
                    name: item.name,
                    path: item.path,
                    kind,
                    download_url: item.download_url,
                })
            })
            .collect();
        Ok(entries)
    }

    async fn fetch(&self, entry: &TreeEntry) -> Result<Vec<u8>, ProviderError> {
        // Raw download first, the base64 contents API only without a URL
        match &entry.download_url {
            Some(url) => self.with_retry(&entry.path, || self.download(url)).await,
            None => {
                self.with_retry(&entry.path, || self.fetch_encoded(&entry.path))
                    .await
            }
        }
    }

    fn describe(&self) -> String {
        self.repo.to_string()
    }
}
