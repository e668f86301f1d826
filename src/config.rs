use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, SystemTime};

use crate::error::AnalysisError;

/// What to do when a Go function matches both the generic call-site rule and the
/// structured `mcp.NewTool(...)` rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Emit both declarations
    KeepAll,
    /// Emit only the structured declarations when any were parsed
    #[default]
    PreferStructured,
}

/// Tunables for a traversal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Directories deeper than this are not entered
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Upper bound on in-flight file fetches
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,

    /// Applies to every individual provider call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Larger files keep their metrics but are not extracted
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: usize,

    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
}

fn default_max_depth() -> usize {
    32
}

fn default_max_concurrent_requests() -> usize {
    5
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_file_bytes() -> usize {
    1024 * 1024
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_concurrent_requests: default_max_concurrent_requests(),
            request_timeout_secs: default_request_timeout_secs(),
            max_file_bytes: default_max_file_bytes(),
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Load a TOML config file. Missing keys fall back to defaults.
    pub fn load(path: &Path) -> Result<Self, AnalysisError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AnalysisError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, AnalysisError> {
        toml::from_str(raw).map_err(|e| AnalysisError::Config(e.to_string()))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// A GitHub token owned by the caller of the engine.
///
/// The engine never stores credentials globally; whoever builds a provider hands
/// one of these in and is responsible for replacing it once it expires.
#[derive(Clone, Default)]
pub struct Credentials {
    token: Option<String>,
    expires_at: Option<SystemTime>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl Credentials {
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Blank tokens are treated as anonymous access.
    pub fn token(token: impl Into<String>) -> Self {
        let token = token.into();
        if token.trim().is_empty() {
            return Self::anonymous();
        }
        Self {
            token: Some(token),
            expires_at: None,
        }
    }

    pub fn with_expiry(mut self, expires_at: SystemTime) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at
            .map(|at| SystemTime::now() >= at)
            .unwrap_or(false)
    }

    /// The token to send, if one is present and still valid.
    pub fn bearer(&self) -> Option<&str> {
        if self.is_expired() {
            tracing::warn!("GitHub credentials expired, falling back to anonymous access");
            return None;
        }
        self.token.as_deref()
    }
}
