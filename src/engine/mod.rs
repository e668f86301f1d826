use std::sync::Arc;

use crate::analysis::languages::ExtractorRegistry;
use crate::analysis::{FileAnalysis, extension_of};
use crate::config::{AnalyzerConfig, Credentials};
use crate::error::{AnalysisError, Result};
use crate::github::{GitHubProvider, RepoRef};
use crate::provider::FileTreeProvider;
use crate::report::{Report, assemble};
use crate::walker::{TreeWalker, analyze_bytes};

/// Entry point composing traversal and summary assembly
#[derive(Clone)]
pub struct Analyzer {
    config: AnalyzerConfig,
    registry: Arc<ExtractorRegistry>,
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        let registry = Arc::new(ExtractorRegistry::with_defaults(config.duplicate_policy));
        Self { config, registry }
    }

    /// Analyzer backed by a caller-built registry instead of the built-in languages.
    pub fn with_registry(config: AnalyzerConfig, registry: ExtractorRegistry) -> Self {
        Self {
            config,
            registry: Arc::new(registry),
        }
    }

    /// Walk `provider` from its root and assemble a report.
    ///
    /// An empty traversal is reported as [`AnalysisError::NoFilesFound`] so callers
    /// can tell "nothing to show" apart from a successful report.
    pub async fn analyze(&self, provider: Arc<dyn FileTreeProvider>) -> Result<Report> {
        let source = provider.describe();
        tracing::info!(source = %source, "Starting file analysis");

        // Provider failures are absorbed by the walker
        let walker = TreeWalker::new(provider, self.registry.clone(), self.config.clone());
        let files = walker.walk("").await;
        if files.is_empty() {
            tracing::warn!(source = %source, "No files found or failed to fetch contents");
            return Err(AnalysisError::no_files(source));
        }

        let report = assemble(source, files);
        tracing::info!(
            files = report.files.len(),
            tools = report.tools().count(),
            servers = report.servers.len(),
            "Summary generation complete"
        );
        Ok(report)
    }

    /// Analyse a GitHub repository from its root.
    pub async fn analyze_repository(
        &self,
        owner: &str,
        repo: &str,
        credentials: Credentials,
    ) -> Result<Report> {
        let provider = GitHubProvider::new(RepoRef::new(owner, repo), credentials).await?;
        self.analyze(Arc::new(provider)).await
    }

    /// Validate `url` before any network traffic, then analyse the repository.
    pub async fn analyze_url(&self, url: &str, credentials: Credentials) -> Result<Report> {
        let repo = RepoRef::parse_url(url)?;
        tracing::info!(owner = %repo.owner, repo = %repo.repo, "Extracted repository");
        self.analyze_repository(&repo.owner, &repo.repo, credentials)
            .await
    }

    /// Analyse a single in-memory file; the extension is taken from `filename`.
    pub fn analyze_file(&self, filename: &str, source: &str) -> FileAnalysis {
        let extension = extension_of(filename);
        analyze_bytes(
            &self.registry,
            filename,
            &extension,
            source.as_bytes(),
            self.config.max_file_bytes,
        )
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(AnalyzerConfig::default())
    }
}
