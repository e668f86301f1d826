//! Recursive, failure-tolerant traversal of a [`FileTreeProvider`].

use std::collections::HashSet;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::analysis::filter::{self, FilterDecision};
use crate::analysis::languages::ExtractorRegistry;
use crate::analysis::{FileAnalysis, analyze_source, extension_of};
use crate::config::AnalyzerConfig;
use crate::error::ProviderError;
use crate::provider::{FileTreeProvider, TreeEntry};

type WalkFuture<'a> = Pin<Box<dyn Future<Output = Vec<FileAnalysis>> + Send + 'a>>;

/// Walks a provider depth-first in listing order, analysing every eligible file.
///
/// Sibling files of one directory are fetched concurrently, bounded by
/// `max_concurrent_requests`, but results are merged back in listing order so the
/// output only depends on what the provider returned.
pub struct TreeWalker {
    provider: Arc<dyn FileTreeProvider>,
    registry: Arc<ExtractorRegistry>,
    config: AnalyzerConfig,
    permits: Arc<Semaphore>,
}

enum Pending {
    File(JoinHandle<Option<FileAnalysis>>),
    Dir(TreeEntry),
}

impl TreeWalker {
    pub fn new(
        provider: Arc<dyn FileTreeProvider>,
        registry: Arc<ExtractorRegistry>,
        config: AnalyzerConfig,
    ) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent_requests.max(1)));
        Self {
            provider,
            registry,
            config,
            permits,
        }
    }

    /// Analyse everything below `path` (`""` for the root).
    pub async fn walk(&self, path: &str) -> Vec<FileAnalysis> {
        let mut visited = HashSet::new();
        let results = self.walk_dir(path.to_string(), 0, &mut visited).await;
        tracing::info!(
            source = %self.provider.describe(),
            files = results.len(),
            "Traversal complete"
        );
        results
    }

    fn walk_dir<'a>(
        &'a self,
        path: String,
        depth: usize,
        visited: &'a mut HashSet<String>,
    ) -> WalkFuture<'a> {
        Box::pin(async move {
            if depth > self.config.max_depth {
                tracing::warn!(path = %path, depth, "Maximum depth reached, not descending");
                return Vec::new();
            }
            if !visited.insert(path.trim_matches('/').to_string()) {
                tracing::warn!(path = %path, "Directory already visited, skipping");
                return Vec::new();
            }

            let entries = match self.call(self.provider.list(&path)).await {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "Failed to list directory");
                    return Vec::new();
                }
            };
            tracing::debug!(path = %path, items = entries.len(), "Listed directory");

            // Files start downloading here, directories are walked in order below
            let pending: Vec<Pending> = entries
                .into_iter()
                .filter_map(|entry| self.schedule(entry))
                .collect();

            let mut results = Vec::new();
            for item in pending {
                match item {
                    Pending::File(handle) => match handle.await {
                        Ok(Some(analysis)) => results.push(analysis),
                        Ok(None) => {}
                        Err(e) => tracing::error!(error = %e, "File analysis task failed"),
                    },
                    Pending::Dir(entry) => {
                        tracing::debug!(path = %entry.path, "Entering directory");
                        let nested = self.walk_dir(entry.path, depth + 1, &mut *visited).await;
                        results.extend(nested);
                    }
                }
            }
            results
        })
    }

    /// Apply the filter and start fetching eligible files right away.
    fn schedule(&self, entry: TreeEntry) -> Option<Pending> {
        if entry.is_dir() {
            if filter::should_prune_dir(&entry.path) {
                tracing::debug!(path = %entry.path, "Skipping ignored directory");
                return None;
            }
            return Some(Pending::Dir(entry));
        }

        let extension = extension_of(&entry.name);
        match filter::decide(&entry.name, &entry.path, &extension) {
            FilterDecision::Analyze => {}
            decision => {
                tracing::debug!(path = %entry.path, ?decision, "Skipping file");
                return None;
            }
        }

        let provider = self.provider.clone();
        let registry = self.registry.clone();
        let permits = self.permits.clone();
        let request_timeout = self.config.request_timeout();
        let max_file_bytes = self.config.max_file_bytes;

        Some(Pending::File(tokio::spawn(async move {
            // Shared across the whole walk, not per directory
            let _permit = permits.acquire_owned().await.ok()?;
            let bytes = match timeout(request_timeout, provider.fetch(&entry)).await {
                Ok(Ok(bytes)) => bytes,
                Ok(Err(e)) => {
                    tracing::warn!(path = %entry.path, error = %e, "Failed to download file");
                    return None;
                }
                Err(_) => {
                    tracing::warn!(path = %entry.path, "Timed out downloading file");
                    return None;
                }
            };
            Some(analyze_bytes(&registry, &entry.path, &extension, &bytes, max_file_bytes))
        })))
    }

    async fn call<T>(
        &self,
        fut: impl Future<Output = Result<T, ProviderError>>,
    ) -> Result<T, ProviderError> {
        timeout(self.config.request_timeout(), fut)
            .await
            .map_err(|_| ProviderError::Timeout(self.config.request_timeout_secs))?
    }
}

/// Analyse fetched content. Undecodable or oversized files, and files an
/// extractor panics on, keep their metrics but yield no findings.
pub fn analyze_bytes(
    registry: &ExtractorRegistry,
    path: &str,
    extension: &str,
    bytes: &[u8],
    max_file_bytes: usize,
) -> FileAnalysis {
    match std::str::from_utf8(bytes) {
        Ok(text) if bytes.len() <= max_file_bytes => {
            tracing::debug!(path, "Running code analysis");
            let extracted = panic::catch_unwind(AssertUnwindSafe(|| {
                analyze_source(registry, path, extension, text)
            }));
            extracted.unwrap_or_else(|_| {
                tracing::error!(path, "Extractor panicked, keeping metrics only");
                FileAnalysis::metrics_only(path, extension, text, bytes.len())
            })
        }
        Ok(text) => {
            tracing::debug!(path, size = bytes.len(), "File too large, skipping extraction");
            FileAnalysis::metrics_only(path, extension, text, bytes.len())
        }
        Err(_) => {
            tracing::warn!(path, "File is not valid UTF-8, skipping extraction");
            let text = String::from_utf8_lossy(bytes);
            FileAnalysis::metrics_only(path, extension, &text, bytes.len())
        }
    }
}
