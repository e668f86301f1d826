use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::ProviderError;

/// Kind of a listing entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
}

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub name: String,
    /// Repository-relative, `/`-separated
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub download_url: Option<String>,
}

impl TreeEntry {
    pub fn file(path: impl Into<String>) -> Self {
        Self::new(path.into(), EntryKind::File)
    }

    pub fn dir(path: impl Into<String>) -> Self {
        Self::new(path.into(), EntryKind::Dir)
    }

    fn new(path: String, kind: EntryKind) -> Self {
        let name = path.rsplit('/').next().unwrap_or(&path).to_string();
        Self {
            name,
            path,
            kind,
            download_url: None,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }
}

/// Repository directory structure and file contents.
///
/// Implementations report failures as errors; the walker turns them into empty
/// subtrees or skipped files.
#[async_trait]
pub trait FileTreeProvider: Send + Sync {
    /// Entries directly under `path`; `""` is the repository root.
    async fn list(&self, path: &str) -> Result<Vec<TreeEntry>, ProviderError>;

    /// Raw bytes of a file entry
    async fn fetch(&self, entry: &TreeEntry) -> Result<Vec<u8>, ProviderError>;

    /// Human readable name of what is being walked, for logs and reports
    fn describe(&self) -> String;
}

/// Provider over a directory on the local disk
#[derive(Debug, Clone)]
pub struct LocalProvider {
    root: PathBuf,
}

impl LocalProvider {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        path.split('/')
            .filter(|part| !part.is_empty() && *part != "..")
            .fold(self.root.clone(), |acc, part| acc.join(part))
    }
}

#[async_trait]
impl FileTreeProvider for LocalProvider {
    async fn list(&self, path: &str) -> Result<Vec<TreeEntry>, ProviderError> {
        let dir = self.resolve(path);
        if !dir.is_dir() {
            return Err(ProviderError::NotFound(dir.display().to_string()));
        }

        let mut entries = Vec::new();
        for entry in WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| ProviderError::Transport(e.to_string()))?;
            let name = entry.file_name().to_string_lossy().to_string();
            let rel = if path.trim_matches('/').is_empty() {
                name.clone()
            } else {
                format!("{}/{}", path.trim_matches('/'), name)
            };
            let file_type = entry.file_type();
            if file_type.is_dir() {
                entries.push(TreeEntry::dir(rel));
            } else if file_type.is_file() {
                entries.push(TreeEntry::file(rel));
            }
        }
        Ok(entries)
    }

    async fn fetch(&self, entry: &TreeEntry) -> Result<Vec<u8>, ProviderError> {
        Ok(tokio::fs::read(self.resolve(&entry.path)).await?)
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}
