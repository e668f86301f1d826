#![allow(dead_code)]

use async_trait::async_trait;
use mcp_lens_rs::ProviderError;
use mcp_lens_rs::provider::{FileTreeProvider, TreeEntry};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Longer than any timeout the tests configure
pub const STALL: Duration = Duration::from_secs(5);

/// In-memory provider. Listings keep insertion order.
#[derive(Default)]
pub struct StubProvider {
    listings: HashMap<String, Vec<TreeEntry>>,
    files: HashMap<String, Vec<u8>>,
    failing: HashSet<String>,
    stalled: HashSet<String>,
    pub list_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
}

impl StubProvider {
    pub fn new() -> Self {
        let mut stub = Self::default();
        stub.listings.insert(String::new(), Vec::new());
        stub
    }

    pub fn file(mut self, path: &str, content: impl Into<Vec<u8>>) -> Self {
        self.register(TreeEntry::file(path));
        self.files.insert(path.to_string(), content.into());
        self
    }

    pub fn dir(mut self, path: &str) -> Self {
        self.register(TreeEntry::dir(path));
        self
    }

    /// Add a directory entry under `parent` that points at `target`
    pub fn link(mut self, parent: &str, target: &str) -> Self {
        self.listings
            .entry(parent.to_string())
            .or_default()
            .push(TreeEntry::dir(target));
        self
    }

    /// Listing or fetching `path` fails with a 500
    pub fn failing(mut self, path: &str) -> Self {
        self.failing.insert(path.to_string());
        self
    }

    /// Listing or fetching `path` hangs for [`STALL`] before answering
    pub fn stalled(mut self, path: &str) -> Self {
        self.stalled.insert(path.to_string());
        self
    }

    async fn maybe_stall(&self, path: &str) {
        if self.stalled.contains(path) {
            tokio::time::sleep(STALL).await;
        }
    }

    fn register(&mut self, entry: TreeEntry) {
        let parent = entry
            .path
            .rsplit_once('/')
            .map(|(p, _)| p.to_string())
            .unwrap_or_default();
        if !parent.is_empty() && !self.listings.contains_key(&parent) {
            self.register(TreeEntry::dir(parent.clone()));
        }
        if entry.is_dir() {
            self.listings.entry(entry.path.clone()).or_default();
        }
        let listing = self.listings.entry(parent).or_default();
        if !listing.iter().any(|e| e.path == entry.path) {
            listing.push(entry);
        }
    }
}

#[async_trait]
impl FileTreeProvider for StubProvider {
    async fn list(&self, path: &str) -> Result<Vec<TreeEntry>, ProviderError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.maybe_stall(path).await;
        if self.failing.contains(path) {
            return Err(ProviderError::Status(500));
        }
        self.listings
            .get(path)
            .cloned()
            .ok_or(ProviderError::Status(404))
    }

    async fn fetch(&self, entry: &TreeEntry) -> Result<Vec<u8>, ProviderError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.maybe_stall(&entry.path).await;
        if self.failing.contains(&entry.path) {
            return Err(ProviderError::Status(500));
        }
        self.files
            .get(&entry.path)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(entry.path.clone()))
    }

    fn describe(&self) -> String {
        "stub/repo".to_string()
    }
}

pub const PY_TOOL: &str = r#"from mcp.server.fastmcp import FastMCP

mcp = FastMCP("demo")

# Handle a request.
@mcp.tool()
def handle(x, y):
    return x + y
"#;

pub const GO_TOOL: &str = r#"package main

import "github.com/mark3labs/mcp-go/mcp"

// searchTool builds the search tool.
func searchTool() mcp.Tool {
	return mcp.NewTool("search",
		mcp.WithDescription("Search the index"),
		mcp.WithString("query", mcp.Required(), mcp.Description("search text")),
	)
}

func helper(x int) int {
	return x + 1
}
"#;
