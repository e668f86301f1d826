//! # MCP Lens
//!
//! Static, heuristic discovery of Model Context Protocol (MCP) tools, prompts and
//! resources in a source tree of mixed languages, exposed both as a library and as
//! an MCP server.
//!
//! ## Capabilities
//!
//! - Walk a GitHub repository (or a local directory) and skip tests, config and
//!   build artifacts
//! - Recognise tool declarations in Python, Go, JavaScript/TypeScript, Java, C#,
//!   Ruby, PHP, C and C++ without a compiler front end
//! - Recover parameter docs and the server/tool hierarchy from mcp-go sources
//! - Render a report as JSON or as an indented text summary
//!
//! ## Layout
//!
//! - `analysis`: per-file extraction, classification and filtering
//! - `walker`: recursive traversal of a file tree provider
//! - `report`: summary assembly and rendering
//! - `github`: GitHub file tree provider
//! - `server`: the `analyze_repository` and `analyze_file` MCP tools

/// Per-file extraction, classification and filtering
pub mod analysis;
/// Analyzer configuration and credentials
pub mod config;
/// Entry points composing traversal and assembly
pub mod engine;
/// Error types
pub mod error;
/// Repository URLs and the GitHub contents provider
pub mod github;
/// File tree provider abstraction
pub mod provider;
/// Summary assembly and rendering
pub mod report;
/// MCP tools over stdio
pub mod server;
/// Recursive traversal
pub mod walker;

pub use engine::Analyzer;
pub use error::{AnalysisError, ProviderError};
pub use report::Report;
