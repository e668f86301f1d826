//! Heuristic, line-oriented discovery of MCP tools, prompts and resources.
//!
//! Nothing in here builds an AST. Every rule is a regular expression applied to
//! individual lines or to the text between two function signatures.

pub mod classifier;
pub mod comments;
pub mod filter;
pub mod languages;
pub mod mcp_go;

use serde::{Deserialize, Serialize};

use classifier::{Classification, classify_assignment};
use languages::ExtractorRegistry;

/// How a declaration was recognised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationSource {
    /// A function signature selected by a decorator, marker call, or no marker at all
    Signature,
    /// Arguments of a marker call such as `mcp.NewTool("name", ...)`
    MarkerCall,
}

/// Name and description recovered from a typed-parameter builder call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDoc {
    pub name: String,
    pub description: String,
}

/// One discovered tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    pub name: String,
    /// Raw parameter tokens, not normalised across languages
    pub params: Vec<String>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParamDoc>,
    /// 1-based line of the signature or marker call
    pub line: usize,
    pub source: DeclarationSource,
}

impl Declaration {
    pub fn from_signature(name: &str, raw_params: &str, description: String, line: usize) -> Self {
        Self {
            name: name.to_string(),
            params: split_params(raw_params),
            description,
            parameters: Vec::new(),
            line,
            source: DeclarationSource::Signature,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptRef {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    pub name: String,
}

/// Tools, prompts and resources grouped under one hosting server
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerDescriptor {
    pub name: String,
    pub tools: Vec<Declaration>,
    pub prompts: Vec<PromptRef>,
    pub resources: Vec<ResourceRef>,
}

/// Extractor + classifier output for one file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpAnalysis {
    pub tools: Vec<Declaration>,
    pub prompts: Vec<PromptRef>,
    pub resources: Vec<ResourceRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<ServerDescriptor>,
}

impl McpAnalysis {
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty() && self.prompts.is_empty() && self.resources.is_empty()
    }
}

/// Size metrics and findings for a single source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAnalysis {
    pub path: String,
    #[serde(rename = "type")]
    pub file_type: String,
    pub lines: usize,
    pub non_empty_lines: usize,
    pub size_bytes: usize,
    pub mcp_analysis: McpAnalysis,
}

impl FileAnalysis {
    /// Metrics only, no findings. Used for undecodable or oversized files.
    pub fn metrics_only(path: &str, extension: &str, text: &str, size_bytes: usize) -> Self {
        Self {
            path: path.to_string(),
            file_type: type_tag(extension),
            lines: text.lines().count(),
            non_empty_lines: text.lines().filter(|l| !l.trim().is_empty()).count(),
            size_bytes,
            mcp_analysis: McpAnalysis::default(),
        }
    }
}

fn type_tag(extension: &str) -> String {
    if extension.is_empty() {
        "unknown".to_string()
    } else {
        extension.to_string()
    }
}

/// Run the extractor for `extension` and the prompt/resource classifier over `source`.
pub fn analyze_source(
    registry: &ExtractorRegistry,
    path: &str,
    extension: &str,
    source: &str,
) -> FileAnalysis {
    let mut analysis = FileAnalysis::metrics_only(path, extension, source, source.len());

    if let Some(extractor) = registry.get(extension) {
        tracing::debug!(path, language = extractor.language(), "Running extractor");
        analysis.mcp_analysis.tools = extractor.extract(source);
        analysis.mcp_analysis.servers = extractor.servers(source);
    }

    for line in source.lines() {
        match classify_assignment(line) {
            Some(Classification::Prompt(name)) => {
                analysis.mcp_analysis.prompts.push(PromptRef { name })
            }
            Some(Classification::Resource(name)) => {
                analysis.mcp_analysis.resources.push(ResourceRef { name })
            }
            None => {}
        }
    }

    tracing::debug!(
        path,
        tools = analysis.mcp_analysis.tools.len(),
        prompts = analysis.mcp_analysis.prompts.len(),
        resources = analysis.mcp_analysis.resources.len(),
        "Analyzed file"
    );
    analysis
}

/// Split a raw parameter list on top-level commas, trimming and dropping empty
/// tokens. Commas nested in `()`, `[]`, `{}` or `<>` stay inside their token.
pub fn split_params(raw: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();

    for ch in raw.chars() {
        match ch {
            '(' | '[' | '{' | '<' => depth += 1,
            ')' | ']' | '}' | '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                tokens.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(ch);
    }
    tokens.push(current);

    tokens
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Extension of a file name without the dot, lower-cased. Empty when there is none.
pub fn extension_of(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((_, ext)) => ext.to_lowercase(),
        None => String::new(),
    }
}
