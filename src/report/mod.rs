//! Aggregation of per-file results into one report, and its renderings.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::analysis::{Declaration, FileAnalysis, ParamDoc, PromptRef, ResourceRef, ServerDescriptor};

/// Everything found in one traversal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// What was walked, e.g. `owner/repo`
    pub source: String,
    pub files: Vec<FileAnalysis>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<ServerDescriptor>,
}

/// Flat tool index entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSummary {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParamDoc>,
    pub params: Vec<String>,
    pub file: String,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedSummary {
    pub name: String,
    pub description: String,
    pub file: String,
}

/// Per-file metrics, listed for every analysed file including empty ones
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    pub path: String,
    #[serde(rename = "type")]
    pub file_type: String,
    pub lines: usize,
    pub non_empty_lines: usize,
    pub size_bytes: usize,
}

/// Structured projection of a [`Report`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub source: String,
    pub files_analyzed: usize,
    pub files: Vec<FileSummary>,
    pub tools: Vec<ToolSummary>,
    pub prompts: Vec<NamedSummary>,
    pub resources: Vec<NamedSummary>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<ServerDescriptor>,
}

/// Combine per-file analyses, in visitation order, into a report.
pub fn assemble(source: impl Into<String>, files: Vec<FileAnalysis>) -> Report {
    let servers = files
        .iter()
        .flat_map(|f| f.mcp_analysis.servers.iter().cloned())
        .collect();
    Report {
        source: source.into(),
        files,
        servers,
    }
}

impl Report {
    pub fn tools(&self) -> impl Iterator<Item = &Declaration> {
        self.files.iter().flat_map(|f| f.mcp_analysis.tools.iter())
    }

    pub fn prompts(&self) -> impl Iterator<Item = &PromptRef> {
        self.files.iter().flat_map(|f| f.mcp_analysis.prompts.iter())
    }

    pub fn resources(&self) -> impl Iterator<Item = &ResourceRef> {
        self.files.iter().flat_map(|f| f.mcp_analysis.resources.iter())
    }

    pub fn summary(&self) -> Summary {
        let mut summary = Summary {
            source: self.source.clone(),
            files_analyzed: self.files.len(),
            files: Vec::with_capacity(self.files.len()),
            tools: Vec::new(),
            prompts: Vec::new(),
            resources: Vec::new(),
            servers: self.servers.clone(),
        };

        for file in &self.files {
            summary.files.push(FileSummary {
                path: file.path.clone(),
                file_type: file.file_type.clone(),
                lines: file.lines,
                non_empty_lines: file.non_empty_lines,
                size_bytes: file.size_bytes,
            });
            let analysis = &file.mcp_analysis;
            summary.tools.extend(analysis.tools.iter().map(|t| ToolSummary {
                name: t.name.clone(),
                description: t.description.clone(),
                parameters: t.parameters.clone(),
                params: t.params.clone(),
                file: file.path.clone(),
                line: t.line,
            }));
            summary.prompts.extend(analysis.prompts.iter().map(|p| NamedSummary {
                name: p.name.clone(),
                description: String::new(),
                file: file.path.clone(),
            }));
            summary.resources.extend(analysis.resources.iter().map(|r| NamedSummary {
                name: r.name.clone(),
                description: String::new(),
                file: file.path.clone(),
            }));
        }
        summary
    }

    /// Pretty-printed JSON of [`Report::summary`]
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.summary())
    }

    /// Indented, human-readable rendering
    pub fn render_text(&self) -> String {
        self.to_string()
    }
}

fn write_tool(f: &mut fmt::Formatter<'_>, tool: &Declaration, indent: &str) -> fmt::Result {
    writeln!(f, "{indent}- {}({}) [line {}]", tool.name, tool.params.join(", "), tool.line)?;
    if !tool.description.is_empty() {
        writeln!(f, "{indent}    Description:")?;
        for line in tool.description.lines() {
            writeln!(f, "{indent}      {line}")?;
        }
    }
    if !tool.parameters.is_empty() {
        writeln!(f, "{indent}    Parameters:")?;
        for p in &tool.parameters {
            writeln!(f, "{indent}      {}: {}", p.name, p.description)?;
        }
    }
    Ok(())
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Repository: {}", self.source)?;
        writeln!(
            f,
            "Files analyzed: {} | Tools: {} | Prompts: {} | Resources: {}",
            self.files.len(),
            self.tools().count(),
            self.prompts().count(),
            self.resources().count()
        )?;

        for file in &self.files {
            writeln!(f)?;
            writeln!(
                f,
                "{} ({}, {} lines, {} non-empty, {} bytes)",
                file.path, file.file_type, file.lines, file.non_empty_lines, file.size_bytes
            )?;
            let analysis = &file.mcp_analysis;
            if analysis.is_empty() {
                writeln!(f, "  (nothing found)")?;
                continue;
            }
            if !analysis.tools.is_empty() {
                writeln!(f, "  Tools:")?;
                for tool in &analysis.tools {
                    write_tool(f, tool, "    ")?;
                }
            }
            if !analysis.prompts.is_empty() {
                writeln!(f, "  Prompts:")?;
                for p in &analysis.prompts {
                    writeln!(f, "    - {}", p.name)?;
                }
            }
            if !analysis.resources.is_empty() {
                writeln!(f, "  Resources:")?;
                for r in &analysis.resources {
                    writeln!(f, "    - {}", r.name)?;
                }
            }
        }

        if !self.servers.is_empty() {
            writeln!(f)?;
            writeln!(f, "Server Architecture")?;
            for server in &self.servers {
                writeln!(f, "  Server: {}", server.name)?;
                if !server.tools.is_empty() {
                    writeln!(f, "    Tools:")?;
                    for tool in &server.tools {
                        write_tool(f, tool, "      ")?;
                    }
                }
                if !server.prompts.is_empty() {
                    writeln!(f, "    Prompts:")?;
                    for p in &server.prompts {
                        writeln!(f, "      - {}", p.name)?;
                    }
                }
                if !server.resources.is_empty() {
                    writeln!(f, "    Resources:")?;
                    for r in &server.resources {
                        writeln!(f, "      - {}", r.name)?;
                    }
                }
            }
        }
        Ok(())
    }
}
