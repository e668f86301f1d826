use rmcp::model::{CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo};
use serde::Deserialize;
use serde_json::json;

use rmcp::{Error as McpError, ServerHandler, schemars, tool};

use crate::config::Credentials;
use crate::engine::Analyzer;
use crate::error::AnalysisError;

/// MCP front end over the analysis engine
#[derive(Clone)]
pub struct LensServer {
    analyzer: Analyzer,
    credentials: Credentials,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AnalyzeRepoRequest {
    #[schemars(description = "URL of the GitHub repository, e.g. https://github.com/owner/repo")]
    pub url: String,

    #[schemars(description = "output format: 'json' (default) or 'text'", default)]
    pub format: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AnalyzeSourceRequest {
    #[schemars(description = "file name; its extension selects the language")]
    pub filename: String,

    #[schemars(description = "the source text to analyze")]
    pub source: String,
}

#[tool(tool_box)]
impl LensServer {
    pub fn new(analyzer: Analyzer, credentials: Credentials) -> Self {
        Self {
            analyzer,
            credentials,
        }
    }

    #[tool(
        description = "Analyze an MCP server GitHub repository: list its tools with descriptions and parameters, its prompts and resources, and the server/tool hierarchy when one can be recovered"
    )]
    async fn analyze_github_repo(
        &self,
        #[tool(aggr)] AnalyzeRepoRequest { url, format }: AnalyzeRepoRequest,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!("Starting analysis for URL: {}", url);
        let report = match self.analyzer.analyze_url(&url, self.credentials.clone()).await {
            Ok(report) => report,
            Err(e @ AnalysisError::InvalidUrl(_)) => {
                return Err(McpError::invalid_params(e.to_string(), Some(json!({ "url": url }))));
            }
            Err(e) => {
                tracing::error!("Analysis of {} failed: {}", url, e);
                return Ok(CallToolResult::success(vec![Content::text(
                    json!({ "error": e.to_string() }).to_string(),
                )]));
            }
        };

        let body = match format.as_deref() {
            Some("text") => report.render_text(),
            _ => report
                .to_json()
                .map_err(|e| McpError::internal_error(e.to_string(), None))?,
        };
        Ok(CallToolResult::success(vec![Content::text(body)]))
    }

    #[tool(description = "Find MCP tool declarations, prompts and resources in a single source file")]
    async fn analyze_source(
        &self,
        #[tool(aggr)] AnalyzeSourceRequest { filename, source }: AnalyzeSourceRequest,
    ) -> Result<CallToolResult, McpError> {
        let analysis = self.analyzer.analyze_file(&filename, &source);
        let response = serde_json::to_string(&analysis)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(response)]))
    }
}

#[tool(tool_box)]
impl ServerHandler for LensServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some("This server statically analyzes MCP server source code. Use 'analyze_github_repo' with a repository URL to list its tools, prompts, resources and server structure, or 'analyze_source' to inspect a single file.".to_string()),
        }
    }
}
