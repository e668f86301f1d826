use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use mcp_lens_rs::Analyzer;
use mcp_lens_rs::config::{AnalyzerConfig, Credentials, DuplicatePolicy};
use mcp_lens_rs::provider::LocalProvider;
use mcp_lens_rs::report::Report;
use mcp_lens_rs::server::LensServer;
use rmcp::{ServiceExt, transport::stdio};

#[cfg(feature = "trace")]
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
struct Cli {
    /// GitHub token used for API requests; anonymous when unset
    #[clap(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_pat: Option<String>,
    /// TOML file with analyzer settings (optional)
    #[clap(long)]
    config: Option<PathBuf>,
    /// Maximum directory depth to descend into
    #[clap(long)]
    max_depth: Option<usize>,
    /// Maximum number of concurrent file downloads
    #[clap(long)]
    concurrency: Option<usize>,
    /// Per-request timeout in seconds
    #[clap(long)]
    timeout: Option<u64>,
    /// Keep both the generic and the structured declaration for Go tools
    #[clap(long)]
    keep_duplicates: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the analysis tools over stdio (default)
    Serve,
    /// Analyze a GitHub repository and print the report
    Analyze {
        /// Repository URL, e.g. https://github.com/owner/repo
        url: String,
        #[clap(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Analyze a local directory and print the report
    Local {
        path: PathBuf,
        #[clap(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

impl Cli {
    fn analyzer_config(&self) -> Result<AnalyzerConfig> {
        let mut config = match &self.config {
            Some(path) => AnalyzerConfig::load(path)?,
            None => AnalyzerConfig::default(),
        };
        if let Some(depth) = self.max_depth {
            config.max_depth = depth;
        }
        if let Some(concurrency) = self.concurrency {
            config.max_concurrent_requests = concurrency;
        }
        if let Some(timeout) = self.timeout {
            config.request_timeout_secs = timeout;
        }
        if self.keep_duplicates {
            config.duplicate_policy = DuplicatePolicy::KeepAll;
        }
        Ok(config)
    }

    fn credentials(&self) -> Credentials {
        self.github_pat
            .as_deref()
            .map(Credentials::token)
            .unwrap_or_default()
    }
}

fn print_report(report: &Report, format: Format) -> Result<()> {
    match format {
        Format::Text => print!("{}", report.render_text()),
        Format::Json => println!("{}", report.to_json()?),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    // stdout carries the protocol while serving, so logs go to a file
    #[cfg(feature = "trace")]
    {
        let serving = matches!(args.command, None | Some(Command::Serve));
        let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
        if serving {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::fs::File::create("server.log")?)
                .with_ansi(false)
                .init();
        } else {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    // Flags override values from the config file
    let analyzer = Analyzer::new(args.analyzer_config()?);
    let credentials = args.credentials();

    match args.command {
        // Without a subcommand the binary is an MCP server on stdio
        None | Some(Command::Serve) => {
            tracing::info!("Starting MCP server");
            let service = LensServer::new(analyzer, credentials)
                .serve(stdio())
                .await
                .inspect_err(|e| {
                    tracing::error!("serving error: {:?}", e);
                })?;
            service.waiting().await?;
        }
        Some(Command::Analyze { url, format }) => {
            let report = analyzer.analyze_url(&url, credentials).await?;
            print_report(&report, format)?;
        }
        // Same pipeline, files read from disk
        Some(Command::Local { path, format }) => {
            let report = analyzer.analyze(Arc::new(LocalProvider::new(&path))).await?;
            print_report(&report, format)?;
        }
    }
    Ok(())
}
