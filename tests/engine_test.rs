mod support;

use std::sync::Arc;

use mcp_lens_rs::config::{AnalyzerConfig, Credentials, DuplicatePolicy};
use mcp_lens_rs::{AnalysisError, Analyzer};
use pretty_assertions::assert_eq;
use support::{GO_TOOL, PY_TOOL, StubProvider};

#[tokio::test]
async fn test_mixed_repository_end_to_end() {
    let provider = StubProvider::new().file("a.py", PY_TOOL).file("b.go", GO_TOOL);

    let report = Analyzer::default().analyze(Arc::new(provider)).await.unwrap();

    assert_eq!(report.source, "stub/repo");
    assert_eq!(report.files.len(), 2);
    let names: Vec<_> = report.tools().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["handle", "search"]);
    assert_eq!(report.prompts().count(), 0);
    assert_eq!(report.resources().count(), 0);

    let summary = report.summary();
    assert_eq!(summary.files_analyzed, 2);
    assert_eq!(summary.tools[0].file, "a.py");
    assert_eq!(summary.tools[0].params, vec!["x", "y"]);
    assert_eq!(summary.tools[1].file, "b.go");
    assert_eq!(summary.tools[1].parameters[0].description, "search text");
}

#[tokio::test]
async fn test_keep_all_policy_reports_generic_declaration_too() {
    let provider = StubProvider::new().file("b.go", GO_TOOL);
    let analyzer = Analyzer::new(AnalyzerConfig {
        duplicate_policy: DuplicatePolicy::KeepAll,
        ..AnalyzerConfig::default()
    });

    let report = analyzer.analyze(Arc::new(provider)).await.unwrap();
    let names: Vec<_> = report.tools().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["searchTool", "search"]);
}

#[tokio::test]
async fn test_repeated_runs_are_identical() {
    let provider: Arc<StubProvider> = Arc::new(
        StubProvider::new()
            .file("cmd/server.go", GO_TOOL)
            .file("app/main.py", PY_TOOL)
            .file("app/prompts.py", "system_prompt = 'be nice'\nRESOURCES = []\n"),
    );
    let analyzer = Analyzer::default();

    let first = analyzer.analyze(provider.clone()).await.unwrap();
    let second = analyzer.analyze(provider).await.unwrap();

    assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
    assert_eq!(first.render_text(), second.render_text());
}

#[tokio::test]
async fn test_nothing_eligible_is_an_error() {
    let provider = StubProvider::new()
        .file("README.md", "# nothing here")
        .file("foo_test.go", GO_TOOL);

    let err = Analyzer::default().analyze(Arc::new(provider)).await.unwrap_err();
    assert!(matches!(err, AnalysisError::NoFilesFound { ref repository } if repository == "stub/repo"));
}

#[tokio::test]
async fn test_invalid_url_is_rejected_before_any_request() {
    let err = Analyzer::default()
        .analyze_url("https://gitlab.com/owner/repo", Credentials::anonymous())
        .await
        .unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidUrl(_)));
}

#[test]
fn test_analyze_file_uses_filename_extension() {
    let analysis = Analyzer::default().analyze_file("Server.PY", PY_TOOL);
    assert_eq!(analysis.file_type, "py");
    assert_eq!(analysis.mcp_analysis.tools[0].name, "handle");
}
