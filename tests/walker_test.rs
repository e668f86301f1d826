mod support;

use std::sync::Arc;

use std::time::Instant;

use mcp_lens_rs::Analyzer;
use mcp_lens_rs::analysis::Declaration;
use mcp_lens_rs::analysis::languages::{Extractor, ExtractorRegistry};
use mcp_lens_rs::config::{AnalyzerConfig, DuplicatePolicy};
use mcp_lens_rs::walker::{TreeWalker, analyze_bytes};
use pretty_assertions::assert_eq;
use support::{GO_TOOL, PY_TOOL, STALL, StubProvider};

/// Blows up on any file containing `boom`
struct Explosive;

impl Extractor for Explosive {
    fn language(&self) -> &'static str {
        "python"
    }

    fn extract(&self, source: &str) -> Vec<Declaration> {
        if source.contains("boom") {
            panic!("extractor bug");
        }
        Vec::new()
    }
}

fn explosive_registry() -> ExtractorRegistry {
    let mut registry = ExtractorRegistry::empty();
    registry.register(&["py"], Arc::new(Explosive));
    registry
}

fn walker(provider: StubProvider, config: AnalyzerConfig) -> TreeWalker {
    let registry = Arc::new(ExtractorRegistry::with_defaults(config.duplicate_policy));
    TreeWalker::new(Arc::new(provider), registry, config)
}

fn paths(files: &[mcp_lens_rs::analysis::FileAnalysis]) -> Vec<&str> {
    files.iter().map(|f| f.path.as_str()).collect()
}

#[tokio::test]
async fn test_walk_in_listing_order() {
    let provider = StubProvider::new()
        .file("z.py", PY_TOOL)
        .file("pkg/b.go", GO_TOOL)
        .file("pkg/a.go", GO_TOOL)
        .file("a.py", PY_TOOL);

    let files = walker(provider, AnalyzerConfig::default()).walk("").await;
    assert_eq!(paths(&files), vec!["z.py", "pkg/b.go", "pkg/a.go", "a.py"]);
}

#[tokio::test]
async fn test_filtered_files_are_never_fetched() {
    let provider = StubProvider::new()
        .file("main.go", GO_TOOL)
        .file("main_test.go", GO_TOOL)
        .file("README.md", "# readme")
        .file("lib.rs", "fn main() {}")
        .file("tests/helper.py", PY_TOOL)
        .file(".github/workflows/release.py", PY_TOOL)
        // Fetching this would fail; filtering must skip it first
        .failing("Dockerfile")
        .file("Dockerfile", "FROM scratch");

    let files = walker(provider, AnalyzerConfig::default()).walk("").await;
    assert_eq!(paths(&files), vec!["main.go"]);
}

#[tokio::test]
async fn test_failing_subtree_does_not_abort_traversal() {
    let provider = StubProvider::new()
        .file("broken/tool.py", PY_TOOL)
        .file("good/tool.py", PY_TOOL)
        .file("flaky.go", GO_TOOL)
        .file("server.go", GO_TOOL)
        .failing("broken")
        .failing("flaky.go");

    let files = walker(provider, AnalyzerConfig::default()).walk("").await;
    assert_eq!(paths(&files), vec!["good/tool.py", "server.go"]);
    assert_eq!(files[0].mcp_analysis.tools[0].name, "handle");
}

#[tokio::test]
async fn test_failing_root_yields_nothing() {
    let provider = StubProvider::new().file("a.py", PY_TOOL).failing("");
    let files = walker(provider, AnalyzerConfig::default()).walk("").await;
    assert!(files.is_empty());
}

#[tokio::test]
async fn test_depth_guard() {
    let provider = StubProvider::new()
        .file("top.py", PY_TOOL)
        .file("a/one.py", PY_TOOL)
        .file("a/b/two.py", PY_TOOL)
        .file("a/b/c/three.py", PY_TOOL);
    let config = AnalyzerConfig {
        max_depth: 1,
        ..AnalyzerConfig::default()
    };

    let files = walker(provider, config).walk("").await;
    assert_eq!(paths(&files), vec!["top.py", "a/one.py"]);
}

#[tokio::test]
async fn test_cycles_are_not_followed() {
    let provider = StubProvider::new()
        .file("a.py", PY_TOOL)
        .dir("loop")
        .link("loop", "")
        .link("loop", "loop");

    let stub = Arc::new(provider);
    let registry = Arc::new(ExtractorRegistry::with_defaults(DuplicatePolicy::default()));
    let walker = TreeWalker::new(stub.clone(), registry, AnalyzerConfig::default());

    let files = walker.walk("").await;
    assert_eq!(paths(&files), vec!["a.py"]);
    // root and "loop" are each listed once
    assert_eq!(stub.list_calls.load(std::sync::atomic::Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_each_file_is_fetched_once() {
    let provider = StubProvider::new()
        .file("a.py", PY_TOOL)
        .file("pkg/b.go", GO_TOOL)
        .file("pkg/c.go", GO_TOOL)
        .file("README.md", "# skipped")
        .link("pkg", "pkg");

    let stub = Arc::new(provider);
    let registry = Arc::new(ExtractorRegistry::with_defaults(DuplicatePolicy::default()));
    let walker = TreeWalker::new(stub.clone(), registry, AnalyzerConfig::default());

    let files = walker.walk("").await;
    assert_eq!(paths(&files), vec!["a.py", "pkg/b.go", "pkg/c.go"]);
    assert_eq!(stub.fetch_calls.load(std::sync::atomic::Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_undecodable_file_keeps_metrics() {
    let provider = StubProvider::new()
        .file("blob.py", vec![0xff, 0xfe, b'\n', b'@', b'\n'])
        .file("a.py", PY_TOOL);

    let files = walker(provider, AnalyzerConfig::default()).walk("").await;
    assert_eq!(paths(&files), vec!["blob.py", "a.py"]);
    assert_eq!(files[0].size_bytes, 5);
    assert_eq!(files[0].lines, 2);
    assert!(files[0].mcp_analysis.is_empty());
    assert_eq!(files[1].mcp_analysis.tools.len(), 1);
}

#[tokio::test]
async fn test_concurrency_of_one_still_completes() {
    let mut provider = StubProvider::new();
    for i in 0..20 {
        provider = provider.file(&format!("mod{i:02}.py"), PY_TOOL);
    }
    let config = AnalyzerConfig {
        max_concurrent_requests: 1,
        ..AnalyzerConfig::default()
    };

    let files = walker(provider, config).walk("").await;
    assert_eq!(files.len(), 20);
    assert_eq!(files[0].path, "mod00.py");
    assert_eq!(files[19].path, "mod19.py");
}

#[test]
fn test_oversized_file_skips_extraction() {
    let registry = ExtractorRegistry::with_defaults(DuplicatePolicy::default());
    let analysis = analyze_bytes(&registry, "big.py", "py", PY_TOOL.as_bytes(), 16);
    assert_eq!(analysis.size_bytes, PY_TOOL.len());
    assert_eq!(analysis.lines, 8);
    assert_eq!(analysis.non_empty_lines, 6);
    assert!(analysis.mcp_analysis.is_empty());
}

#[tokio::test]
async fn test_extractor_panic_keeps_file_and_siblings() {
    let provider = StubProvider::new()
        .file("a.py", "boom\nx = 1\n")
        .file("b.py", "y = 2\n");
    let config = AnalyzerConfig::default();
    let walker = TreeWalker::new(Arc::new(provider), Arc::new(explosive_registry()), config);

    let files = walker.walk("").await;
    assert_eq!(paths(&files), vec!["a.py", "b.py"]);
    assert_eq!(files[0].lines, 2);
    assert_eq!(files[0].size_bytes, 11);
    assert!(files[0].mcp_analysis.is_empty());
}

#[test]
fn test_extractor_panic_in_single_file_analysis() {
    let analyzer = Analyzer::with_registry(AnalyzerConfig::default(), explosive_registry());
    let analysis = analyzer.analyze_file("tool.py", "boom\n");
    assert_eq!(analysis.lines, 1);
    assert_eq!(analysis.file_type, "py");
    assert!(analysis.mcp_analysis.is_empty());
}

#[tokio::test]
async fn test_stalled_requests_time_out_without_losing_siblings() {
    let provider = StubProvider::new()
        .file("first.py", PY_TOOL)
        .file("hung/tool.py", PY_TOOL)
        .file("slow.go", GO_TOOL)
        .file("last.go", GO_TOOL)
        .stalled("hung")
        .stalled("slow.go");
    let config = AnalyzerConfig {
        request_timeout_secs: 1,
        ..AnalyzerConfig::default()
    };

    let started = Instant::now();
    let files = walker(provider, config).walk("").await;
    assert!(started.elapsed() < STALL);
    assert_eq!(paths(&files), vec!["first.py", "last.go"]);
}

#[test]
fn test_hostile_sources_do_not_break_analysis() {
    let analyzer = Analyzer::default();

    let long_line = format!("@mcp.tool()\ndef f({}):\n    pass\n", "a, ".repeat(200_000));
    let analysis = analyzer.analyze_file("long.py", &long_line);
    assert_eq!(analysis.lines, 3);
    assert_eq!(analysis.mcp_analysis.tools[0].name, "f");

    let nul = "@mcp.tool()\ndef g(\0x):\n    \"\"\"Doc\0.\"\"\"\n";
    let analysis = analyzer.analyze_file("nul.py", nul);
    assert_eq!(analysis.mcp_analysis.tools[0].name, "g");

    let unbalanced = format!("@mcp.tool()\n{}", "def f(a,\n".repeat(40));
    let analysis = analyzer.analyze_file("open.py", &unbalanced);
    assert_eq!(analysis.lines, 41);
    assert_eq!(analysis.mcp_analysis.tools.len(), 1);
    assert_eq!(analysis.mcp_analysis.tools[0].description, "");

    let c_soup = "int f(((((((\n".repeat(50);
    let analysis = analyzer.analyze_file("soup.c", &c_soup);
    assert_eq!(analysis.lines, 50);
}
