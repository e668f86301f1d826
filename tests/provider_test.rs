use std::fs;
use std::sync::Arc;

use mcp_lens_rs::Analyzer;
use mcp_lens_rs::provider::{EntryKind, FileTreeProvider, LocalProvider, TreeEntry};

fn sample_tree() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("cmd/server")).unwrap();
    fs::create_dir_all(dir.path().join("tests")).unwrap();
    fs::write(
        dir.path().join("cmd/server/main.go"),
        "func main() {\n\ts := server.NewMCPServer(\"Local\", \"1\")\n\ts.AddTool(mcp.NewTool(\"ping\"), h)\n}\n",
    )
    .unwrap();
    fs::write(dir.path().join("app.py"), "@mcp.tool()\ndef run(cmd):\n    pass\n").unwrap();
    fs::write(dir.path().join("tests/app.py"), "@mcp.tool()\ndef hidden():\n    pass\n").unwrap();
    fs::write(dir.path().join("README.md"), "# Sample\n").unwrap();
    dir
}

#[tokio::test]
async fn test_list_is_sorted_and_relative() {
    let dir = sample_tree();
    let provider = LocalProvider::new(dir.path());

    let root = provider.list("").await.unwrap();
    let names: Vec<_> = root.iter().map(|e| (e.path.as_str(), e.kind)).collect();
    assert_eq!(
        names,
        vec![
            ("README.md", EntryKind::File),
            ("app.py", EntryKind::File),
            ("cmd", EntryKind::Dir),
            ("tests", EntryKind::Dir),
        ]
    );

    let nested = provider.list("cmd/server").await.unwrap();
    assert_eq!(nested, vec![TreeEntry::file("cmd/server/main.go")]);
}

#[tokio::test]
async fn test_fetch_and_missing_paths() {
    let dir = sample_tree();
    let provider = LocalProvider::new(dir.path());

    let bytes = provider.fetch(&TreeEntry::file("README.md")).await.unwrap();
    assert_eq!(bytes, b"# Sample\n");

    assert!(provider.list("nope").await.is_err());
    assert!(provider.fetch(&TreeEntry::file("nope.py")).await.is_err());
    // Parent traversal stays inside the root
    assert!(provider.fetch(&TreeEntry::file("../README.md")).await.is_ok());
}

#[tokio::test]
async fn test_analyze_local_directory() {
    let dir = sample_tree();
    let report = Analyzer::default()
        .analyze(Arc::new(LocalProvider::new(dir.path())))
        .await
        .unwrap();

    let paths: Vec<_> = report.files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["app.py", "cmd/server/main.go"]);
    let tools: Vec<_> = report.tools().map(|t| t.name.as_str()).collect();
    assert_eq!(tools, vec!["run", "ping"]);
    assert_eq!(report.servers.len(), 1);
    assert_eq!(report.servers[0].name, "Local");
    assert_eq!(report.servers[0].tools[0].name, "ping");
}
