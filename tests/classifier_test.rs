use mcp_lens_rs::Analyzer;
use mcp_lens_rs::analysis::classifier::{Classification, classify_assignment};

#[test]
fn test_prompt_names() {
    assert_eq!(
        classify_assignment(r#"system_prompt = "You are helpful""#),
        Some(Classification::Prompt("system_prompt".to_string()))
    );
    assert_eq!(
        classify_assignment("    user_prompts = {}"),
        Some(Classification::Prompt("user_prompts".to_string()))
    );
    assert_eq!(
        classify_assignment("prompt: str = 'hi'"),
        Some(Classification::Prompt("prompt".to_string()))
    );
}

#[test]
fn test_resource_names_keep_their_casing() {
    assert_eq!(
        classify_assignment("RESOURCES: list = []"),
        Some(Classification::Resource("RESOURCES".to_string()))
    );
    assert_eq!(
        classify_assignment("file_resource := load()"),
        Some(Classification::Resource("file_resource".to_string()))
    );
}

#[test]
fn test_near_misses_are_not_classified() {
    assert_eq!(classify_assignment("promptly = 1"), None);
    assert_eq!(classify_assignment("resourceful = True"), None);
    assert_eq!(classify_assignment("x == prompt"), None);
    assert_eq!(classify_assignment("print(system_prompt)"), None);
    assert_eq!(classify_assignment(""), None);
}

#[test]
fn test_classifier_runs_on_every_line() {
    let source = "import os\n\nSYSTEM_PROMPT = \"hi\"\ndocs_resources = []\nother = 3\n";
    let analysis = Analyzer::default().analyze_file("settings.py", source);
    let prompts: Vec<_> = analysis.mcp_analysis.prompts.iter().map(|p| p.name.as_str()).collect();
    let resources: Vec<_> = analysis.mcp_analysis.resources.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(prompts, vec!["SYSTEM_PROMPT"]);
    assert_eq!(resources, vec!["docs_resources"]);
    assert!(analysis.mcp_analysis.tools.is_empty());
}
