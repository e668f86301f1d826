//! Exclusion policy applied before any file content is fetched.

const TEST_KEYWORDS: &[&str] = &[
    "test",
    "tests",
    "spec",
    "e2e",
    "integration",
    "unittest",
    "describe",
];

const TEST_SUFFIXES: &[&str] = &[
    "_test",
    "_tests",
    ".spec",
    ".e2e",
    ".integration",
    ".unittest",
    ".it",
    ".describe",
];

const TEST_PREFIXES: &[&str] = &[
    "test_",
    "spec_",
    "e2e_",
    "integration_",
    "unittest_",
    "it_",
    "describe_",
];

const IGNORED_EXTENSIONS: &[&str] = &["md", "json", "toml", "ini", "env", "cfg", "conf", "yml", "yaml"];
const IGNORED_NAMES: &[&str] = &["Dockerfile"];
const IGNORED_PATH_PATTERNS: &[&str] = &[
    "docker-compose",
    ".github/",
    ".gitlab/",
    ".github",
    ".gitlab",
    "third-party/",
];

/// Extensions that are ever handed to an extractor
pub const CODE_EXTENSIONS: &[&str] = &["py", "js", "ts", "java", "go", "rb", "php", "cpp", "c", "cs"];

/// Why a file was kept or skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDecision {
    Analyze,
    SkipTest,
    SkipIgnored,
    SkipNonCode,
}

/// True when `name`/`path` look like a test file.
pub fn should_ignore(name: &str, path: &str, extension: &str) -> bool {
    let name = name.to_lowercase();
    let path = path.to_lowercase();

    if let Some(kw) = TEST_KEYWORDS
        .iter()
        .find(|kw| name.contains(*kw) || path.contains(*kw))
    {
        tracing::debug!(path = %path, keyword = kw, "Test keyword in name or path");
        return true;
    }

    let with_ext = |suffix: &str| format!("{suffix}.{extension}");
    if TEST_SUFFIXES
        .iter()
        .any(|s| name.ends_with(s) || name.ends_with(&with_ext(s)))
    {
        return true;
    }

    if TEST_PREFIXES.iter().any(|p| name.starts_with(p)) {
        return true;
    }

    language_test_suffixes(extension)
        .iter()
        .any(|s| name.ends_with(s.as_str()))
}

fn language_test_suffixes(extension: &str) -> Vec<String> {
    let fixed: &[&str] = match extension {
        "py" => &["_test.py", "_spec.py", "_e2e.py"],
        "java" => &["test.java", "tests.java", "spec.java", "e2e.java"],
        "go" => &["_test.go", "_e2e.go"],
        "rb" => &["_spec.rb", "_test.rb", "_e2e.rb"],
        "php" => &["test.php", "spec.php", "e2e.php"],
        "js" | "ts" => {
            return [".spec.", ".e2e.", ".test."]
                .iter()
                .map(|p| format!("{p}{extension}"))
                .collect();
        }
        "c" | "cpp" | "cs" => {
            return ["test.", "spec.", "e2e."]
                .iter()
                .map(|p| format!("{p}{extension}"))
                .collect();
        }
        _ => &[],
    };
    fixed.iter().map(|s| s.to_string()).collect()
}

/// Configuration and build artifacts: ignored by extension, exact name, or path fragment.
pub fn is_ignored_artifact(name: &str, path: &str, extension: &str) -> bool {
    IGNORED_EXTENSIONS.contains(&extension)
        || IGNORED_NAMES.contains(&name)
        || IGNORED_PATH_PATTERNS.iter().any(|p| path.contains(p))
}

pub fn is_code_extension(extension: &str) -> bool {
    CODE_EXTENSIONS.contains(&extension)
}

/// Apply the file rules in order: test file, ignored artifact, code allow-list.
pub fn decide(name: &str, path: &str, extension: &str) -> FilterDecision {
    if should_ignore(name, path, extension) {
        FilterDecision::SkipTest
    } else if is_ignored_artifact(name, path, extension) {
        FilterDecision::SkipIgnored
    } else if !is_code_extension(extension) {
        FilterDecision::SkipNonCode
    } else {
        FilterDecision::Analyze
    }
}

/// Directories whose whole subtree would be rejected file-by-file anyway.
///
/// Only path-wide rules apply here; name suffix/prefix rules are file rules.
pub fn should_prune_dir(path: &str) -> bool {
    let lower = path.to_lowercase();
    TEST_KEYWORDS.iter().any(|kw| lower.contains(kw))
        || IGNORED_PATH_PATTERNS.iter().any(|p| path.contains(p))
}
