//! Per-language tool recognition.
//!
//! Three styles are supported:
//!
//! - decorator style (Python): a marker line such as `@mcp.tool()` directly above
//!   a function signature;
//! - call-site style (Go, JavaScript, TypeScript, Java, C#): a function whose body
//!   contains a marker call such as `mcp.NewTool(`;
//! - signature only (Ruby, PHP, C, C++): no reliable marker, every function
//!   signature is reported.

use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;

use super::comments::{docstring_after, lookback};
use super::mcp_go;
use super::{Declaration, ServerDescriptor};
use crate::config::DuplicatePolicy;

/// How far below a decorator the signature may appear
const DECORATOR_LOOKAHEAD: usize = 5;

/// Parameter lists spanning more lines than this are cut off
const MAX_PARAM_LINES: usize = 8;

const HASH_COMMENTS: &[&str] = &["#", "\"\"\"", "'''"];
const SLASH_COMMENTS: &[&str] = &["//", "/*", "*"];
const RUBY_COMMENTS: &[&str] = &["#", "=begin", "=end"];
const PHP_COMMENTS: &[&str] = &["//", "#", "/*", "*"];

/// Names that signature heuristics must never report as functions
const CONTROL_KEYWORDS: &[&str] = &[
    "if", "else", "for", "foreach", "while", "switch", "catch", "return", "new", "throw", "sizeof",
    "case", "do", "using", "lock", "await", "delete", "typeof",
];

/// Extracts tool declarations from the raw text of one source file.
pub trait Extractor: Send + Sync {
    fn language(&self) -> &'static str;

    fn extract(&self, source: &str) -> Vec<Declaration>;

    /// Server hierarchy, for extractors that can recover one
    fn servers(&self, _source: &str) -> Vec<ServerDescriptor> {
        Vec::new()
    }
}

/// A compiled signature rule. Every pattern has a `name` group and ends either on
/// the opening parenthesis of the parameter list or, where parentheses are
/// optional, right after the name.
struct Signature {
    rules: Vec<Rule>,
    /// Lines ending in `;` are calls or prototypes, not definitions
    reject_statements: bool,
}

struct Rule {
    re: Regex,
    /// Extra text the line must contain, e.g. `=>` for arrow functions
    requires: Option<&'static str>,
}

struct SignatureMatch<'a> {
    name: &'a str,
    params: String,
}

impl Signature {
    fn new(patterns: &[&str]) -> Self {
        Self {
            rules: patterns
                .iter()
                .map(|p| Rule {
                    re: Regex::new(p).expect("valid regex"),
                    requires: None,
                })
                .collect(),
            reject_statements: false,
        }
    }

    fn with_rule(mut self, pattern: &str, requires: &'static str) -> Self {
        self.rules.push(Rule {
            re: Regex::new(pattern).expect("valid regex"),
            requires: Some(requires),
        });
        self
    }

    fn rejecting_statements(mut self) -> Self {
        self.reject_statements = true;
        self
    }

    fn matches<'a>(&self, lines: &[&'a str], idx: usize) -> Option<SignatureMatch<'a>> {
        let line = lines[idx];
        if self.reject_statements && line.trim_end().ends_with(';') {
            return None;
        }
        let leading = line
            .trim_start()
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .next()
            .unwrap_or_default();
        if CONTROL_KEYWORDS.contains(&leading) {
            return None;
        }
        self.rules.iter().find_map(|rule| {
            if rule.requires.is_some_and(|r| !line.contains(r)) {
                return None;
            }
            let caps = rule.re.captures(line)?;
            let name = caps.name("name")?.as_str();
            if CONTROL_KEYWORDS.contains(&name) {
                return None;
            }
            if caps
                .name("ret")
                .is_some_and(|r| CONTROL_KEYWORDS.contains(&r.as_str()))
            {
                return None;
            }
            let end = caps.get(0)?.end();
            let params = if line[..end].ends_with('(') {
                read_parenthesized(lines, idx, end)
            } else {
                line[end..].trim().to_string()
            };
            Some(SignatureMatch { name, params })
        })
    }
}

/// Text between an opening parenthesis (just before `start` on line `idx`) and its
/// matching close, possibly across lines.
fn read_parenthesized(lines: &[&str], idx: usize, start: usize) -> String {
    let mut depth = 1usize;
    let mut out = String::new();
    let mut rest = &lines[idx][start..];

    for next in 1..=MAX_PARAM_LINES {
        for ch in rest.chars() {
            match ch {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        return out.trim().to_string();
                    }
                }
                _ => {}
            }
            out.push(ch);
        }
        match lines.get(idx + next) {
            Some(line) => {
                out.push(' ');
                rest = line;
            }
            None => break,
        }
    }
    out.trim().to_string()
}

/// Marker line above the signature, e.g. Python's `@mcp.tool()`.
pub struct DecoratorExtractor {
    language: &'static str,
    marker: Regex,
    signature: Signature,
    comment_tokens: &'static [&'static str],
}

impl DecoratorExtractor {
    pub fn python() -> Self {
        Self {
            language: "python",
            marker: Regex::new(r"^@\w+\.tool\b\s*(?:\(|$)").expect("valid regex"),
            signature: Signature::new(&[r"^\s*(?:async\s+)?def\s+(?P<name>\w+)\s*\("]),
            comment_tokens: HASH_COMMENTS,
        }
    }
}

impl Extractor for DecoratorExtractor {
    fn language(&self) -> &'static str {
        self.language
    }

    fn extract(&self, source: &str) -> Vec<Declaration> {
        let lines: Vec<&str> = source.lines().collect();
        let mut found = Vec::new();

        for (i, line) in lines.iter().enumerate() {
            if !self.marker.is_match(line.trim()) {
                continue;
            }
            let window = (i + 1)..(i + 1 + DECORATOR_LOOKAHEAD).min(lines.len());
            let Some((sig_idx, sig)) = window
                .into_iter()
                .find_map(|j| self.signature.matches(&lines, j).map(|m| (j, m)))
            else {
                continue;
            };

            // Comments sit above the whole decorator stack, which may span lines
            let mut anchor = i;
            while anchor > 0 && lines[anchor - 1].trim().starts_with('@') {
                anchor -= 1;
            }
            let mut doc = lookback(&lines, anchor, self.comment_tokens);
            if doc.is_empty() {
                doc = docstring_after(&lines, sig_idx);
            }

            found.push(Declaration::from_signature(sig.name, &sig.params, doc, sig_idx + 1));
        }
        found
    }
}

/// Marker call inside the function body.
pub struct CallSiteExtractor {
    language: &'static str,
    signature: Signature,
    marker: Regex,
    comment_tokens: &'static [&'static str],
    /// Parse `mcp.NewTool(...)` arguments as well (Go only)
    structured: Option<DuplicatePolicy>,
}

impl CallSiteExtractor {
    pub fn go(policy: DuplicatePolicy) -> Self {
        Self {
            language: "go",
            signature: Signature::new(&[
                r"^func\s+(?:\([^)]*\)\s*)?(?P<name>\w+)\s*(?:\[[^\]]*\]\s*)?\(",
            ]),
            marker: Regex::new(r"\bmcp\.NewTool\(").expect("valid regex"),
            comment_tokens: SLASH_COMMENTS,
            structured: Some(policy),
        }
    }

    pub fn javascript(language: &'static str) -> Self {
        Self {
            language,
            signature: Signature::new(&[
                r"^\s*(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s*\*?\s*(?P<name>\w+)\s*(?:<[^>]*>)?\s*\(",
                r"^\s*(?:export\s+)?(?:const|let|var)\s+(?P<name>\w+)\s*(?::[^=]+)?=\s*(?:async\s+)?function\s*\*?\s*\(",
            ])
            .with_rule(
                r"^\s*(?:export\s+)?(?:const|let|var)\s+(?P<name>\w+)\s*(?::[^=]+)?=\s*(?:async\s+)?\(",
                "=>",
            ),
            marker: Regex::new(r"\bmcp\.newTool\(").expect("valid regex"),
            comment_tokens: SLASH_COMMENTS,
            structured: None,
        }
    }

    pub fn java_like(language: &'static str) -> Self {
        Self {
            language,
            signature: Signature::new(&[
                r"^\s*(?:(?:public|private|protected|internal|static|final|abstract|synchronized|async|override|virtual|sealed)\s+)*(?:<[^>]+>\s+)?(?P<ret>[\w<>\[\],.?]+)\s+(?P<name>\w+)\s*\(",
            ]),
            marker: Regex::new(r"\bnew\s+MCPTool\(").expect("valid regex"),
            comment_tokens: SLASH_COMMENTS,
            structured: None,
        }
    }

    /// Declarations for one function body starting at `start`.
    fn extract_body(
        &self,
        lines: &[&str],
        start: usize,
        end: usize,
        sig: &SignatureMatch<'_>,
        out: &mut Vec<Declaration>,
    ) {
        let body = lines[start..end].join("\n");
        let doc = lookback(lines, start, self.comment_tokens);
        let generic = self
            .marker
            .is_match(&body)
            .then(|| Declaration::from_signature(sig.name, &sig.params, doc.clone(), start + 1));

        let structured: Vec<Declaration> = match self.structured {
            Some(_) => mcp_go::parse_tool_calls(&body)
                .into_iter()
                .filter_map(|call| {
                    let line = mcp_go::line_at(&body, call.offset, start + 1);
                    call.into_declaration(sig.name, &doc, line)
                })
                .collect(),
            None => Vec::new(),
        };

        match self.structured {
            Some(DuplicatePolicy::PreferStructured) if !structured.is_empty() => {}
            _ => out.extend(generic),
        }
        out.extend(structured);
    }
}

impl Extractor for CallSiteExtractor {
    fn language(&self) -> &'static str {
        self.language
    }

    fn extract(&self, source: &str) -> Vec<Declaration> {
        let lines: Vec<&str> = source.lines().collect();
        let starts: Vec<(usize, SignatureMatch<'_>)> = (0..lines.len())
            .filter_map(|i| self.signature.matches(&lines, i).map(|m| (i, m)))
            .collect();

        let mut found = Vec::new();

        // Package-level declarations such as `var searchTool = mcp.NewTool(...)`
        if self.structured.is_some() {
            let preamble_end = starts.first().map(|(i, _)| *i).unwrap_or(lines.len());
            let preamble = lines[..preamble_end].join("\n");
            found.extend(mcp_go::parse_tool_calls(&preamble).into_iter().filter_map(|call| {
                let line = mcp_go::line_at(&preamble, call.offset, 1);
                call.into_declaration("", "", line)
            }));
        }

        for (idx, (start, sig)) in starts.iter().enumerate() {
            let end = starts.get(idx + 1).map(|(i, _)| *i).unwrap_or(lines.len());
            self.extract_body(&lines, *start, end, sig, &mut found);
        }
        found
    }

    fn servers(&self, source: &str) -> Vec<ServerDescriptor> {
        match self.structured {
            Some(_) => mcp_go::recover_servers(source),
            None => Vec::new(),
        }
    }
}

/// Every function signature counts; no marker convention is known.
pub struct SignatureExtractor {
    language: &'static str,
    signature: Signature,
    comment_tokens: &'static [&'static str],
}

impl SignatureExtractor {
    pub fn ruby() -> Self {
        Self {
            language: "ruby",
            signature: Signature::new(&[r"^\s*def\s+(?:self\.)?(?P<name>\w+[?!]?)(?:\s*\(|\s+|$)"]),
            comment_tokens: RUBY_COMMENTS,
        }
    }

    pub fn php() -> Self {
        Self {
            language: "php",
            signature: Signature::new(&[
                r"^\s*(?:(?:public|private|protected|static|final|abstract)\s+)*function\s+&?(?P<name>\w+)\s*\(",
            ]),
            comment_tokens: PHP_COMMENTS,
        }
    }

    pub fn c_family(language: &'static str) -> Self {
        Self {
            language,
            signature: Signature::new(&[r"^\s*(?:[\w:*&<>]+\s+)+[*&]*(?P<name>[\w:~]+)\s*\("])
                .rejecting_statements(),
            comment_tokens: SLASH_COMMENTS,
        }
    }
}

impl Extractor for SignatureExtractor {
    fn language(&self) -> &'static str {
        self.language
    }

    fn extract(&self, source: &str) -> Vec<Declaration> {
        let lines: Vec<&str> = source.lines().collect();
        (0..lines.len())
            .filter_map(|i| {
                let sig = self.signature.matches(&lines, i)?;
                let doc = lookback(&lines, i, self.comment_tokens);
                Some(Declaration::from_signature(sig.name, &sig.params, doc, i + 1))
            })
            .collect()
    }
}

/// Extension to extractor lookup table
pub struct ExtractorRegistry {
    by_extension: HashMap<&'static str, Arc<dyn Extractor>>,
}

impl ExtractorRegistry {
    pub fn empty() -> Self {
        Self {
            by_extension: HashMap::new(),
        }
    }

    /// All built-in languages
    pub fn with_defaults(policy: DuplicatePolicy) -> Self {
        let mut registry = Self::empty();
        registry.register(&["py"], Arc::new(DecoratorExtractor::python()));
        registry.register(&["go"], Arc::new(CallSiteExtractor::go(policy)));
        registry.register(&["js"], Arc::new(CallSiteExtractor::javascript("javascript")));
        registry.register(&["ts"], Arc::new(CallSiteExtractor::javascript("typescript")));
        registry.register(&["java"], Arc::new(CallSiteExtractor::java_like("java")));
        registry.register(&["cs"], Arc::new(CallSiteExtractor::java_like("csharp")));
        registry.register(&["rb"], Arc::new(SignatureExtractor::ruby()));
        registry.register(&["php"], Arc::new(SignatureExtractor::php()));
        registry.register(&["c"], Arc::new(SignatureExtractor::c_family("c")));
        registry.register(&["cpp"], Arc::new(SignatureExtractor::c_family("cpp")));
        registry
    }

    pub fn register(&mut self, extensions: &[&'static str], extractor: Arc<dyn Extractor>) {
        for ext in extensions {
            self.by_extension.insert(ext, extractor.clone());
        }
    }

    pub fn get(&self, extension: &str) -> Option<&Arc<dyn Extractor>> {
        self.by_extension.get(extension)
    }
}
