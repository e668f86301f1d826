//! Argument parsing for mcp-go style declarations.
//!
//! Recognises `mcp.NewTool("name", mcp.WithDescription("..."), mcp.WithString("p",
//! mcp.Description("...")))` and the `server.NewMCPServer` / `AddTool` calls that
//! group such tools under a named server.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::{Declaration, DeclarationSource, ParamDoc, PromptRef, ResourceRef, ServerDescriptor};

// A Go string literal, interpreted or raw. Groups: (interpreted, raw).
macro_rules! go_str {
    () => {
        r#"(?:"((?:[^"\\\n]|\\.)*)"|`([^`]*)`)"#
    };
}

static NEW_TOOL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(r"\bmcp\.NewTool\(\s*(?:", go_str!(), ")?")).expect("valid regex")
});

static WITH_DESCRIPTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(r"\bmcp\.WithDescription\(\s*", go_str!())).expect("valid regex")
});

static PARAM_BUILDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"\bmcp\.With(?:String|Number|Boolean|Bool|Int|Integer|Float|Array|Object)\(\s*",
        go_str!()
    ))
    .expect("valid regex")
});

static PARAM_DESCRIPTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(r"\bmcp\.Description\(\s*", go_str!())).expect("valid regex")
});

static NEW_SERVER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(r"\bserver\.NewMCPServer\(\s*", go_str!())).expect("valid regex")
});

static NEW_PROMPT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(r"\bmcp\.NewPrompt\(\s*", go_str!())).expect("valid regex")
});

static NEW_RESOURCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"\bmcp\.NewResource\(\s*",
        go_str!(),
        r"(?:\s*,\s*",
        go_str!(),
        ")?"
    ))
    .expect("valid regex")
});

static ADD_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\w+)\.(AddTool|AddPrompt|AddResource)\(\s*").expect("valid regex")
});

static BINDING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w+)\s*:?=\s*$").expect("valid regex"));

static IDENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\w+)").expect("valid regex"));

/// One `mcp.NewTool(...)` occurrence and what its arguments say
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    /// Literal tool name, when the first argument is a string literal
    pub name: Option<String>,
    pub description: String,
    pub parameters: Vec<ParamDoc>,
    /// Byte offset of the call within the scanned text
    pub offset: usize,
}

impl ToolCall {
    /// Build a declaration, falling back to `fallback_name` and `fallback_doc`
    /// where the call itself carries no literal.
    pub fn into_declaration(
        self,
        fallback_name: &str,
        fallback_doc: &str,
        line: usize,
    ) -> Option<Declaration> {
        let name = self.name.unwrap_or_else(|| fallback_name.to_string());
        if name.is_empty() {
            return None;
        }
        let description = if self.description.is_empty() {
            fallback_doc.to_string()
        } else {
            self.description
        };
        Some(Declaration {
            name,
            params: self.parameters.iter().map(|p| p.name.clone()).collect(),
            description,
            parameters: self.parameters,
            line,
            source: DeclarationSource::MarkerCall,
        })
    }
}

fn literal(caps: &Captures<'_>, first: usize) -> Option<String> {
    caps.get(first)
        .or_else(|| caps.get(first + 1))
        .map(|m| m.as_str().to_string())
}

/// Split `text` at each match start of `re`, yielding (match start, segment end).
fn segments(re: &Regex, text: &str) -> Vec<(usize, usize)> {
    let starts: Vec<usize> = re.find_iter(text).map(|m| m.start()).collect();
    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| (start, starts.get(i + 1).copied().unwrap_or(text.len())))
        .collect()
}

/// Parse every `mcp.NewTool` call in `text`.
///
/// A call's arguments are taken to run until the next `mcp.NewTool` or the end of
/// `text`; builder parameters are likewise bounded by the next builder.
pub fn parse_tool_calls(text: &str) -> Vec<ToolCall> {
    segments(&NEW_TOOL, text)
        .into_iter()
        .filter_map(|(start, end)| {
            let segment = &text[start..end];
            let head = NEW_TOOL.captures(segment)?;
            let description = WITH_DESCRIPTION
                .captures(segment)
                .and_then(|c| literal(&c, 1))
                .unwrap_or_default();

            let parameters = segments(&PARAM_BUILDER, segment)
                .into_iter()
                .filter_map(|(p_start, p_end)| {
                    let builder = &segment[p_start..p_end];
                    let caps = PARAM_BUILDER.captures(builder)?;
                    let name = literal(&caps, 1)?;
                    let description = PARAM_DESCRIPTION
                        .captures(builder)
                        .and_then(|c| literal(&c, 1))
                        .unwrap_or_default();
                    Some(ParamDoc { name, description })
                })
                .collect();

            Some(ToolCall {
                name: literal(&head, 1),
                description,
                parameters,
                offset: start,
            })
        })
        .collect()
}

/// 1-based line number of byte `offset` in `text`, shifted by `first_line - 1`.
pub fn line_at(text: &str, offset: usize, first_line: usize) -> usize {
    first_line + text[..offset.min(text.len())].matches('\n').count()
}

/// Variable the expression at `offset` is assigned to, e.g. `tool := mcp.NewTool(`.
fn binding_at(text: &str, offset: usize) -> Option<String> {
    let line_start = text[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    BINDING
        .captures(&text[line_start..offset])
        .map(|c| c[1].to_string())
}

#[derive(Debug)]
struct Bound<T> {
    offset: usize,
    var: Option<String>,
    item: T,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Tool,
    Prompt,
    Resource,
}

struct Link {
    receiver: String,
    kind: Kind,
    target: Target,
}

enum Target {
    Var(String),
    Inline(usize),
}

/// Recover servers and the tools, prompts and resources registered on them.
pub fn recover_servers(source: &str) -> Vec<ServerDescriptor> {
    let servers: Vec<Bound<String>> = NEW_SERVER
        .captures_iter(source)
        .filter_map(|c| {
            let m = c.get(0)?;
            Some(Bound {
                offset: m.start(),
                var: binding_at(source, m.start()),
                item: literal(&c, 1)?,
            })
        })
        .collect();
    if servers.is_empty() {
        return Vec::new();
    }

    let tools: Vec<Bound<Declaration>> = parse_tool_calls(source)
        .into_iter()
        .filter_map(|call| {
            let offset = call.offset;
            let line = line_at(source, offset, 1);
            Some(Bound {
                offset,
                var: binding_at(source, offset),
                item: call.into_declaration("", "", line)?,
            })
        })
        .collect();

    let prompts: Vec<Bound<PromptRef>> = NEW_PROMPT
        .captures_iter(source)
        .filter_map(|c| {
            let m = c.get(0)?;
            Some(Bound {
                offset: m.start(),
                var: binding_at(source, m.start()),
                item: PromptRef {
                    name: literal(&c, 1)?,
                },
            })
        })
        .collect();

    let resources: Vec<Bound<ResourceRef>> = NEW_RESOURCE
        .captures_iter(source)
        .filter_map(|c| {
            let m = c.get(0)?;
            // Prefer the display name over the URI
            let name = literal(&c, 3).or_else(|| literal(&c, 1))?;
            Some(Bound {
                offset: m.start(),
                var: binding_at(source, m.start()),
                item: ResourceRef { name },
            })
        })
        .collect();

    let links: Vec<Link> = ADD_CALL
        .captures_iter(source)
        .filter_map(|c| {
            let m = c.get(0)?;
            let kind = match &c[2] {
                "AddTool" => Kind::Tool,
                "AddPrompt" => Kind::Prompt,
                _ => Kind::Resource,
            };
            let rest = &source[m.end()..];
            let target = if rest.starts_with("mcp.") {
                Target::Inline(m.end())
            } else {
                Target::Var(IDENT.captures(rest)?[1].to_string())
            };
            Some(Link {
                receiver: c[1].to_string(),
                kind,
                target,
            })
        })
        .collect();

    let mut descriptors: Vec<ServerDescriptor> = servers
        .iter()
        .map(|s| ServerDescriptor {
            name: s.item.clone(),
            ..Default::default()
        })
        .collect();

    if links.is_empty() {
        if let [only] = descriptors.as_mut_slice() {
            only.tools = tools.into_iter().map(|t| t.item).collect();
            only.prompts = prompts.into_iter().map(|p| p.item).collect();
            only.resources = resources.into_iter().map(|r| r.item).collect();
        }
        return descriptors;
    }

    for link in &links {
        let Some(index) = server_for(&servers, &link.receiver) else {
            continue;
        };
        let target = &link.target;
        let server = &mut descriptors[index];
        match link.kind {
            Kind::Tool => {
                if let Some(t) = resolve(&tools, target) {
                    server.tools.push(t.clone());
                }
            }
            Kind::Prompt => {
                if let Some(p) = resolve(&prompts, target) {
                    server.prompts.push(p.clone());
                }
            }
            Kind::Resource => {
                if let Some(r) = resolve(&resources, target) {
                    server.resources.push(r.clone());
                }
            }
        }
    }

    descriptors
}

/// Server a receiver refers to. With a single server in the file every receiver
/// is taken to be that server.
fn server_for(servers: &[Bound<String>], receiver: &str) -> Option<usize> {
    if servers.len() == 1 {
        return Some(0);
    }
    servers
        .iter()
        .position(|s| s.var.as_deref() == Some(receiver))
}

fn resolve<'a, T>(items: &'a [Bound<T>], target: &Target) -> Option<&'a T> {
    match target {
        Target::Inline(offset) => items.iter().find(|b| b.offset == *offset),
        // Latest binding wins when a variable is reassigned
        Target::Var(var) => items
            .iter()
            .rev()
            .find(|b| b.var.as_deref() == Some(var.as_str())),
    }
    .map(|b| &b.item)
}
