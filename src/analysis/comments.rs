//! Documentation recovery around a declaration.

const MAX_SIGNATURE_LINES: usize = 8;

/// Collect the contiguous comment block directly above `anchor`.
///
/// Walks upward from `anchor - 1` while the trimmed line starts with one of
/// `tokens`, stops at the first other line or the top of the file. Lines come back
/// in source order, each trimmed, joined with `\n`.
pub fn lookback(lines: &[&str], anchor: usize, tokens: &[&str]) -> String {
    let mut start = anchor.min(lines.len());
    while start > 0 {
        let candidate = lines[start - 1].trim();
        if !tokens.iter().any(|t| candidate.starts_with(t)) {
            break;
        }
        start -= 1;
    }

    lines[start..anchor.min(lines.len())]
        .iter()
        .map(|l| l.trim())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Python docstring that opens on the line after the signature starting at
/// `signature`.
///
/// Handles single-line and multi-line forms with either quote style. A signature
/// with its body on the same line (`def f(): return 1`) has no docstring. An
/// unterminated docstring yields everything up to the end of the file.
pub fn docstring_after(lines: &[&str], signature: usize) -> String {
    let Some((idx, inline_body)) = signature_end(lines, signature) else {
        return String::new();
    };
    if inline_body {
        return String::new();
    }
    let Some(first) = lines.get(idx + 1).map(|l| l.trim()) else {
        return String::new();
    };

    let Some(quote) = ["\"\"\"", "'''"].into_iter().find(|q| first.starts_with(q)) else {
        return String::new();
    };

    let opened = &first[quote.len()..];
    if let Some(end) = opened.find(quote) {
        return opened[..end].trim().to_string();
    }

    let mut collected = vec![opened.trim()];
    for line in &lines[idx + 2..] {
        let line = line.trim();
        if let Some(end) = line.find(quote) {
            collected.push(line[..end].trim());
            break;
        }
        collected.push(line);
    }
    collected.join("\n").trim().to_string()
}

/// Line holding the `:` that closes a `def` signature, and whether code follows
/// that colon on the same line.
///
/// Brackets and string literals are skipped so annotations and defaults may
/// contain `:`. A `#` outside a string ends the code part of a line.
fn signature_end(lines: &[&str], signature: usize) -> Option<(usize, bool)> {
    let mut depth = 0usize;
    let mut opened = false;
    let last = (signature + MAX_SIGNATURE_LINES).min(lines.len());

    for (idx, line) in lines.iter().enumerate().take(last).skip(signature) {
        let mut quote: Option<char> = None;
        for (pos, ch) in line.char_indices() {
            if let Some(q) = quote {
                if ch == q {
                    quote = None;
                }
                continue;
            }
            match ch {
                '"' | '\'' => quote = Some(ch),
                '#' => break,
                '(' | '[' | '{' => {
                    depth += 1;
                    opened = true;
                }
                ')' | ']' | '}' => depth = depth.saturating_sub(1),
                ':' if depth == 0 && opened => {
                    let rest = code_before_comment(&line[pos + 1..]);
                    return Some((idx, !rest.trim().is_empty()));
                }
                _ => {}
            }
        }
    }
    None
}

fn code_before_comment(text: &str) -> &str {
    let mut quote: Option<char> = None;
    for (pos, ch) in text.char_indices() {
        match (quote, ch) {
            (None, '#') => return &text[..pos],
            (None, '"' | '\'') => quote = Some(ch),
            (Some(q), c) if c == q => quote = None,
            _ => {}
        }
    }
    text
}
