//! Markdown-subset to HTML transform for post previews and excerpts.
//!
//! SYSTEM CONTEXT
//! ==============
//! The editor preview and the read-only post cards both render through
//! [`render`], so what an author previews is what readers see.
//!
//! DESIGN
//! ======
//! This is a fixed, ordered list of substitutions, not a parser. Inline rules
//! run first so emphasis markers are consumed before line rules look at line
//! starts, and newlines are only collapsed to `<br>` at the very end because
//! the line rules anchor on them. Nesting is unsupported and unbalanced
//! markers pass through literally; a marker pair needs at least one character
//! between its markers. `\r` ends a line like `\n`, so CRLF input never leaks a
//! carriage return into an element. Lists get `<li>` per item with no `<ul>`
//! or `<ol>` container. Input is not HTML-escaped.

#[cfg(test)]
#[path = "markdown_test.rs"]
mod markdown_test;

use std::sync::LazyLock;

use regex::Regex;

use crate::config::EXCERPT_CHARS;

struct Rule {
    pattern: Regex,
    replacement: &'static str,
}

const RULE_SOURCES: [(&str, &str); 8] = [
    (r"(?R)\*\*(.+?)\*\*", "<strong>${1}</strong>"),
    (r"(?R)\*(.+?)\*", "<em>${1}</em>"),
    (r"(?R)`(.+?)`", "<code>${1}</code>"),
    (r"(?mR)^> (.+)$", "<blockquote>${1}</blockquote>"),
    (r"(?mR)^## (.+)$", "<h2>${1}</h2>"),
    (r"(?mR)^# (.+)$", "<h1>${1}</h1>"),
    (r"(?mR)^- (.+)$", "<li>${1}</li>"),
    (r"(?mR)^[0-9]+\. (.+)$", "<li>${1}</li>"),
];

static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    RULE_SOURCES
        .iter()
        .filter_map(|&(source, replacement)| match Regex::new(source) {
            Ok(pattern) => Some(Rule { pattern, replacement }),
            Err(e) => {
                log::error!("markdown: rule {source:?} does not compile: {e}");
                None
            }
        })
        .collect()
});

/// Render `text` to HTML.
pub fn render(text: &str) -> String {
    let mut html = text.to_owned();
    for rule in RULES.iter() {
        html = rule.pattern.replace_all(&html, rule.replacement).into_owned();
    }
    html.replace('\n', "<br>")
}

/// First `limit` characters of `content`, with `...` appended when cut.
pub fn excerpt(content: &str, limit: usize) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(limit).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// Rendered excerpt as shown on post cards.
pub fn render_excerpt(content: &str) -> String {
    render(&excerpt(content, EXCERPT_CHARS))
}
