//! Rich-text escaping for outgoing windows.
//!
//! ```rust
//! use pdeliver::MarkupFormat;
//!
//! assert_eq!(MarkupFormat::Markdown.escape("snake_case"), "snake\\_case");
//! assert_eq!(MarkupFormat::MarkdownV2.escape("1.5!"), "1\\.5\\!");
//! assert_eq!(MarkupFormat::Plain.escape("a_b"), "a_b");
//! ```

use std::fmt::{Display, Formatter};
use std::str::FromStr;

const MARKDOWN_V2_RESERVED: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!', '\\',
];

/// Inside a fenced block only these keep a special meaning.
const MARKDOWN_V2_CODE_RESERVED: &[char] = &['`', '\\'];

const CODE_FENCE: &str = "```";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarkupFormat {
    /// Legacy markdown; only `_` is escaped so streamed identifiers survive.
    #[default]
    Markdown,
    MarkdownV2,
    Plain,
}

impl MarkupFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::MarkdownV2 => "markdown_v2",
            Self::Plain => "plain",
        }
    }

    pub fn is_formatted(self) -> bool {
        !matches!(self, Self::Plain)
    }

    pub fn escape(self, text: &str) -> String {
        match self {
            Self::Markdown => text.replace('_', "\\_"),
            Self::MarkdownV2 => escape_markdown_v2(text),
            Self::Plain => text.to_string(),
        }
    }
}

/// Fences pass through untouched; an unclosed one is closed at the end so a
/// partially streamed block still parses.
fn escape_markdown_v2(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + text.len() / 8);
    let mut in_fence = false;
    let mut rest = text;

    while let Some(ch) = rest.chars().next() {
        if let Some(after) = rest.strip_prefix(CODE_FENCE) {
            escaped.push_str(CODE_FENCE);
            in_fence = !in_fence;
            rest = after;
            continue;
        }

        let reserved = if in_fence {
            MARKDOWN_V2_CODE_RESERVED
        } else {
            MARKDOWN_V2_RESERVED
        };
        if reserved.contains(&ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
        rest = &rest[ch.len_utf8()..];
    }

    if in_fence {
        if !escaped.ends_with('\n') {
            escaped.push('\n');
        }
        escaped.push_str(CODE_FENCE);
    }
    escaped
}

impl Display for MarkupFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarkupFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "markdown" => Ok(Self::Markdown),
            "markdown_v2" | "markdownv2" => Ok(Self::MarkdownV2),
            "plain" | "text" => Ok(Self::Plain),
            other => Err(format!("unknown markup format '{other}'")),
        }
    }
}
