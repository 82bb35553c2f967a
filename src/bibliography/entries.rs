//! BibTeX entry scanning and citation key extraction.
//!
//! Entries are kept as raw text; only the type and citation key are parsed.
//! Field contents are never interpreted.

use super::BibliographyError;
use regex::Regex;
use rustc_hash::FxHashSet;
use std::{path::Path, sync::LazyLock};

/// One `@type{key, ...}` block of a bibliography source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Lowercased entry type (`article`, `string`, ...).
    pub kind: String,
    /// Citation key, `None` for `@string` and `@preamble`.
    pub key: Option<String>,
    /// Full entry text, from `@` to the closing delimiter.
    pub text: String,
    /// 1-based line of the `@`.
    pub line: usize,
}

impl Entry {
    /// Whether two entries are the same apart from whitespace.
    pub fn same_as(&self, other: &Entry) -> bool {
        let strip = |text: &str| text.chars().filter(|c| !c.is_whitespace()).collect::<String>();
        strip(&self.text) == strip(&other.text)
    }
}

/// Scan all entries of `text`. `@comment` blocks are dropped.
///
/// An `@` that does not open an entry (`@type{` or `@type(`) is text
/// outside entries and skipped, as BibTeX does.
pub fn parse_entries(path: &Path, text: &str) -> Result<Vec<Entry>, BibliographyError> {
    let bytes = text.as_bytes();
    let mut entries = Vec::new();
    let mut pos = 0;

    while let Some(offset) = text[pos..].find('@') {
        let start = pos + offset;
        let line = text[..start].matches('\n').count() + 1;
        let error = |reason: &str| BibliographyError::Parse {
            path: path.to_path_buf(),
            line,
            reason: reason.to_string(),
        };

        let rest = &text[start + 1..];
        let kind_len = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        let after_kind = &rest[kind_len..];
        let open = start + 1 + kind_len + (after_kind.len() - after_kind.trim_start().len());
        let close = match bytes.get(open) {
            Some(b'{') if kind_len > 0 => b'}',
            Some(b'(') if kind_len > 0 => b')',
            _ => {
                pos = start + 1;
                continue;
            }
        };
        let kind = rest[..kind_len].to_ascii_lowercase();
        let end = find_close(bytes, open, close)
            .ok_or_else(|| error("entry is not closed, check for unbalanced braces"))?;
        pos = end + 1;

        let entry_text = text[start..=end].to_string();
        match kind.as_str() {
            "comment" => {}
            "string" | "preamble" => entries.push(Entry {
                kind,
                key: None,
                text: entry_text,
                line,
            }),
            _ => {
                let body = &text[open + 1..end];
                let key = body.split(',').next().unwrap_or_default().trim();
                if key.is_empty() {
                    return Err(error("missing citation key"));
                }
                entries.push(Entry {
                    kind,
                    key: Some(key.to_string()),
                    text: entry_text,
                    line,
                });
            }
        }
    }

    Ok(entries)
}

/// Index of the delimiter closing the one at `open`.
fn find_close(bytes: &[u8], open: usize, close: u8) -> Option<usize> {
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(open + 1) {
        match b {
            b'{' => depth += 1,
            b'}' if depth > 0 => depth -= 1,
            _ if b == close && depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

/// Pandoc citation syntax: `@key`, `[@key, p. 3]`, `-@key`, `@{key}`.
static CITATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\w@])@(?:\{([^}\s]+)\}|([A-Za-z0-9_](?:[\w:.#$%&+?<>~/-]*[A-Za-z0-9_])?))")
        .unwrap()
});

/// Citation keys used in a document body.
pub fn cited_keys(body: &str) -> FxHashSet<String> {
    CITATION
        .captures_iter(body)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
        .collect()
}
