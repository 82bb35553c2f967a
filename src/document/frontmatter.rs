//! YAML header extraction.

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The document header could not be used; the document is skipped.
#[derive(Debug, Error)]
pub enum FrontMatterError {
    #[error("invalid YAML header in `{path}`")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("YAML header in `{0}` is not a key-value mapping")]
    NotMapping(PathBuf),
}

/// Key-value header of a document, in header order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter(Map<String, Value>);

impl FrontMatter {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }
}

impl From<Map<String, Value>> for FrontMatter {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Split `content` into header and body.
///
/// The header must open on the first line with `---` and close with a line
/// that is `---` or `...`. Without a closing line the whole text is body.
pub fn split(content: &str) -> Option<(&str, &str)> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let rest = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))?;

    // Empty header: closing marker right away
    for marker in ["---", "..."] {
        if let Some(body) = rest.strip_prefix(marker)
            && (body.is_empty() || body.starts_with('\n') || body.starts_with("\r\n"))
        {
            return Some(("", body.trim_start_matches(['\r', '\n'])));
        }
    }

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if offset > 0 && (trimmed == "---" || trimmed == "...") {
            let header = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Some((header, body));
        }
        offset += line.len();
    }
    None
}

/// Parse the header of `content`, returning `(front_matter, body)`.
///
/// Documents without a header yield an empty front-matter and the full text.
pub fn parse<'a>(path: &Path, content: &'a str) -> Result<(FrontMatter, &'a str), FrontMatterError> {
    let Some((header, body)) = split(content) else {
        return Ok((FrontMatter::default(), content));
    };

    if header.trim().is_empty() {
        return Ok((FrontMatter::default(), body));
    }

    let value: Value = serde_yaml::from_str(header).map_err(|source| FrontMatterError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;

    match value {
        Value::Object(map) => Ok((FrontMatter(map), body)),
        Value::Null => Ok((FrontMatter::default(), body)),
        _ => Err(FrontMatterError::NotMapping(path.to_path_buf())),
    }
}
