//! Per-format configuration sections.
//!
//! # Example
//!
//! ```toml
//! [html]
//! "-o" = "html"
//! "-s" = ""                       # bare flag
//! "--toc" = true                  # bare flag
//! "--number-sections" = false     # omitted
//! "-V" = ["linkcolor=blue"]       # same as "linkcolor=blue"
//! "--filter" = "pandoc-crossref,pandoc-citeproc"
//! ```

use super::ConfigError;
use std::fmt;

/// A raw option value as written in a config section or on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionValue {
    /// Option without a value (`""` or `true`).
    Flag,
    /// Single value, possibly comma-joined for multi-valued options.
    Text(String),
    /// Explicit list of values.
    List(Vec<String>),
}

impl SectionValue {
    /// Build from a string, treating the empty string as a bare flag.
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            Self::Flag
        } else {
            Self::Text(value)
        }
    }

    /// Split into individual items.
    ///
    /// Text is split on commas, empty items are dropped.
    pub fn items(&self) -> Vec<String> {
        match self {
            Self::Flag => Vec::new(),
            Self::Text(text) => text
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            Self::List(items) => items
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

impl fmt::Display for SectionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag => Ok(()),
            Self::Text(text) => f.write_str(text),
            Self::List(items) => f.write_str(&items.join(",")),
        }
    }
}

/// Options for one output format, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatSection {
    name: String,
    entries: Vec<(String, SectionValue)>,
}

impl FormatSection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    /// Append an entry (builder style, used by tests and the parser).
    pub fn with(mut self, key: impl Into<String>, value: SectionValue) -> Self {
        self.entries.push((key.into(), value));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entries(&self) -> &[(String, SectionValue)] {
        &self.entries
    }

    pub fn get(&self, key: &str) -> Option<&SectionValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Parse a section from its TOML table.
    pub(super) fn from_table(name: &str, table: &toml::Table) -> Result<Self, ConfigError> {
        let mut section = Self::new(name);
        for (key, value) in table {
            let invalid = |reason: &str| ConfigError::InvalidValue {
                section: name.to_string(),
                key: key.clone(),
                reason: reason.to_string(),
            };

            let value = match value {
                toml::Value::String(s) => SectionValue::text(s.as_str()),
                toml::Value::Boolean(true) => SectionValue::Flag,
                // `false` switches an option off entirely
                toml::Value::Boolean(false) => continue,
                toml::Value::Integer(n) => SectionValue::Text(n.to_string()),
                toml::Value::Float(n) => SectionValue::Text(n.to_string()),
                toml::Value::Array(items) => {
                    let items = items
                        .iter()
                        .map(|item| match item {
                            toml::Value::String(s) => Ok(s.clone()),
                            toml::Value::Integer(n) => Ok(n.to_string()),
                            _ => Err(invalid("array items must be strings")),
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    SectionValue::List(items)
                }
                _ => return Err(invalid("expected string, boolean, number or array")),
            };
            section.entries.push((key.clone(), value));
        }
        Ok(section)
    }
}
