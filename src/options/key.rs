//! Option keys and values.

use crate::config::SectionValue;
use std::fmt;

/// Long options whose values accumulate across sources instead of overriding.
const ACCUMULATING_LONG: &[&str] = &["filter", "lua-filter"];

/// A pandoc option key, classified by how it is resolved and rendered.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OptionKey {
    /// `-o`: output file suffix, rendered by the command builder.
    Output,
    /// `-V`: template variables (accumulating).
    Variable,
    /// `-M`: metadata values (accumulating).
    Metadata,
    /// `--name`, stored without the dashes.
    Long(String),
    /// Any other key, passed through verbatim (`-s`, `-N`, `-t`).
    Short(String),
}

impl OptionKey {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "-o" => Self::Output,
            "-V" => Self::Variable,
            "-M" => Self::Metadata,
            _ => match raw.strip_prefix("--") {
                Some(name) => Self::Long(name.to_string()),
                None => Self::Short(raw.to_string()),
            },
        }
    }

    pub fn long(name: &str) -> Self {
        Self::Long(name.to_string())
    }

    pub fn is_accumulating(&self) -> bool {
        match self {
            Self::Variable | Self::Metadata => true,
            Self::Long(name) => ACCUMULATING_LONG.contains(&name.as_str()),
            Self::Output | Self::Short(_) => false,
        }
    }

    /// Render one `key value` pair as command arguments.
    pub(super) fn push_args(&self, value: &OptionValue, out: &mut Vec<String>) {
        match self {
            Self::Output => {}
            Self::Long(name) => match value {
                OptionValue::Flag => out.push(format!("--{name}")),
                OptionValue::Value(v) => out.push(format!("--{name}={v}")),
                OptionValue::Values(vs) => out.extend(vs.iter().map(|v| format!("--{name}={v}"))),
            },
            Self::Variable | Self::Metadata | Self::Short(_) => {
                let key = self.to_string();
                match value {
                    OptionValue::Flag => out.push(key),
                    OptionValue::Value(v) => out.extend([key, v.clone()]),
                    OptionValue::Values(vs) => {
                        for v in vs {
                            out.extend([key.clone(), v.clone()]);
                        }
                    }
                }
            }
        }
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Output => f.write_str("-o"),
            Self::Variable => f.write_str("-V"),
            Self::Metadata => f.write_str("-M"),
            Self::Long(name) => write!(f, "--{name}"),
            Self::Short(raw) => f.write_str(raw),
        }
    }
}

/// A resolved option value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    /// Bare switch.
    Flag,
    Value(String),
    /// Repeated option, e.g. several `--bibliography=`.
    Values(Vec<String>),
}

impl OptionValue {
    /// Single value, `None` for flags and lists.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    /// All values, empty for flags.
    pub fn values(&self) -> Vec<&str> {
        match self {
            Self::Flag => Vec::new(),
            Self::Value(v) => vec![v.as_str()],
            Self::Values(vs) => vs.iter().map(String::as_str).collect(),
        }
    }

    /// Apply `f` to every value.
    pub(super) fn map(self, f: impl Fn(String) -> String) -> Self {
        match self {
            Self::Flag => Self::Flag,
            Self::Value(v) => Self::Value(f(v)),
            Self::Values(vs) => Self::Values(vs.into_iter().map(f).collect()),
        }
    }
}

impl From<&SectionValue> for OptionValue {
    fn from(value: &SectionValue) -> Self {
        match value {
            SectionValue::Flag => Self::Flag,
            SectionValue::Text(text) => Self::Value(text.clone()),
            SectionValue::List(items) if items.len() == 1 => Self::Value(items[0].clone()),
            SectionValue::List(items) => Self::Values(items.clone()),
        }
    }
}
