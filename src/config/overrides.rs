//! Command-line pass-through options.
//!
//! Everything after `--` on the command line is forwarded to pandoc and takes
//! precedence over the config file and the document header:
//!
//! ```text
//! pndconf convert -g pdf paper.md -- -V fontsize=12pt --toc= --pdf-engine=xelatex -N
//! ```

use super::{ConfigError, SectionValue};

/// Ordered command-line overrides, shared by every format of the run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    entries: Vec<(String, SectionValue)>,
}

impl Overrides {
    /// Parse raw tokens.
    ///
    /// Accepted forms: `-V name=value`, `-M key=value`, `--key=value`,
    /// `--key=` (bare long flag) and `-X` (bare short flag).
    pub fn parse<S: AsRef<str>>(tokens: &[S]) -> Result<Self, ConfigError> {
        let mut entries = Vec::new();
        let mut iter = tokens.iter().map(AsRef::as_ref);

        while let Some(token) = iter.next() {
            match token {
                "-V" | "-M" => {
                    let value = iter
                        .next()
                        .filter(|v| !v.starts_with('-'))
                        .ok_or_else(|| ConfigError::malformed(token, "expected `name=value` after it"))?;
                    entries.push((token.to_string(), SectionValue::text(value)));
                }
                long if long.starts_with("--") => {
                    let Some((key, value)) = long.split_once('=') else {
                        return Err(ConfigError::malformed(
                            long,
                            format!("long options must be joined with `=`, e.g. `{long}=value` or `{long}=`"),
                        ));
                    };
                    if key.len() <= 2 {
                        return Err(ConfigError::malformed(long, "missing option name"));
                    }
                    entries.push((key.to_string(), SectionValue::text(value)));
                }
                short if short.starts_with('-') && short.len() > 1 => {
                    entries.push((short.to_string(), SectionValue::Flag));
                }
                other => {
                    return Err(ConfigError::malformed(
                        other,
                        "pandoc options must start with `-`, e.g. `-X` or `--key=value`",
                    ));
                }
            }
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[(String, SectionValue)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the overrides set `key` (raw form, e.g. `--csl` or `-V`).
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }
}
