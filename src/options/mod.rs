//! Option resolution.
//!
//! Merges the three option sources of one build request:
//!
//! ```text
//! base section  <  document front-matter  <  command-line overrides
//! ```
//!
//! Single-valued options take the value of the highest source that sets
//! them. Accumulating options (`-V`, `-M`, `--filter`, `--lua-filter`) are
//! the union of all sources in first-seen order.

mod frontmatter;
mod key;

pub use frontmatter::{CITATION_PROCESSOR, DOCUMENT_OPTIONS};
pub use key::{OptionKey, OptionValue};

use crate::config::{FormatSection, Overrides, SectionValue};
use crate::debug;
use crate::document::FrontMatter;
use crate::utils::path::anchor_relative;
use rustc_hash::FxHashSet;
use std::path::Path;

/// Where an option value came from, for debug output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Base,
    FrontMatter,
    CommandLine,
}

/// Effective options of one format for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveOptions {
    format: String,
    /// Value of `-o`: output suffix, or the reader/writer hint for PDF.
    output: Option<String>,
    entries: Vec<(OptionKey, OptionValue)>,
    accumulated: Vec<(OptionKey, Vec<String>)>,
}

impl EffectiveOptions {
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            output: None,
            entries: Vec::new(),
            accumulated: Vec::new(),
        }
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    /// Output suffix from `-o`, without a leading dot.
    pub fn output_extension(&self) -> Option<&str> {
        self.output.as_deref().map(|ext| ext.trim_start_matches('.'))
    }

    pub fn set_output(&mut self, ext: impl Into<String>) {
        self.output = Some(ext.into());
    }

    // ------------------------------------------------------------------------
    // single-valued options
    // ------------------------------------------------------------------------

    pub fn get(&self, key: &OptionKey) -> Option<&OptionValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn long(&self, name: &str) -> Option<&OptionValue> {
        self.entries
            .iter()
            .find(|(k, _)| matches!(k, OptionKey::Long(n) if n == name))
            .map(|(_, v)| v)
    }

    /// Single value of `--name`.
    pub fn long_str(&self, name: &str) -> Option<&str> {
        self.long(name).and_then(OptionValue::as_str)
    }

    pub fn has_long(&self, name: &str) -> bool {
        self.long(name).is_some() || !self.values(&OptionKey::long(name)).is_empty()
    }

    pub fn has_short(&self, flag: &str) -> bool {
        self.get(&OptionKey::Short(flag.to_string())).is_some()
    }

    /// Set `key`, replacing an existing value in place.
    pub fn set(&mut self, key: OptionKey, value: OptionValue) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn set_long(&mut self, name: &str, value: OptionValue) {
        self.set(OptionKey::long(name), value);
    }

    pub fn remove(&mut self, key: &OptionKey) -> Option<OptionValue> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn remove_long(&mut self, name: &str) -> Option<OptionValue> {
        self.remove(&OptionKey::long(name))
    }

    pub fn entries(&self) -> &[(OptionKey, OptionValue)] {
        &self.entries
    }

    // ------------------------------------------------------------------------
    // accumulating options
    // ------------------------------------------------------------------------

    /// Values of an accumulating option, in first-seen order.
    pub fn values(&self, key: &OptionKey) -> &[String] {
        self.accumulated
            .iter()
            .find(|(k, _)| k == key)
            .map_or(&[], |(_, values)| values.as_slice())
    }

    pub fn variables(&self) -> &[String] {
        self.values(&OptionKey::Variable)
    }

    pub fn filters(&self) -> &[String] {
        self.values(&OptionKey::long("filter"))
    }

    /// Append `value` unless already present.
    pub fn push_value(&mut self, key: OptionKey, value: impl Into<String>) {
        let value = value.into();
        match self.accumulated.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => {
                if !values.contains(&value) {
                    values.push(value);
                }
            }
            None => self.accumulated.push((key, vec![value])),
        }
    }

    /// Remove `value`, returning whether it was present.
    pub fn remove_value(&mut self, key: &OptionKey, value: &str) -> bool {
        let Some((_, values)) = self.accumulated.iter_mut().find(|(k, _)| k == key) else {
            return false;
        };
        let before = values.len();
        values.retain(|v| v != value);
        before != values.len()
    }

    /// Command-line arguments in canonical order.
    ///
    /// Single-valued options first (in resolution order), then filters,
    /// then `-V` and `-M`. `-o` is rendered by the command builder.
    pub fn args(&self) -> Vec<String> {
        let mut out = Vec::new();
        for (key, value) in &self.entries {
            key.push_args(value, &mut out);
        }

        let rank = |key: &OptionKey| match key {
            OptionKey::Long(_) => 0,
            OptionKey::Variable => 1,
            _ => 2,
        };
        let mut accumulated: Vec<_> = self.accumulated.iter().collect();
        accumulated.sort_by_key(|(key, _)| rank(key));

        for (key, values) in accumulated {
            let value = OptionValue::Values(values.clone());
            key.push_args(&value, &mut out);
        }
        out
    }

    fn apply(&mut self, source: Source, key: OptionKey, value: Option<&SectionValue>, dir: &Path) {
        let anchor = |v: String| anchor_relative(&v, dir).unwrap_or(v);

        let Some(value) = value else {
            match key {
                OptionKey::Output => self.output = None,
                _ if key.is_accumulating() => {
                    debug!("options"; "{:?}: cannot switch off accumulating `{}`", source, key);
                }
                _ => {
                    self.remove(&key);
                }
            }
            return;
        };

        if key == OptionKey::Output {
            if let SectionValue::Text(ext) = value {
                self.output = Some(ext.clone());
            }
        } else if key.is_accumulating() {
            for item in value.items() {
                self.push_value(key.clone(), anchor(item));
            }
        } else {
            if let Some(OptionValue::Value(old)) = self.get(&key) {
                debug!("options"; "{:?} overrides {} ({})", source, key, old);
            }
            self.set(key, OptionValue::from(value).map(anchor));
        }
    }
}

/// Resolve the effective options of `format` for one document.
///
/// `document_dir` anchors `./` and `../` values from every source.
pub fn resolve(
    format: &str,
    base: &FormatSection,
    front_matter: &FrontMatter,
    overrides: &Overrides,
    document_dir: &Path,
) -> EffectiveOptions {
    let mut options = EffectiveOptions::new(format);

    for (key, value) in base.entries() {
        options.apply(Source::Base, OptionKey::parse(key), Some(value), document_dir);
    }

    let known: FxHashSet<String> = base
        .entries()
        .iter()
        .chain(overrides.entries())
        .filter_map(|(key, _)| key.strip_prefix("--").map(str::to_string))
        .collect();
    for (key, value) in frontmatter::entries(front_matter, &known) {
        options.apply(Source::FrontMatter, key, value.as_ref(), document_dir);
    }

    for (key, value) in overrides.entries() {
        options.apply(Source::CommandLine, OptionKey::parse(key), Some(value), document_dir);
    }

    options
}
