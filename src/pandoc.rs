//! Pandoc discovery and version-dependent option fixups.

use crate::bibliography::CitationMode;
use crate::options::{EffectiveOptions, OptionKey, OptionValue};
use crate::utils::exec::{Cmd, Echo};
use crate::{debug, log};
use anyhow::{Context, Result};
use std::{
    cmp::Ordering,
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

/// Dotted pandoc version, compared component-wise (`2.14` == `2.14.0`).
#[derive(Debug, Clone, Eq)]
pub struct PandocVersion(Vec<u32>);

impl PandocVersion {
    pub fn new(parts: &[u32]) -> Self {
        Self(parts.to_vec())
    }

    /// Parse `pandoc --version` output or a bare `2.19.2`.
    pub fn parse(text: &str) -> Option<Self> {
        let first = text.lines().next()?.trim();
        let token = first.rsplit(' ').next().unwrap_or(first);
        token.parse().ok()
    }

    pub fn geq(&self, parts: &[u32]) -> bool {
        *self >= Self::new(parts)
    }

    /// Run `<pandoc> --version`.
    pub fn detect(pandoc: &Path) -> Result<Self> {
        let output = Cmd::new(pandoc)
            .arg("--version")
            .echo(Echo::Nothing)
            .run()
            .with_context(|| format!("Failed to run `{} --version`", pandoc.display()))?;
        Self::parse(&output.stdout)
            .with_context(|| format!("Unrecognized pandoc version output: {}", output.stdout.trim()))
    }

    fn component(&self, index: usize) -> u32 {
        self.0.get(index).copied().unwrap_or(0)
    }
}

impl Default for PandocVersion {
    /// Assumed when detection is skipped.
    fn default() -> Self {
        Self::new(&[3, 0])
    }
}

impl FromStr for PandocVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .trim()
            .split('.')
            .map(|part| part.parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| format!("invalid version `{s}`, expected e.g. 2.19.2"))?;
        if parts.is_empty() {
            return Err(format!("invalid version `{s}`"));
        }
        Ok(Self(parts))
    }
}

impl PartialEq for PandocVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl PartialOrd for PandocVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PandocVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.0.len().max(other.0.len());
        (0..len)
            .map(|i| self.component(i).cmp(&other.component(i)))
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl fmt::Display for PandocVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<_> = self.0.iter().map(u32::to_string).collect();
        f.write_str(&parts.join("."))
    }
}

/// Locate the pandoc executable: explicit path or name, else `pandoc` on `PATH`.
pub fn locate(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => which::which(path)
            .with_context(|| format!("pandoc executable `{}` not found", path.display())),
        None => which::which("pandoc").context("pandoc not found in PATH, use --pandoc-path"),
    }
}

/// Rewrite options that `version` no longer accepts.
///
/// With an external citation processor, pandoc must not process citations
/// itself: `--citeproc` and the `pandoc-citeproc` filter are dropped.
pub fn apply_fixups(options: &mut EffectiveOptions, version: &PandocVersion, citation: CitationMode) {
    if version.geq(&[2, 14, 2]) {
        if options.remove(&OptionKey::Short("-S".into())).is_some() {
            debug!("pandoc"; "dropped -S, smart is an extension since 2.14.2");
        }
        let reader = OptionKey::Short("-f".into());
        if let Some(OptionValue::Value(spec)) = options.get(&reader)
            && spec == "markdown+simple_tables"
        {
            options.set(reader, OptionValue::Value("markdown+simple_tables+smart".into()));
        }
    }

    let filter = OptionKey::long("filter");
    match citation {
        CitationMode::External(_) => {
            let dropped_filter = options.remove_value(&filter, "pandoc-citeproc");
            if options.remove_long("citeproc").is_some() || dropped_filter {
                debug!("pandoc"; "citations processed externally, dropped pandoc citeproc");
            }
        }
        CitationMode::Integrated => {
            if version.geq(&[2, 12]) && options.remove_value(&filter, "pandoc-citeproc") {
                log!("pandoc"; "pandoc-citeproc filter replaced by --citeproc for pandoc {}", version);
                options.set_long("citeproc", OptionValue::Flag);
            }
        }
    }
}
