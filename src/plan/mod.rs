//! Command plans.
//!
//! # Module Structure
//!
//! ```text
//! plan/
//! ├── command    # Command, Step, GeneratedFile, shell quoting
//! ├── pdf        # multi-step TeX plan
//! └── mod.rs     # build() and single-command formats (this file)
//! ```
//!
//! Every format of a document is planned independently: a failing PDF plan
//! leaves the HTML plan of the same document untouched.

mod command;
mod pdf;

pub use command::{Command, GeneratedFile, Step, quote};

use crate::assets;
use crate::bibliography::{self, BibliographyError};
use crate::config::{Configuration, Settings};
use crate::document::Document;
use crate::options::{self, EffectiveOptions};
use crate::pandoc;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Per-format planning failure.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Bibliography(#[from] BibliographyError),

    #[error("unknown citation processor `{0}`, expected integrated, bibtex, biber or auto")]
    UnknownProcessor(String),

    #[error("both --natbib and --biblatex are set, cannot pick a citation processor")]
    AmbiguousProcessor,

    #[error("no configuration section for format `{0}`")]
    UnknownFormat(String),
}

/// Everything that runs, in order, to produce one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPlan {
    pub format: String,
    pub input: PathBuf,
    /// Final artifact.
    pub output: PathBuf,
    /// Written before the first command.
    pub files: Vec<GeneratedFile>,
    pub commands: Vec<Command>,
}

impl CommandPlan {
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn steps(&self) -> Vec<Step> {
        self.commands.iter().map(|c| c.step).collect()
    }

    /// Number of commands of `step`.
    pub fn count(&self, step: Step) -> usize {
        self.commands.iter().filter(|c| c.step == step).count()
    }
}

/// Plans of one document, in requested format order.
#[derive(Debug, Default)]
pub struct Plans {
    entries: Vec<(String, Result<CommandPlan, PlanError>)>,
}

impl Plans {
    pub fn get(&self, format: &str) -> Option<&Result<CommandPlan, PlanError>> {
        self.entries.iter().find(|(f, _)| f == format).map(|(_, p)| p)
    }

    pub fn formats(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(f, _)| f.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Result<CommandPlan, PlanError>)> {
        self.entries.iter().map(|(f, p)| (f.as_str(), p))
    }
}

impl IntoIterator for Plans {
    type Item = (String, Result<CommandPlan, PlanError>);
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Plan every requested format of `document`. Duplicate formats are planned once.
pub fn build<S: AsRef<str>>(document: &Document, config: &Configuration, formats: &[S]) -> Plans {
    let mut plans = Plans::default();
    for format in formats {
        let format = format.as_ref();
        if plans.get(format).is_some() {
            continue;
        }
        let plan = build_format(document, config, format);
        plans.entries.push((format.to_string(), plan));
    }
    plans
}

fn build_format(document: &Document, config: &Configuration, format: &str) -> Result<CommandPlan, PlanError> {
    let section = config
        .section(format)
        .ok_or_else(|| PlanError::UnknownFormat(format.to_string()))?;
    let settings = config.settings();

    let mut options = options::resolve(
        format,
        section,
        document.front_matter(),
        config.overrides(),
        document.dir(),
    );
    // an unknown header value is a PlanError of the TeX pipeline only
    let citation = bibliography::citation_mode(document, settings).unwrap_or(settings.citation);
    pandoc::apply_fixups(&mut options, &settings.pandoc_version, citation);
    assets::resolve_assets(&mut options, settings, document.dir());

    if format == "pdf" {
        pdf::build(document, options, settings)
    } else {
        let ext = options
            .output_extension()
            .unwrap_or_else(|| default_extension(format))
            .to_string();
        let output = output_dir(document, settings).join(format!("{}.{ext}", document.stem()));
        Ok(single(document, &options, settings, output))
    }
}

/// One pandoc call writing `output`.
fn single(document: &Document, options: &EffectiveOptions, settings: &Settings, output: PathBuf) -> CommandPlan {
    CommandPlan {
        format: options.format().to_string(),
        input: document.path().to_path_buf(),
        commands: vec![convert(document, options, settings, &output)],
        output,
        files: Vec::new(),
    }
}

/// `pandoc <options> <input> -o <output>`, run in the document directory.
fn convert(document: &Document, options: &EffectiveOptions, settings: &Settings, output: &Path) -> Command {
    Command::new(Step::Convert, settings.pandoc_path.display().to_string(), document.dir())
        .args(options.args())
        .arg(document.path().display().to_string())
        .args(["-o".to_string(), output.display().to_string()])
}

/// Directory receiving generated files.
fn output_dir(document: &Document, settings: &Settings) -> PathBuf {
    if settings.same_output_dir {
        document.dir().to_path_buf()
    } else {
        settings.output_dir.clone()
    }
}

/// Output suffix for formats without `-o`.
fn default_extension(format: &str) -> &str {
    match format {
        "html" | "reveal" | "revealjs" | "slidy" => "html",
        "beamer" | "pdf" => "pdf",
        "latex" => "tex",
        other => other,
    }
}

#[cfg(test)]
mod tests;
