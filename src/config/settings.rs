//! Runtime settings that are not pandoc options.

use crate::bibliography::{BibProcessor, CitationMode};
use crate::pandoc::PandocVersion;
use std::path::PathBuf;

/// Per-run settings, fixed once the CLI has been parsed.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Pandoc executable.
    pub pandoc_path: PathBuf,
    /// Detected (or given) pandoc version, drives option fixups.
    pub pandoc_version: PandocVersion,
    /// Root directory for generated files (absolute).
    pub output_dir: PathBuf,
    /// Search directory for CSL styles.
    pub csl_dir: Option<PathBuf>,
    /// Search directory for pandoc templates.
    pub templates_dir: Option<PathBuf>,
    /// Write intermediate and final files next to the document
    /// instead of a `<stem>_files` directory under `output_dir`.
    pub same_output_dir: bool,
    /// How citations are processed for PDF output.
    pub citation: CitationMode,
    /// External processor used when neither `--natbib` nor `--biblatex` is set.
    pub default_processor: BibProcessor,
    /// Skip the bibliography tool and the extra typesetting passes.
    pub no_cite_cmd: bool,
    /// Log planned commands without running them.
    pub dry_run: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pandoc_path: PathBuf::from("pandoc"),
            pandoc_version: PandocVersion::default(),
            output_dir: PathBuf::from("."),
            csl_dir: None,
            templates_dir: None,
            same_output_dir: false,
            citation: CitationMode::Integrated,
            default_processor: BibProcessor::BibTex,
            no_cite_cmd: false,
            dry_run: false,
        }
    }
}
