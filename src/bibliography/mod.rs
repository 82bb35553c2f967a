//! Citation strategy for PDF output.
//!
//! ```text
//! integrated  pandoc --citeproc resolves citations, nothing else to run
//! bibtex      --natbib,    sed shim on the .tex, bibtex between typesetting runs
//! biber       --biblatex,  biber between typesetting runs
//! ```
//!
//! For the external processors a `<stem>-refs.bib` file with only the cited
//! entries is generated next to the document and replaces `--bibliography`.

mod entries;

pub use entries::{Entry, cited_keys, parse_entries};

use crate::config::Settings;
use crate::document::Document;
use crate::options::{CITATION_PROCESSOR, EffectiveOptions, OptionKey, OptionValue};
use crate::plan::{Command, GeneratedFile, PlanError, Step};
use crate::{debug, log};
use rustc_hash::FxHashMap;
use std::{
    fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use thiserror::Error;

/// Bibliography source problems. Abort the PDF plan of one document.
#[derive(Debug, Error)]
pub enum BibliographyError {
    #[error("failed to read bibliography `{path}`")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: {reason}")]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("citation key `{key}` has different entries in `{first}` and `{second}`")]
    DuplicateKey {
        key: String,
        first: PathBuf,
        second: PathBuf,
    },
}

// ============================================================================
// citation modes
// ============================================================================

/// External BibTeX-family processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BibProcessor {
    BibTex,
    Biber,
}

impl BibProcessor {
    /// Pandoc long option selecting the matching LaTeX package.
    pub const fn pandoc_flag(self) -> &'static str {
        match self {
            Self::BibTex => "natbib",
            Self::Biber => "biblatex",
        }
    }

    pub const fn program(self) -> &'static str {
        match self {
            Self::BibTex => "bibtex",
            Self::Biber => "biber",
        }
    }

    fn other(self) -> Self {
        match self {
            Self::BibTex => Self::Biber,
            Self::Biber => Self::BibTex,
        }
    }
}

impl fmt::Display for BibProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

impl FromStr for BibProcessor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bibtex" | "natbib" => Ok(Self::BibTex),
            "biber" | "biblatex" => Ok(Self::Biber),
            other => Err(other.to_string()),
        }
    }
}

/// How citations are processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CitationMode {
    Integrated,
    /// External processor, `None` to pick from the options.
    External(Option<BibProcessor>),
}

impl FromStr for CitationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "integrated" | "citeproc" => Ok(Self::Integrated),
            "external" | "auto" => Ok(Self::External(None)),
            other => other.parse().map(|p| Self::External(Some(p))),
        }
    }
}

// ============================================================================
// planner
// ============================================================================

/// What the command builder has to add for citations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BibliographyPlan {
    /// `None` for the integrated processor.
    pub processor: Option<BibProcessor>,
    /// Citation command rewrite, run right after conversion.
    pub shim: Option<Command>,
    /// Cited-entries file, written before any command runs.
    pub subset: Option<GeneratedFile>,
}

impl BibliographyPlan {
    pub fn style(&self) -> &'static str {
        self.processor.map_or("citeproc", BibProcessor::pandoc_flag)
    }
}

/// Citation mode of `document`: its `citation-processor` header, else the
/// command-line mode.
pub fn citation_mode(document: &Document, settings: &Settings) -> Result<CitationMode, PlanError> {
    match document.front_matter().get(CITATION_PROCESSOR) {
        Some(value) => {
            let name = value.as_str().map_or_else(|| value.to_string(), str::to_string);
            name.parse().map_err(|_| PlanError::UnknownProcessor(name))
        }
        None => Ok(settings.citation),
    }
}

/// Decide the citation strategy of `document` and adjust `options`.
///
/// `tex` is the intermediate TeX file the shim rewrites.
pub fn plan(
    options: &mut EffectiveOptions,
    document: &Document,
    settings: &Settings,
    tex: &Path,
) -> Result<BibliographyPlan, PlanError> {
    let requested = match citation_mode(document, settings)? {
        CitationMode::Integrated => return Ok(BibliographyPlan::default()),
        CitationMode::External(requested) => requested,
    };

    options.remove_long("citeproc");
    options.remove_value(&OptionKey::long("filter"), "pandoc-citeproc");

    let processor = match requested {
        Some(processor) => processor,
        None => detect_processor(options, settings)?,
    };
    options.remove_long(processor.other().pandoc_flag());
    options.set_long(processor.pandoc_flag(), OptionValue::Flag);
    debug!("bibliography"; "{}: using {}", document.path().display(), processor);

    let shim = (processor == BibProcessor::BibTex).then(|| {
        let dir = tex.parent().unwrap_or_else(|| Path::new("."));
        Command::new(Step::Shim, "sed", dir)
            .args(["-i", r"s/\\citep{/\\cite{/g"])
            .arg(tex.display().to_string())
    });

    let sources: Vec<PathBuf> = options
        .long("bibliography")
        .map(|value| {
            value
                .values()
                .into_iter()
                .map(|source| document.dir().join(shellexpand::tilde(source).as_ref()))
                .collect()
        })
        .unwrap_or_default();

    let subset = if sources.is_empty() {
        None
    } else {
        let path = document.dir().join(format!("{}-refs.bib", document.stem()));
        let contents = extract_cited(&sources, document.body())?;
        options.set_long("bibliography", OptionValue::Value(path.display().to_string()));
        Some(GeneratedFile::new(path, contents))
    };

    Ok(BibliographyPlan {
        processor: Some(processor),
        shim,
        subset,
    })
}

/// Processor implied by `--natbib` / `--biblatex`, or the configured default.
fn detect_processor(options: &EffectiveOptions, settings: &Settings) -> Result<BibProcessor, PlanError> {
    let natbib = options.has_long(BibProcessor::BibTex.pandoc_flag());
    let biblatex = options.has_long(BibProcessor::Biber.pandoc_flag());
    match (natbib, biblatex) {
        (true, true) => Err(PlanError::AmbiguousProcessor),
        (true, false) => Ok(BibProcessor::BibTex),
        (false, true) => Ok(BibProcessor::Biber),
        (false, false) => {
            let processor = settings.default_processor;
            log!("warning"; "neither --natbib nor --biblatex given, defaulting to {}", processor);
            Ok(processor)
        }
    }
}

/// Cited entries of `sources`, plus every `@string` and `@preamble`.
///
/// Identical duplicates are merged, differing duplicates of a cited key fail.
pub fn extract_cited(sources: &[PathBuf], body: &str) -> Result<String, BibliographyError> {
    let cited = cited_keys(body);
    let mut shared: Vec<Entry> = Vec::new();
    let mut kept: Vec<Entry> = Vec::new();
    let mut origin: FxHashMap<String, (usize, &Path)> = FxHashMap::default();

    for source in sources {
        let text = fs::read_to_string(source).map_err(|err| BibliographyError::Read {
            path: source.clone(),
            source: err,
        })?;

        for entry in parse_entries(source, &text)? {
            let Some(key) = entry.key.clone() else {
                if !shared.iter().any(|e| e.same_as(&entry)) {
                    shared.push(entry);
                }
                continue;
            };
            if !cited.contains(&key) {
                continue;
            }
            match origin.get(&key) {
                Some(&(index, first)) if !kept[index].same_as(&entry) => {
                    return Err(BibliographyError::DuplicateKey {
                        key,
                        first: first.to_path_buf(),
                        second: source.clone(),
                    });
                }
                Some(_) => {}
                None => {
                    origin.insert(key, (kept.len(), source.as_path()));
                    kept.push(entry);
                }
            }
        }
    }

    debug!("bibliography"; "kept {} of {} cited keys", kept.len(), cited.len());

    let mut out = String::new();
    for entry in shared.iter().chain(&kept) {
        out.push_str(&entry.text);
        out.push_str("\n\n");
    }
    Ok(out)
}

#[cfg(test)]
mod tests;
