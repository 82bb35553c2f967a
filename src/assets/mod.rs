//! Citation style and template lookup.
//!
//! Lookup order for a name such as `ieee`:
//!
//! ```text
//! 1. ieee                     existing path (absolute or cwd-relative)
//! 2. <search_dir>/ieee[.csl]  configured --csl-dir / --templates-dir
//! 3. <doc_dir>/csl/ieee[.csl] class-named directory next to the document
//! 4. <doc_dir>/ieee[.csl]     the document's own directory
//! ```
//!
//! A miss is only a warning: the name is passed through and pandoc falls
//! back to its own data directory.

use crate::config::Settings;
use crate::log;
use crate::options::{EffectiveOptions, OptionValue};
use crate::utils::path::absolute;
use std::path::{Path, PathBuf};

/// Asset classes with their own naming conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Csl,
    Template,
}

impl AssetKind {
    /// Class-named directory looked up next to documents.
    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::Csl => "csl",
            Self::Template => "templates",
        }
    }

    /// Pandoc long option carrying this asset.
    pub const fn option_name(self) -> &'static str {
        match self {
            Self::Csl => "csl",
            Self::Template => "template",
        }
    }

    /// File names tried inside each directory.
    fn candidates(self, name: &str) -> Vec<String> {
        match self {
            Self::Csl => vec![name.to_string(), format!("{name}.csl")],
            Self::Template => vec![
                name.to_string(),
                format!("default.{name}"),
                format!("{name}.template"),
            ],
        }
    }

    fn search_dir(self, settings: &Settings) -> Option<&Path> {
        match self {
            Self::Csl => settings.csl_dir.as_deref(),
            Self::Template => settings.templates_dir.as_deref(),
        }
    }
}

/// Lookup result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Located {
    Found(PathBuf),
    /// Nothing matched, the name is passed through unchanged.
    Missing(String),
}

impl Located {
    pub fn into_value(self) -> String {
        match self {
            Self::Found(path) => path.display().to_string(),
            Self::Missing(name) => name,
        }
    }
}

/// Locate `name` of `kind`.
pub fn locate(kind: AssetKind, name: &str, search_dir: Option<&Path>, document_dir: &Path) -> Located {
    let expanded = shellexpand::tilde(name);
    let direct = Path::new(expanded.as_ref());
    if direct.is_file() {
        return Located::Found(absolute(direct));
    }

    let class_dir = document_dir.join(kind.dir_name());
    let dirs = search_dir
        .into_iter()
        .chain(class_dir.is_dir().then_some(class_dir.as_path()))
        .chain(Some(document_dir));

    for dir in dirs {
        for candidate in kind.candidates(name) {
            let path = dir.join(candidate);
            if path.is_file() {
                return Located::Found(absolute(&path));
            }
        }
    }

    Located::Missing(name.to_string())
}

/// Replace `--csl` and `--template` values with located paths.
pub fn resolve_assets(options: &mut EffectiveOptions, settings: &Settings, document_dir: &Path) {
    for kind in [AssetKind::Csl, AssetKind::Template] {
        let Some(name) = options.long_str(kind.option_name()).map(str::to_string) else {
            continue;
        };
        let located = locate(kind, &name, kind.search_dir(settings), document_dir);
        if let Located::Missing(name) = &located {
            log!("warning"; "{} `{}` not found, passing it to pandoc as is", kind.option_name(), name);
        }
        options.set_long(kind.option_name(), OptionValue::Value(located.into_value()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        csl_dir: PathBuf,
        templates_dir: PathBuf,
        doc_dir: PathBuf,
    }

    fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let root = temp.path().canonicalize().unwrap();
        let csl_dir = root.join("csl");
        let templates_dir = root.join("templates");
        let doc_dir = root.join("notes");
        for dir in [&csl_dir, &templates_dir, &doc_dir] {
            fs::create_dir_all(dir).unwrap();
        }
        fs::write(csl_dir.join("ieee.csl"), "").unwrap();
        fs::write(templates_dir.join("reveal.template"), "").unwrap();
        fs::write(templates_dir.join("default.latex"), "").unwrap();
        Fixture {
            _temp: temp,
            csl_dir,
            templates_dir,
            doc_dir,
        }
    }

    #[test]
    fn test_search_dir_suffixes() {
        let f = fixture();
        assert_eq!(
            locate(AssetKind::Csl, "ieee", Some(&f.csl_dir), &f.doc_dir),
            Located::Found(f.csl_dir.join("ieee.csl"))
        );
        assert_eq!(
            locate(AssetKind::Template, "reveal", Some(&f.templates_dir), &f.doc_dir),
            Located::Found(f.templates_dir.join("reveal.template"))
        );
        assert_eq!(
            locate(AssetKind::Template, "latex", Some(&f.templates_dir), &f.doc_dir),
            Located::Found(f.templates_dir.join("default.latex"))
        );
    }

    #[test]
    fn test_existing_absolute_path_is_idempotent() {
        let f = fixture();
        let path = f.csl_dir.join("ieee.csl");
        let name = path.display().to_string();
        let Located::Found(first) = locate(AssetKind::Csl, &name, None, &f.doc_dir) else {
            panic!("expected a hit");
        };
        assert_eq!(first, path);
        let again = locate(AssetKind::Csl, &first.display().to_string(), None, &f.doc_dir);
        assert_eq!(again, Located::Found(path));
    }

    #[test]
    fn test_class_dir_then_document_dir() {
        let f = fixture();
        fs::create_dir_all(f.doc_dir.join("csl")).unwrap();
        fs::write(f.doc_dir.join("csl/apa.csl"), "").unwrap();
        fs::write(f.doc_dir.join("local.csl"), "").unwrap();

        assert_eq!(
            locate(AssetKind::Csl, "apa", None, &f.doc_dir),
            Located::Found(f.doc_dir.join("csl/apa.csl"))
        );
        assert_eq!(
            locate(AssetKind::Csl, "local", None, &f.doc_dir),
            Located::Found(f.doc_dir.join("local.csl"))
        );
    }

    #[test]
    fn test_search_dir_takes_precedence() {
        let f = fixture();
        fs::write(f.doc_dir.join("ieee.csl"), "").unwrap();
        assert_eq!(
            locate(AssetKind::Csl, "ieee", Some(&f.csl_dir), &f.doc_dir),
            Located::Found(f.csl_dir.join("ieee.csl"))
        );
    }

    #[test]
    fn test_missing_passes_name_through() {
        let f = fixture();
        let located = locate(AssetKind::Csl, "chicago", Some(&f.csl_dir), &f.doc_dir);
        assert_eq!(located, Located::Missing("chicago".into()));
        assert_eq!(located.into_value(), "chicago");
    }

    #[test]
    fn test_resolve_assets_rewrites_options() {
        let f = fixture();
        let settings = Settings {
            csl_dir: Some(f.csl_dir.clone()),
            templates_dir: Some(f.templates_dir.clone()),
            ..Settings::default()
        };
        let mut options = EffectiveOptions::new("html");
        options.set_long("csl", OptionValue::Value("ieee".into()));
        options.set_long("template", OptionValue::Value("reveal".into()));
        options.set_long("toc", OptionValue::Flag);

        resolve_assets(&mut options, &settings, &f.doc_dir);

        let csl = f.csl_dir.join("ieee.csl").display().to_string();
        let template = f.templates_dir.join("reveal.template").display().to_string();
        assert_eq!(options.long_str("csl"), Some(csl.as_str()));
        assert_eq!(options.long_str("template"), Some(template.as_str()));
        assert_eq!(options.long("toc"), Some(&OptionValue::Flag));
    }
}
