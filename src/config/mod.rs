//! Configuration management.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── error          # ConfigError
//! ├── overrides      # command-line pass-through options
//! ├── section        # per-format option tables
//! ├── settings       # runtime settings (paths, citation mode, dry run)
//! ├── default.toml   # embedded default configuration
//! └── mod.rs         # Configuration (this file)
//! ```
//!
//! A [`Configuration`] is built once at startup and only read afterwards.
//! Everything document-specific is resolved per build request by
//! [`crate::options::resolve`].

mod error;
mod overrides;
mod section;
mod settings;

pub use error::ConfigError;
pub use overrides::Overrides;
pub use section::{FormatSection, SectionValue};
pub use settings::Settings;

use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

/// Configuration shipped with the binary, used without `--config-file`.
pub const DEFAULT_CONFIG: &str = include_str!("default.toml");

// ============================================================================
// root configuration
// ============================================================================

/// Base sections, command-line overrides and runtime settings of one run.
#[derive(Debug, Clone)]
pub struct Configuration {
    /// Config file path, `None` for the embedded default.
    source: Option<PathBuf>,
    sections: Vec<FormatSection>,
    overrides: Overrides,
    settings: Settings,
}

/// Parse sections from TOML content.
impl FromStr for Configuration {
    type Err = ConfigError;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        let table: toml::Table = toml::from_str(content)?;

        let mut sections = Vec::with_capacity(table.len());
        for (name, value) in &table {
            let toml::Value::Table(options) = value else {
                return Err(ConfigError::Validation(format!(
                    "top-level key `{name}` must be a format table, e.g. [{name}]"
                )));
            };
            sections.push(FormatSection::from_table(name, options)?);
        }

        Ok(Self {
            source: None,
            sections,
            overrides: Overrides::default(),
            settings: Settings::default(),
        })
    }
}

impl Configuration {
    /// Load from `path`, or the embedded default when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                let content = fs::read_to_string(path)
                    .map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
                let mut config = content.parse::<Self>()?;
                config.source = Some(path.to_path_buf());
                Ok(config)
            }
            None => DEFAULT_CONFIG.parse(),
        }
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn overrides(&self) -> &Overrides {
        &self.overrides
    }

    pub fn section(&self, format: &str) -> Option<&FormatSection> {
        self.sections.iter().find(|s| s.name() == format)
    }

    /// Configured format names, in file order.
    pub fn formats(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(FormatSection::name)
    }

    /// Fail on the first requested format without a section.
    pub fn check_formats<S: AsRef<str>>(&self, requested: &[S]) -> Result<(), ConfigError> {
        for format in requested {
            let format = format.as_ref();
            if self.section(format).is_none() {
                return Err(ConfigError::UnknownFormat {
                    format: format.to_string(),
                    known: self.formats().collect::<Vec<_>>().join(", "),
                });
            }
        }
        Ok(())
    }

    /// Human readable dump of the options for `formats`.
    pub fn generation_opts<S: AsRef<str>>(&self, formats: &[S]) -> String {
        let mut out = String::new();
        for format in formats {
            let format = format.as_ref();
            match self.section(format) {
                Some(section) if !section.entries().is_empty() => {
                    out.push_str(&format!("[{format}]\n"));
                    for (key, value) in section.entries() {
                        out.push_str(&format!("  {key} {value}\n"));
                    }
                }
                _ => out.push_str(&format!("[{format}] (no options)\n")),
            }
        }
        for (key, value) in self.overrides.entries() {
            out.push_str(&format!("override: {key} {value}\n"));
        }
        out
    }
}
