//! Startup shared by the subcommands: configuration, settings, overrides.
//!
//! Everything here runs before the first document is touched; any error
//! aborts the run.

use anyhow::{Context, Result};
use std::path::PathBuf;

use super::args::{Cli, CommonArgs};
use crate::bibliography::{BibProcessor, CitationMode};
use crate::compile::CommandHook;
use crate::config::{ConfigError, Configuration, Overrides, Settings};
use crate::log;
use crate::pandoc::{self, PandocVersion};
use crate::utils::path::expand_path;

/// Load the configuration and attach the settings and overrides of this run.
pub fn load_configuration(cli: &Cli, common: &CommonArgs, no_cite_cmd: bool) -> Result<Configuration> {
    let path = cli.config_file.as_deref().map(expand_path);
    let config = Configuration::load(path.as_deref())
        .with_context(|| match &path {
            Some(path) => format!("Failed to load config file {}", path.display()),
            None => "Failed to load the built-in configuration".to_string(),
        })?;

    config.check_formats(&common.generation)?;
    let overrides = Overrides::parse(&common.pandoc_args)?;
    let settings = settings(cli, common, no_cite_cmd)?;

    Ok(config.with_overrides(overrides).with_settings(settings))
}

/// Runtime settings from the command line.
pub fn settings(cli: &Cli, common: &CommonArgs, no_cite_cmd: bool) -> Result<Settings> {
    let explicit = cli.pandoc_path.as_deref().map(|p| PathBuf::from(shellexpand::tilde(p).as_ref()));
    let pandoc_path = match pandoc::locate(explicit.as_deref()) {
        Ok(path) => path,
        Err(err) if cli.dry_run => {
            log!("warning"; "{:#}", err);
            PathBuf::from("pandoc")
        }
        Err(err) => return Err(err),
    };

    let pandoc_version = match &cli.pandoc_version {
        Some(version) => version.parse::<PandocVersion>().map_err(anyhow::Error::msg)?,
        None => PandocVersion::detect(&pandoc_path).unwrap_or_else(|err| {
            let fallback = PandocVersion::default();
            log!("warning"; "{:#}, assuming pandoc {}", err, fallback);
            fallback
        }),
    };

    let citation = if common.no_citeproc {
        CitationMode::External(None)
    } else {
        match &common.citeproc {
            Some(mode) => mode.parse().map_err(ConfigError::UnknownProcessor)?,
            None => CitationMode::Integrated,
        }
    };

    let default_processor = match &common.default_bib_processor {
        Some(name) => name.parse::<BibProcessor>().map_err(ConfigError::UnknownProcessor)?,
        None => BibProcessor::BibTex,
    };

    Ok(Settings {
        pandoc_path,
        pandoc_version,
        output_dir: expand_path(&common.output_dir),
        csl_dir: cli.csl_dir.as_deref().map(expand_path),
        templates_dir: cli.templates_dir.as_deref().map(expand_path),
        same_output_dir: common.same_output_dir,
        citation,
        default_processor,
        no_cite_cmd,
        dry_run: cli.dry_run,
    })
}

/// The `--post-processor` hook, if any.
pub fn post_processor(cli: &Cli, config: &Configuration) -> Result<Option<CommandHook>> {
    cli.post_processor
        .as_deref()
        .map(|command| CommandHook::parse(command, &config.settings().output_dir))
        .transpose()
}
