//! `pndconf convert`: compile the given documents once.

use anyhow::{Result, bail};

use super::args::ConvertArgs;
use crate::compile::{PostProcessor, Report, compile_files};
use crate::config::Configuration;
use crate::log;
use crate::utils::path::expand_path;

pub fn convert_files(
    args: &ConvertArgs,
    config: &Configuration,
    post: Option<&dyn PostProcessor>,
) -> Result<Report> {
    let mut files = Vec::with_capacity(args.files.len());
    for file in &args.files {
        let path = expand_path(file);
        if path.is_file() {
            files.push(path);
        } else {
            log!("warning"; "{} does not exist, ignoring", file);
        }
    }
    if files.is_empty() {
        bail!("no input files present");
    }

    log!(
        "convert"; "{} file(s) to {} [{}]",
        files.len(),
        config.settings().output_dir.display(),
        args.common.generation.join(", ")
    );
    let report = compile_files(&files, config, &args.common.generation, post);

    if report.is_success() {
        log!("convert"; "done, {} output(s)", report.results.len());
    } else {
        log!("error"; "{} failure(s): {}", report.failures.len(), report.failures.join(", "));
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands, common::load_configuration};
    use clap::Parser;
    use std::fs;
    use tempfile::TempDir;

    fn run(args: &[&str]) -> Result<Report> {
        let cli = Cli::try_parse_from(args).unwrap();
        let Some(Commands::Convert { args }) = &cli.command else {
            panic!("expected convert");
        };
        let config = load_configuration(&cli, &args.common, args.no_cite_cmd)?;
        convert_files(args, &config, None)
    }

    #[test]
    fn test_missing_inputs_are_skipped() {
        let temp = TempDir::new().unwrap();
        let doc = temp.path().join("a.md");
        fs::write(&doc, "---\ntitle: A\n---\ntext\n").unwrap();
        let doc = doc.display().to_string();
        let missing = temp.path().join("missing.md").display().to_string();
        let out = temp.path().join("out").display().to_string();

        let report = run(&[
            "pndconf", "-n", "--pandoc-path", "true", "--pandoc-version", "3.1",
            "convert", &format!("{doc},{missing}"), "-g", "html", "-o", &out,
        ])
        .unwrap();

        assert!(report.is_success());
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].format, "html");
    }

    #[test]
    fn test_no_inputs_is_error() {
        let err = run(&[
            "pndconf", "-n", "--pandoc-path", "true", "--pandoc-version", "3.1",
            "convert", "/pndconf/none.md", "-g", "html",
        ])
        .unwrap_err();
        assert!(err.to_string().contains("no input files"));
    }
}
