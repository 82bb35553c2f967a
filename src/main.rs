//! pndconf - pandoc configuration manager and file watcher.

#![allow(dead_code)]

mod assets;
mod bibliography;
mod cli;
mod compile;
mod config;
mod document;
mod logger;
mod options;
mod pandoc;
mod plan;
mod utils;
mod watch;

use anyhow::Result;
use clap::{ColorChoice, CommandFactory, Parser};
use cli::{Cli, Commands};
use compile::PostProcessor;
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    if cli.dump_default_config {
        print!("{}", config::DEFAULT_CONFIG);
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = &cli.command else {
        Cli::command().print_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    let no_cite_cmd = matches!(command, Commands::Convert { args } if args.no_cite_cmd);
    let common = command.common();
    let config = cli::common::load_configuration(&cli, common, no_cite_cmd)?;

    if cli.print_generation_opts {
        print!("{}", config.generation_opts(&common.generation));
        return Ok(ExitCode::SUCCESS);
    }

    let hook = cli::common::post_processor(&cli, &config)?;
    let post = hook.as_ref().map(|hook| hook as &dyn PostProcessor);

    match command {
        Commands::Convert { args } => {
            let report = cli::convert::convert_files(args, &config, post)?;
            Ok(if report.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Watch { args } => {
            cli::watch::watch_dir(args, &config, post)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
