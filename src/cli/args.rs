//! Command-line interface definitions.

use crate::watch::{DEFAULT_EXCLUDE_REGEXP, DEFAULT_EXTENSIONS, DEFAULT_IGNORED};
use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Pandoc configuration manager and file watcher
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file to read (default: the built-in configuration)
    #[arg(short = 'c', long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config_file: Option<String>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print the commands instead of running them
    #[arg(short = 'n', long, global = true)]
    pub dry_run: bool,

    /// Pandoc executable (default: `pandoc` on PATH)
    #[arg(long, global = true, value_hint = clap::ValueHint::ExecutablePath)]
    pub pandoc_path: Option<String>,

    /// Assume this pandoc version instead of asking pandoc, e.g. 2.19.2
    #[arg(long, global = true)]
    pub pandoc_version: Option<String>,

    /// Directory searched for CSL styles
    #[arg(long, global = true, value_hint = clap::ValueHint::DirPath)]
    pub csl_dir: Option<String>,

    /// Directory searched for pandoc templates
    #[arg(long, global = true, value_hint = clap::ValueHint::DirPath)]
    pub templates_dir: Option<String>,

    /// Command run after each compilation round, results as JSON on stdin
    #[arg(short, long, global = true)]
    pub post_processor: Option<String>,

    /// Print the built-in configuration and exit
    #[arg(long)]
    pub dump_default_config: bool,

    /// Print the configured options of the requested formats and exit
    #[arg(long, global = true)]
    pub print_generation_opts: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Convert files once
    #[command(visible_alias = "c")]
    Convert {
        #[command(flatten)]
        args: ConvertArgs,
    },

    /// Watch a directory and convert documents when they change
    #[command(visible_alias = "w")]
    Watch {
        #[command(flatten)]
        args: WatchArgs,
    },
}

impl Commands {
    pub fn common(&self) -> &CommonArgs {
        match self {
            Self::Convert { args } => &args.common,
            Self::Watch { args } => &args.common,
        }
    }
}

/// Arguments shared by `convert` and `watch`.
#[derive(clap::Args, Debug, Clone)]
pub struct CommonArgs {
    /// Output formats, comma separated (e.g. `pdf,html`)
    #[arg(short, long, value_delimiter = ',', default_value = "pdf")]
    pub generation: Vec<String>,

    /// Directory for output files
    #[arg(short, long, default_value = ".", value_hint = clap::ValueHint::DirPath)]
    pub output_dir: String,

    /// Citation processing: integrated, external, bibtex or biber
    #[arg(long, value_name = "MODE")]
    pub citeproc: Option<String>,

    /// Process citations with bibtex or biber instead of pandoc
    #[arg(long, conflicts_with = "citeproc")]
    pub no_citeproc: bool,

    /// External processor when the options do not name one (bibtex or biber)
    #[arg(long, value_name = "PROCESSOR")]
    pub default_bib_processor: Option<String>,

    /// Write TeX and PDF next to the document instead of `<output>/<name>_files`
    #[arg(long)]
    pub same_output_dir: bool,

    /// Pandoc options after `--`, overriding the config file and the document
    #[arg(last = true, allow_hyphen_values = true, value_name = "PANDOC_OPTS")]
    pub pandoc_args: Vec<String>,
}

/// `convert` arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct ConvertArgs {
    /// Input files, comma or space separated
    #[arg(required = true, value_delimiter = ',', value_hint = clap::ValueHint::FilePath)]
    pub files: Vec<String>,

    /// Skip bibtex/biber and the extra typesetting passes
    #[arg(long)]
    pub no_cite_cmd: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// `watch` arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct WatchArgs {
    /// Directory to watch
    #[arg(short, long, default_value = ".", value_hint = clap::ValueHint::DirPath)]
    pub watch_dir: String,

    /// Only watch these files (comma separated)
    #[arg(short, long, value_delimiter = ',')]
    pub input_files: Vec<String>,

    /// Extensions to watch
    #[arg(long, default_value = DEFAULT_EXTENSIONS)]
    pub watch_extensions: String,

    /// Extensions (`.pdf`) or folders (`bin`) to ignore
    #[arg(long, default_value = DEFAULT_IGNORED)]
    pub ignore_extensions: String,

    /// Regular expressions of paths to ignore
    #[arg(long, default_value = DEFAULT_EXCLUDE_REGEXP)]
    pub exclude_regexp: String,

    /// Files to ignore
    #[arg(long, default_value = "")]
    pub exclude_files: String,

    /// Match the exclude expressions case-sensitively
    #[arg(long)]
    pub no_exclude_ignore_case: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}
