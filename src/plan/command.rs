//! Structured commands.
//!
//! A [`Command`] is program, arguments and working directory. It is only
//! turned into a shell string for display and dry runs; execution passes the
//! argument vector straight to the process.

use serde::Serialize;
use std::{
    borrow::Cow,
    fmt,
    path::{Path, PathBuf},
};

/// Role of a command inside a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    /// Create the artifact directory.
    Setup,
    /// Remove stale auxiliary files.
    Clean,
    /// Pandoc invocation.
    Convert,
    /// Citation command rewrite in the generated TeX source.
    Shim,
    /// TeX engine run.
    Typeset,
    /// `bibtex` / `biber` run.
    Bibliography,
}

impl Step {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Clean => "clean",
            Self::Convert => "convert",
            Self::Shim => "shim",
            Self::Typeset => "typeset",
            Self::Bibliography => "bibliography",
        }
    }
}

/// One external invocation with an explicit working directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Command {
    pub step: Step,
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl Command {
    pub fn new(step: Step, program: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            step,
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Shell form, always qualified with its directory:
    /// `cd '/notes' && pdflatex ... paper.tex`.
    pub fn to_shell(&self) -> String {
        let mut out = format!("cd {} && {}", quote(&self.cwd.display().to_string()), quote(&self.program));
        for arg in &self.args {
            out.push(' ');
            out.push_str(&quote(arg));
        }
        out
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_shell())
    }
}

/// A file the plan writes before running its first command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub contents: String,
}

impl GeneratedFile {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// POSIX single-quote `arg` unless it only has shell-safe characters.
pub fn quote(arg: &str) -> Cow<'_, str> {
    let safe = |c: char| c.is_ascii_alphanumeric() || "_-./=:,+@%^".contains(c);
    if !arg.is_empty() && arg.chars().all(safe) {
        Cow::Borrowed(arg)
    } else {
        Cow::Owned(format!("'{}'", arg.replace('\'', r"'\''")))
    }
}
