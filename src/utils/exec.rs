//! Running external programs.
//!
//! Pandoc, TeX engines, bibliography processors and post-processor hooks
//! all go through [`Cmd`]. Programs are spawned directly, never through a
//! shell, and their output is captured as text.
//!
//! ```ignore
//! // Fails on a non-zero exit status
//! let version = Cmd::new("pandoc").arg("--version").echo(Echo::Nothing).run()?;
//!
//! // Plan steps: a failed run is still a `Captured`
//! let captured = Cmd::new("pdflatex").args(["paper.tex"]).cwd(&files_dir).capture()?;
//! if !captured.success() { ... }
//! ```

use crate::log;
use anyhow::{Context, Result, bail};
use regex::Regex;
use std::{
    borrow::Cow,
    ffi::{OsStr, OsString},
    io::Write,
    path::{Path, PathBuf},
    process::{Command, ExitStatus, Stdio},
    sync::LazyLock,
};

// ============================================================================
// Cmd
// ============================================================================

/// An external program invocation.
#[derive(Debug, Default)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    envs: Vec<(String, String)>,
    input: Option<Vec<u8>>,
    echo: Echo,
}

impl Cmd {
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            ..Default::default()
        }
    }

    /// First element is the program, the rest are arguments.
    ///
    /// An empty slice yields a command that fails to spawn.
    pub fn from_slice<S: AsRef<OsStr>>(command: &[S]) -> Self {
        match command.split_first() {
            Some((program, rest)) => Self::new(program).args(rest),
            None => Self::default(),
        }
    }

    /// Append an argument. Empty arguments are dropped.
    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        let arg = arg.as_ref();
        if !arg.is_empty() {
            self.args.push(arg.to_owned());
        }
        self
    }

    pub fn args<I, S>(self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        args.into_iter().fold(self, Self::arg)
    }

    pub fn cwd<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.cwd = Some(dir.as_ref().to_owned());
        self
    }

    /// Extra environment variables on top of the inherited ones.
    pub fn envs<K, V, I>(mut self, vars: I) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.envs.extend(
            vars.into_iter()
                .map(|(k, v)| (k.as_ref().to_owned(), v.as_ref().to_owned())),
        );
        self
    }

    /// Bytes written to the child's stdin.
    pub fn stdin<D: Into<Vec<u8>>>(mut self, data: D) -> Self {
        self.input = Some(data.into());
        self
    }

    /// What to do with stderr of a successful [`run`](Self::run).
    pub fn echo(mut self, echo: Echo) -> Self {
        self.echo = echo;
        self
    }

    /// The program as shown in messages.
    pub fn name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    /// Run to completion, failing on a non-zero exit status.
    pub fn run(self) -> Result<Captured> {
        let name = self.name();
        let echo = self.echo;
        let captured = self.capture()?;
        if !captured.success() {
            bail!(captured.describe_failure(&name, echo));
        }
        echo.emit(&name, &captured.stderr);
        Ok(captured)
    }

    /// Run to completion whatever the exit status.
    ///
    /// Only spawn failures (missing program, bad directory) are errors.
    pub fn capture(self) -> Result<Captured> {
        let name = self.name();
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .envs(self.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(if self.input.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.cwd {
            command.current_dir(dir);
        }

        let mut child = command
            .spawn()
            .with_context(|| format!("Failed to execute `{name}`"))?;
        if let Some(data) = &self.input
            && let Some(mut stdin) = child.stdin.take()
        {
            stdin
                .write_all(data)
                .with_context(|| format!("Failed to write stdin to `{name}`"))?;
        }

        let output = child
            .wait_with_output()
            .with_context(|| format!("Failed to wait for `{name}`"))?;
        Ok(Captured {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

// ============================================================================
// Captured output
// ============================================================================

/// Exit status and decoded output of a finished program.
#[derive(Debug)]
pub struct Captured {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl Captured {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Stdout followed by stderr, as a TeX log reader wants it.
    pub fn combined(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }

    /// Multi-line failure report: status line, stderr, then stdout.
    pub fn describe_failure(&self, name: &str, echo: Echo) -> String {
        let mut message = format!("Command `{name}` failed with {}", self.status);
        let stderr = echo.filter(&self.stderr);
        if !stderr.is_empty() {
            message.push('\n');
            message.push_str(&stderr);
        }
        let stdout = self.stdout.trim();
        if !stdout.is_empty() {
            message.push_str("\nStdout:\n");
            message.push_str(stdout);
        }
        message
    }
}

// ============================================================================
// Echo
// ============================================================================

/// Which stderr lines reach the terminal.
#[derive(Debug, Clone, Copy, Default)]
pub enum Echo {
    #[default]
    All,
    Nothing,
    /// Everything but lines starting with one of these prefixes.
    Skipping(&'static [&'static str]),
}

/// Pandoc chatter that is not worth showing on every save.
pub const PANDOC_NOISE: Echo = Echo::Skipping(&["[WARNING] Could not deduce format"]);

impl Echo {
    fn keeps(self, line: &str) -> bool {
        match self {
            Self::All => true,
            Self::Nothing => false,
            Self::Skipping(prefixes) => !prefixes.iter().any(|p| line.starts_with(p)),
        }
    }

    /// Non-blank lines of `text` that pass, colors stripped.
    pub fn filter(self, text: &str) -> String {
        text.lines()
            .map(strip_ansi)
            .filter(|line| !line.trim().is_empty() && self.keeps(line.trim()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Log what passes under the `name` prefix.
    pub fn emit(self, name: &str, text: &str) {
        if matches!(self, Self::Nothing) {
            return;
        }
        let kept = self.filter(text);
        if !kept.is_empty() {
            log!(name; "{}", kept);
        }
    }
}

/// Split a command line into words the way a POSIX shell would, without
/// expansion: single quotes are literal, double quotes allow `\"` and `\\`,
/// a backslash outside quotes escapes the next character.
pub fn split_words(line: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut word: Option<String> = None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => words.extend(word.take()),
            '\'' => {
                let current = word.get_or_insert_with(String::new);
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => current.push(c),
                        None => bail!("unterminated single quote in `{line}`"),
                    }
                }
            }
            '"' => {
                let current = word.get_or_insert_with(String::new);
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(c @ ('"' | '\\' | '$' | '`')) => current.push(c),
                            Some(c) => current.extend(['\\', c]),
                            None => bail!("unterminated double quote in `{line}`"),
                        },
                        Some(c) => current.push(c),
                        None => bail!("unterminated double quote in `{line}`"),
                    }
                }
            }
            '\\' => match chars.next() {
                Some(c) => word.get_or_insert_with(String::new).push(c),
                None => bail!("trailing backslash in `{line}`"),
            },
            c => word.get_or_insert_with(String::new).push(c),
        }
    }
    words.extend(word);
    Ok(words)
}

pub fn strip_ansi(s: &str) -> Cow<'_, str> {
    static ANSI: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*m").unwrap());
    ANSI.replace_all(s, "")
}
