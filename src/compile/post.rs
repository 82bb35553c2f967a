//! Post-processing of compiled documents.
//!
//! The compiler only knows the [`PostProcessor`] capability. The shipped
//! implementation runs an external command with the results on stdin:
//!
//! ```text
//! pndconf -p "python3 publish.py --site \$PNDCONF_OUTPUT_DIR" watch -w ~/notes
//! ```
//!
//! ```json
//! [{"in_file": "/notes/a.md", "out_file": "/notes/out/a.html", "format": "html"}]
//! ```

use super::CompileResult;
use crate::log;
use crate::utils::exec::{Cmd, Echo, split_words};
use anyhow::{Context, Result, bail};
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};

/// Receives the successful results of a compilation round.
pub trait PostProcessor {
    fn handle(&self, results: &[CompileResult]) -> Result<()>;
}

/// Runs a user command, results as JSON on stdin.
#[derive(Debug, Clone)]
pub struct CommandHook {
    command: Vec<String>,
    output_dir: PathBuf,
}

impl CommandHook {
    /// Split `command` into words, honoring shell quotes. Empty commands are rejected.
    pub fn parse(command: &str, output_dir: &Path) -> Result<Self> {
        let command = split_words(command).context("invalid post-processor command")?;
        if command.is_empty() {
            bail!("post-processor command is empty");
        }
        Ok(Self {
            command,
            output_dir: output_dir.to_path_buf(),
        })
    }

    pub fn program(&self) -> &str {
        &self.command[0]
    }

    /// `$PNDCONF_*` variables, also substituted in the arguments.
    fn vars(&self, results: &[CompileResult]) -> FxHashMap<String, String> {
        let mut vars = FxHashMap::default();
        vars.insert("PNDCONF_OUTPUT_DIR".into(), self.output_dir.display().to_string());
        vars.insert("PNDCONF_COUNT".into(), results.len().to_string());
        vars
    }
}

/// Replace `$PNDCONF_XXX` in `args` with values from `vars`.
fn resolve_args(args: &[String], vars: &FxHashMap<String, String>) -> Vec<String> {
    args.iter()
        .map(|arg| {
            let mut result = arg.clone();
            for (key, value) in vars {
                result = result.replace(&format!("${key}"), value);
            }
            result
        })
        .collect()
}

impl PostProcessor for CommandHook {
    fn handle(&self, results: &[CompileResult]) -> Result<()> {
        let vars = self.vars(results);
        let command = resolve_args(&self.command, &vars);
        let payload = serde_json::to_string(results)?;

        log!("post"; "`{}` with {} result(s)", self.program(), results.len());
        let output = Cmd::from_slice(&command)
            .envs(&vars)
            .stdin(payload)
            .echo(Echo::Nothing)
            .run()?;

        let stdout = output.stdout.trim();
        if !stdout.is_empty() {
            println!("{stdout}");
        }
        Ok(())
    }
}
