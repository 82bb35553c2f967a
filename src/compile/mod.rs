//! Plan execution.
//!
//! Commands of a plan run sequentially and blocking. A failed step is
//! logged and the remaining steps still run so the TeX log stays complete;
//! the format counts as failed if any step failed. Failures never spread to
//! other formats or documents.

mod post;

pub use post::{CommandHook, PostProcessor};

use crate::config::Configuration;
use crate::document::Document;
use crate::plan::{self, CommandPlan, Command, Step};
use crate::utils::exec::{Cmd, PANDOC_NOISE};
use crate::{debug, log};
use serde::Serialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// A produced artifact, handed to the post-processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompileResult {
    #[serde(rename = "in_file")]
    pub input: PathBuf,
    #[serde(rename = "out_file")]
    pub output: PathBuf,
    pub format: String,
}

/// Result of one command.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub step: Step,
    pub success: bool,
    /// Captured stdout and stderr, or the spawn error.
    pub output: String,
}

/// Result of one format of one document.
#[derive(Debug, Clone)]
pub struct FormatOutcome {
    pub format: String,
    pub input: PathBuf,
    pub output: PathBuf,
    pub steps: Vec<StepOutcome>,
    /// Failure before any command ran (e.g. unwritable generated file).
    pub error: Option<String>,
}

impl FormatOutcome {
    pub fn success(&self) -> bool {
        self.error.is_none() && self.steps.iter().all(|s| s.success)
    }

    pub fn result(&self) -> CompileResult {
        CompileResult {
            input: self.input.clone(),
            output: self.output.clone(),
            format: self.format.clone(),
        }
    }
}

/// Everything produced by a compilation round.
#[derive(Debug, Default)]
pub struct Report {
    pub results: Vec<CompileResult>,
    /// One line per failed document or format.
    pub failures: Vec<String>,
}

impl Report {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn merge(&mut self, other: Report) {
        self.results.extend(other.results);
        self.failures.extend(other.failures);
    }
}

// ============================================================================
// execution
// ============================================================================

/// Run `plan`. With `dry_run` only the commands are logged.
pub fn run_plan(plan: &CommandPlan, dry_run: bool) -> FormatOutcome {
    let mut outcome = FormatOutcome {
        format: plan.format.clone(),
        input: plan.input.clone(),
        output: plan.output.clone(),
        steps: Vec::with_capacity(plan.commands.len()),
        error: None,
    };

    if dry_run {
        for file in &plan.files {
            log!("dry-run"; "write {} ({} bytes)", file.path.display(), file.contents.len());
        }
        for command in &plan.commands {
            log!("dry-run"; "{}", command);
        }
        return outcome;
    }

    if let Err(err) = prepare(plan) {
        outcome.error = Some(format!("{err:#}"));
        return outcome;
    }

    for command in &plan.commands {
        debug!("compile"; "{}", command);
        let step = run_command(command);
        if !step.success {
            log!("error"; "{} step failed: {}", command.step.as_str(), command);
        }
        outcome.steps.push(step);
    }

    outcome
}

/// Write generated files and make sure the output directory exists.
fn prepare(plan: &CommandPlan) -> anyhow::Result<()> {
    use anyhow::Context;

    for file in &plan.files {
        fs::write(&file.path, &file.contents)
            .with_context(|| format!("Failed to write {}", file.path.display()))?;
    }
    if let Some(parent) = plan.output.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    Ok(())
}

fn run_command(command: &Command) -> StepOutcome {
    let result = Cmd::new(&command.program)
        .args(&command.args)
        .cwd(&command.cwd)
        .capture();

    let output = match result {
        Ok(output) => output,
        Err(err) => {
            return StepOutcome {
                step: command.step,
                success: false,
                output: format!("{err:#}"),
            };
        }
    };

    let success = output.success();
    match command.step {
        Step::Typeset => report_tex(&output.combined()),
        Step::Convert if success => PANDOC_NOISE.emit("pandoc", &output.stderr),
        _ if !success => log!("error"; "{}", output.describe_failure(&command.program, PANDOC_NOISE)),
        _ => {}
    }

    StepOutcome {
        step: command.step,
        success,
        output: output.combined(),
    }
}

/// Error and warning lines of a TeX run.
pub fn tex_diagnostics(log: &str) -> (Vec<&str>, Vec<&str>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    for line in log.lines() {
        let is_file_line_error = line
            .split(':')
            .nth(1)
            .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()));
        if line.starts_with('!') || is_file_line_error {
            errors.push(line);
        } else if line.contains("Warning:") {
            warnings.push(line);
        }
    }
    (errors, warnings)
}

fn report_tex(text: &str) {
    let (errors, warnings) = tex_diagnostics(text);
    for error in &errors {
        log!("error"; "{}", error);
    }
    if !warnings.is_empty() {
        debug!("typeset"; "{} warning(s)\n{}", warnings.len(), warnings.join("\n"));
    }
}

// ============================================================================
// documents
// ============================================================================

/// Plan and run every format of the document at `path`.
///
/// A document whose header cannot be parsed is skipped with an error.
pub fn compile_document<S: AsRef<str>>(path: &Path, config: &Configuration, formats: &[S]) -> Report {
    let mut report = Report::default();
    let document = match Document::load(path) {
        Ok(document) => document,
        Err(err) => {
            log!("error"; "skipping {}: {:#}", path.display(), anyhow::Error::from(err));
            report.failures.push(path.display().to_string());
            return report;
        }
    };

    let dry_run = config.settings().dry_run;
    for (format, plan) in plan::build(&document, config, formats) {
        let plan = match plan {
            Ok(plan) => plan,
            Err(err) => {
                log!("error"; "{} [{}]: {}", path.display(), format, err);
                report.failures.push(format!("{} [{format}]", path.display()));
                continue;
            }
        };

        log!("compile"; "{} -> {}", path.display(), plan.output.display());
        let outcome = run_plan(&plan, dry_run);
        if outcome.success() {
            report.results.push(outcome.result());
        } else {
            if let Some(error) = &outcome.error {
                log!("error"; "{}", error);
            }
            report.failures.push(format!("{} [{format}]", path.display()));
        }
    }
    report
}

/// Compile `paths` and hand the successful results to `post`.
pub fn compile_files<S: AsRef<str>>(
    paths: &[PathBuf],
    config: &Configuration,
    formats: &[S],
    post: Option<&dyn PostProcessor>,
) -> Report {
    let mut report = Report::default();
    for path in paths {
        report.merge(compile_document(path, config, formats));
    }

    if let Some(post) = post
        && !report.results.is_empty()
        && !config.settings().dry_run
        && let Err(err) = post.handle(&report.results)
    {
        log!("error"; "post-processor failed: {:#}", err);
        report.failures.push("post-processor".into());
    }
    report
}
