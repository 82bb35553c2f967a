//! Watch mode.
//!
//! ```text
//! notify → Debouncer (timing, dedup) → classify (documents, templates) → compile_files
//! ```
//!
//! Everything runs on the calling thread; notify delivers events through a
//! channel and Ctrl+C arrives on a second one.

mod classifier;
mod debouncer;
mod rules;
mod types;


pub use rules::{DEFAULT_EXCLUDE_REGEXP, DEFAULT_EXTENSIONS, DEFAULT_IGNORED, WatchRules};

use anyhow::{Context, Result};
use crossbeam::channel::{self, Receiver};
use notify::{RecursiveMode, Watcher};
use rustc_hash::FxHashMap;
use std::path::PathBuf;

use crate::compile::{PostProcessor, compile_files};
use crate::config::Configuration;
use crate::log;
use crate::logger::{status_detach, status_error, status_success, status_warning};
use debouncer::Debouncer;
use types::ChangeKind;

/// Watch `rules.watch_dir()` and recompile changed documents until Ctrl+C.
pub fn run<S: AsRef<str>>(
    rules: &WatchRules,
    config: &Configuration,
    formats: &[S],
    post: Option<&dyn PostProcessor>,
) -> Result<()> {
    let shutdown_rx = shutdown_channel()?;

    let (notify_tx, notify_rx) = channel::unbounded();
    let mut watcher = notify::recommended_watcher(move |res| {
        let _ = notify_tx.send(res);
    })?;
    watcher
        .watch(rules.watch_dir(), RecursiveMode::Recursive)
        .with_context(|| format!("Failed to watch {}", rules.watch_dir().display()))?;

    let formats: Vec<&str> = formats.iter().map(AsRef::as_ref).collect();
    log!(
        "watch"; "{} ({} document(s), generating {})",
        rules.watch_dir().display(),
        rules.watched_documents().len(),
        formats.join(", ")
    );

    let mut debouncer = Debouncer::new();
    loop {
        crossbeam::select! {
            recv(notify_rx) -> msg => match msg {
                Ok(Ok(event)) => debouncer.add_event(&event),
                Ok(Err(err)) => log!("watch"; "notify error: {}", err),
                Err(_) => break,
            },
            recv(shutdown_rx) -> _ => {
                status_detach();
                log!("watch"; "stopped");
                break;
            },
            default(debouncer.sleep_duration()) => {
                if let Some(changes) = debouncer.take_if_ready() {
                    process_changes(changes, rules, config, &formats, post);
                }
            }
        }
    }
    Ok(())
}

fn process_changes(
    changes: FxHashMap<PathBuf, ChangeKind>,
    rules: &WatchRules,
    config: &Configuration,
    formats: &[&str],
    post: Option<&dyn PostProcessor>,
) {
    let documents = classifier::classify(changes, rules);
    if documents.is_empty() {
        return;
    }

    status_detach();
    let report = compile_files(&documents, config, formats, post);

    let names: Vec<String> = documents
        .iter()
        .map(|d| rules.relative(d).display().to_string())
        .collect();
    if report.is_success() {
        status_success(&format!("compiled {} [{}]", names.join(", "), formats.join(", ")));
    } else if !report.results.is_empty() {
        status_warning(&format!(
            "compiled {} of {} output(s), failed: {}",
            report.results.len(),
            report.results.len() + report.failures.len(),
            report.failures.join(", ")
        ));
    } else {
        status_error(
            &format!("failed: {}", names.join(", ")),
            &report.failures.join("\n"),
        );
    }
}

/// Route Ctrl+C to a channel instead of terminating the process.
fn shutdown_channel() -> Result<Receiver<()>> {
    let (tx, rx) = channel::bounded(1);
    ctrlc::set_handler(move || {
        let _ = tx.try_send(());
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))?;
    Ok(rx)
}
