//! Terminal output.
//!
//! - `log!("module"; ...)` prints a line under a colored `[module]` prefix
//! - `debug!` does the same, only with `--verbose`
//! - the `status_*` functions keep a single, overwritten status block for
//!   watch mode
//!
//! ```ignore
//! log!("compile"; "{} -> {}", input.display(), output.display());
//! log!("warning"; "csl file for \"{}\" not found", name);
//! ```

use crossterm::{
    cursor, queue,
    terminal::{Clear, ClearType},
};
use owo_colors::{OwoColorize, Style};
use parking_lot::Mutex;
use std::{
    io::{Write, stdout},
    sync::atomic::{AtomicBool, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

static VERBOSE: AtomicBool = AtomicBool::new(false);

pub fn set_verbose(verbose: bool) {
    VERBOSE.store(verbose, Ordering::Relaxed);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

// ============================================================================
// macros
// ============================================================================

#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// `log!` that prints only with `--verbose`.
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

pub fn log(module: &str, message: &str) {
    let prefix = format!("[{module}]");
    let mut out = stdout().lock();
    queue!(out, Clear(ClearType::UntilNewLine)).ok();
    writeln!(out, "{} {message}", prefix.style(prefix_style(module))).ok();
    out.flush().ok();
}

fn prefix_style(module: &str) -> Style {
    let style = Style::new().bold();
    match module.to_ascii_lowercase().as_str() {
        "compile" | "pandoc" | "typeset" => style.bright_blue(),
        "watch" | "post" => style.bright_green(),
        "error" => style.bright_red(),
        "warning" => style.red(),
        "dry-run" => style.bright_magenta(),
        _ => style.bright_yellow(),
    }
}

// ============================================================================
// watch status
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Done,
    Partial,
    Failed,
}

impl Mark {
    fn symbol(self) -> String {
        match self {
            Self::Done => "✓".green().to_string(),
            Self::Partial => "⚠".yellow().to_string(),
            Self::Failed => "✗".red().to_string(),
        }
    }
}

/// The last status block printed, replaced by the next one.
struct StatusBlock {
    height: usize,
}

static STATUS: Mutex<StatusBlock> = parking_lot::const_mutex(StatusBlock { height: 0 });

impl StatusBlock {
    fn show(&mut self, mark: Mark, message: &str) {
        let mut out = stdout().lock();
        if let Ok(lines) = u16::try_from(self.height)
            && lines > 0
        {
            queue!(out, cursor::MoveUp(lines), Clear(ClearType::FromCursorDown)).ok();
        }
        let stamp = format!("[{}]", clock(SystemTime::now()));
        writeln!(out, "{} {} {message}", stamp.dimmed(), mark.symbol()).ok();
        out.flush().ok();
        self.height = block_height(message);
    }
}

/// `HH:MM:SS` of `at`, UTC.
fn clock(at: SystemTime) -> String {
    let secs = at.duration_since(UNIX_EPOCH).map_or(0, |d| d.as_secs()) % 86_400;
    format!("{:02}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60)
}

fn block_height(message: &str) -> usize {
    message.lines().count().max(1)
}

pub fn status_success(message: &str) {
    STATUS.lock().show(Mark::Done, message);
}

/// Summary line, followed by `detail` when there is any.
pub fn status_error(summary: &str, detail: &str) {
    let message = match detail.trim() {
        "" => summary.to_string(),
        detail => format!("{summary}\n{detail}"),
    };
    STATUS.lock().show(Mark::Failed, &message);
}

pub fn status_warning(message: &str) {
    STATUS.lock().show(Mark::Partial, message);
}

/// Keep the current block on screen; the next status starts below it.
///
/// Called before regular log lines are printed.
pub fn status_detach() {
    STATUS.lock().height = 0;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_block_height() {
        assert_eq!(block_height(""), 1);
        assert_eq!(block_height("compiled notes/a.md"), 1);
        assert_eq!(block_height("failed: notes/a.md\npdf: step 4 failed\n  bibtex exit 2"), 3);
    }

    #[test]
    fn test_clock() {
        let at = UNIX_EPOCH + Duration::from_secs(2 * 86_400 + 13 * 3600 + 5 * 60 + 9);
        assert_eq!(clock(at), "13:05:09");
        assert_eq!(clock(UNIX_EPOCH), "00:00:00");
    }

    #[test]
    fn test_prefix_style_is_case_insensitive() {
        assert_eq!(
            format!("{}", "x".style(prefix_style("ERROR"))),
            format!("{}", "x".style(prefix_style("error")))
        );
    }

    #[test]
    fn test_detach_resets_height() {
        STATUS.lock().height = 4;
        status_detach();
        assert_eq!(STATUS.lock().height, 0);
    }
}
