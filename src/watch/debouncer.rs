use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use super::types::ChangeKind;
use crate::debug;
use crate::utils::path::normalize_path;

pub(super) const DEBOUNCE_MS: u64 = 300;

const WINDOW: Duration = Duration::from_millis(DEBOUNCE_MS);
const IDLE: Duration = Duration::from_secs(86_400);

/// Pending changes, released once the directory has been quiet for
/// [`DEBOUNCE_MS`].
pub(super) struct Debouncer {
    pub(super) changes: FxHashMap<PathBuf, ChangeKind>,
    pub(super) last_event: Option<Instant>,
}

impl Debouncer {
    pub(super) fn new() -> Self {
        Self {
            changes: FxHashMap::default(),
            last_event: None,
        }
    }

    pub(super) fn add_event(&mut self, event: &notify::Event) {
        debug!("watch"; "raw notify: {:?} {:?}", event.kind, event.paths);
        let Some(kind) = ChangeKind::from_event(&event.kind) else {
            return;
        };

        for path in event.paths.iter().filter(|p| !is_temp_file(p)) {
            let path = normalize_path(path);
            let merged = match self.changes.get(&path) {
                Some(&pending) => ChangeKind::merge(pending, kind),
                None => Some(kind),
            };
            match merged {
                Some(merged) => {
                    debug!("watch"; "{} {}", merged.label(), path.display());
                    self.changes.insert(path, merged);
                }
                None => {
                    debug!("watch"; "created and removed: {}", path.display());
                    self.changes.remove(&path);
                }
            }
            self.last_event = Some(Instant::now());
        }
    }

    /// Drain the pending changes if the window has closed.
    pub(super) fn take_if_ready(&mut self) -> Option<FxHashMap<PathBuf, ChangeKind>> {
        self.is_ready().then(|| {
            self.last_event = None;
            std::mem::take(&mut self.changes)
        })
    }

    pub(super) fn is_ready(&self) -> bool {
        !self.changes.is_empty() && self.last_event.is_some_and(|at| at.elapsed() >= WINDOW)
    }

    /// How long the watch loop may block before checking again.
    pub(super) fn sleep_duration(&self) -> Duration {
        match self.last_event {
            Some(at) => WINDOW.saturating_sub(at.elapsed()).max(Duration::from_millis(1)),
            None => IDLE,
        }
    }
}

/// Editor swap, lock and backup files.
pub(super) fn is_temp_file(path: &Path) -> bool {
    const TEMP_EXTENSIONS: [&str; 7] = ["bck", "bak", "backup", "swp", "swo", "swx", "tmp"];

    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    let temp_extension = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| TEMP_EXTENSIONS.contains(&ext));

    temp_extension
        || name.starts_with(".#")
        || name.ends_with('~')
        || (name.len() > 1 && name.starts_with('#') && name.ends_with('#'))
}
