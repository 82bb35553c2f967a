//! Turns debounced changes into the documents to recompile.

use std::fs;
use std::path::{Path, PathBuf};

use rustc_hash::{FxHashMap, FxHashSet};

use super::rules::WatchRules;
use super::types::ChangeKind;
use crate::debug;

/// Documents affected by `changes`, by path and without duplicates.
///
/// A changed document is recompiled itself. A changed file whose name ends
/// in `template` recompiles every watched document that mentions it with
/// `includes <template>`.
pub(super) fn classify(changes: FxHashMap<PathBuf, ChangeKind>, rules: &WatchRules) -> Vec<PathBuf> {
    let mut changes: Vec<_> = changes.into_iter().collect();
    changes.sort_by(|a, b| a.0.cmp(&b.0));

    let mut seen = FxHashSet::default();
    let mut documents = Vec::new();
    let mut push = |path: PathBuf| {
        if seen.insert(path.clone()) {
            documents.push(path);
        }
    };

    for (path, kind) in changes {
        if kind == ChangeKind::Removed {
            debug!("watch"; "ignoring removed {}", path.display());
            continue;
        }
        if rules.is_watched(&path) {
            push(path);
        } else if is_template(&path) {
            let including = documents_including(&path, rules);
            debug!("watch"; "template {} used by {} document(s)", path.display(), including.len());
            including.into_iter().for_each(&mut push);
        }
    }
    documents
}

fn is_template(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with("template"))
}

/// Watched documents whose text contains `includes <template>`, with the
/// template named by full path, watch-relative path or file name.
pub(super) fn documents_including(template: &Path, rules: &WatchRules) -> Vec<PathBuf> {
    let mut needles = vec![
        format!("includes {}", template.display()),
        format!("includes {}", rules.relative(template).display()),
    ];
    if let Some(name) = template.file_name() {
        needles.push(format!("includes {}", name.to_string_lossy()));
    }

    rules
        .watched_documents()
        .into_iter()
        .filter(|doc| {
            fs::read_to_string(doc).is_ok_and(|text| needles.iter().any(|n| text.contains(n.as_str())))
        })
        .collect()
}
