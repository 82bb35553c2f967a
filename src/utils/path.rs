//! Paths given on the command line, in config files and in document headers.

use std::path::{Path, PathBuf};

/// Canonical form of `path`, or its [`absolute`] form if it does not exist yet.
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| absolute(path))
}

/// `path` joined onto the working directory unless already absolute.
pub fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    }
}

/// Expand a leading `~` and normalize.
pub fn expand_path(path: &str) -> PathBuf {
    normalize_path(Path::new(shellexpand::tilde(path).as_ref()))
}

/// Rewrite a document-relative value (`./x`, `../x`) against `dir`.
///
/// Returns `None` for values that are not document-relative.
///
/// # Example
/// ```ignore
/// anchor_relative("./refs.bib", Path::new("/notes")) // Some("/notes/refs.bib")
/// anchor_relative("ieee", Path::new("/notes"))       // None
/// ```
pub fn anchor_relative(value: &str, dir: &Path) -> Option<String> {
    if let Some(rest) = value.strip_prefix("./") {
        Some(dir.join(rest).display().to_string())
    } else if value.starts_with("../") {
        Some(dir.join(value).display().to_string())
    } else {
        None
    }
}
