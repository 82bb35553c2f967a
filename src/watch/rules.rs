//! Which files under the watch directory are documents.

use anyhow::{Context, Result};
use jwalk::WalkDir;
use regex::{Regex, RegexBuilder};
use std::path::{Path, PathBuf};

pub const DEFAULT_EXTENSIONS: &str = ".md";
pub const DEFAULT_IGNORED: &str = ".pdf,.tex,doc,bin,common";
pub const DEFAULT_EXCLUDE_REGEXP: &str = "#,~,readme.md,changelog.md";

/// Include and exclude rules, matched against the watch-relative path.
#[derive(Debug, Clone)]
pub struct WatchRules {
    watch_dir: PathBuf,
    extensions: Vec<String>,
    ignored_extensions: Vec<String>,
    ignored_folders: Vec<String>,
    excluded_files: Vec<String>,
    excluded: Vec<Regex>,
    /// Explicit `--input-files`; when set nothing else is watched.
    inputs: Option<Vec<PathBuf>>,
}

impl WatchRules {
    /// Rules with the default inclusions and exclusions.
    pub fn new(watch_dir: &Path) -> Self {
        let mut rules = Self {
            watch_dir: watch_dir.to_path_buf(),
            extensions: split_list(DEFAULT_EXTENSIONS),
            ignored_extensions: Vec::new(),
            ignored_folders: Vec::new(),
            excluded_files: Vec::new(),
            excluded: compile_patterns(DEFAULT_EXCLUDE_REGEXP, true).unwrap_or_default(),
            inputs: None,
        };
        rules.set_ignored(DEFAULT_IGNORED);
        rules
    }

    pub fn watch_dir(&self) -> &Path {
        &self.watch_dir
    }

    /// Comma separated extensions to watch, e.g. `.md,.markdown`.
    pub fn set_extensions(&mut self, list: &str) {
        self.extensions = split_list(list);
    }

    /// Comma separated list; entries starting with `.` are extensions,
    /// anything else a folder name.
    pub fn set_ignored(&mut self, list: &str) {
        let (extensions, folders) = split_list(list).into_iter().partition(|e| e.starts_with('.'));
        self.ignored_extensions = extensions;
        self.ignored_folders = folders;
    }

    pub fn set_excluded_files(&mut self, list: &str) {
        self.excluded_files = split_list(list);
    }

    /// Comma separated regular expressions, matched anywhere in the path.
    pub fn set_exclude_regexp(&mut self, list: &str, ignore_case: bool) -> Result<()> {
        self.excluded = compile_patterns(list, ignore_case)?;
        Ok(())
    }

    /// Restrict the watch set to `files`.
    pub fn set_inputs(&mut self, files: Vec<PathBuf>) {
        self.inputs = Some(files);
    }

    /// Path relative to the watch directory, as matched by the rules.
    pub fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.watch_dir).unwrap_or(path)
    }

    pub fn is_watched(&self, path: &Path) -> bool {
        if let Some(inputs) = &self.inputs {
            return inputs.iter().any(|input| input == path);
        }

        let relative = self.relative(path);
        let text = relative.to_string_lossy();
        let text = text.as_ref();

        // Folders match whole components: `doc` excludes `doc/a.md`, not `document.md`.
        let in_ignored_folder = relative
            .parent()
            .is_some_and(|dir| dir.iter().any(|c| self.ignored_folders.iter().any(|f| c == f.as_str())));

        self.extensions.iter().any(|ext| text.ends_with(ext.as_str()))
            && !self.ignored_extensions.iter().any(|ext| text.ends_with(ext.as_str()))
            && !in_ignored_folder
            && !self.excluded_files.iter().any(|file| relative.ends_with(file))
            && !self.excluded.iter().any(|re| re.is_match(text))
    }

    /// Every watched document currently on disk.
    pub fn watched_documents(&self) -> Vec<PathBuf> {
        if let Some(inputs) = &self.inputs {
            return inputs.iter().filter(|p| p.is_file()).cloned().collect();
        }
        let mut documents: Vec<PathBuf> = WalkDir::new(&self.watch_dir)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path())
            .filter(|p| self.is_watched(p))
            .collect();
        documents.sort();
        documents
    }
}

fn compile_patterns(list: &str, ignore_case: bool) -> Result<Vec<Regex>> {
    split_list(list)
        .iter()
        .map(|pattern| {
            RegexBuilder::new(pattern)
                .case_insensitive(ignore_case)
                .build()
                .with_context(|| format!("invalid exclude pattern `{pattern}`"))
        })
        .collect()
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
