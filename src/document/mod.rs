//! Markdown documents and their front-matter.
//!
//! A [`Document`] is read fresh for every compilation request, nothing is
//! cached across edits.

mod frontmatter;

pub use frontmatter::{FrontMatter, FrontMatterError};

use crate::utils::path::normalize_path;
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Errors while loading a document. Either one skips the document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to read `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error(transparent)]
    FrontMatter(#[from] FrontMatterError),
}

/// A markdown document: absolute path, header and body.
#[derive(Debug, Clone)]
pub struct Document {
    path: PathBuf,
    front_matter: FrontMatter,
    body: String,
}

impl Document {
    /// Read and parse the document at `path`.
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let text =
            fs::read_to_string(path).map_err(|err| DocumentError::Io(path.to_path_buf(), err))?;
        Ok(Self::parse(path, &text)?)
    }

    /// Parse already-read `text` for the document at `path`.
    pub fn parse(path: &Path, text: &str) -> Result<Self, FrontMatterError> {
        let path = normalize_path(path);
        let (front_matter, body) = frontmatter::parse(&path, text)?;
        Ok(Self {
            front_matter,
            body: body.to_string(),
            path,
        })
    }

    /// Build from parts (tests and programmatic callers).
    pub fn from_parts(path: &Path, front_matter: FrontMatter, body: impl Into<String>) -> Self {
        Self {
            path: normalize_path(path),
            front_matter,
            body: body.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory containing the document.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("/"))
    }

    /// File name without extension.
    pub fn stem(&self) -> &str {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output")
    }

    pub fn front_matter(&self) -> &FrontMatter {
        &self.front_matter
    }

    /// Text after the header, used for citation scanning.
    pub fn body(&self) -> &str {
        &self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_document() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("article.md");
        fs::write(&path, "---\ncsl: ieee\n---\nSee [@knuth84].\n").unwrap();

        let doc = Document::load(&path).unwrap();
        assert!(doc.path().is_absolute());
        assert_eq!(doc.stem(), "article");
        assert_eq!(doc.dir(), normalize_path(temp.path()));
        assert_eq!(doc.front_matter().get_str("csl"), Some("ieee"));
        assert_eq!(doc.body(), "See [@knuth84].\n");
    }

    #[test]
    fn test_load_missing_document() {
        let err = Document::load(Path::new("/nonexistent/article.md")).unwrap_err();
        assert!(matches!(err, DocumentError::Io(..)));
    }

    #[test]
    fn test_malformed_header_is_distinct_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.md");
        fs::write(&path, "---\ncsl: [ieee\n---\nbody\n").unwrap();

        let err = Document::load(&path).unwrap_err();
        assert!(matches!(err, DocumentError::FrontMatter(FrontMatterError::Yaml { .. })));
    }
}
