//! In-memory bundles of generated files.
//!
//! Every emitter returns a [`GeneratedCode`] bundle instead of touching
//! the filesystem, so a target that errors half way through never leaves
//! partial output behind. Writing happens in one place, after the whole
//! bundle exists.

use std::path::Path;

use serde::{Deserialize, Serialize};
use wsdl2rest_core::{Error, Result};

/// One emitted file, path relative to the bundle root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFile {
    /// Relative destination path
    pub path: String,
    /// File content
    pub content: String,
}

impl GeneratedFile {
    /// Creates a file entry.
    #[must_use]
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// The complete output of one emitter run.
///
/// # Examples
///
/// ```
/// use wsdl2rest_codegen::{GeneratedCode, GeneratedFile};
///
/// let mut bundle = GeneratedCode::new();
/// bundle.add_file(GeneratedFile::new("types.ts", "export interface A {}"));
/// assert_eq!(bundle.file_count(), 1);
/// assert!(bundle.find("types.ts").is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedCode {
    /// Emitted files in generation order
    pub files: Vec<GeneratedFile>,
}

impl GeneratedCode {
    /// Creates an empty bundle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a file to the bundle.
    pub fn add_file(&mut self, file: GeneratedFile) {
        self.files.push(file);
    }

    /// Number of files in the bundle.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Looks up a file by its relative path.
    #[must_use]
    pub fn find(&self, path: &str) -> Option<&GeneratedFile> {
        self.files.iter().find(|f| f.path == path)
    }

    /// Writes every file under `dir`, creating directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] on the first failed write; files already
    /// written stay on disk.
    pub fn write_to(&self, dir: &Path) -> Result<()> {
        for file in &self.files {
            let dest = dir.join(&file.path);
            if let Some(parent) = dest.parent() {
                std::fs::create_dir_all(parent).map_err(|source| Error::Io {
                    path: parent.display().to_string(),
                    source,
                })?;
            }
            std::fs::write(&dest, &file.content).map_err(|source| Error::Io {
                path: dest.display().to_string(),
                source,
            })?;
            tracing::debug!(path = %dest.display(), bytes = file.content.len(), "wrote file");
        }
        Ok(())
    }
}
