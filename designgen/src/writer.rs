//! File writer for generated artifacts.
//!
//! All filesystem access to the output directory goes through here, with
//! support for dry-run mode.

use crate::error::WriteError;
use std::path::{Path, PathBuf};

/// Result of a write operation.
#[derive(Debug)]
pub enum WriteResult {
    /// File was written successfully.
    Written {
        /// Path to the written file.
        path: PathBuf,
        /// Number of bytes written.
        bytes: usize,
    },
    /// Dry run - content was not written.
    DryRun {
        /// Path where content would have been written.
        path: PathBuf,
    },
}

/// File writer rooted at the output directory, with dry-run support.
#[derive(Debug)]
pub struct FileWriter {
    root: PathBuf,
    dry_run: bool,
}

impl FileWriter {
    /// Create a writer for paths relative to `root`.
    pub fn new(root: impl Into<PathBuf>, dry_run: bool) -> Self {
        Self {
            root: root.into(),
            dry_run,
        }
    }

    /// Absolute location of a relative artifact path.
    pub fn resolve(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }

    /// Read the current content of an artifact, `None` when absent.
    pub fn read(&self, relative: &Path) -> Result<Option<String>, WriteError> {
        let path = self.resolve(relative);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(WriteError::ReadFile { path, source: e }),
        }
    }

    /// Write content to an artifact path.
    ///
    /// In dry-run mode, nothing is written.
    pub fn write(&self, relative: &Path, content: &str) -> Result<WriteResult, WriteError> {
        let path = self.resolve(relative);
        if self.dry_run {
            return Ok(WriteResult::DryRun { path });
        }

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| WriteError::CreateDir {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        std::fs::write(&path, content).map_err(|e| WriteError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        Ok(WriteResult::Written {
            path,
            bytes: content.len(),
        })
    }

    /// Delete an artifact. Returns whether a file was (or would be) removed.
    pub fn remove(&self, relative: &Path) -> Result<bool, WriteError> {
        let path = self.resolve(relative);
        if !path.exists() {
            return Ok(false);
        }
        if self.dry_run {
            return Ok(true);
        }
        std::fs::remove_file(&path).map_err(|e| WriteError::RemoveFile {
            path: path.clone(),
            source: e,
        })?;
        Ok(true)
    }

    /// Check if running in dry-run mode.
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}

impl WriteResult {
    /// Get the path associated with this result.
    pub fn path(&self) -> &Path {
        match self {
            WriteResult::Written { path, .. } => path,
            WriteResult::DryRun { path } => path,
        }
    }

    /// Check if the write was performed (not dry-run).
    pub fn was_written(&self) -> bool {
        matches!(self, WriteResult::Written { .. })
    }

    /// Get the number of bytes written (0 for dry-run).
    pub fn bytes(&self) -> usize {
        match self {
            WriteResult::Written { bytes, .. } => *bytes,
            WriteResult::DryRun { .. } => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_creates_directories() {
        let dir = TempDir::new().unwrap();
        let writer = FileWriter::new(dir.path(), false);
        let relative = Path::new("components/Button.tsx");

        let result = writer.write(relative, "export {};\n").unwrap();

        assert!(result.was_written());
        assert_eq!(result.bytes(), 11);
        assert_eq!(result.path(), dir.path().join(relative));
        assert_eq!(writer.read(relative).unwrap().as_deref(), Some("export {};\n"));
    }

    #[test]
    fn test_dry_run_does_not_write() {
        let dir = TempDir::new().unwrap();
        let writer = FileWriter::new(dir.path(), true);
        let relative = Path::new("tokens/colors.ts");

        let result = writer.write(relative, "export const colors = {} as const;\n").unwrap();

        assert!(matches!(result, WriteResult::DryRun { .. }));
        assert!(!result.was_written());
        assert!(!dir.path().join(relative).exists());
        assert!(writer.is_dry_run());
    }

    #[test]
    fn test_read_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let writer = FileWriter::new(dir.path(), false);
        assert_eq!(writer.read(Path::new("index.ts")).unwrap(), None);
    }

    #[test]
    fn test_remove() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("index.ts"), "x").unwrap();

        assert!(FileWriter::new(dir.path(), true).remove(Path::new("index.ts")).unwrap());
        assert!(dir.path().join("index.ts").exists());

        let writer = FileWriter::new(dir.path(), false);
        assert!(writer.remove(Path::new("index.ts")).unwrap());
        assert!(!dir.path().join("index.ts").exists());
        assert!(!writer.remove(Path::new("index.ts")).unwrap());
    }
}
