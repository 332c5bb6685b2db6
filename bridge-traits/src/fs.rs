//! Local Filesystem Abstraction
//!
//! The capability set the sync engine needs from the local side of the
//! replica: stat, whole-file read/write, recursive listing, recursive
//! mkdir, delete, existence check, and rename (used for atomic overwrite
//! of the persisted state document).

use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// File metadata information
#[derive(Debug, Clone)]
pub struct FileMetadata {
    pub size: u64,
    /// Modification time as Unix seconds, when the platform reports one.
    pub modified_at: Option<i64>,
    pub is_directory: bool,
}

/// Local file I/O trait
///
/// The engine awaits each call to completion before proceeding; there is no
/// concurrent access to a single path from within one reconciliation pass.
#[async_trait]
pub trait LocalFileSystem: Send + Sync {
    /// Get metadata for a file or directory
    async fn stat(&self, path: &Path) -> Result<FileMetadata>;

    /// Check if a file or directory exists
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Read entire file contents into memory
    async fn read_file(&self, path: &Path) -> Result<Bytes>;

    /// Write data to a file, creating it and its parent directories if needed
    async fn write_file(&self, path: &Path, data: Bytes) -> Result<()>;

    /// Create a directory and all parent directories if they don't exist
    async fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Delete a file
    async fn delete_file(&self, path: &Path) -> Result<()>;

    /// Rename a file, replacing the destination if it exists
    async fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    /// List all files under a directory recursively
    ///
    /// Returns file paths only; directories are traversed but not reported.
    async fn list_recursive(&self, path: &Path) -> Result<Vec<PathBuf>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_metadata() {
        let metadata = FileMetadata {
            size: 1024,
            modified_at: Some(1234567900),
            is_directory: false,
        };

        assert_eq!(metadata.size, 1024);
        assert!(!metadata.is_directory);
    }
}
