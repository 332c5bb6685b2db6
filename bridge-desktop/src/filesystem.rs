//! File System Access Implementation using Tokio

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    fs::{FileMetadata, LocalFileSystem},
};
use bytes::Bytes;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Tokio-based file system implementation
pub struct TokioFileSystem;

impl TokioFileSystem {
    pub fn new() -> Self {
        Self
    }

    fn map_io_error(e: std::io::Error) -> BridgeError {
        BridgeError::Io(e)
    }
}

impl Default for TokioFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LocalFileSystem for TokioFileSystem {
    async fn stat(&self, path: &Path) -> Result<FileMetadata> {
        let metadata = fs::metadata(path).await.map_err(Self::map_io_error)?;

        Ok(FileMetadata {
            size: metadata.len(),
            modified_at: metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                .map(|d| d.as_secs() as i64),
            is_directory: metadata.is_dir(),
        })
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        fs::try_exists(path).await.map_err(Self::map_io_error)
    }

    async fn read_file(&self, path: &Path) -> Result<Bytes> {
        let data = fs::read(path).await.map_err(Self::map_io_error)?;
        debug!(path = ?path, size = data.len(), "Read file");
        Ok(Bytes::from(data))
    }

    async fn write_file(&self, path: &Path, data: Bytes) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(Self::map_io_error)?;
        }

        fs::write(path, data.as_ref())
            .await
            .map_err(Self::map_io_error)?;
        debug!(path = ?path, size = data.len(), "Wrote file");
        Ok(())
    }

    async fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).await.map_err(Self::map_io_error)?;
        debug!(path = ?path, "Created directory");
        Ok(())
    }

    async fn delete_file(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).await.map_err(Self::map_io_error)?;
        debug!(path = ?path, "Deleted file");
        Ok(())
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        fs::rename(from, to).await.map_err(Self::map_io_error)?;
        debug!(from = ?from, to = ?to, "Renamed file");
        Ok(())
    }

    async fn list_recursive(&self, path: &Path) -> Result<Vec<PathBuf>> {
        // Explicit worklist keeps traversal depth bounded.
        let mut files = Vec::new();
        let mut pending: VecDeque<PathBuf> = VecDeque::new();
        pending.push_back(path.to_path_buf());

        while let Some(dir) = pending.pop_front() {
            let mut read_dir = fs::read_dir(&dir).await.map_err(Self::map_io_error)?;

            while let Some(entry) = read_dir.next_entry().await.map_err(Self::map_io_error)? {
                let entry_path = entry.path();
                let file_type = entry.file_type().await.map_err(Self::map_io_error)?;

                if file_type.is_dir() {
                    pending.push_back(entry_path);
                } else if file_type.is_file() {
                    files.push(entry_path);
                }
            }
        }

        debug!(path = ?path, count = files.len(), "Listed directory tree");
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("drivesyncd-fs-test-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_write_read_delete() {
        let dir = scratch_dir("rw");
        let fs = TokioFileSystem::new();
        let file = dir.join("nested").join("file.txt");

        let data = Bytes::from("Hello, World!");
        fs.write_file(&file, data.clone()).await.unwrap();

        assert!(fs.exists(&file).await.unwrap());
        assert_eq!(fs.read_file(&file).await.unwrap(), data);

        let meta = fs.stat(&file).await.unwrap();
        assert_eq!(meta.size, 13);
        assert!(!meta.is_directory);
        assert!(meta.modified_at.is_some());

        fs.delete_file(&file).await.unwrap();
        assert!(!fs.exists(&file).await.unwrap());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_rename_replaces_destination() {
        let dir = scratch_dir("rename");
        let fs = TokioFileSystem::new();
        let a = dir.join("a.txt");
        let b = dir.join("b.txt");

        fs.write_file(&a, Bytes::from("new")).await.unwrap();
        fs.write_file(&b, Bytes::from("old")).await.unwrap();

        fs.rename(&a, &b).await.unwrap();
        assert!(!fs.exists(&a).await.unwrap());
        assert_eq!(fs.read_file(&b).await.unwrap(), Bytes::from("new"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_list_recursive_reports_files_only() {
        let dir = scratch_dir("list");
        let fs = TokioFileSystem::new();

        fs.write_file(&dir.join("a.txt"), Bytes::from("a"))
            .await
            .unwrap();
        fs.write_file(&dir.join("sub").join("b.txt"), Bytes::from("b"))
            .await
            .unwrap();
        fs.create_dir_all(&dir.join("empty")).await.unwrap();

        let mut listed = fs.list_recursive(&dir).await.unwrap();
        listed.sort();

        assert_eq!(listed, vec![dir.join("a.txt"), dir.join("sub").join("b.txt")]);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
