//! Upload storage on the local filesystem.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use super::upload::AcceptedFile;

/// Numbered copies tried before giving up on a taken file name.
const MAX_COPIES: u32 = 100;

/// A directory tree that receives accepted uploads.
#[derive(Debug, Clone)]
pub struct UploadStorage {
    root: PathBuf,
}

impl UploadStorage {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether `relative` exists under the root.
    pub async fn exists(&self, relative: impl AsRef<Path>) -> bool {
        tokio::fs::try_exists(self.root.join(relative))
            .await
            .unwrap_or(false)
    }

    /// Create `relative` and any missing parents under the root.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    pub async fn create_dir_all(&self, relative: impl AsRef<Path>) -> std::io::Result<()> {
        tokio::fs::create_dir_all(self.root.join(relative)).await
    }

    /// Where `file` lives on disk.
    #[must_use]
    pub fn path_of(&self, file: &AcceptedFile) -> PathBuf {
        self.root.join(file.directory.as_str()).join(&file.file_name)
    }

    /// Write an accepted file, creating its directory when absent.
    ///
    /// Existing files are never overwritten: when the generated name is
    /// taken, the file is stored as a numbered copy instead. Returns the
    /// file as stored.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error, or `AlreadyExists` when every
    /// numbered copy is taken.
    pub async fn store(&self, file: &AcceptedFile, bytes: &[u8]) -> std::io::Result<AcceptedFile> {
        let directory = file.directory.as_str();
        if !self.exists(directory).await {
            self.create_dir_all(directory).await?;
        }

        for copy in 0..MAX_COPIES {
            let candidate = if copy == 0 {
                file.clone()
            } else {
                file.numbered(copy)
            };
            let path = self.path_of(&candidate);
            let mut out = match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(out) => out,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e),
            };

            if let Err(e) = write_all(&mut out, bytes).await {
                drop(out);
                let _ = tokio::fs::remove_file(&path).await;
                return Err(e);
            }
            tracing::info!(path = %path.display(), "Stored upload");
            return Ok(candidate);
        }

        Err(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("no free name for {}", file.file_name),
        ))
    }

    /// Remove a stored file whose owning record was never saved.
    ///
    /// Failures are logged, not returned.
    pub async fn discard(&self, file: &AcceptedFile) {
        let path = self.path_of(file);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => tracing::info!(path = %path.display(), "Discarded upload"),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to discard upload");
            }
        }
    }
}

async fn write_all(out: &mut tokio::fs::File, bytes: &[u8]) -> std::io::Result<()> {
    out.write_all(bytes).await?;
    out.flush().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::upload::UploadDirectory;

    fn accepted(file_name: &str) -> AcceptedFile {
        AcceptedFile {
            directory: UploadDirectory::Menu,
            file_name: file_name.to_string(),
            relative_path: format!("/uploads/menu/{file_name}"),
            width: 1,
            height: 1,
        }
    }

    #[tokio::test]
    async fn test_store_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let storage = UploadStorage::new(&root);
        let file = accepted("1_dish.png");

        assert!(!storage.exists("menu/1_dish.png").await);
        let stored = storage.store(&file, b"bytes").await.unwrap();

        assert_eq!(stored, file);
        let path = storage.path_of(&stored);
        assert_eq!(path, root.join("menu").join("1_dish.png"));
        assert!(storage.exists("menu/1_dish.png").await);
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"bytes");
    }

    #[tokio::test]
    async fn test_same_name_is_stored_as_numbered_copy() {
        let dir = tempfile::tempdir().unwrap();
        let storage = UploadStorage::new(dir.path());
        let file = accepted("1700000000_dish.png");

        let first = storage.store(&file, b"first").await.unwrap();
        let second = storage.store(&file, b"second").await.unwrap();

        assert_eq!(first.file_name, "1700000000_dish.png");
        assert_eq!(second.file_name, "1700000000_dish-1.png");
        assert_eq!(second.relative_path, "/uploads/menu/1700000000_dish-1.png");
        assert_eq!(tokio::fs::read(storage.path_of(&first)).await.unwrap(), b"first");
        assert_eq!(tokio::fs::read(storage.path_of(&second)).await.unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_discard_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = UploadStorage::new(dir.path());

        let stored = storage.store(&accepted("2_soup.png"), b"x").await.unwrap();
        storage.discard(&stored).await;

        assert!(!storage.exists("menu/2_soup.png").await);
    }
}
