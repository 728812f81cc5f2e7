//! Note storage.
//!
//! All paths handed to a [`FileStore`] are vault-relative and `/`-separated
//! (`arena/research/Idea.md`), whatever the host platform.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::error::{ArenaError, Result};

#[async_trait]
pub trait FileStore: Send + Sync {
    async fn exists(&self, path: &str) -> bool;

    async fn is_folder(&self, path: &str) -> bool;

    /// Create a folder and its parents; existing folders are left alone
    async fn create_folder(&self, path: &str) -> Result<()>;

    async fn read(&self, path: &str) -> Result<String>;

    /// Create or overwrite a text file
    async fn write(&self, path: &str, content: &str) -> Result<()>;

    async fn write_binary(&self, path: &str, bytes: &[u8]) -> Result<()>;

    async fn rename(&self, from: &str, to: &str) -> Result<()>;

    /// Markdown files directly inside `folder`, sorted by path
    async fn list_markdown(&self, folder: &str) -> Result<Vec<String>>;
}

/// A vault backed by a directory on disk
#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a vault path. `..` and absolute components are
    /// dropped so nothing resolves outside the root.
    pub fn resolve(&self, path: &str) -> PathBuf {
        let mut full = self.root.clone();
        for part in path.split(['/', '\\']) {
            match part {
                "" | "." | ".." => continue,
                other => full.push(other),
            }
        }
        full
    }

    /// Vault path for a user-supplied file path (absolute or relative to the
    /// vault root). Returns `None` for files outside the vault.
    pub fn relativize(&self, path: &Path) -> Option<String> {
        let relative = if path.is_absolute() {
            path.strip_prefix(&self.root).ok()?.to_path_buf()
        } else {
            path.to_path_buf()
        };

        let mut parts = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
                Component::CurDir => {}
                _ => return None,
            }
        }
        (!parts.is_empty()).then(|| parts.join("/"))
    }

    fn to_vault_path(&self, full: &Path) -> Option<String> {
        let relative = full.strip_prefix(&self.root).ok()?;
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(parts.join("/"))
    }
}

#[async_trait]
impl FileStore for FsVault {
    async fn exists(&self, path: &str) -> bool {
        fs::try_exists(self.resolve(path)).await.unwrap_or(false)
    }

    async fn is_folder(&self, path: &str) -> bool {
        fs::metadata(self.resolve(path))
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    async fn create_folder(&self, path: &str) -> Result<()> {
        fs::create_dir_all(self.resolve(path)).await?;
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<String> {
        let full = self.resolve(path);
        match fs::read_to_string(&full).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ArenaError::note_not_found(path))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, path: &str, content: &str) -> Result<()> {
        fs::write(self.resolve(path), content).await?;
        Ok(())
    }

    async fn write_binary(&self, path: &str, bytes: &[u8]) -> Result<()> {
        fs::write(self.resolve(path), bytes).await?;
        Ok(())
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        fs::rename(self.resolve(from), self.resolve(to)).await?;
        Ok(())
    }

    async fn list_markdown(&self, folder: &str) -> Result<Vec<String>> {
        let full = self.resolve(folder);
        let mut entries = match fs::read_dir(&full).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ArenaError::FolderNotFound {
                    path: folder.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        let mut notes = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_md = path.extension().map(|ext| ext == "md").unwrap_or(false);
            if is_md && entry.file_type().await?.is_file() {
                if let Some(vault_path) = self.to_vault_path(&path) {
                    notes.push(vault_path);
                }
            }
        }
        notes.sort();
        Ok(notes)
    }
}
