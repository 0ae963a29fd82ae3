//! Filename-addressed blob stores for fonts and template images.
//!
//! Each store is a flat directory. Names are validated before any path is
//! built so that callers can never escape the store root.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::CoreError;

/// Entity label for font misses.
pub const ENTITY_FONT: &str = "Font";

/// Entity label for template misses.
pub const ENTITY_TEMPLATE: &str = "Template";

/// Reject names that could address anything outside a flat directory.
pub fn safe_filename(name: &str) -> Result<&str, CoreError> {
    if name.is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name.starts_with('.')
        || name.contains("..")
    {
        return Err(CoreError::Validation("Invalid file name".to_string()));
    }
    Ok(name)
}

/// A directory of named files.
#[derive(Debug, Clone)]
pub struct AssetStore {
    root: PathBuf,
    entity: &'static str,
}

impl AssetStore {
    pub fn new(root: impl Into<PathBuf>, entity: &'static str) -> Self {
        Self {
            root: root.into(),
            entity,
        }
    }

    /// Font store rooted at `root`.
    pub fn fonts(root: impl Into<PathBuf>) -> Self {
        Self::new(root, ENTITY_FONT)
    }

    /// Template store rooted at `root`.
    pub fn templates(root: impl Into<PathBuf>) -> Self {
        Self::new(root, ENTITY_TEMPLATE)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entity(&self) -> &'static str {
        self.entity
    }

    fn path(&self, name: &str) -> Result<PathBuf, CoreError> {
        Ok(self.root.join(safe_filename(name)?))
    }

    /// Read a file's bytes; a miss is [`CoreError::NotFound`] naming the file.
    pub async fn read(&self, name: &str) -> Result<Vec<u8>, CoreError> {
        let path = self.path(name)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(CoreError::not_found(self.entity, name))
            }
            Err(e) => Err(CoreError::Io(format!(
                "Failed to read {} '{name}': {e}",
                self.entity.to_lowercase()
            ))),
        }
    }

    pub async fn exists(&self, name: &str) -> bool {
        match self.path(name) {
            Ok(path) => tokio::fs::metadata(path)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Sorted names of the regular files in the store.
    pub async fn list(&self) -> Result<Vec<String>, CoreError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| CoreError::Io(format!("Failed to create asset folder: {e}")))?;

        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| CoreError::Io(format!("Failed to list asset folder: {e}")))?;

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CoreError::Io(format!("Failed to list asset folder: {e}")))?
        {
            let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
            if is_file {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Store `bytes` under `name`, replacing any existing file.
    pub async fn put(&self, name: &str, bytes: &[u8]) -> Result<(), CoreError> {
        let path = self.path(name)?;
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| CoreError::Io(format!("Failed to create asset folder: {e}")))?;
        tokio::fs::write(&path, bytes).await.map_err(|e| {
            CoreError::Io(format!(
                "Failed to save {}: {e}",
                self.entity.to_lowercase()
            ))
        })?;
        tracing::info!(entity = self.entity, name, size = bytes.len(), "Asset stored");
        Ok(())
    }

    /// Delete `name`; a miss is [`CoreError::NotFound`].
    pub async fn remove(&self, name: &str) -> Result<(), CoreError> {
        let path = self.path(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(entity = self.entity, name, "Asset deleted");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(CoreError::not_found(self.entity, name))
            }
            Err(e) => Err(CoreError::Io(format!(
                "Failed to delete {}: {e}",
                self.entity.to_lowercase()
            ))),
        }
    }
}
