//! JSON document storage for user bookkeeping files.
//!
//! Each document is read and written whole. A missing file reads as the
//! type's default value.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tracing::debug;

/// A JSON file holding one `T`
#[derive(Debug, Clone)]
pub struct JsonDocument<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonDocument<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the document, returning the default when the file is absent
    pub async fn load(&self) -> Result<T> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No document at {:?}, using default", self.path);
                return Ok(T::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {:?}", self.path));
            }
        };

        serde_json::from_slice(&bytes).with_context(|| format!("Failed to parse {:?}", self.path))
    }

    /// Replaces the document on disk
    pub async fn save(&self, value: &T) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create directory {:?}", parent))?;
            }
        }

        let bytes = serde_json::to_vec_pretty(value)?;
        let mut temp_name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "document".into());
        temp_name.push(".tmp");
        let temp_path = self.path.with_file_name(temp_name);

        fs::write(&temp_path, &bytes)
            .await
            .with_context(|| format!("Failed to write {:?}", temp_path))?;
        fs::rename(&temp_path, &self.path)
            .await
            .with_context(|| format!("Failed to move {:?} to {:?}", temp_path, self.path))?;

        Ok(())
    }
}
