//! Asset Registry
//!
//! The durable storage directory for finalized model files, the naming and
//! collision-avoidance policy over it, and the listing/retrieval/deletion
//! operations. Listing is derived entirely from filesystem metadata; no
//! separate catalog is kept.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};

/// Extension finalized models are stored under
pub const MODEL_EXT: &str = "glb";

/// Metadata for one stored model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    /// Stored file name, e.g. `scene.glb`
    pub name: String,

    /// Size in bytes
    pub size: u64,

    /// Last-modified timestamp
    pub modified_at: DateTime<Utc>,
}

/// Check a client-supplied name for path traversal and separator characters.
///
/// Runs before any filesystem access; `..`, `/`, `\` and NUL are all
/// rejected, as are empty names.
pub fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains("..")
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains('\0')
}

async fn write_and_flush(file: &mut tokio::fs::File, data: &[u8]) -> std::io::Result<()> {
    file.write_all(data).await?;
    file.flush().await
}

fn validate_name(name: &str) -> Result<()> {
    if is_safe_name(name) {
        Ok(())
    } else {
        Err(AppError::InvalidInput(format!(
            "Unsafe model name: {:?}",
            name
        )))
    }
}

/// Durable registry of finalized model files
#[derive(Clone)]
pub struct AssetRegistry {
    model_dir: PathBuf,
}

impl AssetRegistry {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
        }
    }

    fn model_path(&self, name: &str) -> PathBuf {
        self.model_dir.join(name)
    }

    /// Strip a trailing extension from a client-supplied file name.
    ///
    /// `scene.glb` and `scene.glb.gz` both become `scene`; a bare `scene`
    /// is unchanged.
    pub fn base_name(file_name: &str) -> &str {
        let trimmed = file_name.strip_suffix(".gz").unwrap_or(file_name);
        match trimmed.rfind('.') {
            Some(pos) if pos > 0 => &trimmed[..pos],
            _ => trimmed,
        }
    }

    /// Commit finalized bytes under a unique name derived from `base_name`.
    ///
    /// Probes `{base}.glb`, `{base}_1.glb`, `{base}_2.glb`, ... and claims
    /// the first free candidate with an exclusive create, so two concurrent
    /// commits for the same base name cannot both win a candidate. Returns
    /// the name the model was stored under.
    pub async fn commit(&self, base_name: &str, data: &[u8]) -> Result<String> {
        validate_name(base_name)?;
        tokio::fs::create_dir_all(&self.model_dir).await?;

        let mut counter = 0usize;
        loop {
            let candidate = if counter == 0 {
                format!("{}.{}", base_name, MODEL_EXT)
            } else {
                format!("{}_{}.{}", base_name, counter, MODEL_EXT)
            };

            let open = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(self.model_path(&candidate))
                .await;

            match open {
                Ok(mut file) => {
                    if let Err(e) = write_and_flush(&mut file, data).await {
                        // Do not leave a partially written asset behind
                        drop(file);
                        self.discard(&candidate).await;
                        return Err(e.into());
                    }

                    tracing::info!(
                        name = %candidate,
                        size = data.len(),
                        "Model committed"
                    );
                    return Ok(candidate);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    counter += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// List stored models, most recently modified first.
    pub async fn list(&self) -> Result<Vec<ModelInfo>> {
        let mut models = Vec::new();

        let mut entries = match tokio::fs::read_dir(&self.model_dir).await {
            Ok(entries) => entries,
            // Nothing committed yet
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(models),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            if !name.ends_with(&format!(".{}", MODEL_EXT)) {
                continue;
            }

            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }

            let modified_at = metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());

            models.push(ModelInfo {
                name,
                size: metadata.len(),
                modified_at,
            });
        }

        models.sort_by(|a, b| b.modified_at.cmp(&a.modified_at));
        Ok(models)
    }

    /// Read a stored model's bytes.
    pub async fn read(&self, name: &str) -> Result<Vec<u8>> {
        validate_name(name)?;

        match tokio::fs::read(self.model_path(name)).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::NotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a stored model.
    pub async fn delete(&self, name: &str) -> Result<()> {
        validate_name(name)?;

        match tokio::fs::remove_file(self.model_path(name)).await {
            Ok(()) => {
                tracing::info!(name = %name, "Model deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::NotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Best-effort removal of a possibly partially-committed model file.
    ///
    /// Used on failure paths; errors are logged rather than propagated so
    /// cleanup never masks the original failure.
    pub async fn discard(&self, name: &str) {
        if let Err(e) = tokio::fs::remove_file(self.model_path(name)).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(name = %name, error = %e, "Failed to discard model file");
            }
        }
    }

    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }
}

// ============================================================================
// Tests
// ============================================================================
