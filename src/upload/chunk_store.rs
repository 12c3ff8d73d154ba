//! Chunk Store
//!
//! Filesystem-backed temporary storage for uploaded chunks before assembly.
//! Each session owns one directory under the chunk base path; chunk files
//! inside it are named by zero-padded index. The store is a plain blob
//! store; which chunks belong to a session is tracked by the session
//! manager, not by probing directories.

use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::registry::is_safe_name;

/// Temporary storage for in-flight upload chunks
#[derive(Clone)]
pub struct ChunkStore {
    base_path: PathBuf,
}

impl ChunkStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn session_dir(&self, session_id: &str) -> PathBuf {
        self.base_path.join(session_id)
    }

    fn chunk_path(&self, session_id: &str, chunk_index: usize) -> PathBuf {
        self.session_dir(session_id)
            .join(format!("{:08}.chunk", chunk_index))
    }

    /// Store one chunk, creating the session's directory on first use.
    ///
    /// Re-uploading an index silently overwrites the previous bytes
    /// (last-write-wins).
    pub async fn put_chunk(
        &self,
        session_id: &str,
        chunk_index: usize,
        data: &[u8],
    ) -> Result<()> {
        if !is_safe_name(session_id) {
            return Err(AppError::InvalidInput(format!(
                "Invalid session id: {:?}",
                session_id
            )));
        }
        if data.is_empty() {
            return Err(AppError::InvalidInput("Empty chunk payload".to_string()));
        }

        let path = self.chunk_path(session_id, chunk_index);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, data).await?;

        tracing::debug!(
            session_id = %session_id,
            chunk_index = chunk_index,
            size = data.len(),
            "Chunk stored"
        );

        Ok(())
    }

    /// Read one chunk back. `IncompleteUpload` when the file is absent.
    pub async fn read_chunk(&self, session_id: &str, chunk_index: usize) -> Result<Vec<u8>> {
        let path = self.chunk_path(session_id, chunk_index);
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::IncompleteUpload(chunk_index))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Concatenate chunks `0..expected_count` in strict index order.
    ///
    /// Index order is the correctness property here: arrival order is
    /// irrelevant. The first missing index aborts the merge and nothing
    /// partial escapes this function.
    pub async fn assemble(&self, session_id: &str, expected_count: usize) -> Result<Vec<u8>> {
        let mut merged = Vec::new();

        for i in 0..expected_count {
            let chunk = self.read_chunk(session_id, i).await?;
            merged.extend_from_slice(&chunk);
        }

        Ok(merged)
    }

    /// Remove a session's entire chunk directory. Idempotent.
    pub async fn remove_session(&self, session_id: &str) -> Result<()> {
        let dir = self.session_dir(session_id);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

// ============================================================================
// Tests
// ============================================================================
