//! Upload Service
//!
//! Drives the chunked-upload lifecycle: chunk intake, and the finalize
//! sequence merge -> decompress -> optimize (best-effort) -> commit ->
//! cleanup. The session's chunk storage is removed as soon as the merge has
//! been attempted, on success and on every failure path.

use crate::error::{AppError, Result};
use crate::registry::{is_safe_name, AssetRegistry};

use super::chunk_store::ChunkStore;
use super::pipeline::Pipeline;
use super::session::SessionManager;
use super::types::{UploadSession, MAX_CHUNK_SIZE};

/// Result of a successful finalize
#[derive(Debug, Clone)]
pub struct StoredModel {
    /// Unique name the model was committed under
    pub name: String,

    /// Committed size in bytes
    pub size: u64,
}

/// Orchestrates sessions, chunk storage, post-processing and the registry
#[derive(Clone)]
pub struct UploadService {
    sessions: SessionManager,
    chunks: ChunkStore,
    pipeline: Pipeline,
    registry: AssetRegistry,
}

impl UploadService {
    pub fn new(
        sessions: SessionManager,
        chunks: ChunkStore,
        pipeline: Pipeline,
        registry: AssetRegistry,
    ) -> Self {
        Self {
            sessions,
            chunks,
            pipeline,
            registry,
        }
    }

    /// Accept one chunk for a session, creating the session implicitly.
    ///
    /// Returns the number of distinct chunks received so far.
    pub async fn put_chunk(
        &self,
        session_id: &str,
        chunk_index: usize,
        data: &[u8],
    ) -> Result<usize> {
        if data.len() > MAX_CHUNK_SIZE {
            return Err(AppError::InvalidInput(format!(
                "Chunk of {} bytes exceeds the {} byte limit",
                data.len(),
                MAX_CHUNK_SIZE
            )));
        }

        // The chunk store validates the session id and rejects empty
        // payloads before anything touches disk.
        self.chunks.put_chunk(session_id, chunk_index, data).await?;

        Ok(self.sessions.record_chunk(session_id, chunk_index).await)
    }

    /// Reassemble a session's chunks, post-process and commit the result.
    pub async fn finalize(
        &self,
        session_id: &str,
        total_chunks: usize,
        file_name: &str,
    ) -> Result<StoredModel> {
        let base_name = AssetRegistry::base_name(file_name);
        if !is_safe_name(base_name) {
            return Err(AppError::InvalidInput(format!(
                "Invalid file name: {:?}",
                file_name
            )));
        }
        if total_chunks == 0 {
            return Err(AppError::InvalidInput(
                "totalChunks must be greater than zero".to_string(),
            ));
        }

        // Taking the record closes the double-finalize window: the second
        // caller sees SessionNotFound.
        let session = self.sessions.take(session_id).await?;

        tracing::info!(
            session_id = %session_id,
            total_chunks = total_chunks,
            base_name = %base_name,
            "Finalizing upload"
        );

        // Merge. Chunk storage is consumed here; whatever the outcome of
        // this and later stages, the session's chunk area goes away.
        let merged = self.chunks.assemble(&session.id, total_chunks).await;
        self.cleanup_chunks(&session.id).await;
        let merged = merged?;

        let processed = self.pipeline.process(merged).await?;

        let name = self.registry.commit(base_name, &processed.data).await?;
        let size = processed.data.len() as u64;

        tracing::info!(
            session_id = %session_id,
            name = %name,
            size = size,
            was_compressed = processed.was_compressed,
            optimized = processed.optimized,
            "Upload finalized"
        );

        Ok(StoredModel { name, size })
    }

    /// Cancel an in-progress session, dropping its record and chunk data.
    pub async fn cancel(&self, session_id: &str) -> Result<()> {
        let session = self.sessions.take(session_id).await?;
        self.cleanup_chunks(&session.id).await;

        tracing::info!(session_id = %session_id, "Upload session cancelled");
        Ok(())
    }

    /// Look up a session record for status reporting.
    pub async fn session_status(&self, session_id: &str) -> Result<UploadSession> {
        self.sessions.get(session_id).await
    }

    pub fn registry(&self) -> &AssetRegistry {
        &self.registry
    }

    /// Best-effort chunk directory removal; failures are logged and never
    /// mask the error that got us here.
    async fn cleanup_chunks(&self, session_id: &str) {
        if let Err(e) = self.chunks.remove_session(session_id).await {
            tracing::warn!(
                session_id = %session_id,
                error = %e,
                "Failed to clean up session chunks"
            );
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
