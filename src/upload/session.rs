//! Upload Session Manager
//!
//! Explicit in-memory record store for upload sessions. The session id is a
//! client-generated opaque string; a record is created implicitly when the
//! first chunk for that id is accepted and holds only the set of received
//! chunk indices. Chunk bytes live in the chunk store.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::{AppError, Result};

use super::types::UploadSession;

/// Manages upload session records
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<String, UploadSession>>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Record a received chunk, creating the session record on first use.
    ///
    /// Returns the number of distinct chunks received so far.
    pub async fn record_chunk(&self, session_id: &str, chunk_index: usize) -> usize {
        let mut sessions = self.sessions.write().await;

        let session = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                tracing::info!(session_id = %session_id, "Upload session started");
                UploadSession::new(session_id)
            });

        session.mark_chunk_received(chunk_index);
        session.received_chunks.len()
    }

    /// Get a copy of a session record.
    pub async fn get(&self, session_id: &str) -> Result<UploadSession> {
        let sessions = self.sessions.read().await;
        sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| AppError::SessionNotFound(session_id.to_string()))
    }

    /// Take a session record out of the store for finalization.
    ///
    /// Removal is atomic under the write lock, so a second finalize for the
    /// same session observes `SessionNotFound` instead of racing the first.
    pub async fn take(&self, session_id: &str) -> Result<UploadSession> {
        let mut sessions = self.sessions.write().await;
        sessions
            .remove(session_id)
            .ok_or_else(|| AppError::SessionNotFound(session_id.to_string()))
    }

    /// Drop a session record if present. Idempotent.
    pub async fn remove(&self, session_id: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        sessions.remove(session_id).is_some()
    }

    /// Number of sessions currently tracked
    pub async fn session_count(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.len()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
