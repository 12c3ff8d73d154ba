//! Types for the chunked upload lifecycle

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// Maximum accepted chunk size: 8MB (browser clients send 1MB chunks)
pub const MAX_CHUNK_SIZE: usize = 8 * 1024 * 1024;

// ============================================================================
// Session Record
// ============================================================================

/// In-memory record of one in-progress upload session.
///
/// The session id is an opaque, client-generated string. A record exists from
/// the moment the first chunk for that id is accepted until finalize or
/// cancel removes it. Chunk bytes themselves live in the chunk store; this
/// record only tracks which indices have arrived.
#[derive(Debug, Clone)]
pub struct UploadSession {
    /// Client-generated session id
    pub id: String,

    /// Indices of chunks that have been received (sparse, unordered arrival)
    pub received_chunks: HashSet<usize>,

    /// When the first chunk for this session arrived
    pub created_at: DateTime<Utc>,
}

impl UploadSession {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            received_chunks: HashSet::new(),
            created_at: Utc::now(),
        }
    }

    /// Record one received chunk index. Re-sends are idempotent.
    pub fn mark_chunk_received(&mut self, index: usize) {
        self.received_chunks.insert(index);
    }

    /// First index in `[0, expected)` that has not been received, if any
    pub fn first_missing_chunk(&self, expected: usize) -> Option<usize> {
        (0..expected).find(|i| !self.received_chunks.contains(i))
    }
}

// ============================================================================
// Wire Types
// ============================================================================

/// Response after accepting a chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkUploadResponse {
    /// Chunk index that was stored
    pub chunk_index: usize,

    /// Number of distinct chunks received for this session so far
    pub chunks_received: usize,
}

/// Request to finalize an upload session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeRequest {
    /// Session whose chunks should be reassembled
    pub session_id: String,

    /// Number of chunks the client transmitted in total
    pub total_chunks: usize,

    /// Client-supplied file name; the extension is stripped server-side
    pub file_name: String,
}

/// Response after a successful finalize
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeResponse {
    /// Final unique name the model was stored under
    pub file_name: String,

    /// Stored size in bytes (after post-processing)
    pub size: u64,
}
