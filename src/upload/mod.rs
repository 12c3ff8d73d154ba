//! Chunked Upload Module
//!
//! Implements the chunked-upload session lifecycle:
//! 1. Client uploads chunks one at a time; a session record is created
//!    implicitly on the first accepted chunk.
//! 2. Client sends finalize with the expected chunk count and a file name.
//! 3. Server reassembles the chunks in index order, decompresses the gzip
//!    envelope, runs best-effort mesh optimization, and commits the result
//!    under a unique name. The session's chunk storage is consumed either
//!    way.

pub mod chunk_store;
pub mod pipeline;
pub mod service;
pub mod session;
pub mod types;

pub use chunk_store::ChunkStore;
pub use pipeline::{Pipeline, ProcessedModel};
pub use service::{StoredModel, UploadService};
pub use session::SessionManager;
pub use types::*;
