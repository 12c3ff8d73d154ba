//! Mesh Optimizers
//!
//! Capability interface over the external mesh optimization tool. The
//! pipeline treats optimization as best-effort: any error reported here is
//! logged by the caller and the unoptimized bytes are used instead.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

/// Optimizer errors. These never reach a client; the pipeline degrades to
/// pass-through on every variant.
#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("Optimizer not available: {0}")]
    NotAvailable(String),

    #[error("Optimizer exited with an error: {0}")]
    Failed(String),

    #[error("Optimizer timed out after {0:?}")]
    TimedOut(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Bounded-time mesh optimization capability
#[async_trait]
pub trait Optimizer: Send + Sync {
    /// Check whether the optimizer can run in this environment
    async fn is_available(&self) -> bool;

    /// Re-encode the model, returning the optimized bytes
    async fn optimize(&self, data: &[u8]) -> Result<Vec<u8>, OptimizeError>;
}

// ============================================================================
// gltfpack
// ============================================================================

/// Optimizer backed by the external `gltfpack` binary.
///
/// Input and output go through uuid-named temp files; both are removed on
/// every path. The invocation is wrapped in a timeout so a wedged subprocess
/// cannot stall a finalize call.
pub struct GltfpackOptimizer {
    binary_path: String,
    temp_dir: PathBuf,
    timeout: Duration,
}

impl GltfpackOptimizer {
    pub fn new(binary_path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary_path: binary_path.into(),
            temp_dir: std::env::temp_dir(),
            timeout,
        }
    }

    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = temp_dir.into();
        self
    }
}

#[async_trait]
impl Optimizer for GltfpackOptimizer {
    async fn is_available(&self) -> bool {
        // gltfpack prints usage and exits non-zero when run bare; all we
        // care about is that the binary can be spawned at all.
        Command::new(&self.binary_path)
            .arg("-h")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .is_ok()
    }

    async fn optimize(&self, data: &[u8]) -> Result<Vec<u8>, OptimizeError> {
        let unique_id = uuid::Uuid::new_v4().to_string();
        let input_path = self.temp_dir.join(format!("optimize_in_{}.glb", unique_id));
        let output_path = self.temp_dir.join(format!("optimize_out_{}.glb", unique_id));

        tokio::fs::write(&input_path, data).await?;

        let run = Command::new(&self.binary_path)
            .arg("-i")
            .arg(&input_path)
            .arg("-o")
            .arg(&output_path)
            // meshopt vertex/index compression
            .arg("-cc")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output();

        let result = tokio::time::timeout(self.timeout, run).await;

        // Input temp file is no longer needed whatever happened
        let _ = tokio::fs::remove_file(&input_path).await;

        let output = match result {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(OptimizeError::NotAvailable(self.binary_path.clone()));
            }
            Ok(Err(e)) => {
                let _ = tokio::fs::remove_file(&output_path).await;
                return Err(e.into());
            }
            Err(_) => {
                let _ = tokio::fs::remove_file(&output_path).await;
                return Err(OptimizeError::TimedOut(self.timeout));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let _ = tokio::fs::remove_file(&output_path).await;
            return Err(OptimizeError::Failed(stderr.trim().to_string()));
        }

        let optimized = tokio::fs::read(&output_path).await;
        let _ = tokio::fs::remove_file(&output_path).await;

        Ok(optimized?)
    }
}

// ============================================================================
// No-op
// ============================================================================

/// Pass-through optimizer for environments without the external tool
pub struct NoopOptimizer;

#[async_trait]
impl Optimizer for NoopOptimizer {
    async fn is_available(&self) -> bool {
        true
    }

    async fn optimize(&self, data: &[u8]) -> Result<Vec<u8>, OptimizeError> {
        Ok(data.to_vec())
    }
}
