//! Post-Processing Pipeline
//!
//! Transforms a reassembled upload into its stored form. Two ordered
//! stages, each skippable by configuration:
//!
//! 1. Gzip decompression - browser clients gzip the model before chunking
//!    it. A malformed envelope is fatal to the finalize call because the
//!    optimizer needs valid glTF input.
//! 2. Mesh optimization - external, best-effort. Every failure mode
//!    (missing tool, bad exit, timeout) degrades to pass-through.

use std::io::Cursor;
use std::sync::Arc;

use async_compression::tokio::bufread::GzipDecoder;
use tokio::io::AsyncReadExt;

use crate::config::OptimizerConfig;
use crate::error::{AppError, Result};
use crate::optimizer::Optimizer;

/// Gzip envelope magic bytes
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Output of the pipeline, with stage observability
#[derive(Debug)]
pub struct ProcessedModel {
    /// Bytes to commit to the registry
    pub data: Vec<u8>,

    /// Whether the upload arrived in a gzip envelope
    pub was_compressed: bool,

    /// Whether the optimization stage produced the output (false on
    /// pass-through)
    pub optimized: bool,
}

/// Applies decompression and optimization to reassembled uploads
#[derive(Clone)]
pub struct Pipeline {
    optimizer: Arc<dyn Optimizer>,
    decompress_enabled: bool,
    optimize_enabled: bool,
}

impl Pipeline {
    pub fn new(optimizer: Arc<dyn Optimizer>, config: &OptimizerConfig) -> Self {
        Self {
            optimizer,
            decompress_enabled: config.decompress,
            optimize_enabled: config.enabled,
        }
    }

    /// Run all enabled stages over the reassembled bytes.
    pub async fn process(&self, raw: Vec<u8>) -> Result<ProcessedModel> {
        let raw_size = raw.len();

        // Stage 1: decompression (hard failure)
        let was_compressed = self.decompress_enabled && is_gzip(&raw);
        let decompressed = if was_compressed {
            decompress_gzip(&raw).await?
        } else {
            raw
        };

        // Stage 2: optimization (soft failure, pass-through fallback)
        let (data, optimized) = if self.optimize_enabled {
            match self.optimizer.optimize(&decompressed).await {
                Ok(optimized) => {
                    let before = decompressed.len();
                    let after = optimized.len();
                    // Observability only; a negative reduction is accepted.
                    let reduction = 100.0 - (after as f64 / before.max(1) as f64) * 100.0;
                    tracing::info!(
                        input_size = before,
                        output_size = after,
                        reduction = format!("{:.1}%", reduction),
                        "Mesh optimization complete"
                    );
                    (optimized, true)
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "Mesh optimization failed, storing unoptimized model"
                    );
                    (decompressed, false)
                }
            }
        } else {
            (decompressed, false)
        };

        tracing::debug!(
            raw_size = raw_size,
            final_size = data.len(),
            was_compressed = was_compressed,
            optimized = optimized,
            "Post-processing complete"
        );

        Ok(ProcessedModel {
            data,
            was_compressed,
            optimized,
        })
    }
}

fn is_gzip(data: &[u8]) -> bool {
    data.len() >= 2 && data[..2] == GZIP_MAGIC
}

async fn decompress_gzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = GzipDecoder::new(Cursor::new(data));
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .await
        .map_err(|e| AppError::Decompression(e.to_string()))?;
    Ok(out)
}

// ============================================================================
// Tests
// ============================================================================
