//! Application state management

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::optimizer::{GltfpackOptimizer, NoopOptimizer, Optimizer};
use crate::registry::AssetRegistry;
use crate::upload::{ChunkStore, Pipeline, SessionManager, UploadService};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    uploads: UploadService,
    registry: AssetRegistry,
}

impl AppState {
    /// Create application state from configuration.
    pub async fn new(config: Config) -> Self {
        let optimizer: Arc<dyn Optimizer> = if config.optimizer.enabled {
            let optimizer = GltfpackOptimizer::new(
                config.optimizer.gltfpack_path.clone(),
                Duration::from_secs(config.optimizer.timeout_secs),
            );
            if optimizer.is_available().await {
                tracing::info!(
                    binary = %config.optimizer.gltfpack_path,
                    "Mesh optimizer available"
                );
            } else {
                tracing::warn!(
                    binary = %config.optimizer.gltfpack_path,
                    "Mesh optimizer not found, uploads will be stored unoptimized"
                );
            }
            Arc::new(optimizer)
        } else {
            Arc::new(NoopOptimizer)
        };

        let registry = AssetRegistry::new(config.storage.model_dir.clone());
        let uploads = UploadService::new(
            SessionManager::new(),
            ChunkStore::new(config.storage.chunk_dir.clone()),
            Pipeline::new(optimizer, &config.optimizer),
            registry.clone(),
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                uploads,
                registry,
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the upload service
    pub fn uploads(&self) -> &UploadService {
        &self.inner.uploads
    }

    /// Get the asset registry
    pub fn registry(&self) -> &AssetRegistry {
        &self.inner.registry
    }
}
