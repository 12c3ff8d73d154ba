//! Configuration management for the Meshdrop server

use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub optimizer: OptimizerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Transient area for in-flight upload chunks, one subdir per session
    pub chunk_dir: PathBuf,
    /// Durable area for finalized model files
    pub model_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptimizerConfig {
    /// Run the gzip decompression stage during finalize
    pub decompress: bool,
    /// Run the gltfpack optimization stage during finalize
    pub enabled: bool,
    /// Path to the gltfpack binary
    pub gltfpack_path: String,
    /// Upper bound on a single gltfpack invocation, in seconds
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            storage: StorageConfig {
                chunk_dir: PathBuf::from("./uploads/tmp"),
                model_dir: PathBuf::from("./uploads/models"),
            },
            optimizer: OptimizerConfig {
                decompress: true,
                enabled: true,
                gltfpack_path: "gltfpack".to_string(),
                timeout_secs: 60,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        let defaults = Config::default();

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: env::var("SERVER_PORT")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()
                    .unwrap_or(3000),
            },
            storage: StorageConfig {
                chunk_dir: env::var("CHUNK_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.storage.chunk_dir),
                model_dir: env::var("MODEL_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.storage.model_dir),
            },
            optimizer: OptimizerConfig {
                decompress: env_flag("DECOMPRESS_UPLOADS", defaults.optimizer.decompress),
                enabled: env_flag("OPTIMIZER_ENABLED", defaults.optimizer.enabled),
                gltfpack_path: env::var("GLTFPACK_PATH")
                    .unwrap_or(defaults.optimizer.gltfpack_path),
                timeout_secs: env::var("OPTIMIZER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.optimizer.timeout_secs),
            },
        })
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(v) => matches!(v.as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}
