//! Process configuration: defaults, then an optional file, then `SERVE_*`
//! environment variables.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_MAX_BODY_BYTES: u64 = 2 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub model_path: PathBuf,
    /// Hex SHA-256 the artifact must match; unchecked when absent.
    #[serde(default)]
    pub model_sha256: Option<String>,
    /// Per-request scoring budget in milliseconds.
    #[serde(default)]
    pub score_timeout_ms: Option<u64>,
    pub max_body_bytes: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            model_path: PathBuf::from("model.json"),
            model_sha256: None,
            score_timeout_ms: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ServerConfig {
    /// Builds the config from defaults, `file` (if any) and the environment.
    pub fn from_sources(file: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8080)?
            .set_default("model_path", "model.json")?
            .set_default("max_body_bytes", DEFAULT_MAX_BODY_BYTES as i64)?;
        if let Some(file) = file {
            builder = builder.add_source(config::File::from(file).required(true));
        }
        builder = builder.add_source(config::Environment::with_prefix("SERVE").try_parsing(true));
        builder
            .build()
            .context("failed to build configuration")?
            .try_deserialize()
            .context("failed to deserialize configuration")
    }
}

/// Loads the service config, reading the file named by `SERVE_CONFIG_FILE` when set.
pub fn load_config() -> Result<ServerConfig> {
    let file = std::env::var("SERVE_CONFIG_FILE").ok().map(PathBuf::from);
    ServerConfig::from_sources(file.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.model_path, PathBuf::from("model.json"));
        assert_eq!(cfg.host, "0.0.0.0");
    }

    #[test]
    fn file_overrides_defaults() {
        let path = std::env::temp_dir().join(format!("serve-{}.yaml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "port: 9099\nmodel_path: /srv/models/iris.json\nscore_timeout_ms: 250\n").unwrap();
        let cfg = ServerConfig::from_sources(Some(&path)).unwrap();
        assert_eq!(cfg.port, 9099);
        assert_eq!(cfg.model_path, PathBuf::from("/srv/models/iris.json"));
        assert_eq!(cfg.score_timeout_ms, Some(250));
        assert_eq!(cfg.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
        assert_eq!(cfg.model_sha256, None);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(ServerConfig::from_sources(Some(Path::new("/no/such/serve.yaml"))).is_err());
    }
}
