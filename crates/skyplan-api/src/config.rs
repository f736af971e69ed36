use std::env;
use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

/// API server configuration.
///
/// Values resolve in layers: built-in defaults, then an optional TOML file
/// named by `SKYPLAN_CONFIG`, then `SKYPLAN_*` environment variables.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub port: u16,
    pub cors_origin: String,
    /// Directory for the file-backed store; in-memory storage when unset.
    pub data_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    port: Option<u16>,
    cors_origin: Option<String>,
    data_dir: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            cors_origin: "http://localhost:3000".to_string(),
            data_dir: None,
        }
    }
}

impl ApiConfig {
    /// Load configuration from the optional TOML file and the environment.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::default();
        if let Ok(path) = env::var("SKYPLAN_CONFIG") {
            config = config.merge_file(Path::new(&path))?;
        }
        Ok(config.merge_env())
    }

    fn merge_file(mut self, path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        let file: ConfigFile = toml::from_str(&content)
            .with_context(|| format!("cannot parse config file {}", path.display()))?;

        if let Some(port) = file.port {
            self.port = port;
        }
        if let Some(origin) = file.cors_origin {
            self.cors_origin = origin;
        }
        if let Some(dir) = file.data_dir {
            self.data_dir = Some(dir);
        }
        Ok(self)
    }

    fn merge_env(mut self) -> Self {
        if let Some(port) = env::var("SKYPLAN_PORT").ok().and_then(|p| p.parse().ok()) {
            self.port = port;
        }
        if let Ok(origin) = env::var("SKYPLAN_CORS_ORIGIN") {
            self.cors_origin = origin;
        }
        if let Ok(dir) = env::var("SKYPLAN_DATA_DIR") {
            self.data_dir = Some(dir);
        }
        self
    }

    /// Get the server bind address
    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}
