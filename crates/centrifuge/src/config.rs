//! User configuration (`config.toml`)

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::crc::DEFAULT_CHUNK_SIZE;
use crate::error::{Error, Result};

pub const DEFAULT_STEAM_API_URL: &str = "https://api.steampowered.com";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub steam_api_url: String,
    pub http_timeout_secs: u64,
    /// Attempts per request, including the first one.
    pub max_retries: u32,
    pub scan_chunk_size: usize,
    /// Default `--output-dir` for radar images.
    pub overview_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            steam_api_url: DEFAULT_STEAM_API_URL.to_string(),
            http_timeout_secs: 30,
            max_retries: 3,
            scan_chunk_size: DEFAULT_CHUNK_SIZE,
            overview_dir: PathBuf::from("out"),
        }
    }
}

impl Config {
    /// `<config dir>/centrifuge/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("centrifuge").join("config.toml"))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Load an explicit config file, or the default one if it exists.
    ///
    /// An explicit path must exist. A missing default file yields the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }

        let Some(path) = Self::default_path() else {
            return Ok(Self::default());
        };
        match Self::load(&path) {
            Err(e) if e.is_not_found() => {
                debug!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            result => result,
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
