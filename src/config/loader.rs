use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::defaults::{CONFIG_DIR_NAME, CONFIG_FILE_NAME};
use super::ConfigError;

/// Optional TOML defaults; every key may be overridden on the command line
///
/// ```toml
/// proxy_addr = "proxy.corp.example"
/// proxy_port = 3128
/// proxy_username = "svc-healthcheck"
/// timeout = 5
/// strict_url = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub proxy_addr: Option<String>,
    pub proxy_port: Option<u16>,
    pub proxy_username: Option<String>,
    pub proxy_password: Option<String>,
    /// Seconds
    pub timeout: Option<u64>,
    pub strict_url: Option<bool>,
    pub strict_auth: Option<bool>,
    pub cluster_check: Option<bool>,
    pub ingress_proxy_addr: Option<String>,
}

impl FileConfig {
    /// `<config dir>/proxy-auth-healthcheck/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load an explicitly requested file, or the default file when it exists.
    /// No file at all yields empty defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }
}
