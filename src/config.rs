// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::security::ALL_CAPABILITIES;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug)]
pub enum ConfigError {
    LoadError(String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::LoadError(msg) => write!(f, "Configuration load error: {}", msg),
            ConfigError::ValidationError(msg) => {
                write!(f, "Configuration validation error: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8085
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

/// One admin API key and the capabilities its sessions hold. Key issuance
/// and rotation belong to the host deployment; this module only matches.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiKeyConfig {
    pub id: String,
    pub key: String,
    pub capabilities: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AdminConfig {
    #[serde(default = "default_admin_path")]
    pub path: String,
    #[serde(default)]
    pub api_keys: Vec<ApiKeyConfig>,
}

fn default_admin_path() -> String {
    "/admin".to_string()
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            path: default_admin_path(),
            api_keys: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RenderingConfig {
    /// When disabled the public render gate denies everything; admin APIs
    /// keep working.
    #[serde(default = "default_true")]
    pub public_galleries: bool,
}

fn default_true() -> bool {
    true
}

impl Default for RenderingConfig {
    fn default() -> Self {
        Self {
            public_galleries: default_true(),
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub rendering: RenderingConfig,
}

#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub server: ServerConfig,
    pub admin: AdminConfig,
    pub log_level: log::LevelFilter,
    pub public_galleries: bool,
}

pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)
        .map_err(|err| ConfigError::LoadError(format!("{}: {}", path.display(), err)))?;
    serde_yaml::from_str(&content).map_err(|err| ConfigError::LoadError(err.to_string()))
}

/// Write the default configuration with a freshly generated admin key.
pub fn write_default_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let config = AppConfig {
        admin: AdminConfig {
            path: default_admin_path(),
            api_keys: vec![ApiKeyConfig {
                id: "admin".to_string(),
                key: uuid::Uuid::new_v4().to_string(),
                capabilities: ALL_CAPABILITIES
                    .iter()
                    .map(|capability| capability.to_string())
                    .collect(),
            }],
        },
        ..AppConfig::default()
    };
    let content = serde_yaml::to_string(&config)
        .map_err(|err| ConfigError::LoadError(err.to_string()))?;
    fs::write(path, content)
        .map_err(|err| ConfigError::LoadError(format!("{}: {}", path.display(), err)))?;
    Ok(config)
}

impl AppConfig {
    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be non-zero".to_string(),
            ));
        }
        if !self.admin.path.starts_with('/') || self.admin.path.len() < 2 {
            return Err(ConfigError::ValidationError(
                "Admin path must start with '/' and not be the root".to_string(),
            ));
        }
        if self.admin.path.ends_with('/') {
            return Err(ConfigError::ValidationError(
                "Admin path must not end with '/'".to_string(),
            ));
        }
        let mut seen_ids = Vec::new();
        for api_key in &self.admin.api_keys {
            if api_key.id.trim().is_empty() || api_key.key.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "API key entries need a non-empty id and key".to_string(),
                ));
            }
            if seen_ids.contains(&api_key.id) {
                return Err(ConfigError::ValidationError(format!(
                    "Duplicate API key id '{}'",
                    api_key.id
                )));
            }
            seen_ids.push(api_key.id.clone());
            for capability in &api_key.capabilities {
                if !ALL_CAPABILITIES.contains(&capability.as_str()) {
                    log::warn!(
                        "API key '{}' grants unknown capability '{}'",
                        api_key.id,
                        capability
                    );
                }
            }
        }
        let log_level = match self.logging.level.to_ascii_lowercase().as_str() {
            "error" => log::LevelFilter::Error,
            "warn" => log::LevelFilter::Warn,
            "info" => log::LevelFilter::Info,
            "debug" => log::LevelFilter::Debug,
            "trace" => log::LevelFilter::Trace,
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Unknown log level '{}'",
                    other
                )));
            }
        };
        Ok(ValidatedConfig {
            server: self.server,
            admin: self.admin,
            log_level,
            public_galleries: self.rendering.public_galleries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = AppConfig::default().validate().expect("valid defaults");
        assert_eq!(config.admin.path, "/admin");
        assert_eq!(config.log_level, log::LevelFilter::Info);
        assert!(config.public_galleries);
    }

    #[test]
    fn rejects_bad_admin_path() {
        for path in ["admin", "/", "/admin/"] {
            let mut config = AppConfig::default();
            config.admin.path = path.to_string();
            assert!(config.validate().is_err(), "path '{}' accepted", path);
        }
    }

    #[test]
    fn rejects_duplicate_api_key_ids() {
        let mut config = AppConfig::default();
        let entry = ApiKeyConfig {
            id: "admin".to_string(),
            key: "secret".to_string(),
            capabilities: vec![],
        };
        config.admin.api_keys = vec![entry.clone(), entry];
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_unknown_log_level() {
        let mut config = AppConfig::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_config_file_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.yaml");
        let written = write_default_config(&path).expect("write default");
        assert_eq!(written.admin.api_keys.len(), 1);

        let loaded = load_config(&path).expect("load");
        let validated = loaded.validate().expect("validate");
        assert_eq!(validated.admin.api_keys[0].id, "admin");
        assert_eq!(
            validated.admin.api_keys[0].capabilities.len(),
            ALL_CAPABILITIES.len()
        );
    }
}
