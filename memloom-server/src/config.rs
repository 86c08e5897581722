// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use anyhow::Result;
use memloom_memory::MemoryOptions;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Memloom Server Configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: HttpConfig,
    #[serde(default)]
    pub tenant: TenantConfig,
    #[serde(default)]
    pub memory: MemoryOptions,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    /// HTTP API listen address (e.g., "127.0.0.1:8080")
    #[serde(default = "default_http_addr")]
    pub listen_addr: String,

    /// Enable CORS (permissive; front it with a proxy for stricter policies)
    #[serde(default = "default_enable_cors")]
    pub enable_cors: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_http_addr(),
            enable_cors: default_enable_cors(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TenantConfig {
    /// Reject tenant-scoped requests that lack the tenant headers.
    /// Disable for development setups where failures should surface in the
    /// tool result instead.
    #[serde(default = "default_tenant_required")]
    pub required: bool,
}

impl Default for TenantConfig {
    fn default() -> Self {
        Self {
            required: default_tenant_required(),
        }
    }
}

// Default values
fn default_http_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_enable_cors() -> bool {
    true
}

fn default_tenant_required() -> bool {
    true
}

impl ServerConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from environment variables
    ///
    /// Supported environment variables:
    /// - MEMLOOM_HTTP_ADDR: HTTP listen address (default: 127.0.0.1:8080)
    /// - MEMLOOM_ENABLE_CORS: Enable CORS (default: true)
    /// - MEMLOOM_DATA_DIR: Memory data root (default: data/rag)
    /// - MEMLOOM_NAMESPACE: Disk namespace segment (default: default)
    /// - MEMLOOM_TENANT_REQUIRED: Require tenant headers (default: true)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("MEMLOOM_HTTP_ADDR") {
            config.server.listen_addr = addr;
        }

        if let Ok(cors) = std::env::var("MEMLOOM_ENABLE_CORS") {
            config.server.enable_cors = cors.parse().unwrap_or(true);
        }

        if let Ok(data_dir) = std::env::var("MEMLOOM_DATA_DIR") {
            config.memory.disk.root_path = PathBuf::from(data_dir);
        }

        if let Ok(namespace) = std::env::var("MEMLOOM_NAMESPACE") {
            config.memory.namespace = namespace;
        }

        if let Ok(required) = std::env::var("MEMLOOM_TENANT_REQUIRED") {
            config.tenant.required = required.parse().unwrap_or(true);
        }

        config
    }

    /// Load configuration with priority: file > env > defaults
    pub fn load(config_file: Option<PathBuf>) -> Result<Self> {
        let mut config = if let Some(path) = config_file {
            if path.exists() {
                tracing::info!("Loading configuration from file: {:?}", path);
                Self::from_file(&path)?
            } else {
                tracing::warn!("Config file not found: {:?}, using defaults", path);
                Self::default()
            }
        } else {
            Self::default()
        };

        // Override with environment variables
        config = Self::merge_with_env(config);

        Ok(config)
    }

    /// Merge config with environment variables (env takes priority)
    fn merge_with_env(mut config: Self) -> Self {
        let env_config = Self::from_env();

        // Only override if env var was explicitly set
        if std::env::var("MEMLOOM_HTTP_ADDR").is_ok() {
            config.server.listen_addr = env_config.server.listen_addr;
        }
        if std::env::var("MEMLOOM_ENABLE_CORS").is_ok() {
            config.server.enable_cors = env_config.server.enable_cors;
        }
        if std::env::var("MEMLOOM_DATA_DIR").is_ok() {
            config.memory.disk.root_path = env_config.memory.disk.root_path;
        }
        if std::env::var("MEMLOOM_NAMESPACE").is_ok() {
            config.memory.namespace = env_config.memory.namespace;
        }
        if std::env::var("MEMLOOM_TENANT_REQUIRED").is_ok() {
            config.tenant.required = env_config.tenant.required;
        }

        config
    }

    /// Parse listen address as SocketAddr
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(self.server.listen_addr.parse()?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.socket_addr()?;

        if self.memory.disk.enable && self.memory.disk.root_path.as_os_str().is_empty() {
            anyhow::bail!("disk persistence enabled but memory.disk.root_path is empty");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.server.listen_addr, "127.0.0.1:8080");
        assert!(config.tenant.required);
        assert!(config.memory.in_memory.enable);
        config.validate().unwrap();
    }

    #[test]
    fn test_from_env() {
        std::env::set_var("MEMLOOM_HTTP_ADDR", "0.0.0.0:9090");
        std::env::set_var("MEMLOOM_NAMESPACE", "staging");

        let config = ServerConfig::from_env();
        assert_eq!(config.server.listen_addr, "0.0.0.0:9090");
        assert_eq!(config.memory.namespace, "staging");

        std::env::remove_var("MEMLOOM_HTTP_ADDR");
        std::env::remove_var("MEMLOOM_NAMESPACE");
    }

    #[test]
    fn test_toml_partial_decode() {
        let config: ServerConfig = toml::from_str(
            r#"
            [server]
            listen_addr = "127.0.0.1:9000"

            [memory.disk]
            root_path = "/var/lib/memloom"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.listen_addr, "127.0.0.1:9000");
        assert_eq!(
            config.memory.disk.root_path,
            PathBuf::from("/var/lib/memloom")
        );
        // untouched sections keep their defaults
        assert!(config.tenant.required);
        assert!(config.memory.async_write.enable);
    }
}
