//! Configuration for restkv
//!
//! Centralized configuration with sensible defaults.

/// Main configuration for a restkv server instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// HTTP listen address
    pub listen_addr: String,

    // -------------------------------------------------------------------------
    // Authentication Configuration
    // -------------------------------------------------------------------------
    /// Admin API token accepted as authorized. Further tokens can be issued
    /// at runtime with the `ACL RESTTOKEN` command.
    pub api_token: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            api_token: String::new(),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the HTTP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the admin API token
    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.config.api_token = token.into();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
