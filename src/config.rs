//! Runtime configuration.

use anyhow::{Context, Result};
use serde::Deserialize;

/// Runtime configuration data.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    /// The server's logging config, which uses Rust's `env_logger` directives.
    #[serde(default)]
    pub rust_log: String,
    /// The port which client network traffic is to use.
    pub client_port: u16,
    /// The port on which Prometheus metrics are exposed.
    pub metrics_port: u16,
}

impl Config {
    /// Create a new config instance.
    ///
    /// Currently this routine just parses the runtime environment and builds
    /// the application config from that. In the future, this may take into
    /// account an optional config file as well.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Result<Self> {
        let config: Config = envy::from_env().context("error building config from env")?;
        Ok(config)
    }

    /// Build an instance for use in tests.
    #[cfg(test)]
    pub fn new_test() -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self {
            rust_log: "".into(),
            client_port: 7400,
            metrics_port: 7402,
        })
    }
}
