//! API server configuration.

use serde::{Deserialize, Serialize};

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Address to bind.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// First port to try. `0` binds an ephemeral port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Ports tried (`port`, `port + 1`, ...) while the address is in use.
    #[serde(default = "default_max_port_attempts")]
    pub max_port_attempts: u32,
    /// Upper bound on `limit` for `GET /messages` (none = uncapped).
    #[serde(default)]
    pub max_page_limit: Option<u32>,
    /// Environment label shown on the healthcheck.
    #[serde(default)]
    pub environment: Option<String>,
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_max_port_attempts() -> u32 {
    10
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            max_port_attempts: default_max_port_attempts(),
            max_page_limit: None,
            environment: None,
        }
    }
}
