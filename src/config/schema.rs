//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files, and
//! every field has a default so a minimal config works.

use serde::{Deserialize, Serialize};

/// Root configuration for the instrumentation pipeline.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LoggerConfig {
    /// Label namescoping the log sink (e.g. the server name).
    pub server_name: String,

    /// Rendering thresholds for logged values and bodies.
    pub render: RenderConfig,
}

impl LoggerConfig {
    /// Config with the given server name and default rendering thresholds.
    pub fn named(server_name: impl Into<String>) -> Self {
        Self {
            server_name: server_name.into(),
            ..Self::default()
        }
    }
}

/// Thresholds used by the content formatter.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Strings longer than this render as `"<n> characters"`.
    pub large_text_threshold: usize,

    /// HTML bodies at or above this many bytes are summarized, smaller ones
    /// echoed verbatim.
    pub html_echo_limit: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            large_text_threshold: 1000,
            html_echo_limit: 2000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_deserializes_with_defaults() {
        let config: LoggerConfig = toml::from_str("server_name = \"scim\"").unwrap();
        assert_eq!(config.server_name, "scim");
        assert_eq!(config.render.large_text_threshold, 1000);
        assert_eq!(config.render.html_echo_limit, 2000);
    }
}
