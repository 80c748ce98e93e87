//! Tunable thresholds.
//!
//! The classification and discovery heuristics are empirically tuned; every
//! cutoff lives here as a named field so hosts can override it from a TOML
//! file instead of patching literals.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Top-level configuration, one section per subsystem.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct XdConfig {
    pub parser: ParserConfig,
    pub discovery: DiscoveryConfig,
    pub connector: ConnectorConfig,
}

impl XdConfig {
    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }
}

/// DOM → design tree parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Slack (px) before a child counts as overflowing its parent.
    pub containment_epsilon: f32,
    /// Inline `<svg>` elements at or below this size become `Icon` nodes.
    pub icon_max_size: f32,
    /// Tags never turned into nodes.
    pub ignored_tags: Vec<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            containment_epsilon: 1.0,
            icon_max_size: 48.0,
            ignored_tags: [
                "script", "style", "meta", "link", "head", "title", "noscript", "template", "br",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

/// Interactive-element discovery and rescan scheduling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Minimum width/height for semantically interactive tags.
    pub min_interactive_width: f32,
    pub min_interactive_height: f32,
    /// Minimum width/height for generic `div` candidates.
    pub min_div_width: f32,
    pub min_div_height: f32,
    /// `div`s wider or taller than this are treated as layout containers.
    pub max_div_width: f32,
    pub max_div_height: f32,
    /// `div`s with more direct children than this are layout containers.
    pub max_div_children: usize,
    /// Fixed rescan interval.
    pub rescan_interval_ms: u64,
    /// Delay before retrying a screen whose document is not ready yet.
    pub retry_backoff_ms: u64,
    /// Give up retrying after this many not-ready attempts.
    pub max_retries: u32,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            min_interactive_width: 10.0,
            min_interactive_height: 10.0,
            min_div_width: 40.0,
            min_div_height: 24.0,
            max_div_width: 400.0,
            max_div_height: 600.0,
            max_div_children: 10,
            rescan_interval_ms: 2000,
            retry_backoff_ms: 300,
            max_retries: 10,
        }
    }
}

/// Connector curve shaping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorConfig {
    pub offset_factor: f64,
    pub min_offset: f64,
    pub preview_offset_factor: f64,
    pub preview_min_offset: f64,
    /// Arrowhead length along the curve.
    pub arrow_size: f64,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            offset_factor: 0.5,
            min_offset: 60.0,
            preview_offset_factor: 0.3,
            preview_min_offset: 40.0,
            arrow_size: 10.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_tuned_values() {
        let cfg = XdConfig::default();
        assert_eq!(cfg.discovery.max_div_width, 400.0);
        assert_eq!(cfg.discovery.max_div_height, 600.0);
        assert_eq!(cfg.discovery.max_div_children, 10);
        assert_eq!(cfg.connector.min_offset, 60.0);
        assert_eq!(cfg.connector.preview_min_offset, 40.0);
    }

    #[test]
    fn partial_toml_overrides_only_given_keys() {
        let cfg = XdConfig::from_toml(
            r#"
[discovery]
max_div_children = 6
rescan_interval_ms = 500

[connector]
min_offset = 80.0
"#,
        )
        .unwrap();
        assert_eq!(cfg.discovery.max_div_children, 6);
        assert_eq!(cfg.discovery.rescan_interval_ms, 500);
        assert_eq!(cfg.discovery.max_div_width, 400.0);
        assert_eq!(cfg.connector.min_offset, 80.0);
        assert_eq!(cfg.parser, ParserConfig::default());
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(XdConfig::from_toml("[discovery]\nmax_div_children = \"many\"").is_err());
    }
}
