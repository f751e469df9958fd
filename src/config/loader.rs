//! Reading configuration documents from text or from disk.

use super::Config;
use crate::{Error, ErrorContext, Result};
use serde_json::Value;
use std::path::Path;

/// Document formats understood by [`Config::load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();
        match ext.as_str() {
            "json" => Some(ConfigFormat::Json),
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            _ => None,
        }
    }
}

impl Config {
    pub fn from_json_str(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content).map_err(|e| {
            Error::configuration_with_context(
                "invalid JSON configuration",
                ErrorContext::new()
                    .with_details(e.to_string())
                    .with_source("config_loader"),
            )
        })?;
        Self::from_value(value)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(content).map_err(|e| {
            Error::configuration_with_context(
                "invalid YAML configuration",
                ErrorContext::new()
                    .with_details(e.to_string())
                    .with_source("config_loader"),
            )
        })?;
        Self::from_value(value)
    }

    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self> {
        match format {
            ConfigFormat::Json => Self::from_json_str(content),
            ConfigFormat::Yaml => Self::from_yaml_str(content),
        }
    }

    /// Read a configuration file, picking the parser from its extension
    /// (`.json`, `.yaml`, `.yml`).
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let path_text = path.to_string_lossy().to_string();
        let format = ConfigFormat::from_path(path).ok_or_else(|| {
            Error::configuration_with_context(
                "unsupported configuration file extension",
                ErrorContext::new()
                    .with_field_path(path_text.clone())
                    .with_details("expected .json, .yaml or .yml")
                    .with_source("config_loader"),
            )
        })?;

        let bytes = tokio::fs::read(path).await.map_err(|e| {
            Error::configuration_with_context(
                "cannot read configuration file",
                ErrorContext::new()
                    .with_field_path(path_text.clone())
                    .with_details(e.to_string())
                    .with_source("config_loader"),
            )
        })?;

        // Editors on Windows like to prepend a UTF-8 BOM.
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(&bytes);
        let content = std::str::from_utf8(bytes).map_err(|e| {
            Error::configuration_with_context(
                "configuration file is not valid UTF-8",
                ErrorContext::new()
                    .with_field_path(path_text.clone())
                    .with_details(e.to_string())
                    .with_source("config_loader"),
            )
        })?;

        let config = Self::parse(content, format)?;
        tracing::debug!(
            path = %path_text,
            functions = config.functions.len(),
            "loaded configuration"
        );
        Ok(config)
    }
}
