//! Configuration Management
//!
//! Handles persistent defaults for the gcp-collection renderer.

use crate::template::Template;
use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Rendering format for a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Yaml,
    Json,
}

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Template to render when none is given
    #[serde(default)]
    pub template: Option<Template>,
    /// Output format to use when none is given
    #[serde(default)]
    pub format: Option<OutputFormat>,
    /// Owning project to put in the environment when none is given
    #[serde(default)]
    pub project: Option<String>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("gcp-collection").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content).with_context(|| format!("Failed to write {:?}", path))?;

        Ok(())
    }

    /// Get effective template (CLI > config > basic)
    pub fn effective_template(&self, cli: Option<Template>) -> Template {
        cli.or(self.template).unwrap_or(Template::Basic)
    }

    /// Get effective format (CLI > config > yaml)
    pub fn effective_format(&self, cli: Option<OutputFormat>) -> OutputFormat {
        cli.or(self.format).unwrap_or(OutputFormat::Yaml)
    }

    /// Get effective environment project (CLI > config)
    pub fn effective_project(&self, cli: Option<String>) -> Option<String> {
        cli.or_else(|| self.project.clone())
    }

    /// Remember template and format and save
    pub fn set_defaults(&mut self, template: Template, format: OutputFormat) -> Result<()> {
        self.template = Some(template);
        self.format = Some(format);
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_config() {
        let config = Config {
            template: Some(Template::Scoped),
            format: Some(OutputFormat::Json),
            project: Some("from-config".to_string()),
        };
        assert_eq!(config.effective_template(Some(Template::Basic)), Template::Basic);
        assert_eq!(config.effective_template(None), Template::Scoped);
        assert_eq!(config.effective_format(Some(OutputFormat::Yaml)), OutputFormat::Yaml);
        assert_eq!(config.effective_format(None), OutputFormat::Json);
        assert_eq!(
            config.effective_project(Some("cli".to_string())).as_deref(),
            Some("cli")
        );
        assert_eq!(config.effective_project(None).as_deref(), Some("from-config"));
    }

    #[test]
    fn test_builtin_defaults() {
        let config = Config::default();
        assert_eq!(config.effective_template(None), Template::Basic);
        assert_eq!(config.effective_format(None), OutputFormat::Yaml);
        assert_eq!(config.effective_project(None), None);
    }

    #[test]
    fn test_config_json_shape() {
        let config: Config =
            serde_json::from_str(r#"{"template": "extensions", "format": "json"}"#).unwrap();
        assert_eq!(config.template, Some(Template::Extensions));
        assert_eq!(config.format, Some(OutputFormat::Json));
        assert!(config.project.is_none());
    }
}
