//! Configuration management for the ATEM surface
//!
//! Handles loading, validating and hot-reloading of the YAML instance configuration.

pub mod watcher;

use crate::models::{get_model_spec, ModelId};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

pub use watcher::ConfigWatcher;

/// How preset buttons name sources
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PresetLabelStyle {
    #[default]
    Short,
    Long,
}

/// Persisted settings of one switcher instance
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ModuleConfig {
    /// Switcher address
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// `0` selects the model the device reports
    #[serde(default)]
    pub model_id: ModelId,
    #[serde(default)]
    pub preset_label_style: PresetLabelStyle,
    /// Gain fade steps per second
    #[serde(default = "default_fade_fps")]
    pub fade_fps: u32,
    #[serde(default = "default_true")]
    pub poll_tally: bool,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            host: "192.168.10.240".to_string(),
            port: default_port(),
            model_id: ModelId::AUTO_DETECT,
            preset_label_style: PresetLabelStyle::default(),
            fade_fps: default_fade_fps(),
            poll_tally: true,
        }
    }
}

impl ModuleConfig {
    /// Load configuration from file with validation
    pub async fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: ModuleConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML config: {}", path))?;

        config.validate()?;

        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self, path: &str) -> Result<()> {
        let yaml = serde_yaml::to_string(self).context("Failed to serialize config to YAML")?;

        fs::write(path, yaml)
            .await
            .with_context(|| format!("Failed to write config file: {}", path))?;

        Ok(())
    }

    /// Validate configuration for correctness and consistency
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            anyhow::bail!("host cannot be empty");
        }
        if self.port == 0 {
            anyhow::bail!("port must be non-zero");
        }
        if !self.model_id.is_auto() && get_model_spec(self.model_id).is_none() {
            anyhow::bail!("Unknown model_id {}", self.model_id);
        }
        if !(1..=60).contains(&self.fade_fps) {
            anyhow::bail!("fade_fps {} out of range (must be 1-60)", self.fade_fps);
        }
        Ok(())
    }
}

fn default_port() -> u16 {
    9910
}
fn default_fade_fps() -> u32 {
    10
}
fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config: ModuleConfig = serde_yaml::from_str("host: 10.0.0.5\n").unwrap();
        assert_eq!(config.port, 9910);
        assert_eq!(config.model_id, ModelId::AUTO_DETECT);
        assert_eq!(config.preset_label_style, PresetLabelStyle::Short);
        assert_eq!(config.fade_fps, 10);
        assert!(config.poll_tally);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let bad = [
            ModuleConfig {
                host: " ".into(),
                ..ModuleConfig::default()
            },
            ModuleConfig {
                model_id: ModelId(200),
                ..ModuleConfig::default()
            },
            ModuleConfig {
                fade_fps: 0,
                ..ModuleConfig::default()
            },
            ModuleConfig {
                fade_fps: 61,
                ..ModuleConfig::default()
            },
        ];
        for config in bad {
            assert!(config.validate().is_err(), "{:?}", config);
        }
    }

    #[tokio::test]
    async fn test_save_then_load() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("atem.yaml");
        let path = path.to_string_lossy().to_string();

        let config = ModuleConfig {
            model_id: ModelId::MINI_PRO,
            preset_label_style: PresetLabelStyle::Long,
            ..ModuleConfig::default()
        };
        config.save(&path).await?;
        assert_eq!(ModuleConfig::load(&path).await?, config);
        Ok(())
    }
}
