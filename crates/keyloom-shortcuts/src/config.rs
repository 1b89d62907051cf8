//! Manager configuration

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::models::{Platform, ShortcutContext};

/// Default delay before a partially typed chord is abandoned
pub const DEFAULT_CHORD_TIMEOUT_MS: u64 = 1500;

/// Configuration for a [`ShortcutManager`](crate::manager::ShortcutManager)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Whether the manager reacts to key events at all
    pub enabled: bool,
    /// Milliseconds allowed between chord steps
    pub chord_timeout_ms: u64,
    /// Skip shortcuts without `enable_in_inputs` while a text field has focus
    pub ignore_inputs: bool,
    /// Platform used to resolve `mod`; detected when absent
    pub platform: Option<Platform>,
    /// Contexts active at construction, in addition to global
    pub contexts: Vec<ShortcutContext>,
    /// Preset loaded at construction
    pub preset: Option<String>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        ManagerConfig {
            enabled: true,
            chord_timeout_ms: DEFAULT_CHORD_TIMEOUT_MS,
            ignore_inputs: true,
            platform: None,
            contexts: Vec::new(),
            preset: None,
        }
    }
}

impl ManagerConfig {
    pub fn with_chord_timeout(mut self, timeout: Duration) -> Self {
        self.chord_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn with_preset(mut self, preset: impl Into<String>) -> Self {
        self.preset = Some(preset.into());
        self
    }

    pub fn with_context(mut self, context: ShortcutContext) -> Self {
        self.contexts.push(context);
        self
    }

    pub fn with_ignore_inputs(mut self, ignore_inputs: bool) -> Self {
        self.ignore_inputs = ignore_inputs;
        self
    }

    pub fn chord_timeout(&self) -> Duration {
        Duration::from_millis(self.chord_timeout_ms)
    }

    /// Check the configuration for values the manager cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chord_timeout_ms == 0 {
            return Err(ConfigError::ZeroChordTimeout);
        }
        Ok(())
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: ManagerConfig =
            serde_json::from_str(content).map_err(|e| ConfigError::InvalidJson(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ManagerConfig =
            serde_yaml::from_str(content).map_err(|e| ConfigError::InvalidYaml(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a `.json`, `.yaml` or `.yml` file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            Some("json") => Self::from_json_str(&content),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ManagerConfig::default();
        assert!(config.enabled);
        assert!(config.ignore_inputs);
        assert_eq!(config.chord_timeout(), Duration::from_millis(1500));
        assert!(config.platform.is_none());
        assert!(config.preset.is_none());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ManagerConfig::from_json_str(r#"{"chord_timeout_ms": 300, "platform": "macos"}"#).unwrap();
        assert_eq!(config.chord_timeout_ms, 300);
        assert_eq!(config.platform, Some(Platform::MacOs));
        assert!(config.enabled);
    }

    #[test]
    fn test_yaml_contexts() {
        let yaml = "preset: vim\ncontexts:\n  - chat\n  - command-palette\n";
        let config = ManagerConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.preset.as_deref(), Some("vim"));
        assert_eq!(
            config.contexts,
            vec![ShortcutContext::Chat, ShortcutContext::CommandPalette]
        );
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = ManagerConfig::from_json_str(r#"{"chord_timeout_ms": 0}"#);
        assert!(matches!(result, Err(ConfigError::ZeroChordTimeout)));
    }

    #[test]
    fn test_oversized_timeout_saturates() {
        let config = ManagerConfig::default().with_chord_timeout(Duration::MAX);
        assert_eq!(config.chord_timeout_ms, u64::MAX);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            ManagerConfig::from_json_str("{"),
            Err(ConfigError::InvalidJson(_))
        ));
    }
}
