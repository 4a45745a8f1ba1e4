//! Configuration schema for the widget client.

use crate::ConfigError;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Root config for one widget instance.
///
/// Every field except `api_key` has a default matching the original widget
/// behavior; unknown keys in config sources are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetConfig {
    /// API key attached as a bearer token. Required and non-empty.
    #[serde(default)]
    pub api_key: String,
    /// Base URL of the chat backend.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Screen corner the embedding application anchors the widget to.
    #[serde(default)]
    pub position: Position,
    /// Color theme hint for the embedding application.
    #[serde(default)]
    pub theme: Theme,
    /// Widget title.
    #[serde(default = "default_title")]
    pub title: String,
    /// Primary accent color as a hex string.
    #[serde(default = "default_primary_color")]
    pub primary_color: String,
    /// BCP-47 language tag.
    #[serde(default = "default_language")]
    pub language: String,
    /// Open the widget immediately after construction.
    #[serde(default)]
    pub auto_open: bool,
    /// Count unread bot messages while the widget is closed.
    #[serde(default = "default_true")]
    pub notifications: bool,
    /// Sound hint for the embedding application.
    #[serde(default = "default_true")]
    pub sound: bool,
    /// Polling schedule and retry budgets.
    #[serde(default)]
    pub polling: PollingConfig,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: default_endpoint(),
            position: Position::default(),
            theme: Theme::default(),
            title: default_title(),
            primary_color: default_primary_color(),
            language: default_language(),
            auto_open: false,
            notifications: true,
            sound: true,
            polling: PollingConfig::default(),
        }
    }
}

impl WidgetConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder(api_key: impl Into<String>) -> WidgetConfigBuilder {
        WidgetConfigBuilder::new(api_key)
    }

    /// Load a config from a JSON5 file.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        info!("loading config from path: {}", path.as_ref().display());
        let contents = fs::read_to_string(path)?;
        Self::load_from_str(&contents)
    }

    /// Load a config from JSON5 contents.
    pub fn load_from_str(contents: &str) -> Result<Self, ConfigError> {
        debug!("loading config from raw contents (len={})", contents.len());
        let value: Value = json5::from_str(contents)?;
        let config: WidgetConfig = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration invariants that cannot be expressed in serde.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::Invalid("api_key is required".to_string()));
        }
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("endpoint must not be empty".to_string()));
        }
        self.polling.validate()
    }
}

/// Builder for assembling a `WidgetConfig` in code.
#[derive(Debug, Clone)]
pub struct WidgetConfigBuilder {
    config: WidgetConfig,
}

impl WidgetConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            config: WidgetConfig {
                api_key: api_key.into(),
                ..WidgetConfig::default()
            },
        }
    }

    /// Replace the backend endpoint.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    /// Replace the widget position.
    pub fn position(mut self, position: Position) -> Self {
        self.config.position = position;
        self
    }

    /// Replace the widget theme.
    pub fn theme(mut self, theme: Theme) -> Self {
        self.config.theme = theme;
        self
    }

    /// Replace the widget title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.title = title.into();
        self
    }

    /// Replace the primary accent color.
    pub fn primary_color(mut self, color: impl Into<String>) -> Self {
        self.config.primary_color = color.into();
        self
    }

    /// Replace the language tag.
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.config.language = language.into();
        self
    }

    /// Open the widget immediately after construction.
    pub fn auto_open(mut self, auto_open: bool) -> Self {
        self.config.auto_open = auto_open;
        self
    }

    /// Toggle unread-message counting while closed.
    pub fn notifications(mut self, notifications: bool) -> Self {
        self.config.notifications = notifications;
        self
    }

    /// Toggle the sound hint.
    pub fn sound(mut self, sound: bool) -> Self {
        self.config.sound = sound;
        self
    }

    /// Replace the polling schedule and budgets.
    pub fn polling(mut self, polling: PollingConfig) -> Self {
        self.config.polling = polling;
        self
    }

    /// Finalize and return the built `WidgetConfig`.
    pub fn build(self) -> WidgetConfig {
        self.config
    }
}

/// Screen corner the widget anchors to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    /// Bottom-right corner.
    #[default]
    BottomRight,
    /// Bottom-left corner.
    BottomLeft,
    /// Top-right corner.
    TopRight,
    /// Top-left corner.
    TopLeft,
}

/// Color theme hint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light theme.
    #[default]
    Light,
    /// Dark theme.
    Dark,
}

/// Polling schedule and retry budgets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PollingConfig {
    /// Delay between continuous poll ticks, in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Consecutive poll failures tolerated before the poller stops.
    #[serde(default = "default_max_failures")]
    pub max_failures: u32,
    /// Delay between bounded reply-watch ticks, in milliseconds.
    #[serde(default = "default_reply_interval_ms")]
    pub reply_interval_ms: u64,
    /// Maximum reply-watch attempts after a send.
    #[serde(default = "default_max_reply_polls")]
    pub max_reply_polls: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            max_failures: default_max_failures(),
            reply_interval_ms: default_reply_interval_ms(),
            max_reply_polls: default_max_reply_polls(),
        }
    }
}

impl PollingConfig {
    /// Continuous poll tick delay.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Bounded reply-watch tick delay.
    pub fn reply_interval(&self) -> Duration {
        Duration::from_millis(self.reply_interval_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "polling.interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.max_failures == 0 {
            return Err(ConfigError::Invalid(
                "polling.max_failures must be greater than zero".to_string(),
            ));
        }
        if self.max_reply_polls == 0 {
            return Err(ConfigError::Invalid(
                "polling.max_reply_polls must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Default backend endpoint.
fn default_endpoint() -> String {
    "/chat/api".to_string()
}

/// Default widget title.
fn default_title() -> String {
    "Chat with us".to_string()
}

/// Default primary accent color.
fn default_primary_color() -> String {
    "#007bff".to_string()
}

/// Default language tag.
fn default_language() -> String {
    "en".to_string()
}

fn default_true() -> bool {
    true
}

/// Default continuous poll interval.
fn default_interval_ms() -> u64 {
    3000
}

/// Default consecutive-failure budget.
fn default_max_failures() -> u32 {
    3
}

/// Default reply-watch interval.
fn default_reply_interval_ms() -> u64 {
    2000
}

/// Default reply-watch attempt budget.
fn default_max_reply_polls() -> u32 {
    15
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn defaults_match_original_widget() {
        let config = WidgetConfig::builder("k1").build();
        assert_eq!(config.endpoint, "/chat/api");
        assert_eq!(config.position, Position::BottomRight);
        assert_eq!(config.theme, Theme::Light);
        assert_eq!(config.title, "Chat with us");
        assert_eq!(config.primary_color, "#007bff");
        assert_eq!(config.language, "en");
        assert!(!config.auto_open);
        assert!(config.notifications);
        assert!(config.sound);
        assert_eq!(config.polling.interval_ms, 3000);
        assert_eq!(config.polling.max_failures, 3);
        assert_eq!(config.polling.reply_interval_ms, 2000);
        assert_eq!(config.polling.max_reply_polls, 15);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let config = WidgetConfig::load_from_str(
            r#"{
                api_key: "k1",
                position: "top-left",
                frobnicate: true,
                widgets_per_page: 12,
            }"#,
        )
        .expect("load");
        assert_eq!(config.api_key, "k1");
        assert_eq!(config.position, Position::TopLeft);
    }

    #[test]
    fn missing_api_key_fails_validation() {
        let err = WidgetConfig::load_from_str("{ theme: \"dark\" }").expect_err("invalid");
        assert_eq!(err.to_string(), "invalid config: api_key is required");
    }

    #[test]
    fn zero_interval_fails_validation() {
        let config = WidgetConfig::builder("k1")
            .polling(PollingConfig {
                interval_ms: 0,
                ..PollingConfig::default()
            })
            .build();
        let err = config.validate().expect_err("invalid");
        assert!(err.to_string().contains("interval_ms"));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(
            file,
            r#"{{ api_key: "k1", title: "Support", polling: {{ interval_ms: 500 }} }}"#
        )
        .expect("write");
        let config = WidgetConfig::load_from_path(file.path()).expect("load");
        assert_eq!(config.title, "Support");
        assert_eq!(config.polling.interval_ms, 500);
        assert_eq!(config.polling.max_failures, 3);
    }
}
