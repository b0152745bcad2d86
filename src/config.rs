use crate::surprise::SurpriseId;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GiftConfig {
    pub gesture: GestureConfig,
    pub session: SessionConfig,
    pub surprises: SurpriseConfig,
    pub system: SystemConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GestureConfig {
    /// Hold time for the OK gate in the intro and instructions screens
    #[serde(default = "default_ok_hold_ms")]
    pub ok_hold_ms: u64,

    /// Hold time to collect a letter
    #[serde(default = "default_collect_hold_ms")]
    pub collect_hold_ms: u64,

    /// Hold time for the finale thumbs-up
    #[serde(default = "default_thumbs_up_hold_ms")]
    pub thumbs_up_hold_ms: u64,

    /// Thumb/index fingertip distance that counts as touching (normalized units)
    #[serde(default = "default_touch_threshold")]
    pub touch_threshold: f32,

    /// Thumb curled band relative to the thumb base spread
    #[serde(default = "default_thumb_curl_multiplier")]
    pub thumb_curl_multiplier: f32,

    /// Minimum rise of the thumb tip above its MCP joint for a thumbs-up
    #[serde(default = "default_thumbs_up_offset")]
    pub thumbs_up_offset: f32,
}

/// What happens once the last letter's presentation closes
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinaleVariant {
    /// Wait for a held thumbs-up, then reveal the collected captures
    ThumbsUpGrid,
    /// End the session straight away
    Immediate,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SessionConfig {
    /// Quiet period after a presentation closes before letters can be held again
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,

    #[serde(default = "default_finale")]
    pub finale: FinaleVariant,

    /// Scene rotation per unit of horizontal wrist movement
    #[serde(default = "default_rotation_gain")]
    pub rotation_gain: f32,

    /// Fraction of the remaining rotation applied per smoothing step
    #[serde(default = "default_rotation_smoothing")]
    pub rotation_smoothing: f32,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SurpriseConfig {
    /// Surprise for each newly collected letter, in collection order
    #[serde(default = "default_surprise_queue")]
    pub queue: Vec<SurpriseId>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SystemConfig {
    /// Event bus capacity
    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,

    /// Pending session inputs before senders wait
    #[serde(default = "default_input_queue_capacity")]
    pub input_queue_capacity: usize,
}

impl GiftConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("gesturegift.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let queue: Vec<String> = default_surprise_queue()
            .iter()
            .map(|id| id.as_str().to_string())
            .collect();

        let settings = Config::builder()
            .set_default("gesture.ok_hold_ms", default_ok_hold_ms() as i64)?
            .set_default("gesture.collect_hold_ms", default_collect_hold_ms() as i64)?
            .set_default(
                "gesture.thumbs_up_hold_ms",
                default_thumbs_up_hold_ms() as i64,
            )?
            .set_default("gesture.touch_threshold", default_touch_threshold() as f64)?
            .set_default(
                "gesture.thumb_curl_multiplier",
                default_thumb_curl_multiplier() as f64,
            )?
            .set_default("gesture.thumbs_up_offset", default_thumbs_up_offset() as f64)?
            .set_default("session.cooldown_ms", default_cooldown_ms() as i64)?
            .set_default("session.finale", "thumbs_up_grid")?
            .set_default("session.rotation_gain", default_rotation_gain() as f64)?
            .set_default(
                "session.rotation_smoothing",
                default_rotation_smoothing() as f64,
            )?
            .set_default("surprises.queue", queue)?
            .set_default(
                "system.event_bus_capacity",
                default_event_bus_capacity() as i64,
            )?
            .set_default(
                "system.input_queue_capacity",
                default_input_queue_capacity() as i64,
            )?
            // Add configuration file (optional)
            .add_source(File::with_name(&path_str).required(false))
            // Environment overrides, e.g. GIFT_SESSION__COOLDOWN_MS=2000
            .add_source(
                Environment::with_prefix("GIFT")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: GiftConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let gesture = &self.gesture;
        if gesture.ok_hold_ms == 0 || gesture.collect_hold_ms == 0 || gesture.thumbs_up_hold_ms == 0
        {
            return Err(ConfigError::Message(
                "Gesture hold durations must be greater than 0".to_string(),
            ));
        }

        if !(gesture.touch_threshold > 0.0) {
            return Err(ConfigError::Message(
                "Gesture touch_threshold must be greater than 0".to_string(),
            ));
        }

        if !(gesture.thumb_curl_multiplier >= 1.0) {
            return Err(ConfigError::Message(
                "Gesture thumb_curl_multiplier must be at least 1.0".to_string(),
            ));
        }

        if !(gesture.thumbs_up_offset >= 0.0) {
            return Err(ConfigError::Message(
                "Gesture thumbs_up_offset must not be negative".to_string(),
            ));
        }

        if !(self.session.rotation_smoothing > 0.0 && self.session.rotation_smoothing <= 1.0) {
            return Err(ConfigError::Message(
                "Session rotation_smoothing must be in (0, 1]".to_string(),
            ));
        }

        if self.surprises.queue.len() != crate::surprise::QUEUE_LENGTH {
            return Err(ConfigError::Message(format!(
                "Surprise queue must list exactly {} surprises, found {}",
                crate::surprise::QUEUE_LENGTH,
                self.surprises.queue.len()
            )));
        }

        if self.system.event_bus_capacity == 0 {
            return Err(ConfigError::Message(
                "Event bus capacity must be greater than 0".to_string(),
            ));
        }

        if self.system.input_queue_capacity == 0 {
            return Err(ConfigError::Message(
                "Input queue capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for GiftConfig {
    fn default() -> Self {
        Self {
            gesture: GestureConfig::default(),
            session: SessionConfig::default(),
            surprises: SurpriseConfig {
                queue: default_surprise_queue(),
            },
            system: SystemConfig {
                event_bus_capacity: default_event_bus_capacity(),
                input_queue_capacity: default_input_queue_capacity(),
            },
        }
    }
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            ok_hold_ms: default_ok_hold_ms(),
            collect_hold_ms: default_collect_hold_ms(),
            thumbs_up_hold_ms: default_thumbs_up_hold_ms(),
            touch_threshold: default_touch_threshold(),
            thumb_curl_multiplier: default_thumb_curl_multiplier(),
            thumbs_up_offset: default_thumbs_up_offset(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: default_cooldown_ms(),
            finale: default_finale(),
            rotation_gain: default_rotation_gain(),
            rotation_smoothing: default_rotation_smoothing(),
        }
    }
}

// Default value functions
fn default_ok_hold_ms() -> u64 {
    5000
}
fn default_collect_hold_ms() -> u64 {
    3000
}
fn default_thumbs_up_hold_ms() -> u64 {
    3000
}
fn default_touch_threshold() -> f32 {
    crate::classifier::TOUCH_THRESHOLD
}
fn default_thumb_curl_multiplier() -> f32 {
    crate::classifier::THUMB_CURL_MULTIPLIER
}
fn default_thumbs_up_offset() -> f32 {
    crate::classifier::THUMBS_UP_OFFSET
}

fn default_cooldown_ms() -> u64 {
    1500
}
fn default_finale() -> FinaleVariant {
    FinaleVariant::ThumbsUpGrid
}
fn default_rotation_gain() -> f32 {
    5.0
}
fn default_rotation_smoothing() -> f32 {
    0.1
}

fn default_surprise_queue() -> Vec<SurpriseId> {
    SurpriseId::DEFAULT_QUEUE.to_vec()
}

fn default_event_bus_capacity() -> usize {
    256
}
fn default_input_queue_capacity() -> usize {
    64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = GiftConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.gesture.ok_hold_ms, 5000);
        assert_eq!(config.gesture.collect_hold_ms, 3000);
        assert_eq!(config.gesture.thumbs_up_hold_ms, 3000);
        assert_eq!(config.session.cooldown_ms, 1500);
        assert_eq!(config.surprises.queue.len(), 6);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = GiftConfig::load_from_file(&path).unwrap();
        assert_eq!(config, GiftConfig::default());
    }

    #[test]
    fn test_load_from_file_overrides() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[session]
finale = "immediate"
cooldown_ms = 2000

[surprises]
queue = ["placeholder", "voice_clip", "dialogue_game", "image_reveal", "typed_letter", "final_redirect"]
"#
        )
        .unwrap();

        let config = GiftConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.session.finale, FinaleVariant::Immediate);
        assert_eq!(config.session.cooldown_ms, 2000);
        assert_eq!(config.surprises.queue[0], SurpriseId::Placeholder);
        // Untouched sections keep their defaults
        assert_eq!(config.gesture.collect_hold_ms, 3000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = GiftConfig::default();

        config.gesture.collect_hold_ms = 0;
        assert!(config.validate().is_err());
        config.gesture.collect_hold_ms = 3000;

        config.gesture.thumb_curl_multiplier = 0.9;
        assert!(config.validate().is_err());
        config.gesture.thumb_curl_multiplier = 1.2;

        config.surprises.queue.pop();
        assert!(config.validate().is_err());
        config.surprises.queue.push(SurpriseId::FinalRedirect);

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip_of_defaults() {
        let text = GiftConfig::default().to_toml().unwrap();
        assert!(text.contains("thumbs_up_grid"));
        assert!(text.contains("photo_slideshow"));
    }
}
