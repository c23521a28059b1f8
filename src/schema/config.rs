//! Configuration types for streaming, playback and export.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::animation::ExportFormat;

/// Floor applied to the inter-frame streaming delay.
pub const MIN_FRAME_DELAY_MS: u64 = 10;

/// Floor applied to the playback interval.
pub const MIN_PLAYBACK_INTERVAL_MS: u64 = 50;

/// Upper bound accepted by validation for either delay.
pub const MAX_DELAY_MS: u64 = 60_000;

fn default_baud() -> u32 {
    115_200
}

fn default_frame_delay_ms() -> u64 {
    100
}

fn default_interval_ms() -> u64 {
    200
}

fn default_export_name() -> String {
    "animation".to_string()
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CubeConfig {
    /// Serial streaming parameters.
    #[serde(default)]
    pub stream: StreamConfig,
    /// On-host playback parameters.
    #[serde(default)]
    pub playback: PlaybackConfig,
    /// Export parameters.
    #[serde(default)]
    pub export: ExportConfig,
}

impl CubeConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.stream.validate()?;
        self.playback.validate()?;
        self.export.validate()
    }
}

/// Serial streaming parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Connection descriptor, e.g. `/dev/ttyUSB0`.
    #[serde(default)]
    pub descriptor: String,
    /// Line speed in baud.
    #[serde(default = "default_baud")]
    pub baud: u32,
    /// Delay after each frame packet in milliseconds (floored at `MIN_FRAME_DELAY_MS`).
    #[serde(default = "default_frame_delay_ms")]
    pub frame_delay_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            descriptor: String::new(),
            baud: default_baud(),
            frame_delay_ms: default_frame_delay_ms(),
        }
    }
}

impl StreamConfig {
    /// Delay with the floor applied.
    pub fn clamp_delay(ms: u64) -> Duration {
        Duration::from_millis(ms.max(MIN_FRAME_DELAY_MS))
    }

    /// Inter-frame delay actually used by the streamer.
    #[inline]
    pub fn effective_delay(&self) -> Duration {
        Self::clamp_delay(self.frame_delay_ms)
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.descriptor.trim().is_empty() {
            return Err(ConfigError::MissingDescriptor);
        }
        if self.baud == 0 {
            return Err(ConfigError::InvalidBaud(self.baud));
        }
        if self.frame_delay_ms > MAX_DELAY_MS {
            return Err(ConfigError::DelayTooLong(self.frame_delay_ms));
        }
        Ok(())
    }
}

/// On-host playback parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Time between frames in milliseconds (floored at `MIN_PLAYBACK_INTERVAL_MS`).
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Restart from the first frame after the last.
    #[serde(default)]
    pub looping: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            looping: false,
        }
    }
}

impl PlaybackConfig {
    #[inline]
    pub fn effective_interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(MIN_PLAYBACK_INTERVAL_MS))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_ms > MAX_DELAY_MS {
            return Err(ConfigError::DelayTooLong(self.interval_ms));
        }
        Ok(())
    }
}

/// Export parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Symbol name of the exported array.
    #[serde(default = "default_export_name")]
    pub name: String,
    /// Output flavor.
    #[serde(default)]
    pub format: ExportFormat,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            name: default_export_name(),
            format: ExportFormat::default(),
        }
    }
}

impl ExportConfig {
    /// The name must be a valid C identifier.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut chars = self.name.chars();
        let valid = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(ConfigError::InvalidExportName(self.name.clone()));
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Serial device descriptor must not be empty")]
    MissingDescriptor,
    #[error("Baud rate must be non-zero (got {0})")]
    InvalidBaud(u32),
    #[error("Delay of {0} ms exceeds the {MAX_DELAY_MS} ms limit")]
    DelayTooLong(u64),
    #[error("Export name '{0}' is not a valid identifier")]
    InvalidExportName(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let config: CubeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.stream.baud, 115_200);
        assert_eq!(config.stream.frame_delay_ms, 100);
        assert_eq!(config.playback.interval_ms, 200);
        assert_eq!(config.export.name, "animation");
        assert_eq!(config.export.format, ExportFormat::ArrayLiteral);
    }

    #[test]
    fn test_partial_json() {
        let config: CubeConfig = serde_json::from_str(
            r#"{"stream": {"descriptor": "/dev/ttyACM0", "frame_delay_ms": 5},
                "export": {"name": "wave", "format": "sketch"}}"#,
        )
        .unwrap();
        assert_eq!(config.stream.baud, 115_200);
        assert_eq!(config.stream.effective_delay(), Duration::from_millis(10));
        assert_eq!(config.export.format, ExportFormat::Sketch);
        config.validate().unwrap();
    }

    #[test]
    fn test_delay_floors() {
        assert_eq!(StreamConfig::clamp_delay(0), Duration::from_millis(MIN_FRAME_DELAY_MS));
        assert_eq!(StreamConfig::clamp_delay(250), Duration::from_millis(250));

        let playback = PlaybackConfig {
            interval_ms: 1,
            looping: true,
        };
        assert_eq!(playback.effective_interval(), Duration::from_millis(50));
    }

    #[test]
    fn test_validation_errors() {
        let mut stream = StreamConfig::default();
        assert!(matches!(stream.validate(), Err(ConfigError::MissingDescriptor)));

        stream.descriptor = "/dev/ttyUSB0".into();
        stream.baud = 0;
        assert!(matches!(stream.validate(), Err(ConfigError::InvalidBaud(0))));

        stream.baud = 9600;
        stream.frame_delay_ms = MAX_DELAY_MS + 1;
        assert!(matches!(stream.validate(), Err(ConfigError::DelayTooLong(_))));

        let export = ExportConfig {
            name: "9lives".into(),
            format: ExportFormat::Header,
        };
        assert!(matches!(export.validate(), Err(ConfigError::InvalidExportName(_))));
    }
}
