//! Configuration management for hush-ap
//!
//! Two tiers:
//! 1. **TOML bootstrap**: asset folder, startup category, output, meter and
//!    countdown cadence, logging (static, read once at startup)
//! 2. **Command-line / environment overrides** applied on top
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments (--asset-dir, --category, --no-audio, ...)
//! 2. Environment variables (HUSH_ASSET_DIR)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)
//!
//! A missing config file is not an error unless it was named explicitly.

use crate::audio::sink::{SinkKind, DEFAULT_NULL_SAMPLE_RATE};
use crate::error::{Error, Result};
use crate::playback::engine::{DEFAULT_REFRESH_HZ, REFRESH_HZ_RANGE};
use hush_common::config::{locate_config_file, resolve_asset_folder, ASSET_DIR_ENV};
use hush_common::time::millis_to_duration;
use hush_common::Category;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    /// Folder holding `white_noise.*`, `nature_sounds.*`, `rhythm_beat.*`
    #[serde(default)]
    pub asset_dir: Option<PathBuf>,

    /// Category selected at startup (name, asset stem or index)
    #[serde(default)]
    pub initial_category: Option<String>,

    /// Delay before playback starts on its own; 0 disables autostart
    #[serde(default = "default_autostart_delay_ms")]
    pub autostart_delay_ms: u64,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub meter: MeterConfig,

    #[serde(default)]
    pub countdown: CountdownConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Real audio device via cpal
    #[default]
    Device,
    /// Real-time render thread without a device
    Null,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub mode: OutputMode,

    /// Output device name (None = system default)
    #[serde(default)]
    pub device: Option<String>,

    /// Sample rate of the null sink
    #[serde(default = "default_null_sample_rate")]
    pub null_sample_rate: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            mode: OutputMode::default(),
            device: None,
            null_sample_rate: default_null_sample_rate(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeterConfig {
    /// Loudness sampling frequency (1..=240 Hz)
    #[serde(default = "default_refresh_hz")]
    pub refresh_hz: u32,
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            refresh_hz: default_refresh_hz(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CountdownConfig {
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_autostart_delay_ms() -> u64 {
    500
}

fn default_null_sample_rate() -> u32 {
    DEFAULT_NULL_SAMPLE_RATE
}

fn default_refresh_hz() -> u32 {
    DEFAULT_REFRESH_HZ
}

fn default_tick_ms() -> u64 {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let toml_str = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&toml_str)
    }
}

/// Command-line configuration overrides
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub asset_dir: Option<PathBuf>,
    pub category: Option<Category>,
    pub no_audio: bool,
    pub device: Option<String>,
    pub refresh_hz: Option<u32>,
}

/// Complete, validated application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub asset_dir: PathBuf,
    pub initial_category: Category,
    /// None when autostart is disabled
    pub autostart_delay: Option<Duration>,
    pub output: SinkKind,
    pub refresh_hz: u32,
    pub countdown_tick: Duration,
    pub logging: LoggingConfig,
    /// Config file the values were read from, None when defaults were used
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Locate and read the TOML file (if any), then apply overrides
    pub async fn load(overrides: ConfigOverrides) -> Result<Self> {
        let source_path = locate_config_file(overrides.config_path.as_deref())?;
        let toml_config = match source_path.as_deref() {
            Some(path) => TomlConfig::load(path).await?,
            None => TomlConfig::default(),
        };
        let mut config = Self::resolve(toml_config, overrides)?;
        config.source_path = source_path;
        Ok(config)
    }

    /// Merge TOML values with overrides and validate
    pub fn resolve(toml_config: TomlConfig, overrides: ConfigOverrides) -> Result<Self> {
        let asset_dir = resolve_asset_folder(
            overrides.asset_dir.as_deref(),
            ASSET_DIR_ENV,
            toml_config.asset_dir.as_deref(),
        );

        let initial_category = match overrides.category {
            Some(category) => category,
            None => match toml_config.initial_category.as_deref() {
                Some(name) => name.parse::<Category>()?,
                None => Category::default(),
            },
        };

        let output = if overrides.no_audio || toml_config.output.mode == OutputMode::Null {
            SinkKind::Null {
                sample_rate: toml_config.output.null_sample_rate,
            }
        } else {
            SinkKind::Device(overrides.device.or(toml_config.output.device))
        };

        let refresh_hz = overrides.refresh_hz.unwrap_or(toml_config.meter.refresh_hz);
        if !REFRESH_HZ_RANGE.contains(&refresh_hz) {
            return Err(Error::Config(format!(
                "Meter refresh rate {}Hz outside {}..={}",
                refresh_hz,
                REFRESH_HZ_RANGE.start(),
                REFRESH_HZ_RANGE.end()
            )));
        }

        if toml_config.countdown.tick_ms == 0 {
            return Err(Error::Config("Countdown tick_ms must be > 0".to_string()));
        }

        let autostart_delay = match toml_config.autostart_delay_ms {
            0 => None,
            ms => Some(millis_to_duration(ms)),
        };

        Ok(Self {
            asset_dir,
            initial_category,
            autostart_delay,
            output,
            refresh_hz,
            countdown_tick: millis_to_duration(toml_config.countdown.tick_ms),
            logging: toml_config.logging,
            source_path: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_assets() -> ConfigOverrides {
        ConfigOverrides {
            asset_dir: Some(PathBuf::from("/tmp/hush-assets")),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = Config::resolve(TomlConfig::default(), with_assets()).unwrap();

        assert_eq!(config.asset_dir, PathBuf::from("/tmp/hush-assets"));
        assert_eq!(config.initial_category, Category::WhiteNoise);
        assert_eq!(config.output, SinkKind::Device(None));
        assert_eq!(config.refresh_hz, 60);
        assert_eq!(config.countdown_tick, Duration::from_secs(1));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_empty_toml_matches_defaults() {
        let toml_config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(toml_config.autostart_delay_ms, 500);
        assert_eq!(toml_config.meter.refresh_hz, 60);
        assert_eq!(toml_config.output.null_sample_rate, 44100);
        assert_eq!(toml_config.countdown.tick_ms, 1000);
    }

    #[test]
    fn test_full_toml() {
        let toml_config = TomlConfig::from_toml_str(
            r#"
            asset_dir = "/srv/sounds"
            initial_category = "rhythm_beat"
            autostart_delay_ms = 0

            [output]
            mode = "null"
            null_sample_rate = 48000

            [meter]
            refresh_hz = 30

            [logging]
            level = "debug"
            file = "/var/log/hush.log"
            "#,
        )
        .unwrap();

        let config = Config::resolve(toml_config, ConfigOverrides::default()).unwrap();
        assert_eq!(config.initial_category, Category::Rhythm);
        assert_eq!(config.autostart_delay, None);
        assert_eq!(config.output, SinkKind::Null { sample_rate: 48000 });
        assert_eq!(config.refresh_hz, 30);
        assert_eq!(config.logging.file, Some(PathBuf::from("/var/log/hush.log")));
    }

    #[test]
    fn test_overrides_win() {
        let toml_config = TomlConfig::from_toml_str(
            r#"
            initial_category = "nature"
            [output]
            device = "Speakers"
            "#,
        )
        .unwrap();

        let overrides = ConfigOverrides {
            category: Some(Category::Rhythm),
            device: Some("Headphones".to_string()),
            refresh_hz: Some(120),
            ..with_assets()
        };

        let config = Config::resolve(toml_config, overrides).unwrap();
        assert_eq!(config.initial_category, Category::Rhythm);
        assert_eq!(config.output, SinkKind::Device(Some("Headphones".to_string())));
        assert_eq!(config.refresh_hz, 120);
    }

    #[test]
    fn test_no_audio_selects_null_sink() {
        let overrides = ConfigOverrides {
            no_audio: true,
            ..with_assets()
        };
        let config = Config::resolve(TomlConfig::default(), overrides).unwrap();
        assert_eq!(config.output, SinkKind::Null { sample_rate: 44100 });
    }

    #[test]
    fn test_invalid_values_rejected() {
        let overrides = ConfigOverrides {
            refresh_hz: Some(0),
            ..with_assets()
        };
        assert!(matches!(
            Config::resolve(TomlConfig::default(), overrides),
            Err(Error::Config(_))
        ));

        let toml_config = TomlConfig::from_toml_str("initial_category = \"jazz\"").unwrap();
        assert!(Config::resolve(toml_config, with_assets()).is_err());

        assert!(matches!(
            TomlConfig::from_toml_str("[output]\nmode = \"speaker\""),
            Err(Error::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_load_records_source_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hush.toml");
        std::fs::write(&path, "autostart_delay_ms = 250\n[countdown]\ntick_ms = 500\n").unwrap();

        let overrides = ConfigOverrides {
            config_path: Some(path.clone()),
            ..with_assets()
        };
        let config = Config::load(overrides).await.unwrap();

        assert_eq!(config.source_path, Some(path));
        assert_eq!(config.autostart_delay, Some(Duration::from_millis(250)));
        assert_eq!(config.countdown_tick, Duration::from_millis(500));
    }

    #[test]
    fn test_resolve_has_no_source_path() {
        let config = Config::resolve(TomlConfig::default(), with_assets()).unwrap();
        assert_eq!(config.source_path, None);
    }
}
