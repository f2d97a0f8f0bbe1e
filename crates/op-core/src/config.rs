//! Configuration system for oxidized-psp emulator

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// PSP date format: year/month/day
pub const PSP_DATE_FORMAT_YYYYMMDD: u32 = 0;
/// PSP date format: month/day/year
pub const PSP_DATE_FORMAT_MMDDYYYY: u32 = 1;
/// PSP date format: day/month/year
pub const PSP_DATE_FORMAT_DDMMYYYY: u32 = 2;

/// 24-hour clock
pub const PSP_TIME_FORMAT_24HR: u32 = 0;
/// 12-hour clock
pub const PSP_TIME_FORMAT_12HR: u32 = 1;

/// Confirm with the circle button (JP convention)
pub const PSP_BUTTON_PREFERENCE_CIRCLE: u32 = 0;
/// Confirm with the cross button
pub const PSP_BUTTON_PREFERENCE_CROSS: u32 = 1;

/// System language codes as exposed to the guest
pub const PSP_LANGUAGE_JAPANESE: u32 = 0;
pub const PSP_LANGUAGE_ENGLISH: u32 = 1;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub system: SystemParamConfig,
    pub compat: CompatConfig,
    pub debug: DebugConfig,
}

/// Console settings surfaced to the guest through the utility syscalls
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemParamConfig {
    /// Owner nickname reported to games
    pub nickname: String,
    /// Ad-hoc WLAN channel (0 = automatic, otherwise 1/6/11)
    pub adhoc_channel: u32,
    pub wlan_power_save: bool,
    pub date_format: u32,
    pub time_format: u32,
    /// Minutes from UTC
    pub timezone: i32,
    pub daylight_savings: bool,
    pub language: u32,
    pub button_preference: u32,
    pub lock_parental_level: u32,
}

/// Per-title compatibility switches
///
/// Each flag works around a specific title's misuse of the firmware API.
/// They default to off and are enabled from the compatibility database.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CompatConfig {
    /// Allow a new save dialog to displace an unfinished dialog handshake.
    /// Needed by a title that issues overlapping savedata init requests.
    pub savedata_overlap_workaround: bool,
    /// Report only English or Japanese as the system language
    pub english_or_japanese_only: bool,
    /// Force circle-confirm button preference regardless of settings
    pub force_circle_confirm: bool,
    /// Run without the audio codec HLE (firmware-dump setups)
    pub disable_audio_hle: bool,
}

/// Debug settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub log_to_file: bool,
    pub log_path: PathBuf,
}

impl Default for SystemParamConfig {
    fn default() -> Self {
        Self {
            nickname: "Player".to_string(),
            adhoc_channel: 0,
            wlan_power_save: false,
            date_format: PSP_DATE_FORMAT_YYYYMMDD,
            time_format: PSP_TIME_FORMAT_24HR,
            timezone: 0,
            daylight_savings: false,
            language: PSP_LANGUAGE_ENGLISH,
            button_preference: PSP_BUTTON_PREFERENCE_CROSS,
            lock_parental_level: 0,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_to_file: false,
            log_path: PathBuf::from("oxidized-psp.log"),
        }
    }
}

impl Config {
    /// Load configuration from file, or create default if it doesn't exist
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let path = Self::config_path();

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            Ok(toml::from_str(&content)?)
        } else {
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("oxidized-psp")
            .join("config.toml")
    }
}
