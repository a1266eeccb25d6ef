use crate::domain::motor::PvNaming;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Relative path checked before the per-user config directory
pub const LOCAL_CONFIG_PATH: &str = "config/config.json";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("no motor process variables configured")]
    NoProcessVariables,
    #[error("process variable name at index {0} is blank")]
    BlankProcessVariable(usize),
    #[error("notify interval must be at least {min} ms, got {got} ms")]
    NotifyIntervalTooShort { min: u64, got: u64 },
    #[error("channel access timeout must be between 0 and {max} seconds")]
    InvalidTimeout { max: f64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_level")]
    pub level: String, // "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_false")]
    pub file_logging_enabled: bool,
    #[serde(default = "default_true")]
    pub console_logging_enabled: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_prefix")]
    pub file_name_prefix: String,
    #[serde(default = "default_false")]
    pub show_file_line: bool,
    #[serde(default = "default_false")]
    pub show_thread_ids: bool,
    #[serde(default = "default_true")]
    pub show_target: bool,
    #[serde(default = "default_true")]
    pub ansi_colors: bool,
    #[serde(default = "default_rotation")]
    pub rotation: String, // "daily", "hourly", "minutely", "never"
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            file_logging_enabled: default_false(),
            console_logging_enabled: default_true(),
            log_dir: default_log_dir(),
            file_name_prefix: default_prefix(),
            show_file_line: default_false(),
            show_thread_ids: default_false(),
            show_target: default_true(),
            ansi_colors: default_true(),
            rotation: default_rotation(),
        }
    }
}

/// Where the Channel Access command line tools live and how long to wait on them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelAccessSettings {
    #[serde(default = "default_caget")]
    pub caget: String,
    #[serde(default = "default_caput")]
    pub caput: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,
}

impl Default for ChannelAccessSettings {
    fn default() -> Self {
        Self {
            caget: default_caget(),
            caput: default_caput(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Local name put in the advertisement
    #[serde(default = "default_name")]
    pub name: String,
    /// Motor base PV names, one characteristic group each
    #[serde(default = "default_pvs")]
    pub pvs: Vec<String>,
    #[serde(default)]
    pub naming: PvNaming,
    #[serde(default = "default_notify_interval_ms")]
    pub notify_interval_ms: u64,

    // Advanced BLE Settings
    /// Adapter to serve on, e.g. "hci0". Uses the default adapter when unset.
    #[serde(default)]
    pub adapter: Option<String>,
    #[serde(default = "default_manufacturer_id")]
    pub manufacturer_id: u16,

    #[serde(default)]
    pub channel_access: ChannelAccessSettings,

    // Logging Settings
    #[serde(default)]
    pub log_settings: LogSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            name: default_name(),
            pvs: default_pvs(),
            naming: PvNaming::default(),
            notify_interval_ms: default_notify_interval_ms(),
            adapter: None,
            manufacturer_id: default_manufacturer_id(),
            channel_access: ChannelAccessSettings::default(),
            log_settings: LogSettings::default(),
        }
    }
}

impl Settings {
    pub const MIN_NOTIFY_INTERVAL_MS: u64 = 100;
    pub const MAX_CA_TIMEOUT_SECS: f64 = 3600.0;

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pvs.is_empty() {
            return Err(ConfigError::NoProcessVariables);
        }
        if let Some(index) = self.pvs.iter().position(|pv| pv.trim().is_empty()) {
            return Err(ConfigError::BlankProcessVariable(index));
        }
        if self.notify_interval_ms < Self::MIN_NOTIFY_INTERVAL_MS {
            return Err(ConfigError::NotifyIntervalTooShort {
                min: Self::MIN_NOTIFY_INTERVAL_MS,
                got: self.notify_interval_ms,
            });
        }
        let timeout = self.channel_access.timeout_secs;
        if !(timeout > 0.0 && timeout <= Self::MAX_CA_TIMEOUT_SECS) {
            return Err(ConfigError::InvalidTimeout {
                max: Self::MAX_CA_TIMEOUT_SECS,
            });
        }
        Ok(())
    }
}

fn default_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_log_dir() -> String {
    "logs".to_string()
}
fn default_prefix() -> String {
    "ble_motor_ctrl".to_string()
}
fn default_rotation() -> String {
    "daily".to_string()
}
fn default_name() -> String {
    "Motor - Monochromator 1".to_string()
}
fn default_pvs() -> Vec<String> {
    vec![
        "IOC:m1".to_string(),
        "IOC:m2".to_string(),
        "IOC:m3".to_string(),
    ]
}
fn default_notify_interval_ms() -> u64 {
    2000
}
fn default_manufacturer_id() -> u16 {
    0x000D // Texas Instruments
}
fn default_caget() -> String {
    "caget".to_string()
}
fn default_caput() -> String {
    "caput".to_string()
}
fn default_timeout_secs() -> f64 {
    1.0
}

pub struct SettingsService {
    settings: Settings,
    settings_path: Option<PathBuf>,
}

impl SettingsService {
    /// Load settings from `explicit` if given, otherwise from the first
    /// existing default location. Falls back to defaults when no file exists.
    pub fn new(explicit: Option<PathBuf>) -> anyhow::Result<Self> {
        let settings_path = match explicit {
            Some(path) => Some(path),
            None => Self::find_settings_path(),
        };

        let settings = match &settings_path {
            Some(path) => Self::load_from_file(path)?,
            None => Settings::default(),
        };
        settings.validate()?;

        Ok(Self {
            settings,
            settings_path,
        })
    }

    fn find_settings_path() -> Option<PathBuf> {
        let local = PathBuf::from(LOCAL_CONFIG_PATH);
        if local.is_file() {
            return Some(local);
        }

        let mut path = dirs::config_dir()?;
        path.push("ble_motor_ctrl");
        path.push("config.json");
        path.is_file().then_some(path)
    }

    fn load_from_file(path: &Path) -> anyhow::Result<Settings> {
        let contents = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Could not read {}: {}", path.display(), e))?;
        let settings = serde_json::from_str(&contents)
            .map_err(|e| anyhow::anyhow!("Invalid config {}: {}", path.display(), e))?;
        Ok(settings)
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }

    pub fn path(&self) -> Option<&Path> {
        self.settings_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pvs_and_name_config() {
        let json = r#"{ "pvs": ["BL:mono:m1", "BL:mono:m2"], "name": "Mono" }"#;
        let settings: Settings = serde_json::from_str(json).unwrap();

        assert_eq!(settings.name, "Mono");
        assert_eq!(settings.pvs, vec!["BL:mono:m1", "BL:mono:m2"]);
        assert_eq!(settings.naming, PvNaming::MotorRecord);
        assert_eq!(settings.notify_interval_ms, 2000);
        assert_eq!(settings.manufacturer_id, 0x000D);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert_eq!(settings.pvs.len(), 3);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validation_errors() {
        let mut settings = Settings::default();
        settings.pvs.clear();
        assert_eq!(settings.validate(), Err(ConfigError::NoProcessVariables));

        settings.pvs = vec!["IOC:m1".into(), "  ".into()];
        assert_eq!(
            settings.validate(),
            Err(ConfigError::BlankProcessVariable(1))
        );

        settings.pvs = vec!["IOC:m1".into()];
        settings.notify_interval_ms = 10;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::NotifyIntervalTooShort { got: 10, .. })
        ));

        settings.notify_interval_ms = 15_000;
        settings.channel_access.timeout_secs = 0.0;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidTimeout { .. })
        ));
    }

    #[test]
    fn test_timeout_bounds() {
        let mut settings = Settings::default();
        for bad in [f64::NAN, f64::INFINITY, -1.0, 1e30, 3600.5] {
            settings.channel_access.timeout_secs = bad;
            assert!(
                matches!(settings.validate(), Err(ConfigError::InvalidTimeout { .. })),
                "{bad} should be rejected"
            );
        }

        settings.channel_access.timeout_secs = Settings::MAX_CA_TIMEOUT_SECS;
        assert!(settings.validate().is_ok());
        settings.channel_access.timeout_secs = 0.25;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_explicit_file() {
        let path = std::env::temp_dir().join(format!(
            "ble_motor_ctrl_settings_{}.json",
            std::process::id()
        ));
        fs::write(
            &path,
            r#"{ "pvs": ["X:m1"], "naming": "setpoint_readback", "notify_interval_ms": 5000 }"#,
        )
        .unwrap();

        let service = SettingsService::new(Some(path.clone())).unwrap();
        assert_eq!(service.get().pvs, vec!["X:m1"]);
        assert_eq!(service.get().naming, PvNaming::SetpointReadback);
        assert_eq!(service.get().notify_interval_ms, 5000);
        assert_eq!(service.path(), Some(path.as_path()));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let path = PathBuf::from("/nonexistent/ble_motor_ctrl/config.json");
        assert!(SettingsService::new(Some(path)).is_err());
    }
}
