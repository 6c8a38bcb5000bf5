use std::{
    io,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{dispatcher::DispatcherConfig, report::EPOCH_SECONDS};

const APP_NAME: &str = "roosty_alarm";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("couldn't read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("couldn't write config file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("couldn't parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("couldn't serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("`{0}` is not a valid time format")]
    InvalidTimeFormat(String),
    #[error("tick_secs must be at least 1")]
    ZeroTick,
    #[error("couldn't find a config directory")]
    NoConfigDir,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// strftime format used for every time in a report
    pub time_format: String,
    /// show the `alarm> ` prompt before each request
    pub prompt: bool,
    /// seconds between countdown reports
    pub tick_secs: u64,
    /// how long the dispatcher waits for new alarms when there are none
    pub idle_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            time_format: EPOCH_SECONDS.to_string(),
            prompt: true,
            tick_secs: 1,
            idle_ms: 1000,
        }
    }
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads and validates the config at `path`. A missing file means the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = match std::fs::read_to_string(path) {
            Ok(config) => toml::from_str(&config)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Self::default(),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Self::validate(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let config = toml::to_string(self)?;
        let write_error = |source: io::Error| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }
        std::fs::write(path, config).map_err(write_error)
    }

    pub fn validate(self) -> Result<Self, ConfigError> {
        if !crate::report::is_valid_time_format(&self.time_format) {
            return Err(ConfigError::InvalidTimeFormat(self.time_format));
        }
        if self.tick_secs == 0 {
            return Err(ConfigError::ZeroTick);
        }
        Ok(self)
    }

    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let mut path = directories::ProjectDirs::from("", "", APP_NAME)
            .ok_or(ConfigError::NoConfigDir)?
            .config_dir()
            .to_path_buf();
        path.push("config.toml");
        Ok(path)
    }

    #[must_use]
    pub const fn dispatcher(&self) -> DispatcherConfig {
        DispatcherConfig {
            idle: Duration::from_millis(self.idle_ms),
            tick: Duration::from_secs(self.tick_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            time_format: "%H:%M:%S".to_string(),
            prompt: false,
            tick_secs: 2,
            idle_ms: 250,
        };
        config.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "prompt = false\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert!(!config.prompt);
        assert_eq!(config.time_format, EPOCH_SECONDS);
        assert_eq!(config.tick_secs, 1);
    }

    #[test]
    fn bad_toml_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "tick_secs = \"soon\"\n").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn rejects_bad_time_format() {
        let config = Config {
            time_format: "%Q".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTimeFormat(_))
        ));
    }

    #[test]
    fn rejects_zero_tick() {
        let config = Config {
            tick_secs: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroTick)));
    }

    #[test]
    fn dispatcher_timings_come_from_config() {
        let timings = Config {
            tick_secs: 3,
            idle_ms: 20,
            ..Config::default()
        }
        .dispatcher();
        assert_eq!(timings.tick, Duration::from_secs(3));
        assert_eq!(timings.idle, Duration::from_millis(20));
    }
}
