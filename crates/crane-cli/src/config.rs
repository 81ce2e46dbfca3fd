//! Configuration – reads/writes `~/.crane/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use crane_cockpit::{SessionSettings, DEFAULT_PORT};
use crane_control::SimulatorSettings;
use crane_runtime::StreamSettings;
use crane_types::{CraneError, Dimensions, MotionLimits};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid config at {path}: {source}")]
    Invalid {
        path: PathBuf,
        source: CraneError,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("failed to write config at {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Persisted settings stored in `~/.crane/config.toml`.
///
/// Every section is optional; missing values take the library defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// TCP port of the cockpit server.
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub stream: StreamSettings,

    #[serde(default)]
    pub simulator: SimulatorSettings,

    #[serde(default)]
    pub dimensions: Dimensions,

    /// Limits of the crane's own joints.
    #[serde(default = "MotionLimits::robot_default")]
    pub motion_limits: MotionLimits,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            stream: StreamSettings::default(),
            simulator: SimulatorSettings::default(),
            dimensions: Dimensions::default(),
            motion_limits: MotionLimits::robot_default(),
        }
    }
}

impl Config {
    /// Settings handed to every cockpit session.
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            dimensions: self.dimensions,
            motion_limits: self.motion_limits,
            stream: self.stream,
            simulator: self.simulator,
        }
    }

    /// Check every rate the server divides by.
    pub fn validate(&self) -> Result<(), CraneError> {
        let rates = [
            ("stream.streaming_frequency", self.stream.streaming_frequency),
            ("simulator.sensor_frequency", self.simulator.sensor_frequency),
            ("simulator.control_frequency", self.simulator.control_frequency),
        ];
        for (name, hz) in rates {
            CraneError::check_frequency(name, hz)?;
        }
        Ok(())
    }
}

/// Return the path to `~/.crane/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".crane").join("config.toml")
}

/// Load the config from a specific path.  Returns `None` if the file does
/// not exist and [`ConfigError::Invalid`] if it holds an unusable frequency.
pub fn load_from(path: &Path) -> Result<Option<Config>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let cfg: Config = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    cfg.validate().map_err(|source| ConfigError::Invalid {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(cfg))
}

/// Apply `CRANE_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `CRANE_PORT` | `port` |
/// | `CRANE_STREAMING_FREQUENCY` | `stream.streaming_frequency` |
/// | `CRANE_CONTROL_FREQUENCY` | `simulator.control_frequency` |
/// | `CRANE_SENSOR_FREQUENCY` | `simulator.sensor_frequency` |
///
/// Unparsable values and non-positive frequencies are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    apply_overrides(cfg, |key| std::env::var(key).ok());
}

pub(crate) fn apply_overrides(cfg: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(port) = var("CRANE_PORT").and_then(|v| v.parse::<u16>().ok()) {
        cfg.port = port;
    }
    if let Some(hz) = var("CRANE_STREAMING_FREQUENCY").and_then(|v| frequency(&v)) {
        cfg.stream.streaming_frequency = hz;
    }
    if let Some(hz) = var("CRANE_CONTROL_FREQUENCY").and_then(|v| frequency(&v)) {
        cfg.simulator.control_frequency = hz;
    }
    if let Some(hz) = var("CRANE_SENSOR_FREQUENCY").and_then(|v| frequency(&v)) {
        cfg.simulator.sensor_frequency = hz;
    }
}

fn frequency(raw: &str) -> Option<f64> {
    let hz = raw.trim().parse::<f64>().ok()?;
    CraneError::check_frequency("override", hz).ok()
}

/// Save the config to a specific path, creating its directory if necessary.
pub fn save_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    let write_err = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    let raw = toml::to_string_pretty(cfg)?;
    fs::write(path, raw).map_err(write_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn roundtrip_default_config() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        save_to(&Config::default(), &path).expect("save");

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded, Config::default());
        assert_eq!(loaded.port, 8000);
        assert_eq!(loaded.stream.streaming_frequency, 20.0);
        assert_eq!(loaded.simulator.kp, 0.3);
        assert_eq!(loaded.motion_limits, MotionLimits::robot_default());
        assert_eq!(loaded.simulator.origin_limits, MotionLimits::origin_default());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "port = 9001\n\n[simulator]\nkp = 0.5\n\n[stream]\nstreaming_frequency = 50.0\n",
        )
        .unwrap();

        let cfg = load_from(&path).unwrap().unwrap();
        assert_eq!(cfg.port, 9001);
        assert_eq!(cfg.simulator.kp, 0.5);
        assert_eq!(cfg.simulator.ki, 0.74);
        assert_eq!(cfg.stream.streaming_frequency, 50.0);
        assert_eq!(cfg.dimensions, Dimensions::default());
    }

    #[test]
    fn config_path_points_to_crane_dir() {
        let p = config_path_for_home("/home/testuser");
        assert!(p.to_string_lossy().contains(".crane"));
        assert!(p.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert!(load_from(&path).expect("no error").is_none());
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "port = \"eight thousand\"").unwrap();
        assert!(matches!(load_from(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn load_from_rejects_zero_streaming_frequency() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "[stream]\nstreaming_frequency = 0.0\n").unwrap();
        match load_from(&path) {
            Err(ConfigError::Invalid { source, .. }) => assert_eq!(
                source,
                CraneError::InvalidFrequency {
                    name: "stream.streaming_frequency".to_string(),
                    value: 0.0,
                }
            ),
            other => panic!("expected invalid config, got {other:?}"),
        }
    }

    #[test]
    fn load_from_rejects_negative_control_frequency() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "[simulator]\ncontrol_frequency = -20.0\n").unwrap();
        assert!(matches!(load_from(&path), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn overrides_change_port_and_frequencies() {
        let mut cfg = Config::default();
        apply_overrides(
            &mut cfg,
            env(&[
                ("CRANE_PORT", "9999"),
                ("CRANE_STREAMING_FREQUENCY", "50"),
                ("CRANE_CONTROL_FREQUENCY", "100"),
                ("CRANE_SENSOR_FREQUENCY", "10"),
            ]),
        );
        assert_eq!(cfg.port, 9999);
        assert_eq!(cfg.stream.streaming_frequency, 50.0);
        assert_eq!(cfg.simulator.control_frequency, 100.0);
        assert_eq!(cfg.simulator.sensor_frequency, 10.0);
    }

    #[test]
    fn overrides_ignore_invalid_values() {
        let mut cfg = Config::default();
        apply_overrides(
            &mut cfg,
            env(&[
                ("CRANE_PORT", "not-a-port"),
                ("CRANE_STREAMING_FREQUENCY", "0"),
                ("CRANE_CONTROL_FREQUENCY", "-5"),
                ("CRANE_SENSOR_FREQUENCY", "fast"),
            ]),
        );
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn session_settings_carry_every_section() {
        let mut cfg = Config::default();
        cfg.stream.streaming_frequency = 40.0;
        cfg.simulator.kd = 0.01;
        let settings = cfg.session_settings();
        assert_eq!(settings.stream.streaming_frequency, 40.0);
        assert_eq!(settings.simulator.kd, 0.01);
        assert_eq!(settings.dimensions, cfg.dimensions);
    }
}
