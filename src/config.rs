use std::{
    io,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::Args;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("couldn't find a config directory for this user")]
    NoConfigDir,
    #[error("couldn't read config file {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("couldn't write config file {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("couldn't parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("couldn't serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("video size must be non zero, got {width}x{height}")]
    VideoSize { width: u32, height: u32 },
}

/// what the optional config file can set, every field falls back to its default
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub ringtone: Option<PathBuf>,
    pub background: Option<PathBuf>,
    #[serde(with = "crate::duration::serde_str")]
    pub snooze: Duration,
    #[serde(with = "crate::duration::serde_str")]
    pub timeout: Duration,
    /// chrono format string for the big clock
    pub time_format: String,
    pub video: VideoConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct VideoConfig {
    /// program used to decode video backgrounds
    pub decoder: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            decoder: PathBuf::from("ffmpeg"),
            width: 1280,
            height: 720,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ringtone: None,
            background: None,
            snooze: Duration::from_secs(5 * 60),
            timeout: Duration::from_secs(60),
            time_format: "%H:%M".to_string(),
            video: VideoConfig::default(),
        }
    }
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&config).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if config.video.width == 0 || config.video.height == 0 {
            return Err(ConfigError::VideoSize {
                width: config.video.width,
                height: config.video.height,
            });
        }
        Ok(config)
    }

    /// a missing file is not an error, it just means defaults
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            log::debug!("no config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let config = toml::to_string(self)?;
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(path, config).map_err(write_err)
    }

    /// writes the default config, returns false if a file was already there and `force` wasn't set
    pub fn init(path: &Path, force: bool) -> Result<bool, ConfigError> {
        if path.exists() && !force {
            return Ok(false);
        }
        Self::new().save(path)?;
        Ok(true)
    }

    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let mut path = directories::ProjectDirs::from("", "", "roosty_alarm")
            .ok_or(ConfigError::NoConfigDir)?
            .config_dir()
            .to_path_buf();
        path.push("config.toml");
        Ok(path)
    }
}

/// the flat configuration everything else runs from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub ringtone: Option<PathBuf>,
    pub background: Option<PathBuf>,
    pub snooze: Duration,
    pub timeout: Duration,
    pub time_format: String,
    pub video: VideoConfig,
}

impl Settings {
    /// command line flags win over the config file
    #[must_use]
    pub fn resolve(args: &Args, config: Config) -> Self {
        Self {
            ringtone: args.ringtone.clone().or(config.ringtone),
            background: args.background.clone().or(config.background),
            snooze: args.snooze.unwrap_or(config.snooze),
            timeout: args.timeout.unwrap_or(config.timeout),
            time_format: config.time_format,
            video: config.video,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        let Config {
            ringtone,
            background,
            snooze,
            timeout,
            time_format,
            video,
        } = Config::default();
        Self {
            ringtone,
            background,
            snooze,
            timeout,
            time_format,
            video,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert_eq!(settings.snooze, Duration::from_secs(300));
        assert_eq!(settings.timeout, Duration::from_secs(60));
        assert!(settings.ringtone.is_none());
        assert!(settings.background.is_none());
        assert_eq!(settings.video.width, 1280);
        assert_eq!(settings.video.height, 720);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "snooze = \"10m\"\nbackground = \"/tmp/bg.webm\"\n\n[video]\nwidth = 640\n",
        )
        .unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.snooze, Duration::from_secs(600));
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.background, Some(PathBuf::from("/tmp/bg.webm")));
        assert_eq!(config.video.width, 640);
        assert_eq!(config.video.height, 720);
        assert_eq!(config.video.decoder, PathBuf::from("ffmpeg"));
    }

    #[test]
    fn bad_duration_in_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "timeout = \"whenever\"\n").unwrap();
        assert!(matches!(
            Config::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn zero_video_size_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[video]\nheight = 0\n").unwrap();
        assert!(matches!(
            Config::load(&path),
            Err(ConfigError::VideoSize { height: 0, .. })
        ));
    }

    #[test]
    fn missing_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn init_does_not_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        assert!(Config::init(&path, false).unwrap());
        assert_eq!(Config::load(&path).unwrap(), Config::default());

        std::fs::write(&path, "snooze = \"15m\"\n").unwrap();
        assert!(!Config::init(&path, false).unwrap());
        assert_eq!(
            Config::load(&path).unwrap().snooze,
            Duration::from_secs(900)
        );

        assert!(Config::init(&path, true).unwrap());
        assert_eq!(Config::load(&path).unwrap(), Config::default());
    }

    #[test]
    fn flags_override_file() {
        let config = Config {
            ringtone: Some(PathBuf::from("file.mp3")),
            background: Some(PathBuf::from("file.png")),
            snooze: Duration::from_secs(600),
            timeout: Duration::from_secs(120),
            ..Config::default()
        };
        let args = Args::try_parse_from(["roosty_alarm", "-r", "flag.wav", "-t", "0"]).unwrap();
        let settings = Settings::resolve(&args, config);
        assert_eq!(settings.ringtone, Some(PathBuf::from("flag.wav")));
        assert_eq!(settings.background, Some(PathBuf::from("file.png")));
        assert_eq!(settings.snooze, Duration::from_secs(600));
        assert_eq!(settings.timeout, Duration::ZERO);
    }
}
