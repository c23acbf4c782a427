use serde::Deserialize;

use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found")]
    NotFound,
    #[error("unable to determine the config directory, neither $XDG_CONFIG_HOME nor $HOME is set")]
    NoConfigDir,
    #[error("error reading config file {path}: {source}")]
    Io { path: String, source: io::Error },
    #[error("error parsing config file {path}: {source}")]
    Parse { path: String, source: toml::de::Error },
    #[error("invalid disable_duration \"{value}\": {source}")]
    Duration { value: String, source: humantime::DurationError },
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    max_attempts: Option<u32>,
    disable_duration: Option<String>,
    pin: Option<String>,
    setup: Option<bool>,
    store: Option<String>,
    store_limit: Option<usize>,
    volatile: Option<bool>,
}

#[derive(Debug, Default, PartialEq)]
pub struct Config {
    pub max_attempts: Option<u32>,
    pub disable_duration: Option<Duration>,
    pub pin: Option<String>,
    pub setup: Option<bool>,
    pub store: Option<PathBuf>,
    pub store_limit: Option<usize>,
    pub volatile: Option<bool>,
}

impl Config {
    /// Reads `path`, or `$XDG_CONFIG_HOME/pinlock/pinlock.toml` if none is given.
    pub fn new(path: Option<&str>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => PathBuf::from(path),
            None => config_dir()?.join("pinlock.toml"),
        };

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Err(ConfigError::NotFound),
            Err(source) => {
                return Err(ConfigError::Io { path: path.display().to_string(), source })
            }
        };

        log::info!("Using config file {}", path.display());
        Self::parse(&contents)
            .map_err(|err| match err {
                ConfigError::Parse { source, .. } => {
                    ConfigError::Parse { path: path.display().to_string(), source }
                }
                err => err,
            })
    }

    fn parse(contents: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(contents)
            .map_err(|source| ConfigError::Parse { path: String::new(), source })?;

        let disable_duration = match raw.disable_duration {
            Some(value) => match humantime::parse_duration(&value) {
                Ok(duration) => Some(duration),
                Err(source) => return Err(ConfigError::Duration { value, source }),
            },
            None => None,
        };

        Ok(Self {
            max_attempts: raw.max_attempts,
            disable_duration,
            pin: raw.pin,
            setup: raw.setup,
            store: raw.store.map(PathBuf::from),
            store_limit: raw.store_limit,
            volatile: raw.volatile,
        })
    }
}

/// `$XDG_CONFIG_HOME/pinlock`, falling back to `$HOME/.config/pinlock`.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    if let Some(dir) = env::var_os("XDG_CONFIG_HOME").filter(|dir| !dir.is_empty()) {
        return Ok(PathBuf::from(dir).join("pinlock"));
    }
    match env::var_os("HOME") {
        Some(home) => Ok(PathBuf::from(home).join(".config").join("pinlock")),
        None => Err(ConfigError::NoConfigDir),
    }
}
