use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// `[log]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LogConfig {
    /// Filter directives: "warn", "info", "abi_codec=debug" ...
    pub level: Option<String>,

    /// Emit JSON structured logs instead of text
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// ABI file used when `--abi` is not given
    pub abi: Option<PathBuf>,

    /// Print JSON instead of text by default
    #[serde(default)]
    pub json: bool,

    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    /// ABI path from the command line, falling back to the config file.
    /// Relative config paths are taken from the directory holding the config.
    pub fn abi_path(&self, cli: Option<&Path>, config_dir: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = cli {
            return Some(path.to_path_buf());
        }
        let path = self.abi.as_ref()?;
        let path = expand_home(path);
        match config_dir {
            Some(dir) if path.is_relative() => Some(dir.join(path)),
            _ => Some(path),
        }
    }
}

/// A config file that exists but could not be used
#[derive(Debug, Error)]
#[error("ignoring config file {}: {reason}", path.display())]
pub struct ConfigError {
    pub path: PathBuf,
    pub reason: String,
}

/// Load the config file. A missing file means defaults; a broken one is an error
/// the caller can report once logging is up.
pub fn load() -> Result<Config, ConfigError> {
    match config_path() {
        Some(path) => load_from(&path),
        None => Ok(Config::default()),
    }
}

pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Config::default()),
        Err(err) => {
            return Err(ConfigError {
                path: path.to_path_buf(),
                reason: err.to_string(),
            })
        }
    };
    toml::from_str::<Config>(&content).map_err(|err| ConfigError {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("ABI_CODEC_CONFIG").map(PathBuf::from) {
        return Some(path);
    }
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from) {
        return Some(xdg.join("abi-codec").join("config.toml"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".config").join("abi-codec").join("config.toml"));
    }

    directories::ProjectDirs::from("io", "abi-codec", "abi-codec")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

fn expand_home(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    path.to_path_buf()
}
