//! Runtime configuration, read from the environment (after `.env` is loaded).

use humantime_serde::re::humantime;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::utils::database::APPDATA_DB;

const DEFAULT_COOKIES_FILE: &str = "cookies.txt";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Missing required variable {0}")]
    Missing(&'static str),

    #[error("Invalid duration in {name}: {reason}")]
    InvalidDuration { name: &'static str, reason: String },

    #[error("Invalid boolean in {name}: {value}")]
    InvalidBool { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub command_prefix: String,
    /// How long a connected, idle session waits before leaving voice.
    pub idle_timeout: Duration,
    /// Upper bound for one resolve-and-connect step.
    pub resolve_timeout: Duration,
    pub autoplay_default: bool,
    pub database_path: PathBuf,
    pub ytdlp_path: String,
    pub cookies_file: Option<PathBuf>,
    pub serp_api_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup. `from_env` is this over `std::env`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let discord_token = lookup("DISCORD_TOKEN")
            .filter(|token| !token.trim().is_empty())
            .ok_or(ConfigError::Missing("DISCORD_TOKEN"))?;

        let cookies_file = match lookup("COOKIES_FILE") {
            Some(path) if !path.trim().is_empty() => Some(PathBuf::from(path)),
            Some(_) => None,
            None => Path::new(DEFAULT_COOKIES_FILE)
                .exists()
                .then(|| PathBuf::from(DEFAULT_COOKIES_FILE)),
        };

        Ok(Self {
            discord_token,
            command_prefix: lookup("COMMAND_PREFIX").unwrap_or_else(|| "!".to_string()),
            idle_timeout: duration_var(&lookup, "IDLE_TIMEOUT", Duration::from_secs(300))?,
            resolve_timeout: duration_var(&lookup, "RESOLVE_TIMEOUT", Duration::from_secs(45))?,
            autoplay_default: bool_var(&lookup, "AUTOPLAY_DEFAULT", true)?,
            database_path: lookup("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(APPDATA_DB)),
            ytdlp_path: lookup("YTDLP_PATH").unwrap_or_else(|| "yt-dlp".to_string()),
            cookies_file,
            serp_api_key: lookup("SERP_API_KEY").filter(|key| !key.trim().is_empty()),
        })
    }
}

fn duration_var<F>(lookup: &F, name: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => humantime::parse_duration(raw.trim()).map_err(|e| {
            ConfigError::InvalidDuration {
                name,
                reason: e.to_string(),
            }
        }),
        None => Ok(default),
    }
}

fn bool_var<F>(lookup: &F, name: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidBool { name, value: raw }),
        },
        None => Ok(default),
    }
}
