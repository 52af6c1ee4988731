use anyhow::{Context, Result};
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_WORKSPACE: &str = "TRANSPORTD_WORKSPACE";
pub const ENV_LOG: &str = "TRANSPORTD_LOG";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Workspace opened at startup, before any `workspace.select`.
    #[serde(default)]
    pub workspace: Option<PathBuf>,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// First day of the week for weekly report counts.
    #[serde(default = "default_week_start")]
    pub week_start: String,
    #[serde(default = "default_uploads_dir_name")]
    pub uploads_dir_name: String,
}

fn default_log_filter() -> String {
    "transportd=info".to_string()
}

fn default_week_start() -> String {
    "sunday".to_string()
}

fn default_uploads_dir_name() -> String {
    "uploads".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            workspace: None,
            log_filter: default_log_filter(),
            week_start: default_week_start(),
            uploads_dir_name: default_uploads_dir_name(),
        }
    }
}

impl Config {
    /// Config file, then environment overrides. A missing file is not an error.
    pub fn load() -> Result<Config> {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => Config::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Config> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("transportd").join("config.toml"))
    }

    fn apply_env<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(ws) = var(ENV_WORKSPACE).filter(|v| !v.trim().is_empty()) {
            self.workspace = Some(PathBuf::from(ws));
        }
        if let Some(filter) = var(ENV_LOG).filter(|v| !v.trim().is_empty()) {
            self.log_filter = filter;
        }
    }

    /// Configured week start, falling back to Sunday when unparseable.
    pub fn week_start(&self) -> Weekday {
        parse_week_start(&self.week_start).unwrap_or(Weekday::Sun)
    }
}

/// Accepts English day names or abbreviations, case-insensitively.
pub fn parse_week_start(raw: &str) -> Option<Weekday> {
    raw.trim().parse::<Weekday>().ok()
}
