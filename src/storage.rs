use crate::model::WeekStart;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CalendarConfig {
    /// Pages mounted by the month view.
    pub month_window: usize,
    /// Pages mounted by the week view.
    pub week_window: usize,
    pub preload_threshold: usize,
    pub nav_cooldown_ms: u64,
    pub week_starts_on: WeekStart,
    pub log_level: String,
    pub log_file: String,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        CalendarConfig {
            month_window: 100,
            week_window: 120,
            preload_threshold: 4,
            nav_cooldown_ms: 280,
            week_starts_on: WeekStart::Sunday,
            log_level: "info".to_string(),
            log_file: "/dev/null".to_string(),
        }
    }
}

pub fn default_config_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "swipecal").context("locating config directory")?;
    Ok(dirs.config_dir().join("config.yml"))
}

pub fn resolve_config_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path),
        None => default_config_path(),
    }
}

pub fn load_config(path: &Path) -> Result<CalendarConfig> {
    if !path.exists() {
        return Ok(CalendarConfig::default());
    }
    let data = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
    parse_config(&data).with_context(|| format!("parsing {:?}", path))
}

pub fn parse_config(data: &str) -> Result<CalendarConfig> {
    if data.trim().is_empty() {
        return Ok(CalendarConfig::default());
    }
    let config: CalendarConfig = serde_yaml::from_str(data).context("parsing config file")?;
    Ok(config)
}

pub fn save_config(path: &Path, config: &CalendarConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
    }
    let serialized = serde_yaml::to_string(config).context("serializing config")?;
    fs::write(path, serialized).with_context(|| format!("writing {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config = parse_config("week_starts_on: monday\nnav_cooldown_ms: 500\n").unwrap();
        assert_eq!(config.week_starts_on, WeekStart::Monday);
        assert_eq!(config.nav_cooldown_ms, 500);
        assert_eq!(config.month_window, 100);
        assert_eq!(config.week_window, 120);
        assert_eq!(parse_config("").unwrap(), CalendarConfig::default());
    }

    #[test]
    fn rejects_unknown_week_start() {
        assert!(parse_config("week_starts_on: friday\n").is_err());
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = std::env::temp_dir().join(format!("swipecal-test-{}", std::process::id()));
        let path = dir.join("nested").join("config.yml");
        let config = CalendarConfig {
            preload_threshold: 6,
            week_starts_on: WeekStart::Monday,
            ..CalendarConfig::default()
        };
        save_config(&path, &config).unwrap();
        assert_eq!(load_config(&path).unwrap(), config);
        fs::remove_dir_all(&dir).unwrap();

        assert_eq!(load_config(&path).unwrap(), CalendarConfig::default());
    }
}
