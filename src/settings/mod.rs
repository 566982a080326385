use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

const SETTINGS_PATH: &str = "config/league.toml";

/// Bot configuration loaded from `config/league.toml`. Every section has
/// defaults, and a missing file just means "all defaults". Secrets stay in
/// the environment.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub history: HistorySettings,
    #[serde(default)]
    pub riot: RiotSettings,
    #[serde(default)]
    pub keep_alive: KeepAliveSettings,
    #[serde(default)]
    pub paths: PathSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistorySettings {
    /// How many past assignments to remember per guild for repeat-avoidance.
    #[serde(default = "default_window")]
    pub window: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RiotSettings {
    #[serde(default = "default_region")]
    pub default_region: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeepAliveSettings {
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathSettings {
    #[serde(default = "default_champion_roles")]
    pub champion_roles: String,
    #[serde(default = "default_champion_cache")]
    pub champion_cache: String,
}

fn default_window() -> usize {
    3
}

fn default_region() -> String {
    "euw1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_champion_roles() -> String {
    "data/champion_roles.json".to_string()
}

fn default_champion_cache() -> String {
    "data/champion_cache.json".to_string()
}

impl Default for HistorySettings {
    fn default() -> Self {
        HistorySettings {
            window: default_window(),
        }
    }
}

impl Default for RiotSettings {
    fn default() -> Self {
        RiotSettings {
            default_region: default_region(),
        }
    }
}

impl Default for KeepAliveSettings {
    fn default() -> Self {
        KeepAliveSettings {
            port: default_port(),
        }
    }
}

impl Default for PathSettings {
    fn default() -> Self {
        PathSettings {
            champion_roles: default_champion_roles(),
            champion_cache: default_champion_cache(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            history: HistorySettings::default(),
            riot: RiotSettings::default(),
            keep_alive: KeepAliveSettings::default(),
            paths: PathSettings::default(),
        }
    }
}

pub fn load() -> Result<Settings, toml::de::Error> {
    load_from(SETTINGS_PATH)
}

fn load_from<P: AsRef<Path>>(path: P) -> Result<Settings, toml::de::Error> {
    match fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content),
        Err(_) => {
            info!("no settings file found, using defaults");
            Ok(Settings::default())
        }
    }
}
