use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TandemError};
use crate::fmt::MoneyFormat;
use crate::models::Partners;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: String,
    #[serde(default)]
    pub partners: Partners,
    #[serde(default)]
    pub money: MoneyFormat,
    #[serde(default = "default_period_days")]
    pub default_period_days: u32,
}

fn default_period_days() -> u32 {
    30
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            partners: Partners::default(),
            money: MoneyFormat::default(),
            default_period_days: default_period_days(),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("tandem")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("tandem")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        parse_settings(&content)
    } else {
        Settings::default()
    }
}

fn parse_settings(content: &str) -> Settings {
    match serde_json::from_str(content) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!("ignoring unreadable settings file: {e}");
            Settings::default()
        }
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    if settings.partners.a.id.eq_ignore_ascii_case(&settings.partners.b.id) {
        return Err(TandemError::Settings(format!(
            "partner ids must differ (both are {:?})",
            settings.partners.a.id
        )));
    }
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| TandemError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn db_path(settings: &Settings) -> PathBuf {
    PathBuf::from(&settings.data_dir).join("tandem.db")
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}
