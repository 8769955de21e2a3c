use crate::error::AppError;
use crate::model::Priority;
use crate::reminder::DEFAULT_SCAN_INTERVAL;
use crate::storage::json_store::app_dir;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "TASKMASTER_CONFIG_PATH";

/// ANSI colours used to mark task priorities in plain output.
#[derive(Debug, Clone)]
pub struct Palette {
    pub urgent: &'static str,
    pub important: &'static str,
    pub muted: &'static str,
    pub reset: &'static str,
}

impl Palette {
    pub fn paint_priority(&self, priority: Priority, text: &str) -> String {
        let colour = match priority {
            Priority::VeryImportant => self.urgent,
            Priority::Important => self.important,
            Priority::Normal => "",
            Priority::Optional => self.muted,
        };
        self.wrap(colour, text)
    }

    pub fn mutedize(&self, text: &str) -> String {
        self.wrap(self.muted, text)
    }

    fn wrap(&self, colour: &str, text: &str) -> String {
        if colour.is_empty() {
            text.to_string()
        } else {
            format!("{}{}{}", colour, text, self.reset)
        }
    }
}

pub fn palette_for_theme(theme: Option<&str>) -> Palette {
    match theme.and_then(canonical_theme_name).as_deref() {
        Some("noir") => Palette {
            urgent: "\x1b[38;5;208m",
            important: "\x1b[38;5;75m",
            muted: "\x1b[38;5;250m",
            reset: "\x1b[0m",
        },
        Some("solarized") => Palette {
            urgent: "\x1b[38;5;125m",
            important: "\x1b[38;5;33m",
            muted: "\x1b[38;5;245m",
            reset: "\x1b[0m",
        },
        _ => Palette {
            urgent: "",
            important: "",
            muted: "",
            reset: "",
        },
    }
}

pub fn canonical_theme_name(raw: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        return Some("default".into());
    }

    match trimmed {
        "vanilla" | "light" => Some("default".to_string()),
        "dark" | "dark_mode" | "darkmode" => Some("noir".to_string()),
        other => Some(other.to_string()),
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub theme: Option<String>,
    /// Seconds between reminder scans.
    #[serde(default)]
    pub reminder_interval_secs: Option<u64>,
}

impl Config {
    pub fn reminder_interval(&self) -> Duration {
        self.reminder_interval_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_SCAN_INTERVAL)
    }

    pub fn palette(&self) -> Palette {
        palette_for_theme(self.theme.as_deref())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub theme: Option<String>,
    pub reminder_interval_secs: Option<u64>,
}

pub fn config_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    Ok(app_dir()?.join(CONFIG_FILE_NAME))
}

/// Loads the configuration, substituting defaults for a broken file and
/// reporting why instead of failing.
pub fn load_config_with_fallback() -> ConfigLoad {
    match config_path() {
        Ok(path) => load_config_with_fallback_from_path(&path),
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_with_fallback_from_path(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad {
            config: Config::default(),
            error: None,
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    let config: Config = serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })?;
    validate(&config)
        .map_err(|err| AppError::invalid_data(format!("{}: {}", path.display(), err.message())))?;
    Ok(normalize_config_theme(config))
}

fn validate(config: &Config) -> Result<(), AppError> {
    if config.reminder_interval_secs == Some(0) {
        return Err(AppError::invalid_data(
            "reminder_interval_secs must be greater than zero",
        ));
    }
    Ok(())
}

fn normalize_config_theme(mut config: Config) -> Config {
    config.theme = config.theme.and_then(|name| canonical_theme_name(&name));
    config
}

pub fn merge_overrides(base: &Config, overrides: &ConfigOverrides) -> Result<Config, AppError> {
    let mut merged = base.clone();
    if let Some(theme) = overrides.theme.as_ref()
        && let Some(normalized) = canonical_theme_name(theme)
    {
        merged.theme = Some(normalized);
    }

    if let Some(seconds) = overrides.reminder_interval_secs {
        merged.reminder_interval_secs = Some(seconds);
    }

    validate(&merged).map_err(|err| AppError::invalid_input(err.message()))?;
    Ok(merged)
}
