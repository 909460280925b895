use serde::{Deserialize, Serialize};
use std::{
    env,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use crate::{
    core::utils::{ensure_dir, PathResolver},
    domain::CategoryCatalog,
    errors::{Result, SplitError},
};

const TMP_SUFFIX: &str = "tmp";

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_API_KEY_ENV: &str = "API_KEY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub currency_symbol: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra_categories: Vec<String>,
    pub assistant: AssistantConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            currency_symbol: "$".into(),
            extra_categories: Vec::new(),
            assistant: AssistantConfig::default(),
        }
    }
}

/// Keys accepted by [`Config::set_value`].
pub const CONFIG_KEYS: &[&str] = &[
    "currency_symbol",
    "extra_categories",
    "assistant.enabled",
    "assistant.model",
    "assistant.endpoint",
    "assistant.api_key",
    "assistant.api_key_env",
    "assistant.timeout_secs",
];

impl Config {
    pub fn catalog(&self) -> CategoryCatalog {
        CategoryCatalog::with_extra(&self.extra_categories)
    }

    /// Updates one setting from its dotted key, as typed in the shell.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "currency_symbol" | "currency" => self.currency_symbol = value.to_string(),
            "extra_categories" | "categories" => {
                self.extra_categories = value
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            "assistant.enabled" => self.assistant.enabled = parse_bool(value)?,
            "assistant.model" => self.assistant.model = non_empty(key, value)?,
            "assistant.endpoint" => self.assistant.endpoint = non_empty(key, value)?,
            "assistant.api_key" => {
                self.assistant.api_key = Some(value.to_string()).filter(|v| !v.is_empty())
            }
            "assistant.api_key_env" => self.assistant.api_key_env = non_empty(key, value)?,
            "assistant.timeout_secs" => {
                self.assistant.timeout_secs = value
                    .parse()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .ok_or_else(|| {
                        SplitError::Config(format!("`{key}` must be a positive number of seconds"))
                    })?;
            }
            other => {
                return Err(SplitError::Config(format!(
                    "unknown configuration key `{other}`"
                )))
            }
        }
        Ok(())
    }
}

/// Settings for the receipt/categorization assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub enabled: bool,
    pub model: String,
    pub endpoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Environment variable consulted when `api_key` is unset.
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: DEFAULT_MODEL.into(),
            endpoint: DEFAULT_ENDPOINT.into(),
            api_key: None,
            api_key_env: DEFAULT_API_KEY_ENV.into(),
            timeout_secs: 30,
        }
    }
}

impl AssistantConfig {
    /// Explicit key first, then the configured environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| env::var(&self.api_key_env).ok())
            .filter(|key| !key.trim().is_empty())
    }
}

pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn with_base_dir(base: PathBuf) -> Result<Self> {
        ensure_dir(&base)?;
        Ok(Self {
            path: PathResolver::config_file_in(&base),
        })
    }

    pub fn load(&self) -> Result<Config> {
        if !self.path.exists() {
            return Ok(Config::default());
        }
        let data = fs::read_to_string(&self.path)?;
        serde_json::from_str(&data).map_err(|err| {
            SplitError::Config(format!("{}: {err}", self.path.display()))
        })
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        let json = serde_json::to_string_pretty(config)?;
        let tmp = tmp_path(&self.path);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        other => Err(SplitError::Config(format!("expected on/off, got `{other}`"))),
    }
}

fn non_empty(key: &str, value: &str) -> Result<String> {
    if value.is_empty() {
        Err(SplitError::Config(format!("`{key}` cannot be empty")))
    } else {
        Ok(value.to_string())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_loads_defaults() {
        let temp = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).unwrap();
        assert_eq!(manager.load().unwrap(), Config::default());
    }

    #[test]
    fn save_and_reload_roundtrip() {
        let temp = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).unwrap();
        let mut config = Config::default();
        config.set_value("currency", "€").unwrap();
        config.set_value("categories", "Pets, Gifts ,").unwrap();
        config.set_value("assistant.enabled", "off").unwrap();
        manager.save(&config).unwrap();

        let loaded = manager.load().unwrap();
        assert_eq!(loaded.currency_symbol, "€");
        assert_eq!(loaded.extra_categories, vec!["Pets", "Gifts"]);
        assert!(!loaded.assistant.enabled);
        assert!(loaded.catalog().resolve("gifts").is_some());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let temp = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).unwrap();
        fs::write(manager.path(), r#"{"currency_symbol":"£"}"#).unwrap();
        let loaded = manager.load().unwrap();
        assert_eq!(loaded.currency_symbol, "£");
        assert_eq!(loaded.assistant.model, DEFAULT_MODEL);
    }

    #[test]
    fn rejects_unknown_keys_and_bad_values() {
        let mut config = Config::default();
        assert!(config.set_value("theme", "dark").is_err());
        assert!(config.set_value("assistant.timeout_secs", "0").is_err());
        assert!(config.set_value("assistant.enabled", "maybe").is_err());
    }

    #[test]
    fn every_listed_key_is_settable() {
        let mut config = Config::default();
        for key in CONFIG_KEYS {
            let value = match *key {
                "assistant.enabled" => "on",
                "assistant.timeout_secs" => "5",
                _ => "x",
            };
            assert!(config.set_value(key, value).is_ok(), "{key}");
        }
    }

    #[test]
    fn explicit_api_key_wins() {
        let assistant = AssistantConfig {
            api_key: Some("abc".into()),
            api_key_env: "SPLIT_CORE_TEST_UNSET_KEY".into(),
            ..AssistantConfig::default()
        };
        assert_eq!(assistant.resolve_api_key().as_deref(), Some("abc"));
    }
}
