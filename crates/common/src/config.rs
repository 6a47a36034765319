use crate::Result;
use anyhow::anyhow;
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

// TOML configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub forecast: ForecastConfig,
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub dsn: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

#[derive(Debug, Deserialize)]
pub struct ForecastConfig {
    #[serde(default = "default_horizon_months")]
    pub horizon_months: u32,
    #[serde(default = "default_forecast_cron_schedule")]
    pub cron_schedule: String,
    #[serde(default = "default_disease_concurrency")]
    pub disease_concurrency: u32,
}

#[derive(Debug, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_rust_log_format")]
    pub rust_log_format: String,
}

fn default_pool_size() -> u32 {
    16
}

fn default_horizon_months() -> u32 {
    3
}

fn default_forecast_cron_schedule() -> String {
    // 毎日午前3時に予測を再生成する
    "0 0 3 * * *".to_string()
}

fn default_disease_concurrency() -> u32 {
    4
}

fn default_bind_addr() -> String {
    "0.0.0.0:3050".to_string()
}

fn default_rust_log_format() -> String {
    "term".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            dsn: String::new(),
            pool_size: default_pool_size(),
        }
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon_months: default_horizon_months(),
            cron_schedule: default_forecast_cron_schedule(),
            disease_concurrency: default_disease_concurrency(),
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            rust_log_format: default_rust_log_format(),
        }
    }
}

fn load_config() -> Result<Config> {
    let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());
    if !Path::new(&path).exists() {
        return Ok(Config::default());
    }
    let content = fs::read_to_string(&path)?;
    Ok(toml::from_str(&content)?)
}

static CONFIG: Lazy<Config> = Lazy::new(|| {
    load_config().unwrap_or_else(|e| {
        eprintln!(
            "Warning: Failed to load config files: {}. Using defaults.",
            e
        );
        Config::default()
    })
});

static CONFIG_STORE: Lazy<Arc<Mutex<HashMap<String, String>>>> =
    Lazy::new(|| Arc::new(Mutex::new(HashMap::new())));

fn get_from_store(name: &str) -> Option<String> {
    CONFIG_STORE
        .lock()
        .ok()
        .and_then(|store| store.get(name).cloned())
}

pub fn get(name: &str) -> Result<String> {
    // Priority 1: CONFIG_STORE (runtime overrides)
    if let Some(value) = get_from_store(name) {
        if value.is_empty() {
            return Err(anyhow!("{} is empty", name));
        }
        return Ok(value);
    }

    // Priority 2: Environment variables
    if let Ok(val) = std::env::var(name)
        && !val.is_empty()
    {
        return Ok(val);
    }

    // Priority 3: TOML config
    let toml_value = match name {
        "PG_DSN" => {
            if !CONFIG.database.dsn.is_empty() {
                Some(CONFIG.database.dsn.clone())
            } else {
                None
            }
        }
        "PG_POOL_SIZE" => Some(CONFIG.database.pool_size.to_string()),
        "FORECAST_HORIZON_MONTHS" => Some(CONFIG.forecast.horizon_months.to_string()),
        "FORECAST_CRON_SCHEDULE" => Some(CONFIG.forecast.cron_schedule.clone()),
        "FORECAST_DISEASE_CONCURRENCY" => Some(CONFIG.forecast.disease_concurrency.to_string()),
        "WEB_BIND_ADDR" => Some(CONFIG.web.bind_addr.clone()),
        "RUST_LOG_FORMAT" => Some(CONFIG.logging.rust_log_format.clone()),
        _ => None,
    };

    if let Some(value) = toml_value
        && !value.is_empty()
    {
        return Ok(value);
    }

    Err(anyhow!("Configuration key not found: {}", name))
}

pub fn config() -> &'static Config {
    &CONFIG
}

/// テスト用: 設定値を上書きする
///
/// 注: `#[cfg(test)]` にすると他クレート(forecast等)のテストから参照できないため
/// `#[doc(hidden)]` で公開している
#[doc(hidden)]
pub fn set(name: &str, value: &str) {
    if let Ok(mut store) = CONFIG_STORE.lock() {
        store.insert(name.to_string(), value.to_string());
    }
}

/// テスト用: 設定値を CONFIG_STORE から削除する
#[doc(hidden)]
pub fn remove(name: &str) {
    if let Ok(mut store) = CONFIG_STORE.lock() {
        store.remove(name);
    }
}
