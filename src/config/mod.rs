use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub review: ReviewConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            api_port: default_api_port(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8080
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Secret used to sign session tokens. A random secret is generated
    /// when none is configured, which invalidates sessions on restart.
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Session token lifetime in hours
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            token_ttl_hours: default_token_ttl_hours(),
        }
    }
}

fn default_jwt_secret() -> String {
    // Generate a random secret if not provided
    uuid::Uuid::new_v4().to_string()
}

fn default_token_ttl_hours() -> i64 {
    24
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewConfig {
    /// Delays of the learning-step ladder, in minutes (default: [1, 10])
    #[serde(default = "default_learning_steps")]
    pub learning_steps_minutes: Vec<i64>,
    /// Interval assigned when a card graduates from learning (default: 1 day)
    #[serde(default = "default_graduating_interval")]
    pub graduating_interval_days: i64,
    /// Interval assigned when a learning card is answered easy (default: 4 days)
    #[serde(default = "default_easy_interval")]
    pub easy_interval_days: i64,
    /// Growth factor applied to the interval of a graduated card (default: 2.5)
    #[serde(default = "default_interval_multiplier")]
    pub interval_multiplier: f64,
    /// Extra growth factor for easy answers on graduated cards (default: 1.3)
    #[serde(default = "default_easy_bonus")]
    pub easy_bonus: f64,
    /// Upper bound on any review interval, in days (default: 36500)
    #[serde(default = "default_max_interval")]
    pub max_interval_days: i64,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            learning_steps_minutes: default_learning_steps(),
            graduating_interval_days: default_graduating_interval(),
            easy_interval_days: default_easy_interval(),
            interval_multiplier: default_interval_multiplier(),
            easy_bonus: default_easy_bonus(),
            max_interval_days: default_max_interval(),
        }
    }
}

fn default_learning_steps() -> Vec<i64> {
    vec![1, 10]
}

fn default_graduating_interval() -> i64 {
    1
}

fn default_easy_interval() -> i64 {
    4
}

fn default_interval_multiplier() -> f64 {
    2.5
}

fn default_easy_bonus() -> f64 {
    1.3
}

fn default_max_interval() -> i64 {
    36500
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| "Failed to parse configuration file")?;
            Ok(config)
        } else {
            info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }

    pub fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            review: ReviewConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
