use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, Utc};
use chrono_tz::Asia::Seoul;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub crawler: CrawlerConfig,
    pub storage: StorageConfig,
    pub model: ModelConfig,
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub download_timeout_seconds: u64,
    /// Pause between consecutive requests to the BOK site
    pub request_delay_ms: u64,
    pub max_retries: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Minimum number of labeled meetings before the walk-forward backtest starts predicting
    pub backtest_start_idx: usize,
    pub learning_rate: f64,
    pub epochs: usize,
    pub l2_penalty: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub addr: String,
}

fn env_or<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .with_context(|| format!("Invalid {} value", key))
}

impl Config {
    /// Today's date on the BOK calendar (Asia/Seoul)
    pub fn today() -> NaiveDate {
        Utc::now().with_timezone(&Seoul).date_naive()
    }

    pub fn current_year() -> i32 {
        Self::today().year()
    }

    pub fn load() -> Result<Self> {
        // Load .env file - this sets env vars that aren't already set
        dotenv::dotenv().ok();

        let defaults = Config::default();

        let config = Config {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or(defaults.database.url),
                max_connections: env_or("DB_MAX_CONNECTIONS", "2")?,
            },
            crawler: CrawlerConfig {
                base_url: env::var("BOK_BASE_URL").unwrap_or(defaults.crawler.base_url),
                user_agent: env::var("CRAWL_USER_AGENT").unwrap_or(defaults.crawler.user_agent),
                timeout_seconds: env_or("CRAWL_TIMEOUT_SECONDS", "30")?,
                download_timeout_seconds: env_or("DOWNLOAD_TIMEOUT_SECONDS", "60")?,
                request_delay_ms: env_or("CRAWL_DELAY_MS", "1000")?,
                max_retries: env_or("CRAWL_MAX_RETRIES", "3")?,
            },
            storage: StorageConfig {
                data_dir: env::var("DATA_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.storage.data_dir),
            },
            model: ModelConfig {
                backtest_start_idx: env_or("BACKTEST_START_IDX", "10")?,
                learning_rate: env_or("MODEL_LEARNING_RATE", "0.1")?,
                epochs: env_or("MODEL_EPOCHS", "500")?,
                l2_penalty: env_or("MODEL_L2_PENALTY", "0.01")?,
            },
            dashboard: DashboardConfig {
                addr: env::var("DASHBOARD_ADDR").unwrap_or(defaults.dashboard.addr),
            },
        };

        if config.model.learning_rate <= 0.0 {
            anyhow::bail!("MODEL_LEARNING_RATE must be positive");
        }

        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://data/bok_tone.db?mode=rwc".to_string(),
                max_connections: 2,
            },
            crawler: CrawlerConfig::default(),
            storage: StorageConfig {
                data_dir: PathBuf::from("data"),
            },
            model: ModelConfig::default(),
            dashboard: DashboardConfig {
                addr: "127.0.0.1:8501".to_string(),
            },
        }
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.bok.or.kr".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            timeout_seconds: 30,
            download_timeout_seconds: 60,
            request_delay_ms: 1000,
            max_retries: 3,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            backtest_start_idx: 10,
            learning_rate: 0.1,
            epochs: 500,
            l2_penalty: 0.01,
        }
    }
}
