use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub market: MarketConfig,
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub chart: ChartConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Ticker listing page settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScraperConfig {
    #[serde(default = "default_listing_url")]
    pub listing_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Market database and query window
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MarketConfig {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Reporting date of the single ratio snapshot that is fetched.
    #[serde(default = "default_ratio_date")]
    pub ratio_date: NaiveDate,

    #[serde(default = "default_window_days")]
    pub window_days: u32,

    /// Last day of the price window. `None` means yesterday.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,

    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

/// Output schema of the joined dataset
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DatasetConfig {
    #[serde(default)]
    pub keep_ratio_date: bool,
}

/// Moving-average windows and axis ticks of the price chart
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChartConfig {
    #[serde(default = "default_short_window")]
    pub short_window: usize,

    #[serde(default = "default_long_window")]
    pub long_window: usize,

    #[serde(default = "default_tick_months")]
    pub tick_months: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_tui_log_path")]
    pub tui_log_path: PathBuf,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid listing url {url:?}: {reason}")]
    ListingUrl { url: String, reason: String },
    #[error("market.window_days must be positive")]
    EmptyWindow,
    #[error("chart windows must satisfy 0 < short ({short}) <= long ({long})")]
    SmaWindows { short: usize, long: usize },
    #[error("chart.tick_months must be positive")]
    TickMonths,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_listing_url() -> String {
    "https://en.wikipedia.org/wiki/List_of_S%26P_500_companies".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_user_agent() -> String {
    "sp500-screener/0.1 (desktop stock screener)".to_string()
}
fn default_db_path() -> PathBuf {
    PathBuf::from("data/market.duckdb")
}
fn default_ratio_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 11, 30).unwrap_or_default()
}
fn default_window_days() -> u32 {
    365 * 5
}
fn default_true() -> bool {
    true
}
fn default_short_window() -> usize {
    50
}
fn default_long_window() -> usize {
    200
}
fn default_tick_months() -> u32 {
    3
}
fn default_tui_log_path() -> PathBuf {
    PathBuf::from("logs/screener.log")
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            listing_url: default_listing_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            ratio_date: default_ratio_date(),
            window_days: default_window_days(),
            end_date: None,
            run_migrations: true,
        }
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            short_window: default_short_window(),
            long_window: default_long_window(),
            tick_months: default_tick_months(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            tui_log_path: default_tui_log_path(),
        }
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(config::Environment::with_prefix("SCREENER").separator("__"))
            .build()?;

        let app_cfg: AppConfig = cfg.try_deserialize()?;
        app_cfg.validate()?;
        Ok(app_cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match url::Url::parse(&self.scraper.listing_url) {
            Ok(u) if u.scheme() == "http" || u.scheme() == "https" => {}
            Ok(u) => {
                return Err(ConfigError::ListingUrl {
                    url: self.scraper.listing_url.clone(),
                    reason: format!("unsupported scheme {}", u.scheme()),
                });
            }
            Err(e) => {
                return Err(ConfigError::ListingUrl {
                    url: self.scraper.listing_url.clone(),
                    reason: e.to_string(),
                });
            }
        }

        if self.market.window_days == 0 {
            return Err(ConfigError::EmptyWindow);
        }

        let (short, long) = (self.chart.short_window, self.chart.long_window);
        if short == 0 || short > long {
            return Err(ConfigError::SmaWindows { short, long });
        }

        if self.chart.tick_months == 0 {
            return Err(ConfigError::TickMonths);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.validate(), Ok(()));
        assert_eq!(cfg.market.window_days, 1825);
        assert_eq!(cfg.market.ratio_date.to_string(), "2022-11-30");
        assert_eq!((cfg.chart.short_window, cfg.chart.long_window), (50, 200));
        assert!(!cfg.dataset.keep_ratio_date);
    }

    #[test]
    fn test_rejects_bad_listing_url() {
        let mut cfg = AppConfig::default();
        cfg.scraper.listing_url = "ftp://example.com/list".into();
        assert!(matches!(cfg.validate(), Err(ConfigError::ListingUrl { .. })));

        cfg.scraper.listing_url = "not a url".into();
        assert!(matches!(cfg.validate(), Err(ConfigError::ListingUrl { .. })));
    }

    #[test]
    fn test_rejects_inverted_windows() {
        let mut cfg = AppConfig::default();
        cfg.chart.short_window = 300;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::SmaWindows { short: 300, long: 200 })
        );
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let cfg: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(
                "[market]\nratio_date = \"2023-06-30\"\n[dataset]\nkeep_ratio_date = true\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(cfg.market.ratio_date, NaiveDate::from_ymd_opt(2023, 6, 30).unwrap());
        assert!(cfg.dataset.keep_ratio_date);
        assert_eq!(cfg.market.db_path, PathBuf::from("data/market.duckdb"));
        assert_eq!(cfg.chart.tick_months, 3);
    }
}
