//! Startup pipeline: ticker listing → market database → joined dataset.
//!
//! Runs once before the interactive session. Any failure here is fatal to
//! startup; a listing page that answers with a non-2xx status only yields an
//! empty universe (and so an empty dataset).

use crate::config::AppConfig;
use crate::dataset::{BuildOptions, Dataset};
use crate::scraper::TickerSource;
use crate::storage::MarketDataSource;
use anyhow::{Context, Result};
use chrono::{Days, Local, NaiveDate};
use tracing::{info, warn};

/// Inclusive `[start, end]` price window ending at `end`
/// (or yesterday when `end` is `None`).
pub fn price_window(end: Option<NaiveDate>, window_days: u32) -> (NaiveDate, NaiveDate) {
    let yesterday = Local::now().date_naive() - Days::new(1);
    let end = end.unwrap_or(yesterday);
    (end - Days::new(window_days.into()), end)
}

pub struct Pipeline {
    config: AppConfig,
}

impl Pipeline {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub async fn run(
        &self,
        tickers: &dyn TickerSource,
        market: &dyn MarketDataSource,
    ) -> Result<(Dataset, PipelineStats)> {
        // ── 1. Ticker universe ────────────────────────────────────────────────
        info!("=== Step 1: Fetching ticker universe ===");
        let universe = tickers.fetch_tickers().await.context("Ticker list fetch failed")?;
        let symbols: Vec<String> = universe.into_iter().map(|t| t.symbol).collect();
        if symbols.is_empty() {
            warn!("Ticker universe is empty; the dataset will be empty");
        }
        info!("First tickers: {:?}", &symbols[..symbols.len().min(5)]);

        // ── 2. Ratio snapshot + price window ──────────────────────────────────
        let m = &self.config.market;
        let (start, end) = price_window(m.end_date, m.window_days);
        info!(
            "=== Step 2: Querying ratios ({}) and prices ({} → {}) ===",
            m.ratio_date, start, end
        );

        let ratios = market
            .ratio_records(&symbols, m.ratio_date)
            .context("Ratio query failed")?;
        let prices = market
            .price_records(&symbols, start, end)
            .context("Price query failed")?;
        info!("{} ratio snapshots, {} price rows", ratios.len(), prices.len());

        // ── 3. Join ───────────────────────────────────────────────────────────
        let opts = BuildOptions { keep_ratio_date: self.config.dataset.keep_ratio_date };
        let dataset = Dataset::from_records(&ratios, &prices, opts);

        let stats = PipelineStats {
            tickers: symbols.len(),
            ratio_snapshots: ratios.len(),
            price_rows: prices.len(),
            joined_rows: dataset.len(),
            symbols: dataset.symbol_count(),
        };
        info!(
            "=== Done: {} tickers | {} joined rows | {} symbols with data ===",
            stats.tickers, stats.joined_rows, stats.symbols
        );

        Ok((dataset, stats))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineStats {
    pub tickers: usize,
    pub ratio_snapshots: usize,
    pub price_rows: usize,
    pub joined_rows: usize,
    pub symbols: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PriceRecord, RatioRecord, Ratios, Ticker};
    use crate::storage::Repository;
    use async_trait::async_trait;
    use chrono::Utc;

    struct FixedTickers(Vec<&'static str>);

    #[async_trait]
    impl TickerSource for FixedTickers {
        async fn fetch_tickers(&self) -> Result<Vec<Ticker>> {
            let now = Utc::now().naive_utc();
            Ok(self.0.iter().map(|s| Ticker { symbol: s.to_string(), scraped_at: now }).collect())
        }
    }

    struct Unreachable;

    #[async_trait]
    impl TickerSource for Unreachable {
        async fn fetch_tickers(&self) -> Result<Vec<Ticker>> {
            anyhow::bail!("connection refused")
        }
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn price(symbol: &str, date: &str, close: f64, factor: f64) -> PriceRecord {
        PriceRecord { symbol: symbol.into(), date: d(date), close, adjustment_factor: factor }
    }

    fn config() -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.market.end_date = Some(d("2021-12-31"));
        cfg.market.window_days = 365;
        cfg
    }

    fn market() -> Repository {
        let repo = Repository::open_in_memory().unwrap();
        repo.run_migrations().unwrap();
        repo.upsert_ratios(&[
            RatioRecord {
                symbol: "AAA".into(),
                date: d("2022-11-30"),
                ratios: Ratios { pe: Some(12.34567), ..Default::default() },
            },
            RatioRecord {
                symbol: "CCC".into(),
                date: d("2022-11-30"),
                ratios: Ratios { pe: Some(40.0), ..Default::default() },
            },
        ])
        .unwrap();
        repo.upsert_prices(&[
            price("AAA", "2021-01-04", 18.0, 2.0),
            price("AAA", "2021-06-01", 22.0, 2.0),
            price("AAA", "2019-06-01", 10.0, 1.0),
            price("BBB", "2021-06-01", 50.0, 1.0),
        ])
        .unwrap();
        repo
    }

    #[test]
    fn test_price_window_spans_days() {
        let (start, end) = price_window(Some(d("2024-01-10")), 1825);
        assert_eq!(end, d("2024-01-10"));
        assert_eq!(start, d("2019-01-11"));

        let (_, end) = price_window(None, 10);
        assert!(end < Local::now().date_naive());
    }

    #[test]
    fn test_run_joins_universe_within_window() {
        let pipeline = Pipeline::new(config());
        let (dataset, stats) = tokio_test::block_on(
            pipeline.run(&FixedTickers(vec!["AAA", "BBB", "CCC"]), &market()),
        )
        .unwrap();

        // AAA: two prices in window; BBB: no ratios; CCC: no prices
        assert_eq!(dataset.len(), 2);
        assert!(dataset.rows().iter().all(|r| r.symbol == "AAA"));
        assert_eq!(dataset.rows()[0].ratios.pe, Some(12.346));
        assert_eq!(
            stats,
            PipelineStats {
                tickers: 3,
                ratio_snapshots: 2,
                price_rows: 3,
                joined_rows: 2,
                symbols: 1,
            }
        );
    }

    #[test]
    fn test_empty_universe_gives_empty_dataset() {
        let pipeline = Pipeline::new(config());
        let (dataset, _) =
            tokio_test::block_on(pipeline.run(&FixedTickers(vec![]), &market())).unwrap();
        assert!(dataset.is_empty());
    }

    #[test]
    fn test_fetch_failure_is_fatal() {
        let pipeline = Pipeline::new(config());
        let err = tokio_test::block_on(pipeline.run(&Unreachable, &market())).unwrap_err();
        assert!(format!("{:#}", err).contains("connection refused"));
    }
}
