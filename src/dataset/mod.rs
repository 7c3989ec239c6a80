//! Dataset builder: joins ratio snapshots with daily prices.
//!
//! Every ratio snapshot is paired with every price row of the same symbol,
//! so one snapshot is repeated across the whole price window. Multiple
//! snapshots per symbol multiply the rows; only one reporting date is ever
//! queried, so in practice each symbol carries a single snapshot.

use crate::models::{JoinedRow, PriceRecord, RatioRecord};
use std::collections::HashMap;
use tracing::debug;

/// Decimal places kept on every ratio field.
pub const RATIO_DECIMALS: i32 = 3;

#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    /// Keep the ratio snapshot's reporting date on each row.
    pub keep_ratio_date: bool,
}

/// Round half away from zero to `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

/// Join ratio and price records on exact symbol equality.
///
/// Output order follows the ratio records, then the price records of that
/// symbol in input order.
pub fn build(ratios: &[RatioRecord], prices: &[PriceRecord], opts: BuildOptions) -> Vec<JoinedRow> {
    let mut by_symbol: HashMap<&str, Vec<&PriceRecord>> = HashMap::new();
    for p in prices {
        by_symbol.entry(p.symbol.as_str()).or_default().push(p);
    }

    let mut rows = Vec::new();
    for r in ratios {
        let Some(matches) = by_symbol.get(r.symbol.as_str()) else {
            debug!("{}: no prices in window", r.symbol);
            continue;
        };

        let rounded = r.ratios.map(|v| round_to(v, RATIO_DECIMALS));
        rows.extend(matches.iter().map(|p| JoinedRow {
            symbol: r.symbol.clone(),
            ratio_date: opts.keep_ratio_date.then_some(r.date),
            ratios: rounded,
            date: p.date,
            adjusted_price: p.adjusted_price(),
        }));
    }

    rows
}

/// Number of distinct symbols among `rows`.
pub fn distinct_symbols(rows: &[JoinedRow]) -> usize {
    let mut symbols: Vec<&str> = rows.iter().map(|r| r.symbol.as_str()).collect();
    symbols.sort_unstable();
    symbols.dedup();
    symbols.len()
}

/// The joined rows of one session, built once and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    rows: Vec<JoinedRow>,
}

impl Dataset {
    pub fn new(rows: Vec<JoinedRow>) -> Self {
        Self { rows }
    }

    pub fn from_records(
        ratios: &[RatioRecord],
        prices: &[PriceRecord],
        opts: BuildOptions,
    ) -> Self {
        Self::new(build(ratios, prices, opts))
    }

    pub fn rows(&self) -> &[JoinedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of distinct symbols.
    pub fn symbol_count(&self) -> usize {
        distinct_symbols(&self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Ratios;
    use chrono::NaiveDate;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn ratio(symbol: &str, pe: f64) -> RatioRecord {
        RatioRecord {
            symbol: symbol.into(),
            date: d("2022-11-30"),
            ratios: Ratios { pe: Some(pe), roe: Some(-0.123456), ..Default::default() },
        }
    }

    fn price(symbol: &str, date: &str, close: f64, factor: f64) -> PriceRecord {
        PriceRecord { symbol: symbol.into(), date: d(date), close, adjustment_factor: factor }
    }

    #[test]
    fn test_cross_join_repeats_snapshot_per_date() {
        let ratios = vec![ratio("AAA", 12.34567), ratio("BBB", 30.0)];
        let prices = vec![
            price("AAA", "2021-01-01", 18.0, 2.0),
            price("BBB", "2021-01-01", 50.0, 1.0),
            price("AAA", "2021-06-01", 22.0, 2.0),
        ];

        let rows = build(&ratios, &prices, BuildOptions::default());
        assert_eq!(rows.len(), 3);

        let aaa: Vec<_> = rows.iter().filter(|r| r.symbol == "AAA").collect();
        assert_eq!(aaa.len(), 2);
        assert_eq!(aaa[0].ratios, aaa[1].ratios);
        assert_eq!(aaa[0].ratios.pe, Some(12.346));
        assert_eq!(aaa[0].ratios.roe, Some(-0.123));
        assert_eq!(aaa[0].adjusted_price, 9.0);
        assert_eq!(aaa[1].adjusted_price, 11.0);
        assert!(aaa.iter().all(|r| r.ratio_date.is_none()));
    }

    #[test]
    fn test_join_is_case_sensitive() {
        let rows = build(
            &[ratio("aaa", 1.0)],
            &[price("AAA", "2021-01-01", 1.0, 1.0)],
            BuildOptions::default(),
        );
        assert!(rows.is_empty());
    }

    #[test]
    fn test_empty_inputs_give_empty_dataset() {
        let opts = BuildOptions::default();
        assert!(build(&[], &[price("AAA", "2021-01-01", 1.0, 1.0)], opts).is_empty());
        assert!(build(&[ratio("AAA", 1.0)], &[], opts).is_empty());
    }

    #[test]
    fn test_keep_ratio_date() {
        let opts = BuildOptions { keep_ratio_date: true };
        let prices = [price("AAA", "2021-01-01", 1.0, 1.0)];
        let ds = Dataset::from_records(&[ratio("AAA", 1.0)], &prices, opts);
        assert_eq!(ds.rows()[0].ratio_date, Some(d("2022-11-30")));
        assert_eq!(ds.symbol_count(), 1);
    }

    #[test]
    fn test_symbol_count_ignores_repeats() {
        let prices = [
            price("AAA", "2021-01-01", 1.0, 1.0),
            price("AAA", "2021-01-02", 1.0, 1.0),
            price("BBB", "2021-01-01", 1.0, 1.0),
        ];
        let ratios = [ratio("BBB", 1.0), ratio("AAA", 1.0)];
        let ds = Dataset::from_records(&ratios, &prices, BuildOptions::default());
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.symbol_count(), 2);
        assert_eq!(distinct_symbols(&[]), 0);
    }

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(round_to(0.0125, 3), 0.013);
        assert_eq!(round_to(-2.5, 0), -3.0);
        assert_eq!(round_to(1.23449, 3), 1.234);
    }

    #[test]
    fn test_adjusted_price_matches_division() {
        let prices = vec![
            price("AAA", "2021-01-04", 131.01, 4.0),
            price("AAA", "2021-01-05", 132.63, 3.7),
        ];
        let rows = build(&[ratio("AAA", 1.0)], &prices, BuildOptions::default());
        for (row, p) in rows.iter().zip(&prices) {
            assert!((row.adjusted_price - p.close / p.adjustment_factor).abs() < 1e-12);
        }
    }
}
