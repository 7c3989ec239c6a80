//! Time-series view: one symbol's adjusted price history with two trailing
//! simple moving averages, plus the date ticks used on the chart axis.

use crate::models::JoinedRow;
use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;
use thiserror::Error;

pub const SHORT_WINDOW: usize = 50;
pub const LONG_WINDOW: usize = 200;

#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("No data available for {0}")]
    SymbolNotFound(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub adjusted_price: f64,
    pub sma_short: Option<f64>,
    pub sma_long: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    pub symbol: String,
    pub short_window: usize,
    pub long_window: usize,
    pub points: Vec<SeriesPoint>,
}

impl TimeSeries {
    pub fn title(&self) -> String {
        format!(
            "{} Stock Price with {}-day & {}-day SMA",
            self.symbol, self.short_window, self.long_window
        )
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// (min, max) over the price and both averages.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.points
            .iter()
            .flat_map(|p| [Some(p.adjusted_price), p.sma_short, p.sma_long])
            .flatten()
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// Trailing mean over `window` observations. The first `window - 1`
/// positions have no value.
pub fn sma(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window == 0 || values.len() < window {
        return out;
    }

    let mut sum: f64 = values[..window].iter().sum();
    out[window - 1] = Some(sum / window as f64);

    for i in window..values.len() {
        sum += values[i] - values[i - window];
        // inf - inf poisons the running sum; rebuild it from the window
        if !sum.is_finite() {
            sum = values[i + 1 - window..=i].iter().sum();
        }
        out[i] = Some(sum / window as f64);
    }

    out
}

/// Price history of `symbol` (matched upper-cased) with 50/200-day averages.
pub fn series_for(symbol: &str, rows: &[JoinedRow]) -> Result<TimeSeries, SeriesError> {
    series_with_windows(symbol, rows, SHORT_WINDOW, LONG_WINDOW)
}

pub fn series_with_windows(
    symbol: &str,
    rows: &[JoinedRow],
    short_window: usize,
    long_window: usize,
) -> Result<TimeSeries, SeriesError> {
    let symbol = symbol.trim().to_uppercase();

    let mut selected: Vec<&JoinedRow> = rows.iter().filter(|r| r.symbol == symbol).collect();
    if selected.is_empty() {
        return Err(SeriesError::SymbolNotFound(symbol));
    }
    selected.sort_by_key(|r| r.date);

    let prices: Vec<f64> = selected.iter().map(|r| r.adjusted_price).collect();
    let short = sma(&prices, short_window);
    let long = sma(&prices, long_window);

    let points = selected
        .iter()
        .zip(short.into_iter().zip(long))
        .map(|(r, (s, l))| SeriesPoint {
            date: r.date,
            adjusted_price: r.adjusted_price,
            sma_short: s,
            sma_long: l,
        })
        .collect();

    Ok(TimeSeries { symbol, short_window, long_window, points })
}

/// First day of every `every_months`-th month from the series start up to
/// its end, each labelled "MM-YYYY".
pub fn month_ticks(
    start: NaiveDate,
    end: NaiveDate,
    every_months: u32,
) -> Vec<(NaiveDate, String)> {
    let mut ticks = Vec::new();
    if every_months == 0 || start > end {
        return ticks;
    }

    let Some(mut tick) = NaiveDate::from_ymd_opt(start.year(), start.month(), 1) else {
        return ticks;
    };
    if tick < start {
        tick = tick + Months::new(1);
    }

    while tick <= end {
        ticks.push((tick, tick.format("%m-%Y").to_string()));
        tick = tick + Months::new(every_months);
    }
    ticks
}

/// Evenly spaced chart axis: bounds snapped to month starts and at most
/// `max_labels` "MM-YYYY" labels, each a multiple of `every_months` apart.
#[derive(Debug, Clone, PartialEq)]
pub struct DateAxis {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub labels: Vec<String>,
}

pub fn date_axis(
    start: NaiveDate,
    end: NaiveDate,
    every_months: u32,
    max_labels: usize,
) -> Option<DateAxis> {
    if every_months == 0 || max_labels < 2 || start > end {
        return None;
    }
    let from = NaiveDate::from_ymd_opt(start.year(), start.month(), 1)?;

    // steps of `every_months` needed to cover [from, end]
    let mut steps = 1u32;
    while from + Months::new(steps * every_months) < end {
        steps += 1;
    }

    let stride = (steps as usize).div_ceil(max_labels - 1).max(1) as u32;
    let steps = steps.div_ceil(stride) * stride;
    let to = from + Months::new(steps * every_months);

    let labels = month_ticks(from, to, every_months * stride)
        .into_iter()
        .map(|(_, label)| label)
        .collect();

    Some(DateAxis { from, to, labels })
}
