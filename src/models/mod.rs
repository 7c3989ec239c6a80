use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ── Ticker ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ticker {
    pub symbol: String,
    pub scraped_at: NaiveDateTime,
}

// ── Ratio snapshot ────────────────────────────────────────────────────────────

/// The nine fundamental ratios of one company on one reporting date.
/// Missing upstream values stay `None`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Ratios {
    pub pe: Option<f64>,
    pub pb: Option<f64>,
    pub div_yield: Option<f64>,
    pub roe: Option<f64>,
    pub npm: Option<f64>,
    pub de: Option<f64>,
    pub peg: Option<f64>,
    pub current_ratio: Option<f64>,
    pub asset_turnover: Option<f64>,
}

impl Ratios {
    /// Apply `f` to every present ratio.
    pub fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            pe: self.pe.map(&f),
            pb: self.pb.map(&f),
            div_yield: self.div_yield.map(&f),
            roe: self.roe.map(&f),
            npm: self.npm.map(&f),
            de: self.de.map(&f),
            peg: self.peg.map(&f),
            current_ratio: self.current_ratio.map(&f),
            asset_turnover: self.asset_turnover.map(&f),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RatioRecord {
    pub symbol: String,
    pub date: NaiveDate,
    pub ratios: Ratios,
}

// ── Daily price ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceRecord {
    pub symbol: String,
    pub date: NaiveDate,
    pub close: f64,
    /// Cumulative split/dividend adjustment factor.
    pub adjustment_factor: f64,
}

impl PriceRecord {
    pub fn adjusted_price(&self) -> f64 {
        self.close / self.adjustment_factor
    }
}

// ── Joined row ────────────────────────────────────────────────────────────────

/// One ratio snapshot paired with one trading day of the same symbol.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JoinedRow {
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratio_date: Option<NaiveDate>,
    #[serde(flatten)]
    pub ratios: Ratios,
    /// Trading date of the price.
    pub date: NaiveDate,
    pub adjusted_price: f64,
}

// ── Raw CSV rows ──────────────────────────────────────────────────────────────

/// Ratio export: ticker, public_date and the nine ratio columns
#[derive(Debug, Clone, Default)]
pub struct RawRatioRow {
    pub ticker: Option<String>,
    pub public_date: Option<String>,
    pub pe_inc: Option<String>,
    pub ptb: Option<String>,
    pub divyield: Option<String>,
    pub roe: Option<String>,
    pub npm: Option<String>,
    pub de_ratio: Option<String>,
    pub peg_trailing: Option<String>,
    pub curr_ratio: Option<String>,
    pub at_turn: Option<String>,
}

/// Daily security export: tic, datadate, prccd (close), ajexdi (adjustment)
#[derive(Debug, Clone, Default)]
pub struct RawPriceRow {
    pub tic: Option<String>,
    pub datadate: Option<String>,
    pub prccd: Option<String>,
    pub ajexdi: Option<String>,
}
