//! Filterable fields and their option vocabulary.
//!
//! The option labels are shown verbatim in the UI, and the comparison
//! direction of each option is read from its label text.

use crate::models::JoinedRow;

pub const ANY: &str = "Any";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterField {
    PriceEarnings,
    PriceBook,
    DividendYield,
    ReturnOnEquity,
    NetProfitMargin,
    DebtEquity,
    Peg,
    CurrentRatio,
    AssetTurnover,
    StockPrice,
}

impl FilterField {
    pub const ALL: [FilterField; 10] = [
        FilterField::PriceEarnings,
        FilterField::PriceBook,
        FilterField::DividendYield,
        FilterField::ReturnOnEquity,
        FilterField::NetProfitMargin,
        FilterField::DebtEquity,
        FilterField::Peg,
        FilterField::CurrentRatio,
        FilterField::AssetTurnover,
        FilterField::StockPrice,
    ];

    /// Column name of the field in the joined dataset.
    pub fn name(self) -> &'static str {
        match self {
            FilterField::PriceEarnings => "Price/Earnings Ratio",
            FilterField::PriceBook => "Price/Book Ratio",
            FilterField::DividendYield => "Dividend Yield",
            FilterField::ReturnOnEquity => "Return on Equity",
            FilterField::NetProfitMargin => "Net Profit Margin",
            FilterField::DebtEquity => "Debt/Equity Ratio",
            FilterField::Peg => "PEG Ratio",
            FilterField::CurrentRatio => "Current Ratio",
            FilterField::AssetTurnover => "Asset Turnover",
            FilterField::StockPrice => "Stock Price",
        }
    }

    /// Short column header used in listings and filter descriptions.
    pub fn abbreviation(self) -> &'static str {
        match self {
            FilterField::PriceEarnings => "P/E",
            FilterField::PriceBook => "P/B",
            FilterField::DividendYield => "Div Yld",
            FilterField::ReturnOnEquity => "ROE",
            FilterField::NetProfitMargin => "NPM",
            FilterField::DebtEquity => "D/E",
            FilterField::Peg => "PEG",
            FilterField::CurrentRatio => "Curr Ratio",
            FilterField::AssetTurnover => "Asset TO",
            FilterField::StockPrice => "Stock Price",
        }
    }

    /// Match a full name or abbreviation, ignoring case.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().trim_end_matches(':').trim();
        Self::ALL.into_iter().find(|f| {
            f.name().eq_ignore_ascii_case(s) || f.abbreviation().eq_ignore_ascii_case(s)
        })
    }

    pub fn value(self, row: &JoinedRow) -> Option<f64> {
        let r = &row.ratios;
        match self {
            FilterField::PriceEarnings => r.pe,
            FilterField::PriceBook => r.pb,
            FilterField::DividendYield => r.div_yield,
            FilterField::ReturnOnEquity => r.roe,
            FilterField::NetProfitMargin => r.npm,
            FilterField::DebtEquity => r.de,
            FilterField::Peg => r.peg,
            FilterField::CurrentRatio => r.current_ratio,
            FilterField::AssetTurnover => r.asset_turnover,
            FilterField::StockPrice => Some(row.adjusted_price),
        }
    }

    /// Selectable options, excluding "Any".
    pub fn options(self) -> &'static [FilterOption] {
        match self {
            FilterField::PriceEarnings => PE_OPTIONS,
            FilterField::PriceBook => PB_OPTIONS,
            FilterField::DividendYield => DIV_YIELD_OPTIONS,
            FilterField::ReturnOnEquity => ROE_OPTIONS,
            FilterField::NetProfitMargin => NPM_OPTIONS,
            FilterField::DebtEquity => DE_OPTIONS,
            FilterField::Peg => PEG_OPTIONS,
            FilterField::CurrentRatio => CURRENT_RATIO_OPTIONS,
            FilterField::AssetTurnover => ASSET_TURNOVER_OPTIONS,
            FilterField::StockPrice => STOCK_PRICE_OPTIONS,
        }
    }

    /// "Any" followed by every option label, in display order.
    pub fn labels(self) -> Vec<&'static str> {
        std::iter::once(ANY)
            .chain(self.options().iter().map(|o| o.label))
            .collect()
    }

    /// Threshold for an option label of this field.
    pub fn threshold(self, label: &str) -> Option<f64> {
        self.options()
            .iter()
            .find(|o| o.label == label)
            .map(|o| o.threshold)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterOption {
    pub label: &'static str,
    pub threshold: f64,
}

impl FilterOption {
    const fn new(label: &'static str, threshold: f64) -> Self {
        Self { label, threshold }
    }
}

const PE_OPTIONS: &[FilterOption] = &[
    FilterOption::new("Low (<15)", 15.0),
    FilterOption::new("Profitable (>0)", 0.0),
    FilterOption::new("High (>50)", 50.0),
];

const PB_OPTIONS: &[FilterOption] = &[
    FilterOption::new("Low (<1)", 1.0),
    FilterOption::new("High (>5)", 5.0),
];

const DIV_YIELD_OPTIONS: &[FilterOption] = &[
    FilterOption::new("None (0%)", 0.0),
    FilterOption::new("Positive (>0%)", 0.0001),
    FilterOption::new("High (>5%)", 0.05),
    FilterOption::new("Very High (>10%)", 0.1),
];

const ROE_OPTIONS: &[FilterOption] = &[
    FilterOption::new("Positive (>0%)", 0.0001),
    FilterOption::new("Negative (<0%)", -0.0001),
    FilterOption::new("Very Positive (>30%)", 0.30),
    FilterOption::new("Very Negative (<-15%)", -0.15),
];

const NPM_OPTIONS: &[FilterOption] = &[
    FilterOption::new("Positive (>0%)", 0.0001),
    FilterOption::new("Negative (<0%)", -0.0001),
    FilterOption::new("High (>20%)", 0.20),
    FilterOption::new("Very Negative (<-20%)", -0.20),
];

const DE_OPTIONS: &[FilterOption] = &[
    FilterOption::new("Low (<0.1)", 0.1),
    FilterOption::new("High (>0.5)", 0.5),
];

const PEG_OPTIONS: &[FilterOption] = &[
    FilterOption::new("Low (<1)", 1.0),
    FilterOption::new("High (>2)", 2.0),
];

const CURRENT_RATIO_OPTIONS: &[FilterOption] = &[
    FilterOption::new("Low (<1)", 1.0),
    FilterOption::new("High (>3)", 3.0),
];

const ASSET_TURNOVER_OPTIONS: &[FilterOption] = &[
    FilterOption::new("Low (<0.5)", 0.5),
    FilterOption::new("High (>1)", 1.0),
];

const STOCK_PRICE_OPTIONS: &[FilterOption] = &[
    FilterOption::new("Low (<$10)", 10.0),
    FilterOption::new("High (>$100)", 100.0),
];

/// Direction of a threshold test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// value < threshold
    Below,
    /// value > threshold
    Above,
}

impl Polarity {
    /// Read the direction from the label wording. Upper-bound words are
    /// checked first, so "Very Negative" is `Below`.
    pub fn of_label(label: &str) -> Option<Self> {
        if ["Low", "Negative", "None"].iter().any(|w| label.contains(w)) {
            Some(Polarity::Below)
        } else if ["High", "Positive", "Profitable"].iter().any(|w| label.contains(w)) {
            Some(Polarity::Above)
        } else {
            None
        }
    }

    pub fn passes(self, value: f64, threshold: f64) -> bool {
        match self {
            Polarity::Below => value < threshold,
            Polarity::Above => value > threshold,
        }
    }
}
