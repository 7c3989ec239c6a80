//! Filter engine: latest row per symbol, then AND of all active thresholds.

pub mod listing;
pub mod options;

use crate::dataset::distinct_symbols;
use crate::models::JoinedRow;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::{debug, warn};

pub use self::options::{FilterField, Polarity, ANY};

// ── Selection ─────────────────────────────────────────────────────────────────

/// Chosen option label per field. Missing, empty or "Any" means inactive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    choices: BTreeMap<FilterField, String>,
}

#[derive(Debug, Error, PartialEq)]
pub enum SelectionError {
    #[error("expected FIELD=LABEL, got {0:?}")]
    Malformed(String),
    #[error("unknown filter field {0:?}")]
    UnknownField(String),
}

impl FilterSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: FilterField, label: impl Into<String>) -> &mut Self {
        self.choices.insert(field, label.into());
        self
    }

    pub fn with(mut self, field: FilterField, label: impl Into<String>) -> Self {
        self.set(field, label);
        self
    }

    pub fn get(&self, field: FilterField) -> Option<&str> {
        self.choices.get(&field).map(String::as_str)
    }

    /// Parse `FIELD=LABEL` arguments, e.g. `"P/E=Low (<15)"`.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Result<Self, SelectionError> {
        let mut selection = Self::new();
        for arg in args {
            let arg = arg.as_ref();
            let (field, label) = arg
                .split_once('=')
                .ok_or_else(|| SelectionError::Malformed(arg.to_string()))?;
            let field = FilterField::parse(field)
                .ok_or_else(|| SelectionError::UnknownField(field.trim().to_string()))?;
            selection.set(field, label.trim());
        }
        Ok(selection)
    }

    /// Active (field, label) pairs in field order.
    pub fn active(&self) -> impl Iterator<Item = (FilterField, &str)> {
        self.choices
            .iter()
            .map(|(f, l)| (*f, l.trim()))
            .filter(|(_, l)| !l.is_empty() && *l != ANY)
    }
}

// ── Comparisons ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparison {
    pub field: FilterField,
    pub polarity: Polarity,
    pub threshold: f64,
}

impl Comparison {
    /// Resolve a label to a threshold test. `None` for labels that are not
    /// in the field's vocabulary or carry no direction word.
    pub fn resolve(field: FilterField, label: &str) -> Option<Self> {
        let threshold = field.threshold(label)?;
        let polarity = Polarity::of_label(label)?;
        Some(Self { field, polarity, threshold })
    }

    /// Missing values never pass.
    pub fn matches(&self, row: &JoinedRow) -> bool {
        self.field
            .value(row)
            .is_some_and(|v| self.polarity.passes(v, self.threshold))
    }
}

// ── Engine ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilteredResult {
    pub rows: Vec<JoinedRow>,
    /// "abbrev: label" for every non-"Any" selection, in field order.
    pub descriptions: Vec<String>,
}

impl FilteredResult {
    /// Header line shown above the listing.
    pub fn active_filters_message(&self) -> String {
        if self.descriptions.is_empty() {
            "No active filters".to_string()
        } else {
            format!("Active Filters: {}", self.descriptions.join(", "))
        }
    }
}

/// Keep the row with the latest date for each symbol. Ties keep the row seen
/// first. Output is in first-appearance order of the symbols.
pub fn latest_per_symbol(rows: &[JoinedRow]) -> Vec<JoinedRow> {
    let mut slot: HashMap<&str, usize> = HashMap::new();
    let mut latest: Vec<&JoinedRow> = Vec::new();

    for row in rows {
        match slot.get(row.symbol.as_str()) {
            Some(&i) => {
                if row.date > latest[i].date {
                    latest[i] = row;
                }
            }
            None => {
                slot.insert(row.symbol.as_str(), latest.len());
                latest.push(row);
            }
        }
    }

    latest.into_iter().cloned().collect()
}

/// Apply every active selection to the latest row of each symbol.
///
/// Labels outside a field's vocabulary are skipped (the field is treated as
/// "Any") but still appear in the descriptions.
pub fn apply_filters(rows: &[JoinedRow], selection: &FilterSelection) -> FilteredResult {
    let latest = latest_per_symbol(rows);

    let mut descriptions = Vec::new();
    let mut comparisons = Vec::new();
    for (field, label) in selection.active() {
        descriptions.push(format!("{}: {}", field.abbreviation(), label));
        match Comparison::resolve(field, label) {
            Some(c) => comparisons.push(c),
            None => warn!("Ignoring unknown option {:?} for {}", label, field.name()),
        }
    }

    let mut result: Vec<JoinedRow> = latest
        .into_iter()
        .filter(|row| comparisons.iter().all(|c| c.matches(row)))
        .collect();
    result.sort_by(|a, b| a.symbol.cmp(&b.symbol));

    debug!(
        "{} comparisons → {} of {} symbols",
        comparisons.len(),
        result.len(),
        distinct_symbols(rows)
    );

    FilteredResult { rows: result, descriptions }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
