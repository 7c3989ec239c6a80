//! CSV loader for seeding the market database from ratio and price exports.

use crate::models::{PriceRecord, RatioRecord, RawPriceRow, RawRatioRow};
use crate::scraper::cleaner::{price_row_to_record, ratio_row_to_record};
use anyhow::{Context, Result};
use csv::StringRecord;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// Column positions looked up by header name, case-insensitive.
struct Columns {
    headers: Vec<String>,
}

impl Columns {
    fn new(headers: &StringRecord) -> Self {
        Self {
            headers: headers.iter().map(|h| h.trim().to_lowercase()).collect(),
        }
    }

    fn require(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .with_context(|| format!("missing column `{}`", name))
    }

    fn optional(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

fn cell(record: &StringRecord, idx: Option<usize>) -> Option<String> {
    idx.and_then(|i| record.get(i)).map(|s| s.to_string())
}

fn reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input)
}

/// Parse a ratio export: ticker, public_date, pe_inc, ptb, divyield, roe,
/// npm, de_ratio, peg_trailing, curr_ratio, at_turn (any order).
pub fn read_ratios<R: Read>(input: R) -> Result<Vec<RatioRecord>> {
    let mut rdr = reader(input);
    let cols = Columns::new(rdr.headers()?);

    let ticker = Some(cols.require("ticker")?);
    let public_date = Some(cols.require("public_date")?);
    let pe_inc = cols.optional("pe_inc");
    let ptb = cols.optional("ptb");
    let divyield = cols.optional("divyield");
    let roe = cols.optional("roe");
    let npm = cols.optional("npm");
    let de_ratio = cols.optional("de_ratio");
    let peg_trailing = cols.optional("peg_trailing");
    let curr_ratio = cols.optional("curr_ratio");
    let at_turn = cols.optional("at_turn");

    let mut records = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!("Ratio row {}: {}", i + 1, e);
                continue;
            }
        };

        let raw = RawRatioRow {
            ticker: cell(&record, ticker),
            public_date: cell(&record, public_date),
            pe_inc: cell(&record, pe_inc),
            ptb: cell(&record, ptb),
            divyield: cell(&record, divyield),
            roe: cell(&record, roe),
            npm: cell(&record, npm),
            de_ratio: cell(&record, de_ratio),
            peg_trailing: cell(&record, peg_trailing),
            curr_ratio: cell(&record, curr_ratio),
            at_turn: cell(&record, at_turn),
        };

        match ratio_row_to_record(&raw) {
            Some(rec) => records.push(rec),
            None => debug!("Skipped ratio row {}", i + 1),
        }
    }

    Ok(records)
}

/// Parse a daily price export: tic, datadate, prccd, ajexdi (any order).
pub fn read_prices<R: Read>(input: R) -> Result<Vec<PriceRecord>> {
    let mut rdr = reader(input);
    let cols = Columns::new(rdr.headers()?);

    let tic = Some(cols.require("tic")?);
    let datadate = Some(cols.require("datadate")?);
    let prccd = Some(cols.require("prccd")?);
    let ajexdi = Some(cols.require("ajexdi")?);

    let mut prices = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!("Price row {}: {}", i + 1, e);
                continue;
            }
        };

        let raw = RawPriceRow {
            tic: cell(&record, tic),
            datadate: cell(&record, datadate),
            prccd: cell(&record, prccd),
            ajexdi: cell(&record, ajexdi),
        };

        match price_row_to_record(&raw) {
            Some(p) => prices.push(p),
            None => debug!("Skipped price row {}", i + 1),
        }
    }

    Ok(prices)
}

pub fn load_ratio_file(path: &Path) -> Result<Vec<RatioRecord>> {
    let file = std::fs::File::open(path).with_context(|| format!("Cannot open {:?}", path))?;
    let records = read_ratios(file).with_context(|| format!("Bad ratio file {:?}", path))?;
    info!("{:?}: {} ratio snapshots loaded", path, records.len());
    Ok(records)
}

pub fn load_price_file(path: &Path) -> Result<Vec<PriceRecord>> {
    let file = std::fs::File::open(path).with_context(|| format!("Cannot open {:?}", path))?;
    let prices = read_prices(file).with_context(|| format!("Bad price file {:?}", path))?;
    info!("{:?}: {} price rows loaded", path, prices.len());
    Ok(prices)
}
