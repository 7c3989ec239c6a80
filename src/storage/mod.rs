use crate::models::{PriceRecord, RatioRecord, Ratios};
use crate::utils::ensure_parent_dir;
use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use duckdb::{params, params_from_iter, Connection, Row};
use std::path::Path;
use tracing::{debug, info};

// ── Schema ────────────────────────────────────────────────────────────────────

const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS firm_ratio (
    ticker        VARCHAR NOT NULL,
    public_date   DATE    NOT NULL,
    pe_inc        DOUBLE,
    ptb           DOUBLE,
    divyield      DOUBLE,
    roe           DOUBLE,
    npm           DOUBLE,
    de_ratio      DOUBLE,
    peg_trailing  DOUBLE,
    curr_ratio    DOUBLE,
    at_turn       DOUBLE,
    PRIMARY KEY (ticker, public_date)
);

CREATE TABLE IF NOT EXISTS daily_prices (
    tic       VARCHAR NOT NULL,
    datadate  DATE    NOT NULL,
    -- Raw close, not adjusted for splits or dividends
    prccd     DOUBLE  NOT NULL,
    -- Cumulative adjustment factor (ex-date)
    ajexdi    DOUBLE  NOT NULL,
    PRIMARY KEY (tic, datadate)
);

CREATE TABLE IF NOT EXISTS schema_version (
    version     INTEGER PRIMARY KEY,
    applied_at  TIMESTAMP NOT NULL
);
"#;

const INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_prices_date ON daily_prices (datadate);
CREATE INDEX IF NOT EXISTS idx_ratio_date  ON firm_ratio (public_date);
"#;

const RATIO_COLUMNS: &str = "ticker, public_date, pe_inc, ptb, divyield, roe, npm, \
                             de_ratio, peg_trailing, curr_ratio, at_turn";

// ── Source trait ──────────────────────────────────────────────────────────────

/// Parameterized access to ratio snapshots and daily prices.
pub trait MarketDataSource {
    /// Ratio snapshots published on `ratio_date` for the given tickers.
    fn ratio_records(&self, tickers: &[String], ratio_date: NaiveDate) -> Result<Vec<RatioRecord>>;

    /// Daily prices within `[start, end]`, ordered by symbol then date.
    /// Rows with a non-positive adjustment factor are left out.
    fn price_records(
        &self,
        tickers: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceRecord>>;
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn ratio_from_row(r: &Row<'_>) -> duckdb::Result<RatioRecord> {
    Ok(RatioRecord {
        symbol: r.get(0)?,
        date: r.get(1)?,
        ratios: Ratios {
            pe: r.get(2)?,
            pb: r.get(3)?,
            div_yield: r.get(4)?,
            roe: r.get(5)?,
            npm: r.get(6)?,
            de: r.get(7)?,
            peg: r.get(8)?,
            current_ratio: r.get(9)?,
            asset_turnover: r.get(10)?,
        },
    })
}

// ── Repository ────────────────────────────────────────────────────────────────

pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub fn open(path: &Path) -> Result<Self> {
        ensure_parent_dir(path).with_context(|| format!("Could not create dir for {:?}", path))?;
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open DuckDB at {:?}", path))?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self { conn: Connection::open_in_memory()? })
    }

    pub fn run_migrations(&self) -> Result<()> {
        info!("Running migrations…");
        self.conn.execute_batch(DDL).context("DDL failed")?;
        self.conn.execute_batch(INDEXES).context("Index creation failed")?;
        self.conn.execute(
            "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (1, ?)",
            params![Utc::now().naive_utc()],
        )?;
        info!("Migrations done.");
        Ok(())
    }

    // ── Ratios ────────────────────────────────────────────────────────────────

    /// Upsert ratio snapshots. Re-running on the same file is a no-op.
    pub fn upsert_ratios(&self, records: &[RatioRecord]) -> Result<usize> {
        if records.is_empty() { return Ok(0); }

        let tx = self.conn.unchecked_transaction()?;
        let sql = format!(
            r#"INSERT INTO firm_ratio ({RATIO_COLUMNS})
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT (ticker, public_date) DO UPDATE SET
                   pe_inc       = excluded.pe_inc,
                   ptb          = excluded.ptb,
                   divyield     = excluded.divyield,
                   roe          = excluded.roe,
                   npm          = excluded.npm,
                   de_ratio     = excluded.de_ratio,
                   peg_trailing = excluded.peg_trailing,
                   curr_ratio   = excluded.curr_ratio,
                   at_turn      = excluded.at_turn"#
        );

        for rec in records {
            let r = &rec.ratios;
            tx.execute(&sql, params![
                rec.symbol, rec.date,
                r.pe, r.pb, r.div_yield, r.roe, r.npm,
                r.de, r.peg, r.current_ratio, r.asset_turnover,
            ]).with_context(|| format!("insert ratios {} {}", rec.symbol, rec.date))?;
        }

        tx.commit()?;
        Ok(records.len())
    }

    // ── Daily prices ──────────────────────────────────────────────────────────

    /// Upsert prices. Re-running on the same file is a no-op.
    pub fn upsert_prices(&self, prices: &[PriceRecord]) -> Result<usize> {
        if prices.is_empty() { return Ok(0); }

        let tx = self.conn.unchecked_transaction()?;
        let sql = r#"
            INSERT INTO daily_prices (tic, datadate, prccd, ajexdi)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (tic, datadate) DO UPDATE SET
                prccd  = excluded.prccd,
                ajexdi = excluded.ajexdi
        "#;

        for p in prices {
            tx.execute(sql, params![p.symbol, p.date, p.close, p.adjustment_factor])
                .with_context(|| format!("insert price {} {}", p.symbol, p.date))?;
        }

        tx.commit()?;
        Ok(prices.len())
    }

    // ── Stats ─────────────────────────────────────────────────────────────────

    pub fn ratio_count(&self) -> Result<i64> {
        let mut s = self.conn.prepare("SELECT COUNT(*) FROM firm_ratio")?;
        Ok(s.query_row([], |r| r.get(0))?)
    }

    pub fn price_count(&self) -> Result<i64> {
        let mut s = self.conn.prepare("SELECT COUNT(*) FROM daily_prices")?;
        Ok(s.query_row([], |r| r.get(0))?)
    }

    pub fn symbol_count(&self) -> Result<i64> {
        let mut s = self.conn.prepare("SELECT COUNT(DISTINCT tic) FROM daily_prices")?;
        Ok(s.query_row([], |r| r.get(0))?)
    }

    pub fn price_date_range(&self) -> Result<(Option<NaiveDate>, Option<NaiveDate>)> {
        let mut s = self.conn.prepare("SELECT MIN(datadate), MAX(datadate) FROM daily_prices")?;
        Ok(s.query_row([], |r| Ok((r.get(0)?, r.get(1)?)))?)
    }
}

impl MarketDataSource for Repository {
    fn ratio_records(&self, tickers: &[String], ratio_date: NaiveDate) -> Result<Vec<RatioRecord>> {
        if tickers.is_empty() { return Ok(vec![]); }

        let sql = format!(
            "SELECT {RATIO_COLUMNS} FROM firm_ratio
             WHERE public_date = CAST(? AS DATE) AND ticker IN ({})
             ORDER BY ticker",
            placeholders(tickers.len())
        );
        let args = std::iter::once(ratio_date.to_string()).chain(tickers.iter().cloned());

        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map(params_from_iter(args), ratio_from_row)?
            .collect::<duckdb::Result<Vec<_>>>()
            .context("ratio query failed")?;

        debug!("{} ratio snapshots for {}", records.len(), ratio_date);
        Ok(records)
    }

    fn price_records(
        &self,
        tickers: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceRecord>> {
        if tickers.is_empty() { return Ok(vec![]); }

        let sql = format!(
            "SELECT tic, datadate, prccd, ajexdi FROM daily_prices
             WHERE datadate BETWEEN CAST(? AS DATE) AND CAST(? AS DATE)
               AND ajexdi > 0
               AND tic IN ({})
             ORDER BY tic, datadate",
            placeholders(tickers.len())
        );
        let args = [start.to_string(), end.to_string()]
            .into_iter()
            .chain(tickers.iter().cloned());

        let mut stmt = self.conn.prepare(&sql)?;
        let prices = stmt
            .query_map(params_from_iter(args), |r| {
                Ok(PriceRecord {
                    symbol: r.get(0)?,
                    date: r.get(1)?,
                    close: r.get(2)?,
                    adjustment_factor: r.get(3)?,
                })
            })?
            .collect::<duckdb::Result<Vec<_>>>()
            .context("price query failed")?;

        debug!("{} price rows in {} → {}", prices.len(), start, end);
        Ok(prices)
    }
}
