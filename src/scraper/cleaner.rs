use crate::models::{PriceRecord, RatioRecord, Ratios, RawPriceRow, RawRatioRow, Ticker};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashSet;
use tracing::warn;

// ── Parsers ───────────────────────────────────────────────────────────────────

fn is_blank(s: &str) -> bool {
    matches!(s, "" | "N/A" | "NA" | "-" | "—" | "." | "NaN" | "nan")
}

/// Parse a numeric cell: thousands separators and currency symbols are
/// stripped, placeholders become `None`.
/// "1,234.56" → 1234.56 | "$10" → 10.0 | "-0.15" → -0.15 | "N/A" → None
pub fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if is_blank(s) {
        return None;
    }
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | 'e' | 'E' | '+'))
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse dates: ISO, compact "20221130", US "11/30/2022" or "Nov 30, 2022"
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    for fmt in ["%Y-%m-%d", "%Y%m%d", "%m/%d/%Y", "%b %d, %Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }

    // Timestamps exported as "2022-11-30 00:00:00"
    s.split_whitespace()
        .next()
        .filter(|head| head.len() < s.len())
        .and_then(|head| NaiveDate::parse_from_str(head, "%Y-%m-%d").ok())
}

/// Symbols are matched exactly as stored, so only surrounding whitespace goes.
pub fn normalise_symbol(s: &str) -> String {
    s.trim().to_string()
}

// ── Listing → Ticker ──────────────────────────────────────────────────────────

/// Trim, drop blanks and keep the first occurrence of each symbol.
pub fn clean_ticker_symbols(raw: Vec<String>, now: NaiveDateTime) -> Vec<Ticker> {
    let mut seen = HashSet::new();
    raw.iter()
        .map(|s| normalise_symbol(s))
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.clone()))
        .map(|symbol| Ticker { symbol, scraped_at: now })
        .collect()
}

// ── Ratio CSV → RatioRecord ───────────────────────────────────────────────────

pub fn ratio_row_to_record(row: &RawRatioRow) -> Option<RatioRecord> {
    let symbol = normalise_symbol(row.ticker.as_deref().unwrap_or_default());
    if symbol.is_empty() {
        warn!("Ratio row without ticker (public_date {:?})", row.public_date);
        return None;
    }

    let Some(date) = row.public_date.as_deref().and_then(parse_date) else {
        warn!("Unparsable public_date {:?} for {}", row.public_date, symbol);
        return None;
    };

    let num = |cell: &Option<String>| cell.as_deref().and_then(parse_number);

    Some(RatioRecord {
        symbol,
        date,
        ratios: Ratios {
            pe: num(&row.pe_inc),
            pb: num(&row.ptb),
            div_yield: num(&row.divyield),
            roe: num(&row.roe),
            npm: num(&row.npm),
            de: num(&row.de_ratio),
            peg: num(&row.peg_trailing),
            current_ratio: num(&row.curr_ratio),
            asset_turnover: num(&row.at_turn),
        },
    })
}

// ── Price CSV → PriceRecord ───────────────────────────────────────────────────

pub fn price_row_to_record(row: &RawPriceRow) -> Option<PriceRecord> {
    let symbol = normalise_symbol(row.tic.as_deref().unwrap_or_default());
    if symbol.is_empty() {
        warn!("Price row without tic (datadate {:?})", row.datadate);
        return None;
    }

    let Some(date) = row.datadate.as_deref().and_then(parse_date) else {
        warn!("Unparsable datadate {:?} for {}", row.datadate, symbol);
        return None;
    };

    let close = row.prccd.as_deref().and_then(parse_number);
    let adjustment_factor = row.ajexdi.as_deref().and_then(parse_number);
    let (Some(close), Some(adjustment_factor)) = (close, adjustment_factor) else {
        warn!(
            "Missing close {:?} / adjustment {:?} for {} on {}",
            row.prccd, row.ajexdi, symbol, date
        );
        return None;
    };

    if close <= 0.0 || adjustment_factor <= 0.0 {
        warn!(
            "Invalid close {} / adjustment {} for {} on {}",
            close, adjustment_factor, symbol, date
        );
        return None;
    }

    Some(PriceRecord {
        symbol,
        date,
        close,
        adjustment_factor,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Run `f` and return its result with everything logged at `warn` or above.
    fn capture_warnings<T>(f: impl FnOnce() -> T) -> (T, String) {
        let buf = LogBuffer::default();
        let writer = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let out = tracing::subscriber::with_default(subscriber, f);
        let logs = String::from_utf8_lossy(&buf.0.lock().unwrap()).into_owned();
        (out, logs)
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("1,234.56"), Some(1234.56));
        assert_eq!(parse_number(" -0.15 "), Some(-0.15));
        assert_eq!(parse_number("$10"), Some(10.0));
        assert_eq!(parse_number("1.5e-3"), Some(0.0015));
        assert_eq!(parse_number("N/A"), None);
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("abc"), None);
    }

    #[test]
    fn test_parse_date_formats() {
        let d = NaiveDate::from_ymd_opt(2022, 11, 30).unwrap();
        assert_eq!(parse_date("2022-11-30"), Some(d));
        assert_eq!(parse_date("20221130"), Some(d));
        assert_eq!(parse_date("11/30/2022"), Some(d));
        assert_eq!(parse_date("Nov 30, 2022"), Some(d));
        assert_eq!(parse_date("2022-11-30 00:00:00"), Some(d));
        assert_eq!(parse_date("yesterday"), None);
    }

    #[test]
    fn test_clean_ticker_symbols_dedupes_in_order() {
        let raw = vec![" MMM".into(), "AOS\n".into(), "".into(), "MMM".into()];
        let tickers = clean_ticker_symbols(raw, now());
        let symbols: Vec<_> = tickers.iter().map(|t| t.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["MMM", "AOS"]);
    }

    #[test]
    fn test_ratio_row_keeps_missing_values_as_none() {
        let row = RawRatioRow {
            ticker: Some("AAPL".into()),
            public_date: Some("2022-11-30".into()),
            pe_inc: Some("24.8123".into()),
            divyield: Some("".into()),
            roe: Some("1.47".into()),
            ..Default::default()
        };
        let rec = ratio_row_to_record(&row).unwrap();
        assert_eq!(rec.symbol, "AAPL");
        assert_eq!(rec.ratios.pe, Some(24.8123));
        assert_eq!(rec.ratios.div_yield, None);
        assert_eq!(rec.ratios.pb, None);
        assert_eq!(rec.ratios.roe, Some(1.47));
    }

    #[test]
    fn test_skipped_rows_are_warned() {
        let (rec, logs) = capture_warnings(|| {
            ratio_row_to_record(&RawRatioRow {
                ticker: Some("  ".into()),
                public_date: Some("2022-11-30".into()),
                ..Default::default()
            })
        });
        assert!(rec.is_none());
        assert!(logs.contains("Ratio row without ticker"), "{logs}");

        let (rec, logs) = capture_warnings(|| {
            price_row_to_record(&RawPriceRow {
                tic: None,
                datadate: Some("2023-03-01".into()),
                ..Default::default()
            })
        });
        assert!(rec.is_none());
        assert!(logs.contains("Price row without tic"), "{logs}");

        let (rec, logs) = capture_warnings(|| {
            price_row_to_record(&RawPriceRow {
                tic: Some("AAPL".into()),
                datadate: Some("2023-03-01".into()),
                prccd: Some("145.31".into()),
                ajexdi: None,
            })
        });
        assert!(rec.is_none());
        assert!(logs.contains("Missing close"), "{logs}");
        assert!(logs.contains("AAPL"), "{logs}");
    }

    #[test]
    fn test_price_row_rejects_non_positive_factor() {
        let mut row = RawPriceRow {
            tic: Some("AAPL".into()),
            datadate: Some("2023-03-01".into()),
            prccd: Some("145.31".into()),
            ajexdi: Some("0".into()),
        };
        assert!(price_row_to_record(&row).is_none());

        row.ajexdi = Some("4".into());
        let rec = price_row_to_record(&row).unwrap();
        assert!((rec.adjusted_price() - 36.3275).abs() < 1e-9);
    }
}
