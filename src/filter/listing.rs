//! Plain-text results table, one line per company.

use super::options::FilterField;
use crate::models::JoinedRow;

pub const EMPTY_LISTING: &str = "No companies match the active filters.";

const RATIO_FIELDS: [FilterField; 9] = [
    FilterField::PriceEarnings,
    FilterField::PriceBook,
    FilterField::DividendYield,
    FilterField::ReturnOnEquity,
    FilterField::NetProfitMargin,
    FilterField::DebtEquity,
    FilterField::Peg,
    FilterField::CurrentRatio,
    FilterField::AssetTurnover,
];

fn header() -> Vec<String> {
    let mut cols = vec!["ticker".to_string()];
    cols.extend(RATIO_FIELDS.iter().map(|f| f.abbreviation().to_string()));
    cols.push("Date".to_string());
    cols.push(FilterField::StockPrice.abbreviation().to_string());
    cols
}

fn cells(row: &JoinedRow) -> Vec<String> {
    let mut out = vec![row.symbol.clone()];
    out.extend(RATIO_FIELDS.iter().map(|f| match f.value(row) {
        Some(v) => format!("{:.3}", v),
        None => "NaN".to_string(),
    }));
    out.push(row.date.format("%Y-%m-%d").to_string());
    out.push(format!("{:.4}", row.adjusted_price));
    out
}

/// Render rows as a right-aligned table with abbreviated column headers.
pub fn format_listing(rows: &[JoinedRow]) -> String {
    if rows.is_empty() {
        return EMPTY_LISTING.to_string();
    }

    let table: Vec<Vec<String>> = std::iter::once(header()).chain(rows.iter().map(cells)).collect();

    let mut widths = vec![0usize; table[0].len()];
    for line in &table {
        for (w, c) in widths.iter_mut().zip(line) {
            *w = (*w).max(c.chars().count());
        }
    }

    table
        .iter()
        .map(|line| {
            line.iter()
                .zip(&widths)
                .map(|(c, w)| format!("{:>w$}", c, w = *w))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::tests::row;

    #[test]
    fn test_listing_layout() {
        let rows = vec![
            row("AAA", "2021-06-01", Some(12.0), 11.0),
            row("BRK.B", "2021-06-01", None, 312.5),
        ];
        let text = format_listing(&rows);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].trim_start().starts_with("ticker"));
        assert!(lines[0].contains("Curr Ratio"));
        assert!(lines[0].ends_with("Stock Price"));
        assert!(lines[1].contains("12.000"));
        assert!(lines[1].ends_with("11.0000"));
        assert!(lines[2].contains("NaN"));
        // right-aligned columns share a width
        assert_eq!(lines[0].len(), lines[1].len());
        assert_eq!(lines[1].len(), lines[2].len());
    }

    #[test]
    fn test_empty_listing() {
        assert_eq!(format_listing(&[]), EMPTY_LISTING);
    }
}
