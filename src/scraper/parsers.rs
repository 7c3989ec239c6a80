use anyhow::Result;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

// ── Listing page ──────────────────────────────────────────────────────────────

fn selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| anyhow::anyhow!("{} selector: {:?}", s, e))
}

/// Pick the constituents table: the first `wikitable`, else the first table.
fn find_listing_table(doc: &Html) -> Result<Option<ElementRef<'_>>> {
    for candidate in ["table.wikitable", "table"] {
        let sel = selector(candidate)?;
        if let Some(table) = doc.select(&sel).next() {
            debug!("Listing table matched `{}`", candidate);
            return Ok(Some(table));
        }
    }
    Ok(None)
}

/// Extract the first-column text of every row after the header row.
///
/// Rows without `td` cells and rows whose first cell is blank are skipped.
pub fn parse_listing_page(html: &str) -> Result<Vec<String>> {
    let doc = Html::parse_document(html);

    let Some(table) = find_listing_table(&doc)? else {
        warn!("No table found on listing page");
        return Ok(vec![]);
    };

    let tr_sel = selector("tr")?;
    let td_sel = selector("td")?;

    let mut symbols = Vec::new();
    for tr in table.select(&tr_sel).skip(1) {
        let Some(first) = tr.select(&td_sel).next() else {
            continue;
        };
        let text = first.text().collect::<String>();
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        symbols.push(text.to_string());
    }

    Ok(symbols)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
