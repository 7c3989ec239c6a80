pub mod cleaner;
pub mod http_client;
pub mod parsers;

use crate::config::ScraperConfig;
use crate::models::Ticker;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use self::cleaner::clean_ticker_symbols;
use self::http_client::HttpClient;
use self::parsers::parse_listing_page;

// ── Source trait ──────────────────────────────────────────────────────────────

/// Swappable supplier of the ticker universe.
#[async_trait]
pub trait TickerSource: Send + Sync {
    async fn fetch_tickers(&self) -> Result<Vec<Ticker>>;
}

// ── Listing page scraper ──────────────────────────────────────────────────────

/// Reads the constituents table of a public index listing page.
pub struct ListingScraper {
    client: HttpClient,
    url: String,
}

impl ListingScraper {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        Ok(Self {
            client: HttpClient::new(config)?,
            url: config.listing_url.clone(),
        })
    }
}

#[async_trait]
impl TickerSource for ListingScraper {
    async fn fetch_tickers(&self) -> Result<Vec<Ticker>> {
        info!("Fetching ticker listing ({})", self.url);

        let Some(html) = self
            .client
            .get_text(&self.url)
            .await
            .context("Ticker listing fetch failed")?
        else {
            return Ok(vec![]);
        };

        let raw = parse_listing_page(&html)?;
        let tickers = clean_ticker_symbols(raw, Utc::now().naive_utc());

        info!("Total tickers discovered: {}", tickers.len());
        Ok(tickers)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve one canned HTTP response on a local port and return its URL.
    fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut chunk) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&chunk[..n]),
                }
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: text/html\r\nContent-Length: {}\r\n\
                 Connection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
        });

        format!("http://{addr}/wiki/List_of_S%26P_500_companies")
    }

    fn scraper_for(url: String) -> ListingScraper {
        let config = ScraperConfig { listing_url: url, timeout_secs: 5, ..Default::default() };
        ListingScraper::new(&config).unwrap()
    }

    #[test]
    fn test_non_2xx_listing_gives_empty_universe() {
        let scraper = scraper_for(serve_once("503 Service Unavailable", "maintenance"));
        let tickers = tokio_test::block_on(scraper.fetch_tickers()).unwrap();
        assert!(tickers.is_empty());
    }

    #[test]
    fn test_listing_page_yields_trimmed_symbols() {
        let page = r#"<table class="wikitable">
            <tr><th>Symbol</th><th>Security</th></tr>
            <tr><td> MMM </td><td>3M</td></tr>
            <tr><td>AOS</td><td>A. O. Smith</td></tr>
            <tr><td>MMM</td><td>duplicate</td></tr>
        </table>"#;
        let scraper = scraper_for(serve_once("200 OK", page));

        let tickers = tokio_test::block_on(scraper.fetch_tickers()).unwrap();
        let symbols: Vec<_> = tickers.iter().map(|t| t.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["MMM", "AOS"]);
    }

    #[test]
    fn test_unreachable_listing_is_an_error() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let scraper = scraper_for(format!("http://127.0.0.1:{port}/"));

        let err = tokio_test::block_on(scraper.fetch_tickers()).unwrap_err();
        assert!(format!("{:#}", err).contains("Ticker listing fetch failed"));
    }
}
