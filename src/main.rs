mod config;
mod dataset;
mod filter;
mod loader;
mod models;
mod pipeline;
mod scraper;
mod series;
mod storage;
mod ui;
mod utils;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::AppConfig;
use crate::dataset::Dataset;
use crate::filter::listing::format_listing;
use crate::filter::{apply_filters, FilterField, FilterSelection};
use crate::loader::{load_price_file, load_ratio_file};
use crate::pipeline::Pipeline;
use crate::scraper::{ListingScraper, TickerSource};
use crate::series::{month_ticks, series_with_windows};
use crate::storage::Repository;

#[derive(Parser)]
#[command(name = "sp500-screener", about = "S&P 500 stock screener", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Load the dataset and open the interactive screener (default)
    Tui,

    /// Load the dataset, apply filters and print the matching companies
    Screen {
        /// Filter as FIELD=LABEL, e.g. "Price/Earnings Ratio=Low (<15)"
        #[arg(short, long = "filter")]
        filters: Vec<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the price history of one symbol with its moving averages
    Chart {
        symbol: String,

        /// Number of trailing observations to print
        #[arg(short, long, default_value_t = 10)]
        tail: usize,
    },

    /// Fetch and print the ticker universe
    Tickers,

    /// Import a ratio snapshot CSV into the market database
    LoadRatios { file: PathBuf },

    /// Import a daily price CSV into the market database
    LoadPrices { file: PathBuf },

    /// Show market database statistics
    Stats,

    /// Apply schema migrations without loading data
    Migrate,

    /// List every filterable field and its option labels
    Options,
}

impl Command {
    fn is_interactive(&self) -> bool {
        matches!(self, Command::Tui)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Tui);

    let config = AppConfig::load()?;
    init_tracing(cli.verbose, command.is_interactive().then_some(&config.logging.tui_log_path))?;

    match command {
        Command::Tui => {
            eprintln!("Loading market data…");
            let dataset = load_dataset(&config).await?;
            ui::run(&dataset, config.chart.clone())?;
        }

        Command::Screen { filters, json } => {
            let selection = FilterSelection::from_args(&filters)?;
            let dataset = load_dataset(&config).await?;
            let result = apply_filters(dataset.rows(), &selection);
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", result.active_filters_message());
                println!("{}", format_listing(&result.rows));
                println!("{} companies", result.rows.len());
            }
        }

        Command::Chart { symbol, tail } => {
            let dataset = load_dataset(&config).await?;
            let series = match series_with_windows(
                &symbol,
                dataset.rows(),
                config.chart.short_window,
                config.chart.long_window,
            ) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("{e}");
                    std::process::exit(1);
                }
            };

            println!("{}", series.title());
            println!(
                "{:<12}{:>14}{:>14}{:>14}",
                "Date",
                "Stock Price",
                format!("{}-day SMA", series.short_window),
                format!("{}-day SMA", series.long_window)
            );
            let skip = series.points.len().saturating_sub(tail);
            for p in &series.points[skip..] {
                let cell = |v: Option<f64>| v.map(|v| format!("{v:.4}")).unwrap_or_default();
                println!(
                    "{:<12}{:>14.4}{:>14}{:>14}",
                    p.date.to_string(),
                    p.adjusted_price,
                    cell(p.sma_short),
                    cell(p.sma_long)
                );
            }

            if let (Some(first), Some(last)) = (series.first_date(), series.last_date()) {
                let ticks: Vec<String> = month_ticks(first, last, config.chart.tick_months)
                    .into_iter()
                    .map(|(_, label)| label)
                    .collect();
                println!("Ticks: {}", ticks.join(" "));
            }
        }

        Command::Tickers => {
            let scraper = ListingScraper::new(&config.scraper)?;
            let tickers = scraper.fetch_tickers().await?;
            println!("{} tickers:", tickers.len());
            for t in &tickers {
                println!("  {}", t.symbol);
            }
        }

        Command::LoadRatios { file } => {
            let _t = utils::Timer::start(format!("Ratio import {:?}", file));
            let repo = open_repository(&config)?;
            let records = load_ratio_file(&file)?;
            let n = repo.upsert_ratios(&records)?;
            info!("Done: {} ratio snapshots upserted", n);
        }

        Command::LoadPrices { file } => {
            let _t = utils::Timer::start(format!("Price import {:?}", file));
            let repo = open_repository(&config)?;
            let records = load_price_file(&file)?;
            let n = repo.upsert_prices(&records)?;
            info!("Done: {} prices upserted", n);
        }

        Command::Stats => {
            let repo = open_repository(&config)?;
            let (min, max) = repo.price_date_range().unwrap_or((None, None));
            println!("─────────────────────────────────");
            println!("  Market database stats");
            println!("─────────────────────────────────");
            println!("  Symbols  : {}", utils::fmt_number(repo.symbol_count()?));
            println!("  Ratios   : {}", utils::fmt_number(repo.ratio_count()?));
            println!("  Prices   : {}", utils::fmt_number(repo.price_count()?));
            println!("  From     : {}", utils::fmt_date(min));
            println!("  To       : {}", utils::fmt_date(max));
            println!("─────────────────────────────────");
        }

        Command::Migrate => {
            Repository::open(&config.market.db_path)?.run_migrations()?;
            println!("Migrations applied.");
        }

        Command::Options => {
            for field in FilterField::ALL {
                println!("{}", field.name());
                for label in field.labels() {
                    println!("  {}", label);
                }
            }
        }
    }

    Ok(())
}

/// Logs go to stderr, or to `log_file` while the terminal UI owns the screen.
fn init_tracing(verbose: u8, log_file: Option<&PathBuf>) -> Result<()> {
    let filter = match verbose {
        0 => "sp500_screener=info,warn",
        1 => "sp500_screener=debug,info",
        _ => "trace",
    };

    let (console, file) = match log_file {
        Some(path) => {
            utils::ensure_parent_dir(path)?;
            let f = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Could not open log file {:?}", path))?;
            let layer = fmt::layer()
                .compact()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(f));
            (None, Some(layer))
        }
        None => {
            let layer = fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr);
            (Some(layer), None)
        }
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(filter))
        .with(console)
        .with(file)
        .init();
    Ok(())
}

fn open_repository(config: &AppConfig) -> Result<Repository> {
    let repo = Repository::open(&config.market.db_path)?;
    if config.market.run_migrations {
        repo.run_migrations()?;
    }
    Ok(repo)
}

/// Startup load: ticker universe, market query and join.
async fn load_dataset(config: &AppConfig) -> Result<Dataset> {
    let _t = utils::Timer::start("Startup load");
    let repo = open_repository(config)?;
    let scraper = ListingScraper::new(&config.scraper)?;
    let (dataset, _stats) = Pipeline::new(config.clone()).run(&scraper, &repo).await?;
    Ok(dataset)
}
