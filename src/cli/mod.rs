use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use sqlx::SqlitePool;
use std::path::PathBuf;
use tracing::info;

use crate::config::Config;
use crate::data::NewsFilter;

pub mod commands;
pub mod migrate;

#[derive(Parser)]
#[command(
    name = "bok-tone",
    about = "Bank of Korea monetary policy Tone Index dashboard",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Title filter for the news board
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum NewsKind {
    Minutes,
    Outlook,
    All,
}

impl From<NewsKind> for NewsFilter {
    fn from(kind: NewsKind) -> Self {
        match kind {
            NewsKind::Minutes => NewsFilter::Minutes,
            NewsKind::Outlook => NewsFilter::Outlook,
            NewsKind::All => NewsFilter::All,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Crawl the MPC meeting listings and store them
    Crawl {
        /// Years to crawl (defaults to last year and this year)
        #[arg(short, long, num_args = 1..)]
        years: Vec<i32>,
    },

    /// List postings from a BOK news board
    News {
        /// Board menu number
        #[arg(short, long, default_value = crate::data::minutes::MINUTES_NEWS_MENU)]
        menu: String,

        /// Number of pages to read
        #[arg(short, long, default_value_t = 1)]
        pages: u32,

        /// Postings per page
        #[arg(long, default_value_t = 10)]
        page_unit: u32,

        /// Which titles to keep
        #[arg(short, long, value_enum, default_value = "minutes")]
        filter: NewsKind,
    },

    /// Download minutes PDFs and extract their text
    Download {
        /// Years to process (defaults to every crawled year)
        #[arg(short, long, num_args = 1..)]
        years: Vec<i32>,

        /// Pause between downloads in milliseconds
        #[arg(short, long)]
        delay_ms: Option<u64>,
    },

    /// Show sentiment dictionary statistics, export it, or score a sentence
    Dictionary {
        /// Write the dictionary as JSON (defaults to data/dictionaries/sentiment_dictionary.json)
        #[arg(short, long)]
        export: Option<Option<PathBuf>>,

        /// Text to score against the dictionary
        #[arg(short, long)]
        text: Option<String>,
    },

    /// Compute the Tone Index of every extracted minutes text
    Analyze,

    /// Fetch GDP/CPI projections from the latest Economic Outlook
    Outlook {
        /// Latest release date to consider (defaults to today, Asia/Seoul)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Predict the rate decision for the latest analyzed meeting
    Predict,

    /// Run the walk-forward backtest of the rate predictor
    Backtest {
        /// Labeled meetings used before the first prediction
        #[arg(short, long)]
        start_idx: Option<usize>,
    },

    /// Start the HTTP dashboard
    Serve {
        /// Listen address (overrides DASHBOARD_ADDR)
        #[arg(short, long)]
        addr: Option<String>,
    },

    /// Run database migrations
    Migrate,
}

/// Execute CLI command with database pool
pub async fn run(cli: Cli, pool: SqlitePool, config: Config) -> Result<()> {
    match cli.command {
        Commands::Crawl { years } => {
            let years = if years.is_empty() {
                let current = Config::current_year();
                vec![current - 1, current]
            } else {
                years
            };
            info!("Crawling MPC meetings for {:?}", years);
            commands::crawl(pool, &config, years).await?;
        }
        Commands::News { menu, pages, page_unit, filter } => {
            info!("Reading {} page(s) of news board {}", pages, menu);
            commands::news(&config, &menu, pages, page_unit, filter.into()).await?;
        }
        Commands::Download { years, delay_ms } => {
            let years = (!years.is_empty()).then_some(years);
            info!("Downloading minutes PDFs");
            commands::download(&config, years, delay_ms).await?;
        }
        Commands::Dictionary { export, text } => {
            commands::dictionary(&config, export, text)?;
        }
        Commands::Analyze => {
            info!("Analyzing minutes tone");
            commands::analyze(pool, &config).await?;
        }
        Commands::Outlook { date } => {
            let date = date.unwrap_or_else(Config::today);
            info!("Fetching Economic Outlook released on or before {}", date);
            commands::outlook(pool, &config, date).await?;
        }
        Commands::Predict => {
            commands::predict(pool, config).await?;
        }
        Commands::Backtest { start_idx } => {
            info!("Running walk-forward backtest");
            commands::backtest(pool, config, start_idx).await?;
        }
        Commands::Serve { addr } => {
            let mut config = config;
            if let Some(addr) = addr {
                config.dashboard.addr = addr;
            }
            commands::serve(pool, config).await?;
        }
        Commands::Migrate => {
            migrate::execute(pool).await?;
        }
    }
    Ok(())
}
