//! Collection pipeline
//! Crawls the yearly MPC meeting listings, stores them as JSON and in the database

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::{
    config::Config,
    data::{MeetingDAO, MinutesCrawler, MinutesItem, DataStore},
};

/// Outcome of one collection run
#[derive(Debug, Clone, Default)]
pub struct CollectSummary {
    pub years_requested: usize,
    pub years_failed: Vec<i32>,
    pub meetings: Vec<MinutesItem>,
    pub stored: usize,
}

impl CollectSummary {
    pub fn with_minutes(&self) -> usize {
        self.meetings.iter().filter(|m| m.has_minutes()).count()
    }
}

/// Print one line per meeting, `[O]` when minutes are published
pub fn display_minutes_list(items: &[MinutesItem]) {
    println!("\n{}", "=".repeat(60));
    println!("금융통화위원회 회의 목록 ({}건)", items.len());
    println!("{}", "=".repeat(60));

    for item in items {
        let mark = if item.has_minutes() { "[O]" } else { "[ ]" };
        let formats: Vec<&str> = [
            (item.minutes_pdf_url.is_some(), "PDF"),
            (item.minutes_hwp_url.is_some(), "HWP"),
        ]
        .iter()
        .filter_map(|(present, name)| present.then_some(*name))
        .collect();

        if formats.is_empty() {
            println!("{} {}", mark, item.meeting_date);
        } else {
            println!("{} {}  ({})", mark, item.meeting_date, formats.join(", "));
        }
    }

    println!("{}\n", "=".repeat(60));
}

pub struct CollectOrchestrator {
    crawler: MinutesCrawler,
    store: DataStore,
    meeting_dao: MeetingDAO,
    request_delay: Duration,
}

impl CollectOrchestrator {
    pub fn new(pool: SqlitePool, config: &Config) -> Result<Self> {
        let crawler = MinutesCrawler::new(&config.crawler).context("Failed to build BOK crawler")?;
        Ok(Self::with_crawler(pool, config, crawler))
    }

    pub fn with_crawler(pool: SqlitePool, config: &Config, crawler: MinutesCrawler) -> Self {
        Self {
            crawler,
            store: DataStore::new(&config.storage.data_dir),
            meeting_dao: MeetingDAO::new(pool),
            request_delay: Duration::from_millis(config.crawler.request_delay_ms),
        }
    }

    /// Crawl `years` one at a time; a failed year is reported and skipped
    pub async fn run(&self, years: &[i32]) -> Result<CollectSummary> {
        info!("📥 Collecting MPC meetings for {} year(s)", years.len());

        let mut summary = CollectSummary {
            years_requested: years.len(),
            ..Default::default()
        };

        for (i, &year) in years.iter().enumerate() {
            match self.crawler.get_minutes_by_year(year).await {
                Ok(items) => {
                    info!("{}: collected {} meetings", year, items.len());
                    summary.stored += self.persist_year(year, &items).await?;
                    summary.meetings.extend(items);
                }
                Err(e) => {
                    error!("Failed to collect meetings for {}: {}", year, e);
                    summary.years_failed.push(year);
                }
            }

            if i + 1 < years.len() && !self.request_delay.is_zero() {
                tokio::time::sleep(self.request_delay).await;
            }
        }

        summary.meetings.sort_by_key(|m| m.meeting_date);
        info!(
            "Collection finished: {} meetings, {} with minutes, {} failed year(s)",
            summary.meetings.len(),
            summary.with_minutes(),
            summary.years_failed.len()
        );

        Ok(summary)
    }

    /// Save `raw/minutes_<year>.json` and upsert the rows.
    /// An empty listing leaves any earlier file for that year untouched.
    pub async fn persist_year(&self, year: i32, items: &[MinutesItem]) -> Result<usize> {
        if items.is_empty() {
            warn!("No meetings listed for {}, keeping existing data", year);
            return Ok(0);
        }

        self.store
            .save_items(items, &format!("minutes_{}.json", year))
            .with_context(|| format!("Failed to save meeting listing for {}", year))?;

        let stored = self
            .meeting_dao
            .upsert_many(items)
            .await
            .with_context(|| format!("Failed to store meetings for {}", year))?;

        Ok(stored)
    }
}
