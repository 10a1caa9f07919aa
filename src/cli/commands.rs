use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::config::Config;
use crate::dashboard::{self, AppState};
use crate::data::{
    dao::OutlookDAO, DataStore, MinutesCrawler, NewsFilter, OutlookCrawler, PdfDownloader,
};
use crate::nlp::{interpret_tone, ToneAnalyzer};
use crate::orchestrator::{
    analyze::{display_tone_table, load_dictionary},
    collect::display_minutes_list,
    AnalyzeOrchestrator, CollectOrchestrator, ForecastOrchestrator,
};

/// Crawl meeting listings, save them and print the summary list
pub async fn crawl(pool: SqlitePool, config: &Config, years: Vec<i32>) -> Result<()> {
    let orchestrator = CollectOrchestrator::new(pool, config)?;
    let summary = orchestrator.run(&years).await?;

    display_minutes_list(&summary.meetings);
    println!(
        "✅ {} meetings stored ({} with minutes)",
        summary.stored,
        summary.with_minutes()
    );
    if !summary.years_failed.is_empty() {
        println!("⚠️  Failed years: {:?}", summary.years_failed);
    }

    Ok(())
}

/// Print postings from a news board
pub async fn news(config: &Config, menu: &str, pages: u32, page_unit: u32, filter: NewsFilter) -> Result<()> {
    let crawler = MinutesCrawler::new(&config.crawler)?;
    let items = crawler.get_news_list(menu, pages, page_unit, filter).await;

    if items.is_empty() {
        println!("No postings found");
        return Ok(());
    }

    println!("\n📰 {} posting(s) from board {}", items.len(), menu);
    for item in &items {
        let date = item.date.map(|d| d.to_string()).unwrap_or_else(|| "----------".to_string());
        println!("  {}  {}", date, item.title);
        println!("              {}", item.url);
    }
    println!();

    Ok(())
}

/// Download minutes PDFs for crawled years and extract their text
pub async fn download(config: &Config, years: Option<Vec<i32>>, delay_ms: Option<u64>) -> Result<()> {
    let store = DataStore::new(&config.storage.data_dir);
    let mut downloader = PdfDownloader::new(&config.crawler, store.clone())?;
    if let Some(ms) = delay_ms {
        downloader = downloader.with_delay(Duration::from_millis(ms));
    }

    let stats = downloader.process_all_years(years).await?;

    println!("\n{}", "=".repeat(60));
    println!("PDF download and text extraction complete");
    println!("{}", "=".repeat(60));
    println!("  Meetings:   {}", stats.total);
    println!("  Downloaded: {}", stats.downloaded);
    println!("  Extracted:  {}", stats.extracted);
    println!("  Skipped (no PDF): {}", stats.skipped);
    println!("  Failed:     {}", stats.failed);
    println!("\n  PDFs:  {}", store.pdf_dir().display());
    println!("  Texts: {}\n", store.text_dir().display());

    Ok(())
}

/// Dictionary statistics, optional export and optional scoring of `text`
pub fn dictionary(config: &Config, export: Option<Option<PathBuf>>, text: Option<String>) -> Result<()> {
    let store = DataStore::new(&config.storage.data_dir);
    let dictionary = load_dictionary(&store)?;
    let stats = dictionary.statistics();

    println!("\n{}", "=".repeat(60));
    println!("Sentiment dictionary");
    println!("{}", "=".repeat(60));
    println!("  Hawkish terms: {}", stats.total_hawkish);
    println!("  Dovish terms:  {}", stats.total_dovish);
    println!("  N-grams:       {}", stats.total_ngrams);

    for (title, groups) in [("Hawkish", &stats.hawkish_by_category), ("Dovish", &stats.dovish_by_category)] {
        println!("\n  [{} by category]", title);
        for (category, terms) in groups {
            let shown: Vec<&str> = terms.iter().take(5).map(String::as_str).collect();
            let more = if terms.len() > 5 { "..." } else { "" };
            println!("    {}: {}{}", category, shown.join(", "), more);
        }
    }
    println!();

    if let Some(path) = export {
        let path = path.unwrap_or_else(|| store.default_dictionary_path());
        dictionary.save(&path)?;
        println!("💾 Dictionary written to {}", path.display());
    }

    if let Some(text) = text {
        let analyzer = ToneAnalyzer::new(dictionary);
        let result = analyzer.analyze_document(&text);
        println!("\n  Tone Index: {:+.3} ({})", result.tone_index, result.stance());
        println!("  Weighted:   {:+.3}", result.weighted_tone);
        println!(
            "  Sentences:  {} hawkish / {} dovish / {} neutral",
            result.hawkish_sentences, result.dovish_sentences, result.neutral_sentences
        );
        for (term, weight) in &result.top_terms {
            println!("    {:+.1}  {}", weight, term);
        }
        println!();
    }

    Ok(())
}

/// Score every extracted minutes text
pub async fn analyze(pool: SqlitePool, config: &Config) -> Result<()> {
    let orchestrator = AnalyzeOrchestrator::new(pool, config)?;
    let records = orchestrator.run().await?;

    if records.is_empty() {
        println!("No minutes text to analyze. Run `download` first.");
        return Ok(());
    }

    display_tone_table(&records);
    if let Some(latest) = records.last() {
        println!(
            "✅ Analyzed {} meetings; latest {} is {}",
            records.len(),
            latest.meeting_date,
            interpret_tone(latest.tone_index)
        );
    }

    Ok(())
}

/// Fetch and store the latest Economic Outlook projections
pub async fn outlook(pool: SqlitePool, config: &Config, date: NaiveDate) -> Result<()> {
    let crawler = OutlookCrawler::new(MinutesCrawler::new(&config.crawler)?);
    let Some(forecast) = crawler.get_latest_outlook_forecast(date).await? else {
        println!("No Economic Outlook with projections found on or before {}", date);
        return Ok(());
    };

    OutlookDAO::new(pool)
        .upsert(&forecast)
        .await
        .context("Failed to store outlook forecast")?;

    println!("\n📊 {} ({})", forecast.description, forecast.release_date);
    for (year, projection) in &forecast.forecasts {
        let fmt = |v: Option<f64>| v.map(|x| format!("{:.1}%", x)).unwrap_or_else(|| "-".to_string());
        println!("  {}: GDP {}  CPI {}", year, fmt(projection.gdp), fmt(projection.cpi));
    }
    println!("  Source: {}\n", forecast.source_url);

    Ok(())
}

pub async fn predict(pool: SqlitePool, config: Config) -> Result<()> {
    let orchestrator = ForecastOrchestrator::new(pool, config);
    match orchestrator.predict_latest().await? {
        Some(prediction) => prediction.display(),
        None => println!("No tone scores stored. Run `analyze` first."),
    }
    Ok(())
}

pub async fn backtest(pool: SqlitePool, config: Config, start_idx: Option<usize>) -> Result<()> {
    let orchestrator = ForecastOrchestrator::new(pool, config);
    let (run_id, report) = orchestrator.run_backtest(start_idx).await?;

    report.display_summary();
    info!("Backtest run {} stored", run_id);
    Ok(())
}

pub async fn serve(pool: SqlitePool, config: Config) -> Result<()> {
    let store = DataStore::new(&config.storage.data_dir);
    let dictionary = load_dictionary(&store)?;
    dashboard::serve(AppState::new(pool, config, dictionary)).await
}
