//! Economic Outlook crawler
//!
//! Finds the most recent Economic Outlook press release on the BOK news board
//! and pulls the GDP growth and CPI inflation projections out of its body.

use chrono::NaiveDate;
use regex::Regex;
use scraper::Html;
use std::collections::BTreeMap;
use tracing::{info, warn};

use super::minutes::{selector, NewsFilter, PRESS_RELEASE_MENU};
use super::{DataError, DataResult, MinutesCrawler, OutlookForecast, YearForecast};
use crate::config::Config;

/// Number of press-release pages scanned for outlook postings
const OUTLOOK_PAGES: u32 = 3;
const OUTLOOK_PAGE_UNIT: u32 = 10;

pub struct OutlookCrawler {
    crawler: MinutesCrawler,
}

impl OutlookCrawler {
    pub fn new(crawler: MinutesCrawler) -> Self {
        Self { crawler }
    }

    /// Latest outlook released on or before `target_date` whose body yields projections
    pub async fn get_latest_outlook_forecast(&self, target_date: NaiveDate) -> DataResult<Option<OutlookForecast>> {
        let news_items = self
            .crawler
            .get_news_list(PRESS_RELEASE_MENU, OUTLOOK_PAGES, OUTLOOK_PAGE_UNIT, NewsFilter::Outlook)
            .await;

        let mut outlook_items: Vec<_> = news_items
            .into_iter()
            .filter(|item| item.date.is_some_and(|d| d <= target_date))
            .collect();

        if outlook_items.is_empty() {
            warn!("No Economic Outlook release found on or before {}", target_date);
            return Ok(None);
        }

        // Newest first
        outlook_items.sort_by(|a, b| b.date.cmp(&a.date));

        for item in outlook_items {
            let Some(release_date) = item.date else { continue };
            info!("Parsing outlook release: {} ({})", item.title, release_date);

            match self.parse_outlook_content(&item.url).await {
                Ok(Some(forecasts)) => {
                    return Ok(Some(OutlookForecast {
                        release_date,
                        description: item.title,
                        source_url: item.url,
                        forecasts,
                    }));
                }
                Ok(None) => info!("No projections found in {}", item.url),
                Err(e) => warn!("Failed to parse outlook body {}: {}", item.url, e),
            }
        }

        Ok(None)
    }

    /// Fetch a release page and extract projections for this year and next
    pub async fn parse_outlook_content(&self, url: &str) -> DataResult<Option<BTreeMap<i32, YearForecast>>> {
        let html = self.crawler.get_text(url, &[]).await?;
        parse_outlook_html(&html, Config::current_year())
    }
}

/// Extract the release body (`.dbData` or `.view_content`) and parse it
pub fn parse_outlook_html(html: &str, reference_year: i32) -> DataResult<Option<BTreeMap<i32, YearForecast>>> {
    let document = Html::parse_document(html);
    let body = document
        .select(&selector(".dbData")?)
        .next()
        .or_else(|| selector(".view_content").ok().and_then(|s| document.select(&s).next()));

    let Some(body) = body else {
        return Ok(None);
    };

    let text = body
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    parse_outlook_text(&text, reference_year)
}

/// Projections for `reference_year` and the year after, e.g.
/// "2025년 경제성장률은 1.9%, 소비자물가 상승률은 2.3%로 전망"
pub fn parse_outlook_text(text: &str, reference_year: i32) -> DataResult<Option<BTreeMap<i32, YearForecast>>> {
    let mut forecasts = BTreeMap::new();

    for year in [reference_year, reference_year + 1] {
        let gdp = first_percentage(&format!(r"{}년.*?성장률.*?(\d+\.\d+)%", year), text)?;
        let cpi = first_percentage(&format!(r"{}년.*?소비자물가.*?(\d+\.\d+)%", year), text)?;

        if gdp.is_some() || cpi.is_some() {
            forecasts.insert(year, YearForecast { gdp, cpi });
        }
    }

    Ok(if forecasts.is_empty() { None } else { Some(forecasts) })
}

fn first_percentage(pattern: &str, text: &str) -> DataResult<Option<f64>> {
    let re = Regex::new(pattern).map_err(|e| DataError::Internal(format!("bad pattern {}: {}", pattern, e)))?;
    Ok(re
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_outlook_text_current_and_next_year() {
        let text = "2025년 경제성장률은 1.5%, 소비자물가 상승률은 2.1%로 전망된다. \
                    2026년 성장률은 1.8%, 소비자물가는 1.9% 수준으로 예상된다.";
        let forecasts = parse_outlook_text(text, 2025).unwrap().unwrap();

        assert_eq!(forecasts.len(), 2);
        assert_eq!(forecasts[&2025].gdp, Some(1.5));
        assert_eq!(forecasts[&2025].cpi, Some(2.1));
        assert_eq!(forecasts[&2026].gdp, Some(1.8));
        assert_eq!(forecasts[&2026].cpi, Some(1.9));
    }

    #[test]
    fn test_parse_outlook_text_partial_and_missing() {
        let forecasts = parse_outlook_text("2025년 성장률 0.9% 전망", 2025).unwrap().unwrap();
        assert_eq!(forecasts[&2025], YearForecast { gdp: Some(0.9), cpi: None });
        assert!(!forecasts.contains_key(&2026));

        assert!(parse_outlook_text("전망치 없음", 2025).unwrap().is_none());
    }

    #[test]
    fn test_parse_outlook_html_prefers_db_data() {
        let html = r#"<div class="view_content">2025년 성장률 9.9%</div>
                      <div class="dbData"><p>2025년 성장률은</p><p>2.0%로</p></div>"#;
        let forecasts = parse_outlook_html(html, 2025).unwrap().unwrap();
        assert_eq!(forecasts[&2025].gdp, Some(2.0));

        assert!(parse_outlook_html("<div>2025년 성장률 2.0%</div>", 2025).unwrap().is_none());
    }
}
