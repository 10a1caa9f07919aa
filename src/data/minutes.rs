//! Monetary Policy Committee minutes crawler
//!
//! Scrapes the yearly "policy rate decision meeting" listing on www.bok.or.kr
//! for decision statements, press conference material, minutes and issue
//! notes, and the news/press-release board for minutes announcements.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER, RETRY_AFTER};
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::retry::retry_with_backoff;
use super::{DataError, DataResult, MinutesItem, NewsItem};
use crate::config::CrawlerConfig;

pub const POLICY_MEETING_PATH: &str = "/portal/singl/crncyPolicyDrcMtg/listYear.do";
pub const NEWS_LIST_PATH: &str = "/portal/singl/newsData/listCont.do";

/// Menu number of the policy meeting listing
pub const POLICY_MEETING_MENU: &str = "200755";
/// News board menu carrying minutes releases
pub const MINUTES_NEWS_MENU: &str = "200789";
/// News board menu carrying monetary policy press releases
pub const PRESS_RELEASE_MENU: &str = "200690";

lazy_static! {
    /// Meeting date cell, e.g. "01월 15일(목)"
    static ref MEETING_DATE: Regex = Regex::new(r"(\d{1,2})월\s*(\d{1,2})일")
        .expect("Failed to compile MEETING_DATE regex - this is a bug in the hardcoded pattern");

    /// Board posting date, e.g. "2025.01.16" or "2025-01-16"
    static ref POSTING_DATE: Regex = Regex::new(r"(\d{4})[.\-/](\d{2})[.\-/](\d{2})")
        .expect("Failed to compile POSTING_DATE regex - this is a bug in the hardcoded pattern");
}

/// Title filter applied when scanning a news board page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewsFilter {
    /// Minutes and committee announcements
    Minutes,
    /// Economic Outlook releases
    Outlook,
    /// Keep every titled posting
    All,
}

impl NewsFilter {
    pub fn accepts(&self, title: &str) -> bool {
        match self {
            NewsFilter::Minutes => title.contains("의사록") || title.contains("금융통화위원회"),
            NewsFilter::Outlook => title.contains("경제전망") && !title.contains("보도자료"),
            NewsFilter::All => true,
        }
    }
}

pub(crate) fn selector(css: &str) -> DataResult<Selector> {
    Selector::parse(css).map_err(|e| DataError::parse_error(format!("invalid selector {}: {}", css, e)))
}

/// Whitespace-trimmed text content of an element
pub(crate) fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Turn a relative link from the BOK site into an absolute URL
pub fn make_full_url(base_url: &str, href: &str) -> String {
    if href.is_empty() {
        return String::new();
    }
    if href.starts_with("http") {
        return href.to_string();
    }
    let base = base_url.trim_end_matches('/');
    if href.starts_with('/') {
        format!("{}{}", base, href)
    } else {
        format!("{}/{}", base, href)
    }
}

pub struct MinutesCrawler {
    pub(crate) http_client: reqwest::Client,
    pub(crate) base_url: String,
    request_delay: Duration,
    max_retries: usize,
    timeout_seconds: u64,
}

impl MinutesCrawler {
    pub fn new(config: &CrawlerConfig) -> DataResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7"),
        );
        let referer = format!("{}/", config.base_url.trim_end_matches('/'));
        headers.insert(
            REFERER,
            HeaderValue::from_str(&referer)
                .map_err(|e| DataError::Config(format!("invalid base url {}: {}", config.base_url, e)))?,
        );

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            request_delay: Duration::from_millis(config.request_delay_ms),
            max_retries: config.max_retries,
            timeout_seconds: config.timeout_seconds,
        })
    }

    pub fn full_url(&self, href: &str) -> String {
        make_full_url(&self.base_url, href)
    }

    /// GET a page and return its body, retrying transient failures
    pub(crate) async fn get_text(&self, url: &str, params: &[(&str, String)]) -> DataResult<String> {
        retry_with_backoff(
            || async move {
                let response = self
                    .http_client
                    .get(url)
                    .query(params)
                    .send()
                    .await
                    .map_err(|e| DataError::from_request(e, self.timeout_seconds))?;

                if !response.status().is_success() {
                    let retry_after = response
                        .headers()
                        .get(RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.trim().parse::<u64>().ok());
                    return Err(DataError::from_status(
                        response.status().as_u16(),
                        retry_after,
                        format!("GET {} failed", url),
                    ));
                }

                response
                    .text()
                    .await
                    .map_err(|e| DataError::from_request(e, self.timeout_seconds))
            },
            self.max_retries,
        )
        .await
    }

    /// Fetch the policy meeting listing for `year`
    pub async fn fetch_policy_meeting_page(&self, year: i32) -> DataResult<String> {
        info!("Requesting policy meeting listing for {}", year);
        let url = format!("{}{}", self.base_url, POLICY_MEETING_PATH);
        let params = [
            // A: all meetings, B: regular, C: extraordinary
            ("mtgSe", "A".to_string()),
            ("menuNo", POLICY_MEETING_MENU.to_string()),
            ("pYear", year.to_string()),
        ];
        self.get_text(&url, &params).await
    }

    /// Parse the meeting rows of a listing page
    pub fn parse_policy_meeting_page(&self, html: &str, year: i32) -> DataResult<Vec<MinutesItem>> {
        let document = Html::parse_document(html);
        let table_selector = selector("#tableId, table.tb-type01, table")?;
        let row_selector = selector("tbody tr")?;

        let Some(table) = document.select(&table_selector).next() else {
            warn!("No meeting table found in listing for {}", year);
            return Ok(Vec::new());
        };

        let rows: Vec<ElementRef<'_>> = table.select(&row_selector).collect();
        info!("Found {} meeting rows", rows.len());

        let mut items = Vec::new();
        for row in rows {
            match self.parse_meeting_row(&row, year) {
                Ok(Some(item)) => items.push(item),
                Ok(None) => {}
                Err(e) => debug!("Failed to parse meeting row: {}", e),
            }
        }

        Ok(items)
    }

    fn parse_meeting_row(&self, row: &ElementRef<'_>, year: i32) -> DataResult<Option<MinutesItem>> {
        let th_selector = selector("th")?;
        let td_selector = selector("td")?;
        let link_selector = selector(r#"a[href*="fileDown.do"]"#)?;

        let Some(th) = row.select(&th_selector).next() else {
            return Ok(None);
        };
        let cells: Vec<ElementRef<'_>> = row.select(&td_selector).collect();
        if cells.len() < 4 {
            return Ok(None);
        }

        let date_text = element_text(&th);
        let Some(caps) = MEETING_DATE.captures(&date_text) else {
            return Ok(None);
        };
        let month: u32 = caps[1].parse().map_err(|_| DataError::parse_error("month"))?;
        let day: u32 = caps[2].parse().map_err(|_| DataError::parse_error("day"))?;

        // Rejects 13월, 2월 30일 and the like
        let Some(meeting_date) = NaiveDate::from_ymd_opt(year, month, day) else {
            return Ok(None);
        };

        let mut item = MinutesItem::new(meeting_date);
        let first_link = |cell: &ElementRef<'_>| {
            cell.select(&link_selector)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(|href| self.full_url(href))
        };

        // Cell order after the date header: decision, press conference, minutes, issues
        item.decision_url = first_link(&cells[0]);
        item.press_url = first_link(&cells[1]);

        for link in cells[2].select(&link_selector) {
            let href = link.value().attr("href").unwrap_or_default();
            let link_text = element_text(&link).to_uppercase();
            if link_text.contains("HWP") {
                item.minutes_hwp_url = Some(self.full_url(href));
            } else if link_text.contains("PDF") {
                item.minutes_pdf_url = Some(self.full_url(href));
            } else if item.minutes_url.is_none() {
                item.minutes_url = Some(self.full_url(href));
            }
        }

        item.issue_url = first_link(&cells[3]);

        Ok(Some(item))
    }

    /// Collect the meetings held in `year`
    pub async fn get_minutes_by_year(&self, year: i32) -> DataResult<Vec<MinutesItem>> {
        super::validation::validate_year(year)?;
        let html = self.fetch_policy_meeting_page(year).await?;
        self.parse_policy_meeting_page(&html, year)
    }

    /// Collect several years sequentially, pausing between requests.
    /// A year that fails is logged and contributes no rows.
    pub async fn get_minutes_list(&self, years: &[i32]) -> Vec<MinutesItem> {
        let mut all_items = Vec::new();

        for (i, year) in years.iter().enumerate() {
            match self.get_minutes_by_year(*year).await {
                Ok(items) => {
                    info!("{}: collected {} meetings", year, items.len());
                    all_items.extend(items);
                }
                Err(e) => error!("Failed to collect meetings for {}: {}", year, e),
            }

            if i + 1 < years.len() {
                tokio::time::sleep(self.request_delay).await;
            }
        }

        all_items
    }

    /// Fetch one page of a news board
    pub async fn fetch_news_page(&self, menu_no: &str, page_index: u32, page_unit: u32) -> DataResult<String> {
        info!("Requesting news page {} (menu {})", page_index, menu_no);
        let url = format!("{}{}", self.base_url, NEWS_LIST_PATH);
        let params = [
            ("menuNo", menu_no.to_string()),
            ("pageIndex", page_index.to_string()),
            ("pageUnit", page_unit.to_string()),
        ];
        self.get_text(&url, &params).await
    }

    /// Parse postings from a news board page, keeping titles `filter` accepts
    pub fn parse_news_page(&self, html: &str, filter: NewsFilter) -> DataResult<Vec<NewsItem>> {
        let document = Html::parse_document(html);
        let link_selector = selector(r#"a[href*="view.do"], a[href*="nttId"]"#)?;

        let mut items = Vec::new();
        for link in document.select(&link_selector) {
            let title = element_text(&link);
            if title.chars().count() < 2 || !filter.accepts(&title) {
                continue;
            }

            let url = self.full_url(link.value().attr("href").unwrap_or_default());
            let date = link
                .ancestors()
                .filter_map(ElementRef::wrap)
                .find(|el| matches!(el.value().name(), "li" | "tr" | "div"))
                .and_then(|parent| parse_posting_date(&parent.text().collect::<String>()));

            items.push(NewsItem {
                title,
                date,
                url,
                department: None,
                views: None,
            });
        }

        Ok(items)
    }

    /// Collect `pages` pages of a news board
    pub async fn get_news_list(
        &self,
        menu_no: &str,
        pages: u32,
        page_unit: u32,
        filter: NewsFilter,
    ) -> Vec<NewsItem> {
        let mut all_items = Vec::new();

        for page in 1..=pages {
            match self.fetch_news_page(menu_no, page, page_unit).await {
                Ok(html) => match self.parse_news_page(&html, filter) {
                    Ok(items) => {
                        info!("News page {}: {} items", page, items.len());
                        all_items.extend(items);
                    }
                    Err(e) => warn!("Failed to parse news page {}: {}", page, e),
                },
                Err(e) => error!("Failed to fetch news page {}: {}", page, e),
            }

            if page < pages {
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }

        all_items
    }
}

/// First `YYYY.MM.DD`-style date in `text`
pub fn parse_posting_date(text: &str) -> Option<NaiveDate> {
    let caps = POSTING_DATE.captures(text)?;
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}
