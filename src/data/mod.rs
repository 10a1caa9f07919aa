//! Data pipeline module for collecting Bank of Korea policy documents
//! Covers the minutes and outlook crawlers, PDF download/extraction and persistence

pub mod dao;
pub mod errors;
pub mod minutes;
pub mod outlook;
pub mod pdf;
pub mod retry;
pub mod store;

// Re-export commonly used types
pub use dao::{MeetingDAO, ToneDAO, ToneRecord};
pub use errors::{DataError, DataResult};
pub use minutes::{MinutesCrawler, NewsFilter};
pub use outlook::OutlookCrawler;
pub use pdf::{DownloadOutcome, PdfDownloader, PdfTextExtractor, TextExtractor};
pub use store::DataStore;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::AddAssign;

/// One Monetary Policy Committee meeting row from the yearly listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinutesItem {
    pub meeting_date: NaiveDate,
    pub year: i32,
    pub decision_url: Option<String>,
    pub press_url: Option<String>,
    pub minutes_url: Option<String>,
    pub minutes_hwp_url: Option<String>,
    pub minutes_pdf_url: Option<String>,
    pub issue_url: Option<String>,
}

impl MinutesItem {
    pub fn new(meeting_date: NaiveDate) -> Self {
        use chrono::Datelike;
        Self {
            meeting_date,
            year: meeting_date.year(),
            decision_url: None,
            press_url: None,
            minutes_url: None,
            minutes_hwp_url: None,
            minutes_pdf_url: None,
            issue_url: None,
        }
    }

    /// True once minutes have been published in any format
    pub fn has_minutes(&self) -> bool {
        self.minutes_pdf_url.is_some() || self.minutes_hwp_url.is_some() || self.minutes_url.is_some()
    }

    /// File stem used for the downloaded PDF and extracted text, e.g. `minutes_2025_01_16`
    pub fn file_stem(&self) -> String {
        minutes_file_stem(self.meeting_date)
    }
}

pub fn minutes_file_stem(date: NaiveDate) -> String {
    format!("minutes_{}", date.format("%Y_%m_%d"))
}

/// Parse the meeting date back out of a `minutes_YYYY_MM_DD` file stem
pub fn parse_minutes_file_stem(stem: &str) -> Option<NaiveDate> {
    let date_part = stem.strip_prefix("minutes_")?;
    NaiveDate::parse_from_str(date_part, "%Y_%m_%d").ok()
}

/// News / press release board entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub date: Option<NaiveDate>,
    pub url: String,
    pub department: Option<String>,
    pub views: Option<u32>,
}

/// GDP growth and CPI inflation projections for one calendar year (percent)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct YearForecast {
    pub gdp: Option<f64>,
    pub cpi: Option<f64>,
}

/// Projections extracted from an Economic Outlook press release
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlookForecast {
    pub release_date: NaiveDate,
    pub description: String,
    pub source_url: String,
    pub forecasts: BTreeMap<i32, YearForecast>,
}

/// Counters reported by the PDF download/extraction stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessStats {
    pub total: usize,
    pub downloaded: usize,
    pub extracted: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl AddAssign for ProcessStats {
    fn add_assign(&mut self, other: Self) {
        self.total += other.total;
        self.downloaded += other.downloaded;
        self.extracted += other.extracted;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

/// Validation helpers
pub mod validation {
    use super::*;

    /// BOK listings go back to 1999; anything outside this window is a typo
    pub fn validate_year(year: i32) -> DataResult<()> {
        if !(1999..=2100).contains(&year) {
            return Err(DataError::validation_error(
                "year".to_string(),
                format!("Year {} is outside the supported range 1999-2100", year),
            ));
        }
        Ok(())
    }

    /// Validate a tone index value
    pub fn validate_tone_index(tone: f64) -> DataResult<()> {
        if !(-1.0..=1.0).contains(&tone) || tone.is_nan() {
            return Err(DataError::validation_error(
                "tone_index",
                "Tone index must be between -1.0 and 1.0",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_stem_roundtrip() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 16).unwrap();
        let item = MinutesItem::new(date);
        assert_eq!(item.file_stem(), "minutes_2025_01_16");
        assert_eq!(parse_minutes_file_stem(&item.file_stem()), Some(date));
        assert_eq!(parse_minutes_file_stem("outlook_2025_01_16"), None);
    }

    #[test]
    fn test_has_minutes() {
        let mut item = MinutesItem::new(NaiveDate::from_ymd_opt(2024, 11, 28).unwrap());
        assert!(!item.has_minutes());
        item.minutes_hwp_url = Some("https://www.bok.or.kr/fileDown.do?id=1".to_string());
        assert!(item.has_minutes());
    }

    #[test]
    fn test_stats_accumulate() {
        let mut total = ProcessStats::default();
        total += ProcessStats { total: 8, downloaded: 5, extracted: 4, skipped: 2, failed: 1 };
        total += ProcessStats { total: 2, downloaded: 1, extracted: 1, skipped: 1, failed: 0 };
        assert_eq!(total.total, 10);
        assert_eq!(total.extracted, 5);
        assert_eq!(total.skipped, 3);
    }

    #[test]
    fn test_validation() {
        assert!(validation::validate_year(2025).is_ok());
        assert!(validation::validate_year(1950).is_err());
        assert!(validation::validate_tone_index(0.4).is_ok());
        assert!(validation::validate_tone_index(1.4).is_err());
        assert!(validation::validate_tone_index(f64::NAN).is_err());
    }
}
