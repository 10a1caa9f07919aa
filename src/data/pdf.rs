//! Minutes PDF download and text extraction
//!
//! Downloads the PDF edition of each meeting's minutes listed in
//! `raw/minutes_<year>.json`, then extracts page text into `texts/`.
//! Both steps are idempotent: existing non-empty outputs are reused.

use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, REFERER};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};

use super::store::{is_non_empty_file, DataStore};
use super::{DataError, DataResult, ProcessStats};
use crate::config::CrawlerConfig;

/// Downloads smaller than this are error pages, not minutes
const MIN_PDF_BYTES: u64 = 1000;

/// Outcome of a single PDF download
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadOutcome {
    Downloaded(PathBuf),
    AlreadyPresent(PathBuf),
    Failed(String),
}

impl DownloadOutcome {
    pub fn path(&self) -> Option<&Path> {
        match self {
            DownloadOutcome::Downloaded(path) | DownloadOutcome::AlreadyPresent(path) => Some(path),
            DownloadOutcome::Failed(_) => None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.path().is_some()
    }
}

/// Page-level text extraction from a PDF file
pub trait TextExtractor: Send + Sync {
    fn extract_pages(&self, pdf_path: &Path) -> DataResult<Vec<String>>;
}

/// `pdf-extract` backed extractor
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract_pages(&self, pdf_path: &Path) -> DataResult<Vec<String>> {
        pdf_extract::extract_text_by_pages(pdf_path).map_err(|e| DataError::Extraction(e.to_string()))
    }
}

/// Join page texts with page markers, skipping pages with no text
pub fn format_pages(pages: &[String]) -> Option<String> {
    let sections: Vec<String> = pages
        .iter()
        .enumerate()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(i, text)| format!("--- 페이지 {} ---\n{}", i + 1, text.trim()))
        .collect();

    if sections.is_empty() {
        None
    } else {
        Some(sections.join("\n\n"))
    }
}

pub struct PdfDownloader {
    http_client: reqwest::Client,
    store: DataStore,
    extractor: Arc<dyn TextExtractor>,
    delay: Duration,
}

impl PdfDownloader {
    pub fn new(config: &CrawlerConfig, store: DataStore) -> DataResult<Self> {
        Self::with_extractor(config, store, Arc::new(PdfTextExtractor))
    }

    pub fn with_extractor(
        config: &CrawlerConfig,
        store: DataStore,
        extractor: Arc<dyn TextExtractor>,
    ) -> DataResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/pdf,*/*"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("ko-KR,ko;q=0.9"));
        let referer = format!("{}/", config.base_url.trim_end_matches('/'));
        headers.insert(
            REFERER,
            HeaderValue::from_str(&referer)
                .map_err(|e| DataError::Config(format!("invalid base url {}: {}", config.base_url, e)))?,
        );

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.download_timeout_seconds))
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()?;

        std::fs::create_dir_all(store.pdf_dir())?;
        std::fs::create_dir_all(store.text_dir())?;

        Ok(Self {
            http_client,
            store,
            extractor,
            delay: Duration::from_millis(config.request_delay_ms),
        })
    }

    /// Override the pause between downloads
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Download `url` to `pdfs/<filename>.pdf`
    pub async fn download_pdf(&self, url: &str, filename: &str) -> DataResult<DownloadOutcome> {
        if url.is_empty() {
            return Ok(DownloadOutcome::Failed("URL is empty".to_string()));
        }

        let file_path = self.store.pdf_dir().join(format!("{}.pdf", filename));
        if is_non_empty_file(&file_path) {
            info!("Already downloaded: {}.pdf", filename);
            return Ok(DownloadOutcome::AlreadyPresent(file_path));
        }

        info!("Downloading {}.pdf", filename);
        match self.stream_to_file(url, &file_path).await {
            Ok(size) if size < MIN_PDF_BYTES => {
                tokio::fs::remove_file(&file_path).await?;
                Ok(DownloadOutcome::Failed(format!(
                    "File too small ({} bytes), likely corrupt",
                    size
                )))
            }
            Ok(size) => {
                info!("Downloaded {}.pdf ({} bytes)", filename, size);
                Ok(DownloadOutcome::Downloaded(file_path))
            }
            Err(DataError::Io(e)) => Err(DataError::Io(e)),
            Err(e) => {
                error!("Download failed ({}): {}", filename, e);
                // Partial file must not be mistaken for a finished download
                if file_path.exists() {
                    tokio::fs::remove_file(&file_path).await?;
                }
                Ok(DownloadOutcome::Failed(e.to_string()))
            }
        }
    }

    async fn stream_to_file(&self, url: &str, file_path: &Path) -> DataResult<u64> {
        let response = self.http_client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(DataError::api_error(
                response.status().as_u16(),
                format!("GET {} failed", url),
            ));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_lowercase();
        if !content_type.contains("pdf") && !content_type.contains("octet-stream") {
            warn!("Unexpected Content-Type: {}", content_type);
        }

        let mut file = tokio::fs::File::create(file_path).await?;
        let mut written: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        Ok(written)
    }

    /// Extract text from `pdf_path` into `texts/<output_filename>.txt`
    pub async fn extract_text(&self, pdf_path: &Path, output_filename: &str) -> DataResult<Option<PathBuf>> {
        if !pdf_path.exists() {
            error!("PDF file does not exist: {}", pdf_path.display());
            return Ok(None);
        }

        let text_path = self.store.text_dir().join(format!("{}.txt", output_filename));
        if is_non_empty_file(&text_path) {
            info!("Already extracted: {}.txt", output_filename);
            return Ok(Some(text_path));
        }

        info!("Extracting text from {}", pdf_path.display());
        let extractor = Arc::clone(&self.extractor);
        let path = pdf_path.to_path_buf();
        let pages = match tokio::task::spawn_blocking(move || extractor.extract_pages(&path)).await {
            Ok(Ok(pages)) => pages,
            Ok(Err(e)) => {
                error!("Text extraction failed ({}): {}", pdf_path.display(), e);
                return Ok(None);
            }
            // pdf-extract panics on some malformed files
            Err(e) => {
                error!("Text extraction aborted ({}): {}", pdf_path.display(), e);
                return Ok(None);
            }
        };

        let Some(full_text) = format_pages(&pages) else {
            warn!("No text could be extracted from {}", pdf_path.display());
            return Ok(None);
        };

        tokio::fs::write(&text_path, &full_text).await?;
        info!(
            "Extracted {}.txt ({} chars)",
            output_filename,
            full_text.chars().count()
        );
        Ok(Some(text_path))
    }

    /// Download and extract every meeting listed in one minutes JSON file
    pub async fn process_minutes_file(&self, json_path: &Path) -> DataResult<ProcessStats> {
        let minutes_list = self.store.load_minutes_file(json_path)?;

        let mut stats = ProcessStats {
            total: minutes_list.len(),
            ..Default::default()
        };

        for item in minutes_list {
            let filename = item.file_stem();

            // Only the PDF edition is processed; HWP-only meetings are skipped
            let Some(pdf_url) = item.minutes_pdf_url.as_deref() else {
                info!("No PDF URL for {}", item.meeting_date);
                stats.skipped += 1;
                continue;
            };

            let outcome = self.download_pdf(pdf_url, &filename).await?;
            match outcome.path() {
                Some(path) => {
                    stats.downloaded += 1;
                    if self.extract_text(path, &filename).await?.is_some() {
                        stats.extracted += 1;
                    }
                }
                None => stats.failed += 1,
            }

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        Ok(stats)
    }

    /// Process several years; `None` means every year with a listing on disk
    pub async fn process_all_years(&self, years: Option<Vec<i32>>) -> DataResult<ProcessStats> {
        let years = match years {
            Some(years) => years,
            None => self.store.available_years()?,
        };

        let mut total_stats = ProcessStats::default();

        for year in years {
            let json_path = self.store.minutes_json_path(year);
            if !json_path.exists() {
                warn!("Missing listing: {}", json_path.display());
                continue;
            }

            info!("Processing minutes for {}", year);
            let stats = self.process_minutes_file(&json_path).await?;
            info!(
                "{} done: downloaded {}, extracted {}, skipped {}, failed {}",
                year, stats.downloaded, stats.extracted, stats.skipped, stats.failed
            );
            total_stats += stats;
        }

        Ok(total_stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MinutesItem;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    struct FixedPages(Vec<String>);

    impl TextExtractor for FixedPages {
        fn extract_pages(&self, _pdf_path: &Path) -> DataResult<Vec<String>> {
            Ok(self.0.clone())
        }
    }

    struct PanickingExtractor;

    impl TextExtractor for PanickingExtractor {
        fn extract_pages(&self, _pdf_path: &Path) -> DataResult<Vec<String>> {
            panic!("malformed xref table");
        }
    }

    fn downloader(dir: &TempDir, pages: Vec<&str>) -> PdfDownloader {
        let store = DataStore::new(dir.path());
        let extractor = Arc::new(FixedPages(pages.into_iter().map(String::from).collect()));
        PdfDownloader::with_extractor(&CrawlerConfig::default(), store, extractor)
            .unwrap()
            .with_delay(Duration::ZERO)
    }

    #[test]
    fn test_format_pages_skips_blank_pages() {
        let pages = vec!["첫 페이지".to_string(), "  ".to_string(), "셋째".to_string()];
        let text = format_pages(&pages).unwrap();
        assert_eq!(text, "--- 페이지 1 ---\n첫 페이지\n\n--- 페이지 3 ---\n셋째");
        assert!(format_pages(&[String::new()]).is_none());
    }

    #[tokio::test]
    async fn test_empty_url_fails_without_request() {
        let dir = TempDir::new().unwrap();
        let outcome = downloader(&dir, vec![]).download_pdf("", "minutes_x").await.unwrap();
        assert_eq!(outcome, DownloadOutcome::Failed("URL is empty".to_string()));
    }

    #[tokio::test]
    async fn test_existing_pdf_is_reused() {
        let dir = TempDir::new().unwrap();
        let dl = downloader(&dir, vec!["본문"]);
        let existing = dir.path().join("pdfs").join("minutes_2025_01_16.pdf");
        std::fs::write(&existing, b"%PDF-1.4 cached").unwrap();

        let outcome = dl
            .download_pdf("http://127.0.0.1:9/never-called", "minutes_2025_01_16")
            .await
            .unwrap();
        assert_eq!(outcome, DownloadOutcome::AlreadyPresent(existing));
    }

    #[tokio::test]
    async fn test_extract_text_writes_and_reuses() {
        let dir = TempDir::new().unwrap();
        let dl = downloader(&dir, vec!["위원들은 물가상승 압력을 우려하였다."]);
        let pdf = dir.path().join("pdfs").join("minutes_2025_01_16.pdf");
        std::fs::write(&pdf, b"%PDF").unwrap();

        let text_path = dl.extract_text(&pdf, "minutes_2025_01_16").await.unwrap().unwrap();
        let text = std::fs::read_to_string(&text_path).unwrap();
        assert!(text.starts_with("--- 페이지 1 ---"));

        // Second call must not overwrite
        std::fs::write(&text_path, "cached").unwrap();
        let again = dl.extract_text(&pdf, "minutes_2025_01_16").await.unwrap().unwrap();
        assert_eq!(std::fs::read_to_string(again).unwrap(), "cached");

        let missing = dl.extract_text(&dir.path().join("nope.pdf"), "x").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_process_minutes_file_counts() {
        let dir = TempDir::new().unwrap();
        let dl = downloader(&dir, vec!["본문"]);
        let store = DataStore::new(dir.path());

        let mut with_pdf = MinutesItem::new(NaiveDate::from_ymd_opt(2025, 1, 16).unwrap());
        with_pdf.minutes_pdf_url = Some("http://127.0.0.1:9/cached.pdf".to_string());
        let mut hwp_only = MinutesItem::new(NaiveDate::from_ymd_opt(2025, 2, 25).unwrap());
        hwp_only.minutes_hwp_url = Some("http://127.0.0.1:9/x.hwp".to_string());

        std::fs::write(store.pdf_dir().join("minutes_2025_01_16.pdf"), b"%PDF cached").unwrap();
        let json_path = store.save_items(&[with_pdf, hwp_only], "minutes_2025.json").unwrap();

        let stats = dl.process_minutes_file(&json_path).await.unwrap();
        assert_eq!(
            stats,
            ProcessStats { total: 2, downloaded: 1, extracted: 1, skipped: 1, failed: 0 }
        );

        let all = dl.process_all_years(Some(vec![2024, 2025])).await.unwrap();
        assert_eq!(all.total, 2);
    }

    #[tokio::test]
    async fn test_extractor_panic_is_counted_not_fatal() {
        let dir = TempDir::new().unwrap();
        let store = DataStore::new(dir.path());
        let dl = PdfDownloader::with_extractor(&CrawlerConfig::default(), store.clone(), Arc::new(PanickingExtractor))
            .unwrap()
            .with_delay(Duration::ZERO);

        let mut items = Vec::new();
        for day in [16, 28] {
            let mut item = MinutesItem::new(NaiveDate::from_ymd_opt(2025, 1, day).unwrap());
            item.minutes_pdf_url = Some(format!("http://127.0.0.1:9/{}.pdf", day));
            std::fs::write(store.pdf_dir().join(format!("{}.pdf", item.file_stem())), b"%PDF broken").unwrap();
            items.push(item);
        }
        let json_path = store.save_items(&items, "minutes_2025.json").unwrap();

        let stats = dl.process_minutes_file(&json_path).await.unwrap();
        assert_eq!(
            stats,
            ProcessStats { total: 2, downloaded: 2, extracted: 0, skipped: 0, failed: 0 }
        );
        assert!(!store.text_dir().join("minutes_2025_01_16.txt").exists());
    }
}
