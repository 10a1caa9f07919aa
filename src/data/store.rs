//! On-disk layout for crawled artifacts
//!
//! ```text
//! <data_dir>/raw/minutes_<year>.json    meeting listings
//! <data_dir>/pdfs/minutes_<date>.pdf    downloaded minutes
//! <data_dir>/texts/minutes_<date>.txt   extracted text
//! <data_dir>/dictionaries/              exported sentiment dictionary
//! ```

use chrono::NaiveDate;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use super::{parse_minutes_file_stem, DataResult, MinutesItem};

#[derive(Debug, Clone)]
pub struct DataStore {
    data_dir: PathBuf,
}

impl DataStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.data_dir.join("raw")
    }

    pub fn pdf_dir(&self) -> PathBuf {
        self.data_dir.join("pdfs")
    }

    pub fn text_dir(&self) -> PathBuf {
        self.data_dir.join("texts")
    }

    pub fn dictionary_dir(&self) -> PathBuf {
        self.data_dir.join("dictionaries")
    }

    pub fn default_dictionary_path(&self) -> PathBuf {
        self.dictionary_dir().join("sentiment_dictionary.json")
    }

    pub fn rate_history_path(&self) -> PathBuf {
        self.data_dir.join("rate_history.json")
    }

    pub fn minutes_json_path(&self, year: i32) -> PathBuf {
        self.raw_dir().join(format!("minutes_{}.json", year))
    }

    pub fn ensure_dirs(&self) -> DataResult<()> {
        for dir in [self.raw_dir(), self.pdf_dir(), self.text_dir(), self.dictionary_dir()] {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// Write `items` as pretty-printed UTF-8 JSON under `raw/`
    pub fn save_items<T: Serialize>(&self, items: &[T], filename: &str) -> DataResult<PathBuf> {
        let raw_dir = self.raw_dir();
        fs::create_dir_all(&raw_dir)?;

        let output_path = raw_dir.join(filename);
        let json = serde_json::to_string_pretty(items)?;
        fs::write(&output_path, json)?;

        info!("Saved {} records to {}", items.len(), output_path.display());
        Ok(output_path)
    }

    pub fn load_minutes_file(&self, path: &Path) -> DataResult<Vec<MinutesItem>> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn load_minutes(&self, year: i32) -> DataResult<Vec<MinutesItem>> {
        self.load_minutes_file(&self.minutes_json_path(year))
    }

    /// Years with a `raw/minutes_<year>.json` listing, ascending
    pub fn available_years(&self) -> DataResult<Vec<i32>> {
        let raw_dir = self.raw_dir();
        if !raw_dir.exists() {
            return Ok(Vec::new());
        }

        let mut years: Vec<i32> = fs::read_dir(raw_dir)?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().to_string();
                name.strip_prefix("minutes_")?
                    .strip_suffix(".json")?
                    .parse()
                    .ok()
            })
            .collect();

        years.sort_unstable();
        Ok(years)
    }

    /// Extracted minutes texts keyed by meeting date, ascending
    pub fn minutes_texts(&self) -> DataResult<Vec<(NaiveDate, PathBuf)>> {
        let text_dir = self.text_dir();
        if !text_dir.exists() {
            return Ok(Vec::new());
        }

        let mut texts: Vec<(NaiveDate, PathBuf)> = fs::read_dir(text_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "txt"))
            .filter_map(|path| {
                let date = parse_minutes_file_stem(path.file_stem()?.to_str()?)?;
                Some((date, path))
            })
            .collect();

        texts.sort_by_key(|(date, _)| *date);
        Ok(texts)
    }
}

/// True when `path` exists and holds at least one byte
pub fn is_non_empty_file(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_file() && m.len() > 0).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load_minutes() {
        let dir = TempDir::new().unwrap();
        let store = DataStore::new(dir.path());

        let mut item = MinutesItem::new(NaiveDate::from_ymd_opt(2025, 5, 29).unwrap());
        item.minutes_pdf_url = Some("https://www.bok.or.kr/fileDown.do?id=9".to_string());

        let path = store.save_items(&[item.clone()], "minutes_2025.json").unwrap();
        assert_eq!(path, store.minutes_json_path(2025));

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("2025-05-29"));

        let loaded = store.load_minutes(2025).unwrap();
        assert_eq!(loaded, vec![item]);
    }

    #[test]
    fn test_available_years_and_texts() {
        let dir = TempDir::new().unwrap();
        let store = DataStore::new(dir.path());
        assert!(store.available_years().unwrap().is_empty());

        store.ensure_dirs().unwrap();
        for name in ["minutes_2026.json", "minutes_2024.json", "minutes_bad.json", "notes.json"] {
            fs::write(store.raw_dir().join(name), "[]").unwrap();
        }
        assert_eq!(store.available_years().unwrap(), vec![2024, 2026]);

        fs::write(store.text_dir().join("minutes_2025_02_25.txt"), "b").unwrap();
        fs::write(store.text_dir().join("minutes_2025_01_16.txt"), "a").unwrap();
        fs::write(store.text_dir().join("readme.md"), "x").unwrap();
        let texts = store.minutes_texts().unwrap();
        assert_eq!(texts.len(), 2);
        assert_eq!(texts[0].0, NaiveDate::from_ymd_opt(2025, 1, 16).unwrap());
    }

    #[test]
    fn test_is_non_empty_file() {
        let dir = TempDir::new().unwrap();
        let empty = dir.path().join("empty.pdf");
        fs::write(&empty, "").unwrap();
        assert!(!is_non_empty_file(&empty));
        assert!(!is_non_empty_file(&dir.path().join("missing.pdf")));
        fs::write(&empty, "x").unwrap();
        assert!(is_non_empty_file(&empty));
    }
}
