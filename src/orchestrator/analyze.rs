//! Tone analysis pipeline
//! Scores every extracted minutes text and stores the Tone Index per meeting

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use std::path::Path;
use tracing::{info, warn};

use crate::{
    config::Config,
    data::{validation, DataStore, ToneDAO, ToneRecord},
    nlp::{interpret_tone, SentimentDictionary, ToneAnalyzer, ToneResult},
};

/// Built-in lexicon, overridden by `dictionaries/sentiment_dictionary.json` when present
pub fn load_dictionary(store: &DataStore) -> Result<SentimentDictionary> {
    let mut dictionary = SentimentDictionary::new();
    let path = store.default_dictionary_path();
    if path.exists() {
        dictionary
            .load(&path)
            .with_context(|| format!("Failed to load sentiment dictionary from {}", path.display()))?;
    }
    Ok(dictionary)
}

pub fn tone_record(meeting_date: NaiveDate, result: &ToneResult) -> ToneRecord {
    ToneRecord {
        meeting_date,
        tone_index: result.tone_index,
        weighted_tone: result.weighted_tone,
        hawkish_score: result.hawkish_score,
        dovish_score: result.dovish_score,
        hawkish_sentences: result.hawkish_sentences as i64,
        dovish_sentences: result.dovish_sentences as i64,
        neutral_sentences: result.neutral_sentences as i64,
        top_terms: result.top_terms.clone(),
        analyzed_at: Utc::now(),
    }
}

pub struct AnalyzeOrchestrator {
    store: DataStore,
    tone_dao: ToneDAO,
    analyzer: ToneAnalyzer,
}

impl AnalyzeOrchestrator {
    pub fn new(pool: SqlitePool, config: &Config) -> Result<Self> {
        let store = DataStore::new(&config.storage.data_dir);
        let dictionary = load_dictionary(&store)?;
        Ok(Self::with_dictionary(pool, store, dictionary))
    }

    pub fn with_dictionary(pool: SqlitePool, store: DataStore, dictionary: SentimentDictionary) -> Self {
        Self {
            store,
            tone_dao: ToneDAO::new(pool),
            analyzer: ToneAnalyzer::new(dictionary),
        }
    }

    pub async fn analyze_file(&self, meeting_date: NaiveDate, path: &Path) -> Result<ToneRecord> {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let result = self.analyzer.analyze_document(&text);
        validation::validate_tone_index(result.tone_index)?;

        let record = tone_record(meeting_date, &result);
        self.tone_dao.upsert(&record).await?;
        Ok(record)
    }

    /// Analyze every `texts/minutes_*.txt`, one document at a time
    pub async fn run(&self) -> Result<Vec<ToneRecord>> {
        let texts = self.store.minutes_texts()?;
        if texts.is_empty() {
            warn!("No extracted minutes found in {}", self.store.text_dir().display());
            return Ok(Vec::new());
        }

        info!("🧮 Analyzing tone of {} minutes", texts.len());
        let mut records = Vec::with_capacity(texts.len());

        for (meeting_date, path) in texts {
            match self.analyze_file(meeting_date, &path).await {
                Ok(record) => {
                    info!(
                        "{}: tone {:+.3} ({} hawkish / {} dovish sentences)",
                        meeting_date, record.tone_index, record.hawkish_sentences, record.dovish_sentences
                    );
                    records.push(record);
                }
                Err(e) => warn!("Skipping {}: {:#}", path.display(), e),
            }
        }

        Ok(records)
    }
}

pub fn display_tone_table(records: &[ToneRecord]) {
    println!("\n{}", "-".repeat(72));
    println!(
        "{:<12} {:>8} {:>9} {:>5} {:>5} {:>5}  {}",
        "회의일", "Tone", "Weighted", "H", "D", "N", "Stance"
    );
    println!("{}", "-".repeat(72));
    for r in records {
        println!(
            "{:<12} {:>+8.3} {:>+9.3} {:>5} {:>5} {:>5}  {}",
            r.meeting_date.to_string(),
            r.tone_index,
            r.weighted_tone,
            r.hawkish_sentences,
            r.dovish_sentences,
            r.neutral_sentences,
            interpret_tone(r.tone_index)
        );
    }
    println!("{}\n", "-".repeat(72));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_run_scores_texts_and_persists() -> Result<()> {
        let dir = TempDir::new()?;
        let store = DataStore::new(dir.path());
        store.ensure_dirs()?;

        std::fs::write(
            store.text_dir().join("minutes_2022_07_13.txt"),
            "--- 페이지 1 ---\n물가상승 압력이 확대되어 추가 인상이 필요하다. 긴축 기조를 유지해야 한다.",
        )?;
        std::fs::write(
            store.text_dir().join("minutes_2024_10_11.txt"),
            "경기 둔화 우려가 커졌다. 내수 부진과 하방리스크를 고려하여 인하가 바람직하다.",
        )?;
        std::fs::write(store.text_dir().join("notes.txt"), "ignored")?;

        let db = Database::in_memory().await?;
        db.run_migrations().await?;
        let orchestrator =
            AnalyzeOrchestrator::with_dictionary(db.pool.clone(), store, SentimentDictionary::new());

        let records = orchestrator.run().await?;
        assert_eq!(records.len(), 2);
        assert!(records[0].tone_index > 0.0);
        assert!(records[1].tone_index < 0.0);

        let stored = ToneDAO::new(db.pool.clone()).list().await?;
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].meeting_date, records[0].meeting_date);
        Ok(())
    }

    #[tokio::test]
    async fn test_run_without_texts_is_empty() -> Result<()> {
        let dir = TempDir::new()?;
        let db = Database::in_memory().await?;
        db.run_migrations().await?;

        let orchestrator = AnalyzeOrchestrator::with_dictionary(
            db.pool.clone(),
            DataStore::new(dir.path()),
            SentimentDictionary::new(),
        );
        assert!(orchestrator.run().await?.is_empty());
        Ok(())
    }
}
