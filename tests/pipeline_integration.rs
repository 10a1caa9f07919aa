//! Text → Tone Index → stored scores → forecast, without network access

use anyhow::{Context, Result};
use bok_tone::config::Config;
use bok_tone::data::{DataStore, ToneDAO};
use bok_tone::db::Database;
use bok_tone::models::{RateAction, RateHistory};
use bok_tone::nlp::SentimentDictionary;
use bok_tone::orchestrator::{AnalyzeOrchestrator, ForecastOrchestrator};
use tempfile::TempDir;

const HAWKISH_MINUTES: &str = "--- 페이지 1 ---
위원들은 물가상승 압력이 확대되고 있어 추가 인상이 필요하다는 견해를 밝혔다.
가계부채 증가와 금융불균형 누증에 대응하여 긴축 기조를 이어가야 한다.
회의는 오전 9시에 개최되었다.";

const DOVISH_MINUTES: &str = "--- 페이지 1 ---
위원들은 경기 둔화와 내수 부진이 이어지고 있다고 평가하였다.
성장의 하방리스크가 커진 만큼 기준금리 인하가 바람직하다.
대외 불확실성도 높은 상황이다.";

const NEUTRAL_MINUTES: &str = "--- 페이지 1 ---
회의는 오전 9시에 개최되었다. 의장이 개회를 선언하였다.";

fn minutes_for(action: RateAction) -> &'static str {
    match action {
        RateAction::Hike => HAWKISH_MINUTES,
        RateAction::Cut => DOVISH_MINUTES,
        RateAction::Hold => NEUTRAL_MINUTES,
    }
}

/// Write one minutes text per known rate decision
fn seed_texts(store: &DataStore, count: usize) -> Result<()> {
    store.ensure_dirs()?;
    for (date, decision) in RateHistory::bok_default().iter().take(count) {
        let path = store
            .text_dir()
            .join(format!("minutes_{}.txt", date.format("%Y_%m_%d")));
        std::fs::write(path, minutes_for(decision.action))?;
    }
    Ok(())
}

#[tokio::test]
async fn test_analyze_then_forecast() -> Result<()> {
    let dir = TempDir::new()?;
    let store = DataStore::new(dir.path());
    seed_texts(&store, 40)?;

    let db = Database::in_memory().await?;
    db.run_migrations().await?;

    let analyzer = AnalyzeOrchestrator::with_dictionary(db.pool.clone(), store, SentimentDictionary::new());
    let records = analyzer.run().await?;
    assert_eq!(records.len(), 40);
    assert!(records.iter().all(|r| (-1.0..=1.0).contains(&r.tone_index)));

    // Hawkish and dovish texts land on opposite sides
    let stored = ToneDAO::new(db.pool.clone()).list().await?;
    let history = RateHistory::bok_default();
    for record in &stored {
        let action = history.get(&record.meeting_date).context("unlabeled meeting")?.action;
        match action {
            RateAction::Hike => assert!(record.tone_index > 0.0),
            RateAction::Cut => assert!(record.tone_index < 0.0),
            RateAction::Hold => assert_eq!(record.tone_index, 0.0),
        }
    }

    let mut config = Config::default();
    config.storage.data_dir = dir.path().to_path_buf();
    config.model.epochs = 300;
    let forecaster = ForecastOrchestrator::new(db.pool.clone(), config);

    let (_, report) = forecaster.run_backtest(None).await?;
    assert_eq!(report.labeled_meetings, 40);
    assert_eq!(report.total, 30);
    assert_eq!(report.cumulative_accuracy().len(), 30);
    assert_eq!(report.chunk_accuracy(5).len(), 6);
    assert!(report.accuracy > 0.5, "accuracy {}", report.accuracy);

    let latest = forecaster.predict_latest().await?.context("prediction missing")?;
    assert_eq!(latest.actual, Some(RateAction::Hold));
    assert_eq!(latest.training_samples, 39);
    Ok(())
}

#[tokio::test]
async fn test_custom_rate_history_file_is_used() -> Result<()> {
    let dir = TempDir::new()?;
    let store = DataStore::new(dir.path());
    seed_texts(&store, 12)?;

    // Only the first four meetings are labeled
    let mut history = RateHistory::new();
    for (date, decision) in RateHistory::bok_default().iter().take(4) {
        history.insert(*date, *decision);
    }
    history.save(&store.rate_history_path())?;

    let db = Database::in_memory().await?;
    db.run_migrations().await?;
    AnalyzeOrchestrator::with_dictionary(db.pool.clone(), store, SentimentDictionary::new())
        .run()
        .await?;

    let mut config = Config::default();
    config.storage.data_dir = dir.path().to_path_buf();
    let forecaster = ForecastOrchestrator::new(db.pool.clone(), config);

    let report = forecaster.evaluate(Some(2)).await?;
    assert_eq!(report.total_meetings, 12);
    assert_eq!(report.labeled_meetings, 4);
    assert_eq!(report.total, 2);

    let latest = forecaster.predict_latest().await?.context("prediction missing")?;
    assert_eq!(latest.actual, None);
    assert_eq!(latest.training_samples, 4);
    Ok(())
}
