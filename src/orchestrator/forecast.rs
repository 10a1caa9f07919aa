//! Forecast pipelines
//! Walk-forward backtest over stored tone scores and a prediction for the latest meeting

use anyhow::{Context as AnyhowContext, Result};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    config::Config,
    data::{
        dao::{BacktestDAO, BacktestRunRecord},
        DataStore, ToneDAO,
    },
    models::{
        build_samples, Backtester, BacktestReport, MeetingFeatures, PredictionResult,
        PredictorConfig, RateAction, RateHistory, RatePredictor, ToneObservation,
    },
};

/// Prediction for the most recently analyzed meeting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatestPrediction {
    pub meeting_date: NaiveDate,
    pub features: MeetingFeatures,
    pub prediction: PredictionResult,
    /// Known decision for that meeting, if it is in the rate history
    pub actual: Option<RateAction>,
    pub training_samples: usize,
}

impl LatestPrediction {
    pub fn display(&self) {
        println!("\n📈 Rate decision forecast for meeting {}", self.meeting_date);
        println!("  Tone Index: {:+.3} (change {:+.3})", self.features.tone_index, self.features.tone_change);
        println!(
            "  Predicted: {} ({:.1}% confidence)",
            self.prediction.predicted_action.label(),
            self.prediction.confidence * 100.0
        );
        println!(
            "  P(인상) {:.1}%  P(동결) {:.1}%  P(인하) {:.1}%",
            self.prediction.prob_hike * 100.0,
            self.prediction.prob_hold * 100.0,
            self.prediction.prob_cut * 100.0
        );
        if let Some(actual) = self.actual {
            println!("  Actual decision: {}", actual.label());
        }
        println!("  Trained on {} labeled meetings\n", self.training_samples);
    }
}

pub struct ForecastOrchestrator {
    tone_dao: ToneDAO,
    backtest_dao: BacktestDAO,
    store: DataStore,
    config: Config,
}

impl ForecastOrchestrator {
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        Self {
            tone_dao: ToneDAO::new(pool.clone()),
            backtest_dao: BacktestDAO::new(pool),
            store: DataStore::new(&config.storage.data_dir),
            config,
        }
    }

    fn predictor_config(&self) -> PredictorConfig {
        PredictorConfig::from(&self.config.model)
    }

    pub fn rate_history(&self) -> Result<RateHistory> {
        RateHistory::load_or_default(&self.store.rate_history_path()).context("Failed to load rate history")
    }

    async fn observations(&self) -> Result<Vec<ToneObservation>> {
        let records = self.tone_dao.list().await.context("Failed to load tone scores")?;
        Ok(records.iter().map(ToneObservation::from).collect())
    }

    /// Run the walk-forward backtest without persisting it
    pub async fn evaluate(&self, start_idx: Option<usize>) -> Result<BacktestReport> {
        let start_idx = start_idx.unwrap_or(self.config.model.backtest_start_idx);
        let observations = self.observations().await?;
        let history = self.rate_history()?;

        let report = Backtester::new(start_idx, self.predictor_config()).run(&observations, &history)?;
        if report.total == 0 {
            warn!(
                "No predictions made: {} labeled meetings with an initial window of {}",
                report.labeled_meetings, start_idx
            );
        }
        Ok(report)
    }

    /// Run the backtest and store the result in `backtest_runs`
    pub async fn run_backtest(&self, start_idx: Option<usize>) -> Result<(Uuid, BacktestReport)> {
        info!("🚀 Starting walk-forward backtest");
        let report = self.evaluate(start_idx).await?;

        let run = BacktestRunRecord {
            id: Uuid::new_v4(),
            run_at: Utc::now(),
            start_idx: report.start_idx as i64,
            total: report.total as i64,
            correct: report.correct as i64,
            accuracy: report.accuracy,
            records: serde_json::to_value(&report.records)?,
        };
        self.backtest_dao.insert(&run).await.context("Failed to store backtest run")?;

        Ok((run.id, report))
    }

    /// Train on every labeled meeting before the latest analyzed one and predict it
    pub async fn predict_latest(&self) -> Result<Option<LatestPrediction>> {
        let observations = self.observations().await?;
        let history = self.rate_history()?;

        let samples = build_samples(&observations, &history);
        let Some((latest, earlier)) = samples.split_last() else {
            warn!("No tone scores stored yet; run `analyze` first");
            return Ok(None);
        };

        let mut predictor = RatePredictor::new(self.predictor_config())?;
        predictor.train(earlier)?;
        let prediction = predictor.predict(&latest.features)?;

        Ok(Some(LatestPrediction {
            meeting_date: latest.meeting_date,
            features: latest.features,
            prediction,
            actual: latest.label,
            training_samples: earlier.iter().filter(|s| s.label.is_some()).count(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ToneRecord;
    use crate::db::Database;
    use tempfile::TempDir;

    async fn seeded(dir: &TempDir, count: usize) -> Result<ForecastOrchestrator> {
        let db = Database::in_memory().await?;
        db.run_migrations().await?;

        let tone_dao = ToneDAO::new(db.pool.clone());
        for (date, decision) in RateHistory::bok_default().iter().take(count) {
            let tone = f64::from(decision.action.code()) * 0.5;
            tone_dao
                .upsert(&ToneRecord {
                    meeting_date: *date,
                    tone_index: tone,
                    weighted_tone: tone,
                    hawkish_score: 1.0,
                    dovish_score: 1.0,
                    hawkish_sentences: 1,
                    dovish_sentences: 1,
                    neutral_sentences: 1,
                    top_terms: vec![],
                    analyzed_at: Utc::now(),
                })
                .await?;
        }

        let mut config = Config::default();
        config.storage.data_dir = dir.path().to_path_buf();
        config.model.epochs = 200;
        Ok(ForecastOrchestrator::new(db.pool, config))
    }

    #[tokio::test]
    async fn test_backtest_is_persisted() -> Result<()> {
        let dir = TempDir::new()?;
        let orchestrator = seeded(&dir, 20).await?;

        let (id, report) = orchestrator.run_backtest(Some(12)).await?;
        assert_eq!(report.total, 8);

        let stored = orchestrator.backtest_dao.latest().await?.context("run missing")?;
        assert_eq!(stored.id, id);
        assert_eq!(stored.total, 8);
        assert_eq!(stored.records.as_array().map(Vec::len), Some(8));
        Ok(())
    }

    #[tokio::test]
    async fn test_predict_latest() -> Result<()> {
        let dir = TempDir::new()?;
        let orchestrator = seeded(&dir, 12).await?;

        let latest = orchestrator.predict_latest().await?.context("prediction missing")?;
        assert_eq!(latest.training_samples, 11);
        assert_eq!(latest.actual, Some(RateAction::Hike));
        let total = latest.prediction.prob_hike + latest.prediction.prob_hold + latest.prediction.prob_cut;
        assert!((total - 1.0).abs() < 1e-9);
        Ok(())
    }

    #[tokio::test]
    async fn test_predict_latest_without_data() -> Result<()> {
        let dir = TempDir::new()?;
        let orchestrator = seeded(&dir, 0).await?;
        assert!(orchestrator.predict_latest().await?.is_none());
        Ok(())
    }
}
