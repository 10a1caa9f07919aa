//! Walk-forward backtest of the rate predictor
//!
//! For every labeled meeting after the first `start_idx`, a fresh predictor is
//! trained on all earlier labeled meetings and asked to predict the decision.
//! No information from the predicted meeting or later leaks into training.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::rate_history::{RateAction, RateHistory};
use super::rate_predictor::{build_samples, PredictorConfig, RatePredictor, Sample, ToneObservation};
use super::ModelResult;

pub const DEFAULT_START_IDX: usize = 10;
pub const CHUNK_SIZE: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestRecord {
    pub date: NaiveDate,
    pub actual: RateAction,
    pub predicted: RateAction,
    pub is_correct: bool,
    pub confidence: f64,
    pub tone: f64,
    /// Probabilities in hike, hold, cut order
    pub probs: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkAccuracy {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub accuracy: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    pub start_idx: usize,
    pub total_meetings: usize,
    pub labeled_meetings: usize,
    pub total: usize,
    pub correct: usize,
    pub accuracy: f64,
    pub records: Vec<BacktestRecord>,
}

impl BacktestReport {
    /// Running accuracy after each prediction
    pub fn cumulative_accuracy(&self) -> Vec<f64> {
        let mut correct = 0usize;
        self.records
            .iter()
            .enumerate()
            .map(|(i, r)| {
                if r.is_correct {
                    correct += 1;
                }
                correct as f64 / (i + 1) as f64
            })
            .collect()
    }

    /// Accuracy over consecutive windows of `size` predictions
    pub fn chunk_accuracy(&self, size: usize) -> Vec<ChunkAccuracy> {
        self.records
            .chunks(size.max(1))
            .filter_map(|chunk| {
                let first = chunk.first()?;
                let last = chunk.last()?;
                let correct = chunk.iter().filter(|r| r.is_correct).count();
                Some(ChunkAccuracy {
                    start: first.date,
                    end: last.date,
                    accuracy: correct as f64 / chunk.len() as f64,
                })
            })
            .collect()
    }

    pub fn display_summary(&self) {
        println!("\n╔════════════════════════════════════════════════════════════╗");
        println!("║          RATE PREDICTION BACKTEST (WALK-FORWARD)           ║");
        println!("╚════════════════════════════════════════════════════════════╝\n");

        println!(
            "📅 Meetings: {} total, {} labeled, initial training window {}",
            self.total_meetings, self.labeled_meetings, self.start_idx
        );
        println!();

        println!("{}", "-".repeat(64));
        println!(
            "{:<12} {:<6} {:<6} {:<4} {:<8} {:>8}",
            "회의일", "실제", "예측", "정확", "신뢰도", "Tone"
        );
        println!("{}", "-".repeat(64));
        for r in &self.records {
            println!(
                "{:<12} {:<6} {:<6} {:<4} {:<8} {:>+8.3}",
                r.date.to_string(),
                r.actual.label(),
                r.predicted.label(),
                if r.is_correct { "O" } else { "X" },
                format!("{:.1}%", r.confidence * 100.0),
                r.tone
            );
        }
        println!("{}", "-".repeat(64));

        println!();
        println!("═══════════════════════════════════════════════════════════");
        println!("📊 RESULTS");
        println!("═══════════════════════════════════════════════════════════\n");

        println!("  Predictions: {}", self.total);
        println!("  Correct: {}", self.correct);
        println!("  Accuracy: {:.2}%", self.accuracy * 100.0);

        let chunks = self.chunk_accuracy(CHUNK_SIZE);
        if !chunks.is_empty() {
            println!();
            println!("  Accuracy by window of {}:", CHUNK_SIZE);
            for chunk in chunks {
                println!("    {} ~ {}: {:.2}%", chunk.start, chunk.end, chunk.accuracy * 100.0);
            }
        }

        println!("\n═══════════════════════════════════════════════════════════\n");
    }
}

pub struct Backtester {
    start_idx: usize,
    config: PredictorConfig,
}

impl Default for Backtester {
    fn default() -> Self {
        Self::new(DEFAULT_START_IDX, PredictorConfig::default())
    }
}

impl Backtester {
    pub fn new(start_idx: usize, config: PredictorConfig) -> Self {
        Self { start_idx, config }
    }

    pub fn run(&self, observations: &[ToneObservation], history: &RateHistory) -> ModelResult<BacktestReport> {
        let samples = build_samples(observations, history);
        let labeled: Vec<Sample> = samples.iter().filter(|s| s.label.is_some()).copied().collect();

        info!(
            "Backtest: {} meetings, {} labeled, initial training window {}",
            samples.len(),
            labeled.len(),
            self.start_idx
        );

        // Training needs at least two labeled meetings
        let first = self.start_idx.max(2);
        let mut records = Vec::new();

        for i in first..labeled.len() {
            let target = &labeled[i];
            let Some(actual) = target.label else { continue };

            let mut predictor = RatePredictor::new(self.config)?;
            predictor.train(&labeled[..i])?;
            let prediction = predictor.predict(&target.features)?;

            records.push(BacktestRecord {
                date: target.meeting_date,
                actual,
                predicted: prediction.predicted_action,
                is_correct: prediction.predicted_action == actual,
                confidence: prediction.confidence,
                tone: target.features.tone_index,
                probs: prediction.probs(),
            });
        }

        let total = records.len();
        let correct = records.iter().filter(|r| r.is_correct).count();
        let accuracy = if total > 0 { correct as f64 / total as f64 } else { 0.0 };

        info!("Backtest complete: {}/{} correct ({:.2}%)", correct, total, accuracy * 100.0);

        Ok(BacktestReport {
            start_idx: self.start_idx,
            total_meetings: samples.len(),
            labeled_meetings: labeled.len(),
            total,
            correct,
            accuracy,
            records,
        })
    }
}
