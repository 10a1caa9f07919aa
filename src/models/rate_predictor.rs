//! Rate decision predictor
//!
//! Multinomial logistic regression over four tone features, trained with
//! batch gradient descent and L2 regularization. Features are standardized
//! with statistics from the training set only.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::rate_history::{RateAction, RateHistory};
use super::{ModelError, ModelResult};
use crate::config::ModelConfig;
use crate::data::ToneRecord;

pub const NUM_FEATURES: usize = 4;
const NUM_CLASSES: usize = 3;
const MIN_TRAINING_SAMPLES: usize = 2;

/// Tone measurements for one meeting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToneObservation {
    pub meeting_date: NaiveDate,
    pub tone_index: f64,
    pub weighted_tone: f64,
}

impl From<&ToneRecord> for ToneObservation {
    fn from(record: &ToneRecord) -> Self {
        Self {
            meeting_date: record.meeting_date,
            tone_index: record.tone_index,
            weighted_tone: record.weighted_tone,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeetingFeatures {
    pub tone_index: f64,
    pub weighted_tone: f64,
    /// Tone index change versus the previous analyzed meeting
    pub tone_change: f64,
    /// Code of the last rate decision before this meeting (0 when unknown)
    pub prev_action: f64,
}

impl MeetingFeatures {
    pub fn to_array(&self) -> [f64; NUM_FEATURES] {
        [self.tone_index, self.weighted_tone, self.tone_change, self.prev_action]
    }
}

/// Feature row for one meeting; `label` is set when the meeting decided a rate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub meeting_date: NaiveDate,
    pub features: MeetingFeatures,
    pub label: Option<RateAction>,
}

/// Build feature rows ordered by meeting date
pub fn build_samples(observations: &[ToneObservation], history: &RateHistory) -> Vec<Sample> {
    let mut sorted = observations.to_vec();
    sorted.sort_by_key(|o| o.meeting_date);

    let mut previous_tone: Option<f64> = None;
    sorted
        .into_iter()
        .map(|obs| {
            let tone_change = previous_tone.map_or(0.0, |prev| obs.tone_index - prev);
            previous_tone = Some(obs.tone_index);

            let prev_action = history
                .previous(obs.meeting_date)
                .map_or(0.0, |(_, decision)| f64::from(decision.action.code()));

            Sample {
                meeting_date: obs.meeting_date,
                features: MeetingFeatures {
                    tone_index: obs.tone_index,
                    weighted_tone: obs.weighted_tone,
                    tone_change,
                    prev_action,
                },
                label: history.get(&obs.meeting_date).map(|d| d.action),
            }
        })
        .collect()
}

/// Zero-mean, unit-variance scaling fitted on training rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: [f64; NUM_FEATURES],
    std: [f64; NUM_FEATURES],
}

impl StandardScaler {
    pub fn fit(rows: &[[f64; NUM_FEATURES]]) -> Self {
        let n = rows.len().max(1) as f64;
        let mut mean = [0.0; NUM_FEATURES];
        let mut std = [0.0; NUM_FEATURES];

        for row in rows {
            for (m, x) in mean.iter_mut().zip(row) {
                *m += x / n;
            }
        }
        for row in rows {
            for j in 0..NUM_FEATURES {
                std[j] += (row[j] - mean[j]).powi(2) / n;
            }
        }
        for s in std.iter_mut() {
            *s = s.sqrt();
            // Constant column: leave values centered but unscaled
            if *s < 1e-12 {
                *s = 1.0;
            }
        }

        Self { mean, std }
    }

    pub fn transform(&self, row: &[f64; NUM_FEATURES]) -> [f64; NUM_FEATURES] {
        let mut out = [0.0; NUM_FEATURES];
        for j in 0..NUM_FEATURES {
            out[j] = (row[j] - self.mean[j]) / self.std[j];
        }
        out
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    pub predicted_action: RateAction,
    pub confidence: f64,
    pub prob_hike: f64,
    pub prob_hold: f64,
    pub prob_cut: f64,
}

impl PredictionResult {
    fn from_probs(probs: [f64; NUM_CLASSES]) -> Self {
        let (best, confidence) = probs
            .iter()
            .copied()
            .enumerate()
            .fold((1, f64::MIN), |acc, (i, p)| if p > acc.1 { (i, p) } else { acc });

        Self {
            predicted_action: RateAction::ALL[best],
            confidence,
            prob_hike: probs[0],
            prob_hold: probs[1],
            prob_cut: probs[2],
        }
    }

    pub fn probs(&self) -> [f64; NUM_CLASSES] {
        [self.prob_hike, self.prob_hold, self.prob_cut]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictorConfig {
    pub learning_rate: f64,
    pub epochs: usize,
    pub l2_penalty: f64,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            epochs: 500,
            l2_penalty: 0.01,
        }
    }
}

impl From<&ModelConfig> for PredictorConfig {
    fn from(config: &ModelConfig) -> Self {
        Self {
            learning_rate: config.learning_rate,
            epochs: config.epochs,
            l2_penalty: config.l2_penalty,
        }
    }
}

fn softmax(logits: [f64; NUM_CLASSES]) -> [f64; NUM_CLASSES] {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut exp = logits.map(|z| (z - max).exp());
    let sum: f64 = exp.iter().sum();
    for p in exp.iter_mut() {
        *p /= sum;
    }
    exp
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SoftmaxRegression {
    weights: [[f64; NUM_FEATURES]; NUM_CLASSES],
    bias: [f64; NUM_CLASSES],
}

impl SoftmaxRegression {
    fn probabilities(&self, x: &[f64; NUM_FEATURES]) -> [f64; NUM_CLASSES] {
        let mut logits = self.bias;
        for (k, logit) in logits.iter_mut().enumerate() {
            *logit += self.weights[k].iter().zip(x).map(|(w, xi)| w * xi).sum::<f64>();
        }
        softmax(logits)
    }

    fn fit(xs: &[[f64; NUM_FEATURES]], ys: &[usize], config: &PredictorConfig) -> Self {
        let mut model = Self {
            weights: [[0.0; NUM_FEATURES]; NUM_CLASSES],
            bias: [0.0; NUM_CLASSES],
        };
        let n = xs.len() as f64;

        for _ in 0..config.epochs {
            let mut grad_w = [[0.0; NUM_FEATURES]; NUM_CLASSES];
            let mut grad_b = [0.0; NUM_CLASSES];

            for (x, &y) in xs.iter().zip(ys) {
                let probs = model.probabilities(x);
                for k in 0..NUM_CLASSES {
                    let err = probs[k] - if k == y { 1.0 } else { 0.0 };
                    grad_b[k] += err / n;
                    for j in 0..NUM_FEATURES {
                        grad_w[k][j] += err * x[j] / n;
                    }
                }
            }

            for k in 0..NUM_CLASSES {
                model.bias[k] -= config.learning_rate * grad_b[k];
                for j in 0..NUM_FEATURES {
                    let grad = grad_w[k][j] + config.l2_penalty * model.weights[k][j];
                    model.weights[k][j] -= config.learning_rate * grad;
                }
            }
        }

        model
    }
}

#[derive(Debug, Clone, Default)]
pub struct RatePredictor {
    config: PredictorConfig,
    scaler: Option<StandardScaler>,
    model: Option<SoftmaxRegression>,
}

impl RatePredictor {
    pub fn new(config: PredictorConfig) -> ModelResult<Self> {
        if config.learning_rate <= 0.0 || !config.learning_rate.is_finite() {
            return Err(ModelError::InvalidConfig(format!(
                "learning rate must be positive, got {}",
                config.learning_rate
            )));
        }
        if config.l2_penalty < 0.0 {
            return Err(ModelError::InvalidConfig(format!(
                "L2 penalty must not be negative, got {}",
                config.l2_penalty
            )));
        }

        Ok(Self {
            config,
            scaler: None,
            model: None,
        })
    }

    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    /// Fit on the labeled samples; unlabeled rows are ignored
    pub fn train(&mut self, samples: &[Sample]) -> ModelResult<()> {
        let (rows, labels): (Vec<[f64; NUM_FEATURES]>, Vec<usize>) = samples
            .iter()
            .filter_map(|s| s.label.map(|label| (s.features.to_array(), label.index())))
            .unzip();

        if rows.len() < MIN_TRAINING_SAMPLES {
            return Err(ModelError::InsufficientData {
                needed: MIN_TRAINING_SAMPLES,
                got: rows.len(),
            });
        }

        let scaler = StandardScaler::fit(&rows);
        let scaled: Vec<_> = rows.iter().map(|r| scaler.transform(r)).collect();
        let model = SoftmaxRegression::fit(&scaled, &labels, &self.config);

        debug!(
            "Trained rate predictor on {} samples ({} epochs)",
            rows.len(),
            self.config.epochs
        );

        self.scaler = Some(scaler);
        self.model = Some(model);
        Ok(())
    }

    pub fn predict(&self, features: &MeetingFeatures) -> ModelResult<PredictionResult> {
        let (Some(scaler), Some(model)) = (&self.scaler, &self.model) else {
            return Err(ModelError::NotTrained);
        };

        let x = scaler.transform(&features.to_array());
        Ok(PredictionResult::from_probs(model.probabilities(&x)))
    }
}
