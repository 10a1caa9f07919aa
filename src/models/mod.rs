//! Rate decision forecasting from the Tone Index
//!
//! - `rate_history`: BOK base rate decisions used as labels
//! - `rate_predictor`: softmax logistic regression over tone features
//! - `backtest`: walk-forward validation of the predictor

pub mod backtest;
pub mod rate_history;
pub mod rate_predictor;

use thiserror::Error;

pub use backtest::{BacktestRecord, BacktestReport, Backtester, ChunkAccuracy};
pub use rate_history::{RateAction, RateDecision, RateHistory};
pub use rate_predictor::{
    build_samples, MeetingFeatures, PredictionResult, PredictorConfig, RatePredictor, Sample,
    StandardScaler, ToneObservation,
};

/// Error types for model training and prediction
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Insufficient training data: need at least {needed} labeled meetings, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("Model has not been trained")]
    NotTrained,

    #[error("Invalid model configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ModelResult<T> = Result<T, ModelError>;
