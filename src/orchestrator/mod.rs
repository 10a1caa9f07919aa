//! Orchestrator module for the end-to-end BOK pipelines
//! collection → tone analysis → forecasting

pub mod analyze;
pub mod collect;
pub mod forecast;

// Re-export main orchestrators
pub use analyze::AnalyzeOrchestrator;
pub use collect::CollectOrchestrator;
pub use forecast::{ForecastOrchestrator, LatestPrediction};
