// bok-tone - Bank of Korea monetary policy Tone Index
// Collects MPC minutes and outlook releases from the BOK website, scores them with a
// hawkish/dovish sentiment dictionary and forecasts the next base rate decision.

#![deny(clippy::unwrap_used)]

pub mod cli;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod db;
pub mod models;
pub mod nlp;
pub mod orchestrator;

// Re-export commonly used items
pub use config::Config;
pub use data::{MinutesItem, NewsItem, OutlookForecast, ToneRecord};
pub use nlp::{SentimentDictionary, ToneAnalyzer, ToneResult};
