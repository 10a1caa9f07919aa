//! Dashboard request handlers

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::Html,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::error::{AppError, AppResult};
use super::AppState;
use crate::{
    data::{dao::OutlookDAO, validation, MeetingDAO, MinutesItem, OutlookForecast, ToneDAO, ToneRecord},
    models::{BacktestReport, ChunkAccuracy},
    models::backtest::CHUNK_SIZE,
    nlp::DictionaryStats,
    orchestrator::{ForecastOrchestrator, LatestPrediction},
};

const INDEX_HTML: &str = include_str!("index.html");

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn health(State(state): State<AppState>) -> AppResult<Json<Value>> {
    sqlx::query("SELECT 1")
        .execute(&state.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Database unavailable: {}", e)))?;

    Ok(Json(json!({
        "status": "ok",
        "service": "bok-tone",
        "version": env!("CARGO_PKG_VERSION"),
    })))
}

#[derive(Debug, Deserialize)]
pub struct MeetingsQuery {
    pub year: Option<i32>,
}

pub async fn meetings(
    State(state): State<AppState>,
    query: Result<Query<MeetingsQuery>, QueryRejection>,
) -> AppResult<Json<Vec<MinutesItem>>> {
    let Query(query) = query?;
    if let Some(year) = query.year {
        validation::validate_year(year)?;
    }
    let items = MeetingDAO::new(state.pool.clone()).list(query.year).await?;
    Ok(Json(items))
}

pub async fn tone(State(state): State<AppState>) -> AppResult<Json<Vec<ToneRecord>>> {
    let records = ToneDAO::new(state.pool.clone()).list().await?;
    Ok(Json(records))
}

pub async fn latest_prediction(State(state): State<AppState>) -> AppResult<Json<LatestPrediction>> {
    let orchestrator = ForecastOrchestrator::new(state.pool.clone(), state.config.as_ref().clone());
    orchestrator
        .predict_latest()
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("No tone scores stored yet".to_string()))
}

pub async fn latest_outlook(State(state): State<AppState>) -> AppResult<Json<OutlookForecast>> {
    OutlookDAO::new(state.pool.clone())
        .latest()
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("No Economic Outlook stored yet".to_string()))
}

#[derive(Debug, Deserialize)]
pub struct BacktestQuery {
    pub start_idx: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct BacktestView {
    #[serde(flatten)]
    pub report: BacktestReport,
    pub cumulative_accuracy: Vec<f64>,
    pub chunk_accuracy: Vec<ChunkAccuracy>,
}

/// Walk-forward backtest computed on demand; nothing is persisted
pub async fn backtest(
    State(state): State<AppState>,
    query: Result<Query<BacktestQuery>, QueryRejection>,
) -> AppResult<Json<BacktestView>> {
    let Query(query) = query?;
    let orchestrator = ForecastOrchestrator::new(state.pool.clone(), state.config.as_ref().clone());
    let report = orchestrator.evaluate(query.start_idx).await?;

    Ok(Json(BacktestView {
        cumulative_accuracy: report.cumulative_accuracy(),
        chunk_accuracy: report.chunk_accuracy(CHUNK_SIZE),
        report,
    }))
}

pub async fn dictionary_stats(State(state): State<AppState>) -> Json<DictionaryStats> {
    Json(state.dictionary.statistics())
}
