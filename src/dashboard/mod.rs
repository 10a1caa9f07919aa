//! Local HTTP dashboard: JSON API plus a single page charting the Tone Index

pub mod error;
pub mod handlers;

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::nlp::SentimentDictionary;

pub use error::{AppError, AppResult};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<Config>,
    pub dictionary: Arc<SentimentDictionary>,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: Config, dictionary: SentimentDictionary) -> Self {
        Self {
            pool,
            config: Arc::new(config),
            dictionary: Arc::new(dictionary),
        }
    }
}

fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/meetings", get(handlers::meetings))
        .route("/tone", get(handlers::tone))
        .route("/prediction/latest", get(handlers::latest_prediction))
        .route("/outlook/latest", get(handlers::latest_outlook))
        .route("/backtest", get(handlers::backtest))
        .route("/dictionary/stats", get(handlers::dictionary_stats))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .nest("/api", api_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Serve until Ctrl-C
pub async fn serve(state: AppState) -> Result<()> {
    let addr = state.config.dashboard.addr.clone();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind dashboard to {}", addr))?;

    info!("📊 Dashboard listening on http://{}", addr);
    println!("Dashboard running at http://{} (Ctrl-C to stop)", addr);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down dashboard");
        })
        .await
        .context("Dashboard server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{MeetingDAO, MinutesItem};
    use crate::db::Database;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::NaiveDate;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    async fn state() -> Result<AppState> {
        let db = Database::in_memory().await?;
        db.run_migrations().await?;
        Ok(AppState::new(db.pool, Config::default(), SentimentDictionary::new()))
    }

    async fn get_json(app: Router, uri: &str) -> Result<(StatusCode, Value)> {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty())?)
            .await?;
        let status = response.status();
        let bytes = response.into_body().collect().await?.to_bytes();
        Ok((status, serde_json::from_slice(&bytes)?))
    }

    #[tokio::test]
    async fn test_health_and_dictionary_stats() -> Result<()> {
        let app = build_router(state().await?);

        let (status, body) = get_json(app.clone(), "/api/health").await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, body) = get_json(app, "/api/dictionary/stats").await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_hawkish"], 30);
        assert_eq!(body["total_dovish"], 35);
        Ok(())
    }

    #[tokio::test]
    async fn test_meetings_filtered_by_year() -> Result<()> {
        let state = state().await?;
        let dates = [(2024, 11, 28), (2025, 1, 16)];
        let items: Vec<MinutesItem> = dates
            .iter()
            .filter_map(|&(y, m, d)| NaiveDate::from_ymd_opt(y, m, d))
            .map(MinutesItem::new)
            .collect();
        MeetingDAO::new(state.pool.clone()).upsert_many(&items).await?;

        let app = build_router(state);
        let (status, body) = get_json(app.clone(), "/api/meetings?year=2025").await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(1));
        assert_eq!(body[0]["meeting_date"], "2025-01-16");

        let (status, body) = get_json(app, "/api/meetings?year=1900").await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_database_responses() -> Result<()> {
        let app = build_router(state().await?);

        let (status, body) = get_json(app.clone(), "/api/tone").await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::Array(vec![]));

        let (status, body) = get_json(app.clone(), "/api/prediction/latest").await?;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].is_string());

        let (status, _) = get_json(app.clone(), "/api/outlook/latest").await?;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = get_json(app, "/api/backtest?start_idx=5").await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 0);
        assert_eq!(body["start_idx"], 5);
        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_query_is_json_bad_request() -> Result<()> {
        let app = build_router(state().await?);

        let (status, body) = get_json(app.clone(), "/api/backtest?start_idx=abc").await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().is_some_and(|msg| !msg.is_empty()));

        let (status, body) = get_json(app, "/api/meetings?year=twenty").await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
        Ok(())
    }

    #[tokio::test]
    async fn test_index_page() -> Result<()> {
        let app = build_router(state().await?);
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty())?)
            .await?;
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await?.to_bytes();
        let html = String::from_utf8(bytes.to_vec())?;
        assert!(html.contains("/api/tone"));
        Ok(())
    }
}
