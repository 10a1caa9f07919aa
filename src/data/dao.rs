//! SQLite persistence for meetings, tone scores, outlook projections and backtest runs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use tracing::info;
use uuid::Uuid;

use super::{DataResult, MinutesItem, OutlookForecast};

pub struct MeetingDAO {
    pool: SqlitePool,
}

#[derive(Debug, FromRow)]
struct MeetingRow {
    meeting_date: NaiveDate,
    year: i64,
    decision_url: Option<String>,
    press_url: Option<String>,
    minutes_url: Option<String>,
    minutes_hwp_url: Option<String>,
    minutes_pdf_url: Option<String>,
    issue_url: Option<String>,
}

impl From<MeetingRow> for MinutesItem {
    fn from(row: MeetingRow) -> Self {
        MinutesItem {
            meeting_date: row.meeting_date,
            year: row.year as i32,
            decision_url: row.decision_url,
            press_url: row.press_url,
            minutes_url: row.minutes_url,
            minutes_hwp_url: row.minutes_hwp_url,
            minutes_pdf_url: row.minutes_pdf_url,
            issue_url: row.issue_url,
        }
    }
}

impl MeetingDAO {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or refresh meetings; links found later overwrite earlier gaps
    pub async fn upsert_many(&self, items: &[MinutesItem]) -> DataResult<usize> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO meetings (
                    meeting_date, year, decision_url, press_url, minutes_url,
                    minutes_hwp_url, minutes_pdf_url, issue_url, updated_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                ON CONFLICT (meeting_date) DO UPDATE SET
                    decision_url    = COALESCE(excluded.decision_url, meetings.decision_url),
                    press_url       = COALESCE(excluded.press_url, meetings.press_url),
                    minutes_url     = COALESCE(excluded.minutes_url, meetings.minutes_url),
                    minutes_hwp_url = COALESCE(excluded.minutes_hwp_url, meetings.minutes_hwp_url),
                    minutes_pdf_url = COALESCE(excluded.minutes_pdf_url, meetings.minutes_pdf_url),
                    issue_url       = COALESCE(excluded.issue_url, meetings.issue_url),
                    updated_at      = excluded.updated_at
                "#,
            )
            .bind(item.meeting_date)
            .bind(item.year)
            .bind(&item.decision_url)
            .bind(&item.press_url)
            .bind(&item.minutes_url)
            .bind(&item.minutes_hwp_url)
            .bind(&item.minutes_pdf_url)
            .bind(&item.issue_url)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!("Persisted {} meetings", items.len());
        Ok(items.len())
    }

    pub async fn list(&self, year: Option<i32>) -> DataResult<Vec<MinutesItem>> {
        let rows: Vec<MeetingRow> = sqlx::query_as(
            r#"
            SELECT meeting_date, year, decision_url, press_url, minutes_url,
                   minutes_hwp_url, minutes_pdf_url, issue_url
            FROM meetings
            WHERE ($1 IS NULL OR year = $1)
            ORDER BY meeting_date ASC
            "#,
        )
        .bind(year)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(MinutesItem::from).collect())
    }
}

/// Stored Tone Index for one meeting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ToneRecord {
    pub meeting_date: NaiveDate,
    pub tone_index: f64,
    pub weighted_tone: f64,
    pub hawkish_score: f64,
    pub dovish_score: f64,
    pub hawkish_sentences: i64,
    pub dovish_sentences: i64,
    pub neutral_sentences: i64,
    #[sqlx(json)]
    pub top_terms: Vec<(String, f64)>,
    pub analyzed_at: DateTime<Utc>,
}

pub struct ToneDAO {
    pool: SqlitePool,
}

impl ToneDAO {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn upsert(&self, record: &ToneRecord) -> DataResult<()> {
        sqlx::query(
            r#"
            INSERT INTO tone_scores (
                meeting_date, tone_index, weighted_tone, hawkish_score, dovish_score,
                hawkish_sentences, dovish_sentences, neutral_sentences, top_terms, analyzed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (meeting_date) DO UPDATE SET
                tone_index        = excluded.tone_index,
                weighted_tone     = excluded.weighted_tone,
                hawkish_score     = excluded.hawkish_score,
                dovish_score      = excluded.dovish_score,
                hawkish_sentences = excluded.hawkish_sentences,
                dovish_sentences  = excluded.dovish_sentences,
                neutral_sentences = excluded.neutral_sentences,
                top_terms         = excluded.top_terms,
                analyzed_at       = excluded.analyzed_at
            "#,
        )
        .bind(record.meeting_date)
        .bind(record.tone_index)
        .bind(record.weighted_tone)
        .bind(record.hawkish_score)
        .bind(record.dovish_score)
        .bind(record.hawkish_sentences)
        .bind(record.dovish_sentences)
        .bind(record.neutral_sentences)
        .bind(serde_json::to_string(&record.top_terms)?)
        .bind(record.analyzed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// All tone scores in meeting order
    pub async fn list(&self) -> DataResult<Vec<ToneRecord>> {
        let records = sqlx::query_as::<_, ToneRecord>(
            r#"
            SELECT meeting_date, tone_index, weighted_tone, hawkish_score, dovish_score,
                   hawkish_sentences, dovish_sentences, neutral_sentences, top_terms, analyzed_at
            FROM tone_scores
            ORDER BY meeting_date ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}

pub struct OutlookDAO {
    pool: SqlitePool,
}

impl OutlookDAO {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn upsert(&self, forecast: &OutlookForecast) -> DataResult<()> {
        let mut tx = self.pool.begin().await?;

        for (year, projection) in &forecast.forecasts {
            sqlx::query(
                r#"
                INSERT INTO outlook_forecasts (release_date, year, gdp, cpi, description, source_url)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (release_date, year) DO UPDATE SET
                    gdp = excluded.gdp,
                    cpi = excluded.cpi,
                    description = excluded.description,
                    source_url = excluded.source_url
                "#,
            )
            .bind(forecast.release_date)
            .bind(year)
            .bind(projection.gdp)
            .bind(projection.cpi)
            .bind(&forecast.description)
            .bind(&forecast.source_url)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Most recent release, if any has been stored
    pub async fn latest(&self) -> DataResult<Option<OutlookForecast>> {
        let rows: Vec<(NaiveDate, i64, Option<f64>, Option<f64>, String, String)> = sqlx::query_as(
            r#"
            SELECT release_date, year, gdp, cpi, description, source_url
            FROM outlook_forecasts
            WHERE release_date = (SELECT MAX(release_date) FROM outlook_forecasts)
            ORDER BY year ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let Some((release_date, _, _, _, description, source_url)) = rows.first().cloned() else {
            return Ok(None);
        };

        let forecasts = rows
            .into_iter()
            .map(|(_, year, gdp, cpi, _, _)| (year as i32, super::YearForecast { gdp, cpi }))
            .collect();

        Ok(Some(OutlookForecast {
            release_date,
            description,
            source_url,
            forecasts,
        }))
    }
}

/// Persisted summary of one walk-forward backtest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestRunRecord {
    pub id: Uuid,
    pub run_at: DateTime<Utc>,
    pub start_idx: i64,
    pub total: i64,
    pub correct: i64,
    pub accuracy: f64,
    pub records: serde_json::Value,
}

pub struct BacktestDAO {
    pool: SqlitePool,
}

impl BacktestDAO {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, run: &BacktestRunRecord) -> DataResult<()> {
        sqlx::query(
            r#"
            INSERT INTO backtest_runs (id, run_at, start_idx, total, correct, accuracy, records)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(run.id.to_string())
        .bind(run.run_at)
        .bind(run.start_idx)
        .bind(run.total)
        .bind(run.correct)
        .bind(run.accuracy)
        .bind(run.records.to_string())
        .execute(&self.pool)
        .await?;

        info!("Stored backtest run {} ({:.1}% accuracy)", run.id, run.accuracy * 100.0);
        Ok(())
    }

    pub async fn latest(&self) -> DataResult<Option<BacktestRunRecord>> {
        let row: Option<(String, DateTime<Utc>, i64, i64, i64, f64, String)> = sqlx::query_as(
            r#"
            SELECT id, run_at, start_idx, total, correct, accuracy, records
            FROM backtest_runs
            ORDER BY run_at DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        let Some((id, run_at, start_idx, total, correct, accuracy, records)) = row else {
            return Ok(None);
        };

        Ok(Some(BacktestRunRecord {
            id: Uuid::parse_str(&id).map_err(|e| super::DataError::parse_error(e.to_string()))?,
            run_at,
            start_idx,
            total,
            correct,
            accuracy,
            records: serde_json::from_str(&records)?,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::YearForecast;
    use crate::db::Database;
    use std::collections::BTreeMap;

    async fn pool() -> SqlitePool {
        let db = Database::in_memory().await.unwrap();
        db.run_migrations().await.unwrap();
        db.pool
    }

    #[tokio::test]
    async fn test_meeting_upsert_keeps_known_links() {
        let dao = MeetingDAO::new(pool().await);
        let date = NaiveDate::from_ymd_opt(2025, 1, 16).unwrap();

        let mut first = MinutesItem::new(date);
        first.decision_url = Some("d".to_string());
        dao.upsert_many(&[first]).await.unwrap();

        // Minutes are published two weeks later; the decision link stays
        let mut second = MinutesItem::new(date);
        second.minutes_pdf_url = Some("m.pdf".to_string());
        dao.upsert_many(&[second]).await.unwrap();

        let stored = dao.list(Some(2025)).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].decision_url.as_deref(), Some("d"));
        assert_eq!(stored[0].minutes_pdf_url.as_deref(), Some("m.pdf"));
        assert!(dao.list(Some(2024)).await.unwrap().is_empty());
        assert_eq!(dao.list(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_tone_upsert_and_list_in_date_order() {
        let dao = ToneDAO::new(pool().await);
        let record = |m: u32, tone: f64| ToneRecord {
            meeting_date: NaiveDate::from_ymd_opt(2024, m, 1).unwrap(),
            tone_index: tone,
            weighted_tone: tone / 2.0,
            hawkish_score: 3.0,
            dovish_score: 1.0,
            hawkish_sentences: 3,
            dovish_sentences: 1,
            neutral_sentences: 5,
            top_terms: vec![("긴축".to_string(), 2.0)],
            analyzed_at: Utc::now(),
        };

        dao.upsert(&record(5, 0.5)).await.unwrap();
        dao.upsert(&record(2, -0.25)).await.unwrap();
        dao.upsert(&record(5, 0.1)).await.unwrap();

        let stored = dao.list().await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].tone_index, -0.25);
        assert_eq!(stored[1].tone_index, 0.1);
        assert_eq!(stored[1].top_terms, vec![("긴축".to_string(), 2.0)]);
    }

    #[tokio::test]
    async fn test_outlook_latest_release() {
        let dao = OutlookDAO::new(pool().await);
        assert!(dao.latest().await.unwrap().is_none());

        let forecast = |day: u32, gdp: f64| OutlookForecast {
            release_date: NaiveDate::from_ymd_opt(2025, 5, day).unwrap(),
            description: "경제전망보고서".to_string(),
            source_url: "https://www.bok.or.kr/view.do".to_string(),
            forecasts: BTreeMap::from([
                (2025, YearForecast { gdp: Some(gdp), cpi: Some(1.9) }),
                (2026, YearForecast { gdp: Some(1.6), cpi: None }),
            ]),
        };
        dao.upsert(&forecast(1, 1.5)).await.unwrap();
        dao.upsert(&forecast(29, 0.8)).await.unwrap();

        let latest = dao.latest().await.unwrap().unwrap();
        assert_eq!(latest.release_date, NaiveDate::from_ymd_opt(2025, 5, 29).unwrap());
        assert_eq!(latest.forecasts[&2025].gdp, Some(0.8));
        assert_eq!(latest.forecasts[&2026].cpi, None);
    }

    #[tokio::test]
    async fn test_backtest_run_roundtrip() {
        let dao = BacktestDAO::new(pool().await);
        let run = BacktestRunRecord {
            id: Uuid::new_v4(),
            run_at: Utc::now(),
            start_idx: 10,
            total: 4,
            correct: 3,
            accuracy: 0.75,
            records: serde_json::json!([{ "actual": "Hold" }]),
        };
        dao.insert(&run).await.unwrap();

        let latest = dao.latest().await.unwrap().unwrap();
        assert_eq!(latest.id, run.id);
        assert_eq!(latest.correct, 3);
        assert_eq!(latest.records[0]["actual"], "Hold");
    }
}
