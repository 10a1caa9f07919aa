use anyhow::{Context, Result};
use sqlx::SqlitePool;

pub async fn execute(pool: SqlitePool) -> Result<()> {
    tracing::info!("Running database migrations");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    let (tables,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE '\\_%' ESCAPE '\\'")
            .fetch_one(&pool)
            .await?;

    println!("Database migrations completed successfully ({} tables)", tables);
    Ok(())
}
