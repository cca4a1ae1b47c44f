mod channels;
mod jobs;

pub use channels::ChannelStore;
pub use jobs::JobStore;

use log::{info, warn};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

/// Opens the pool and makes sure both tables exist with their current columns.
pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    let mut pool_options = SqlitePoolOptions::new().max_connections(5);
    // Every connection to an in-memory database is its own database.
    if database_url.contains(":memory:") {
        pool_options = pool_options
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    }

    let pool = pool_options.connect_with(options).await?;

    run_migrations(&pool).await?;
    info!("Database ready at {database_url}");
    Ok(pool)
}

async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS channels (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            channel_id TEXT UNIQUE NOT NULL,
            channel_name TEXT NOT NULL,
            category TEXT DEFAULT 'Noticias'
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS analysis_jobs (
            id TEXT PRIMARY KEY,
            status TEXT NOT NULL,
            result TEXT,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Tables created before these columns existed get them added in place.
    add_column_if_missing(pool, "analysis_jobs", "channel_name", "TEXT").await?;
    add_column_if_missing(pool, "analysis_jobs", "raw_json_data", "TEXT").await?;

    Ok(())
}

async fn add_column_if_missing(
    pool: &SqlitePool,
    table: &str,
    column: &str,
    sql_type: &str,
) -> Result<(), sqlx::Error> {
    let statement = format!("ALTER TABLE {table} ADD COLUMN {column} {sql_type}");
    match sqlx::query(&statement).execute(pool).await {
        Ok(_) => {
            info!("Added column '{column}' to '{table}'");
            Ok(())
        }
        Err(sqlx::Error::Database(e)) if e.message().contains("duplicate column name") => Ok(()),
        Err(e) => {
            warn!("Failed to add column '{column}' to '{table}': {e}");
            Err(e)
        }
    }
}

#[cfg(test)]
pub(crate) async fn memory_pool() -> SqlitePool {
    connect("sqlite::memory:")
        .await
        .expect("in-memory database")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let pool = memory_pool().await;
        run_migrations(&pool).await.unwrap();

        let columns: Vec<String> =
            sqlx::query_scalar("SELECT name FROM pragma_table_info('analysis_jobs')")
                .fetch_all(&pool)
                .await
                .unwrap();
        for expected in [
            "id",
            "status",
            "result",
            "created_at",
            "channel_name",
            "raw_json_data",
        ] {
            assert!(columns.iter().any(|c| c == expected), "missing {expected}");
        }
    }

    #[tokio::test]
    async fn upgrades_legacy_jobs_table() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query(
            "CREATE TABLE analysis_jobs (id TEXT PRIMARY KEY, status TEXT NOT NULL, result TEXT, created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP)",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query("INSERT INTO analysis_jobs (id, status) VALUES ('old', 'completed')")
            .execute(&pool)
            .await
            .unwrap();

        run_migrations(&pool).await.unwrap();

        let raw: Option<String> =
            sqlx::query_scalar("SELECT raw_json_data FROM analysis_jobs WHERE id = 'old'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert!(raw.is_none());
    }
}
