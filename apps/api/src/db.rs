use anyhow::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tracing::info;

const CREATE_HR_HOME: &str = r#"
CREATE TABLE IF NOT EXISTS hr_home (
  UID TEXT PRIMARY KEY,
  Email TEXT NOT NULL,
  time DATETIME NOT NULL,
  JD BLOB,
  CV BLOB,
  status INTEGER NOT NULL CHECK (status IN (0,1)),
  Active INTEGER NOT NULL CHECK (Active IN (0,1))
)"#;

/// Creates and returns a SQLite connection pool.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    info!("Connecting to SQLite at {database_url}...");

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("SQLite connection pool established");
    Ok(pool)
}

/// Creates the `hr_home` table if it does not exist yet.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(CREATE_HR_HOME).execute(pool).await?;
    info!("Table hr_home is ready");
    Ok(())
}
