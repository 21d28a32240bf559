use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement,
};
use std::path::Path;

const CREATE_CALL_LOG_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS a001_call_log (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        date_time TEXT NOT NULL,
        duration REAL NOT NULL,
        name TEXT NOT NULL DEFAULT 'Unknown',
        phone_number TEXT NOT NULL,
        call_type TEXT NOT NULL
    );
"#;

const CREATE_CALL_LOG_KEY_INDEX: &str = r#"
    CREATE UNIQUE INDEX IF NOT EXISTS idx_a001_call_log_key
    ON a001_call_log (phone_number, date_time);
"#;

const CREATE_CALL_LOG_DATE_INDEX: &str = r#"
    CREATE INDEX IF NOT EXISTS idx_a001_call_log_date_time
    ON a001_call_log (date_time);
"#;

/// Открыть соединение с БД и создать недостающие таблицы
pub async fn initialize_database(db_url: &str) -> anyhow::Result<DatabaseConnection> {
    if let Some(db_file) = sqlite_file_path(db_url) {
        if let Some(parent) = Path::new(db_file).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
    }

    let mut options = ConnectOptions::new(db_url.to_string());
    options.sqlx_logging(false);
    if is_in_memory(db_url) {
        // Every pooled connection to :memory: is its own database
        options.max_connections(1).min_connections(1);
    }
    let conn = Database::connect(options).await?;

    ensure_schema(&conn).await?;
    Ok(conn)
}

/// Minimal schema bootstrap, safe to run on every start
pub async fn ensure_schema(conn: &DatabaseConnection) -> anyhow::Result<()> {
    for sql in [
        CREATE_CALL_LOG_TABLE,
        CREATE_CALL_LOG_KEY_INDEX,
        CREATE_CALL_LOG_DATE_INDEX,
    ] {
        conn.execute(Statement::from_string(
            DatabaseBackend::Sqlite,
            sql.to_string(),
        ))
        .await?;
    }
    tracing::info!("Table a001_call_log is ready");
    Ok(())
}

fn is_in_memory(db_url: &str) -> bool {
    db_url.contains(":memory:") || db_url.contains("mode=memory")
}

/// Путь к файлу SQLite из URL вида `sqlite://path/to/file.db?mode=rwc`
fn sqlite_file_path(db_url: &str) -> Option<&str> {
    if is_in_memory(db_url) {
        return None;
    }
    let rest = db_url
        .strip_prefix("sqlite://")
        .or_else(|| db_url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or(rest);
    if path.is_empty() {
        None
    } else {
        Some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_file_path() {
        assert_eq!(
            sqlite_file_path("sqlite://target/db/call_logs.db?mode=rwc"),
            Some("target/db/call_logs.db")
        );
        assert_eq!(
            sqlite_file_path("sqlite:///var/lib/app.db"),
            Some("/var/lib/app.db")
        );
        assert_eq!(sqlite_file_path("sqlite::memory:"), None);
        assert_eq!(sqlite_file_path("postgres://localhost/db"), None);
    }

    #[tokio::test]
    async fn test_schema_bootstrap_is_idempotent() {
        let conn = initialize_database("sqlite::memory:").await.unwrap();
        ensure_schema(&conn).await.unwrap();

        let tables = conn
            .query_all(Statement::from_string(
                DatabaseBackend::Sqlite,
                "SELECT name FROM sqlite_master WHERE type='table' AND name='a001_call_log';"
                    .to_string(),
            ))
            .await
            .unwrap();
        assert_eq!(tables.len(), 1);
    }
}
