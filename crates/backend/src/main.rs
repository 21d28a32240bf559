pub mod domain;
pub mod handlers;
pub mod routes;
pub mod shared;

use std::net::SocketAddr;
use std::path::Path;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::domain::a001_call_log::repository::CallLogStore;
use crate::routes::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Создаем директорию для логов
    let log_dir = Path::new("target").join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("backend.log"))?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| {
                // Отключаем логи SQL запросов, но оставляем логи приложения
                "info,sqlx=warn,sea_orm=warn".into()
            }),
        ))
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::sync::Arc::new(log_file))
                .with_ansi(false),
        )
        .init();

    let config = shared::config::load_config()?;

    let conn = shared::data::db::initialize_database(&config.database.url)
        .await
        .map_err(|e| anyhow::anyhow!("db init failed: {e}"))?;
    let store = CallLogStore::new(conn);
    tracing::info!(
        "Successfully connected to database ({} call logs stored)",
        store.count().await?
    );

    let static_dir = Path::new(&config.server.static_dir);
    if !static_dir.join("index.html").exists() {
        tracing::warn!(
            "index.html not found in {}, client routes will return 404",
            static_dir.display()
        );
    }

    let app = routes::configure_routes(AppState { store }, static_dir);

    let port = config.server.port;
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();

    tracing::info!("Attempting to bind server to http://{}", addr);
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => {
            tracing::info!("Server is running on http://localhost:{}", port);
            listener
        }
        Err(e) => {
            if e.kind() == std::io::ErrorKind::AddrInUse {
                tracing::error!(
                    "Error: Port {} is already in use. Please ensure no other process is using this port.",
                    port
                );
            } else {
                tracing::error!("Failed to bind to port {}. Error: {}", port, e);
            }
            return Err(e.into());
        }
    };

    axum::serve(listener, app).await?;

    Ok(())
}
