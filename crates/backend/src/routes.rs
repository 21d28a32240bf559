use std::path::Path;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    middleware,
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};

use crate::domain::a001_call_log::repository::CallLogStore;
use crate::handlers;
use crate::shared::request_log::request_logger;

/// Максимальный размер тела запроса (JSON и form-urlencoded)
pub const BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Общее состояние обработчиков
#[derive(Clone)]
pub struct AppState {
    pub store: CallLogStore,
}

/// Конфигурация всех роутов приложения.
///
/// Всё, что не попало в API, отдаётся из `static_dir`; неизвестные пути
/// получают `index.html` для клиентской маршрутизации.
pub fn configure_routes(state: AppState, static_dir: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    let assets =
        ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join("index.html")));

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route(
            "/api/logs",
            get(handlers::a001_call_log::list_all).post(handlers::a001_call_log::ingest),
        )
        .with_state(state)
        .fallback_service(assets)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(middleware::from_fn(request_logger))
        .layer(cors)
}
