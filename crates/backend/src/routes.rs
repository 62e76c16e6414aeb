use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;

/// Конфигурация всех роутов приложения
pub fn configure_routes() -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // D400 Monotributo dashboard
        .route(
            "/api/d400/monotributo",
            get(handlers::d400_monotributo::get_dashboard),
        )
        .route(
            "/api/d400/monotributo/config",
            get(handlers::d400_monotributo::get_config)
                .put(handlers::d400_monotributo::save_config),
        )
        .route(
            "/api/d400/monotributo/categories",
            get(handlers::d400_monotributo::get_categories),
        )
        .route(
            "/api/d400/monotributo/periods",
            get(handlers::d400_monotributo::get_available_periods),
        )
        .route(
            "/api/d400/monotributo/testdata",
            post(handlers::d400_monotributo::insert_test_data),
        )
}
