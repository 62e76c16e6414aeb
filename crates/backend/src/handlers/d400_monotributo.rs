use axum::{extract::Query, http::StatusCode, Json};
use contracts::dashboards::d400_monotributo::{
    MonotributoDashboardRequest, MonotributoDashboardResponse, SaveConfigResponse,
};
use contracts::domain::a002_tax_category::TaxCategory;
use contracts::domain::a003_user_config::{UserConfig, UserConfigDto};
use serde_json::json;

use crate::dashboards::d400_monotributo::{service, state};
use crate::domain::{a001_payment, a003_user_config};
use crate::shared::config;
use crate::shared::data::source;
use crate::shared::data::db;

/// GET /api/d400/monotributo?currency=ARS&rate=1000
pub async fn get_dashboard(
    Query(request): Query<MonotributoDashboardRequest>,
) -> Result<Json<MonotributoDashboardResponse>, StatusCode> {
    let source = source::get_source().map_err(|e| {
        tracing::error!("D400 Monotributo: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    let epoch = config::current().dashboard.epoch;

    let response =
        service::load_dashboard(source.as_ref(), state::global(), epoch, &request).await;
    Ok(Json(response))
}

/// GET /api/d400/monotributo/config
pub async fn get_config() -> Result<Json<UserConfig>, StatusCode> {
    let source = source::get_source().map_err(|e| {
        tracing::error!("D400 Monotributo: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    match a003_user_config::service::get_current(source.as_ref()).await {
        Ok(Some(config)) => Ok(Json(config)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("D400 Monotributo: Failed to get user config: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// PUT /api/d400/monotributo/config
pub async fn save_config(
    Query(request): Query<MonotributoDashboardRequest>,
    Json(dto): Json<UserConfigDto>,
) -> Result<Json<SaveConfigResponse>, (StatusCode, Json<serde_json::Value>)> {
    let source = source::get_source().map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
    })?;
    let epoch = config::current().dashboard.epoch;

    match service::save_config(source.as_ref(), state::global(), epoch, dto, &request).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            let error_msg = e.to_string();
            tracing::error!("D400 Monotributo: Failed to save user config: {}", error_msg);
            let status = if e.is_validation() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            Err((status, Json(json!({"error": error_msg}))))
        }
    }
}

/// GET /api/d400/monotributo/categories
pub async fn get_categories() -> Result<Json<Vec<TaxCategory>>, StatusCode> {
    let source = source::get_source().map_err(|e| {
        tracing::error!("D400 Monotributo: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(service::get_categories(source.as_ref()).await))
}

/// GET /api/d400/monotributo/periods
pub async fn get_available_periods() -> Result<Json<Vec<String>>, StatusCode> {
    let source = source::get_source().map_err(|e| {
        tracing::error!("D400 Monotributo: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    let epoch = config::current().dashboard.epoch;

    let periods = service::get_available_periods(source.as_ref(), epoch).await;
    tracing::info!(
        "D400 Monotributo: Returning {} available periods",
        periods.len()
    );
    Ok(Json(periods))
}

/// POST /api/d400/monotributo/testdata
///
/// Только для локальной базы.
pub async fn insert_test_data() -> StatusCode {
    let Some(conn) = db::get_connection() else {
        tracing::warn!("D400 Monotributo: test data is only available for the local database");
        return StatusCode::BAD_REQUEST;
    };
    let today = chrono::Local::now().date_naive();
    match a001_payment::service::insert_test_data(conn, today).await {
        Ok(count) => {
            tracing::info!("D400 Monotributo: Inserted {} demo payments", count);
            StatusCode::OK
        }
        Err(e) => {
            tracing::error!("D400 Monotributo: Failed to insert test data: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
