use axum::{
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};

use granthalaya_core::ServiceError;

use crate::model::{MigrationLock, MigrationOutcome};

use super::{actor, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/migrations/product-codes", get(status))
        .route("/migrations/product-codes/run", post(run))
}

async fn status(State(svc): State<AppState>) -> Result<Json<MigrationLock>, ServiceError> {
    Ok(Json(svc.get_migration_status()?))
}

async fn run(
    State(svc): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MigrationOutcome>, ServiceError> {
    let actor = actor(&headers).unwrap_or_else(|| "admin-console".to_string());
    Ok(Json(svc.run_product_code_backfill(&actor)?))
}
