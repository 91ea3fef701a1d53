pub mod code;
pub mod label;
pub mod migration;
pub mod product;
pub mod rack;

use std::sync::Arc;

use axum::http::HeaderMap;
use axum::Router;

use crate::service::InventoryService;

/// Shared application state.
pub type AppState = Arc<InventoryService>;

/// Header naming the admin user behind a request. Authentication happens
/// in front of this service; the name is only recorded in audit fields.
pub const ACTOR_HEADER: &str = "x-actor";

/// Build the inventory API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/inventory/v1", api_routes())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(product::routes())
        .merge(rack::routes())
        .merge(code::routes())
        .merge(label::routes())
        .merge(migration::routes())
}

pub(crate) fn actor(headers: &HeaderMap) -> Option<String> {
    headers
        .get(ACTOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
