use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use granthalaya_core::ServiceError;

use crate::model::LabelSheet;

use super::{actor, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/labels", post(create_label_sheet).get(list_label_sheets))
        .route("/labels/{id}", get(get_label_sheet))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LabelsBody {
    product_codes: Vec<String>,
}

async fn create_label_sheet(
    State(svc): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<LabelsBody>,
) -> Result<(StatusCode, Json<LabelSheet>), ServiceError> {
    let sheet = svc.create_label_sheet(&body.product_codes, actor(&headers).as_deref())?;
    Ok((StatusCode::CREATED, Json(sheet)))
}

async fn list_label_sheets(State(svc): State<AppState>) -> Result<Json<Vec<LabelSheet>>, ServiceError> {
    Ok(Json(svc.list_label_sheets()?))
}

async fn get_label_sheet(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LabelSheet>, ServiceError> {
    Ok(Json(svc.get_label_sheet(&id)?))
}
