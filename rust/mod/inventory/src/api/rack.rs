use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use granthalaya_core::ServiceError;

use crate::model::{NewRack, Rack};

use super::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/racks", post(create_rack).get(list_racks))
        .route("/racks/{id}", get(get_rack))
        .route("/racks/{id}/assign", post(assign_to_rack))
}

async fn create_rack(
    State(svc): State<AppState>,
    Json(input): Json<NewRack>,
) -> Result<(StatusCode, Json<Rack>), ServiceError> {
    Ok((StatusCode::CREATED, Json(svc.create_rack(input)?)))
}

async fn list_racks(State(svc): State<AppState>) -> Result<Json<Vec<Rack>>, ServiceError> {
    Ok(Json(svc.list_racks()?))
}

async fn get_rack(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Rack>, ServiceError> {
    Ok(Json(svc.get_rack(&id)?))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssignBody {
    product_code: String,
}

async fn assign_to_rack(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<AssignBody>,
) -> Result<Json<Rack>, ServiceError> {
    Ok(Json(svc.assign_to_rack(&id, &body.product_code)?))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::api::testing::{call, test_router};

    #[tokio::test]
    async fn create_list_and_assign() {
        let (router, _dir) = test_router();

        let (status, rack) = call(
            &router,
            "POST",
            "/inventory/v1/racks",
            Some(json!({"rackId": "a3", "name": "Scripture", "section": "Books"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(rack["rackId"], "RACK-A3");

        let (status, _) = call(
            &router,
            "POST",
            "/inventory/v1/racks",
            Some(json!({"rackId": "RACK-A3", "name": "Again"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        call(
            &router,
            "POST",
            "/inventory/v1/products",
            Some(json!({"type": "BOOK", "name": "Gita"})),
        )
        .await;

        let (status, rack) = call(
            &router,
            "POST",
            "/inventory/v1/racks/A3/assign",
            Some(json!({"productCode": "GG-BK-GITA-00001"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(rack["productCodes"], json!(["GG-BK-GITA-00001"]));

        let (_, product) = call(&router, "GET", "/inventory/v1/products/GG-BK-GITA-00001", None).await;
        assert_eq!(product["rackId"], "RACK-A3");

        let (_, racks) = call(&router, "GET", "/inventory/v1/racks", None).await;
        assert_eq!(racks.as_array().unwrap().len(), 1);

        let (status, _) = call(&router, "GET", "/inventory/v1/racks/Z9", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
