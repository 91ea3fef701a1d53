use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;

use granthalaya_core::{ListParams, ListResult, ServiceError};

use crate::code::ProductType;
use crate::model::{NewProduct, Product, ProductFilter};

use super::{actor, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", post(create_product).get(list_products))
        .route(
            "/products/{code}",
            get(get_product).patch(update_product).delete(delete_product),
        )
}

async fn create_product(
    State(svc): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>), ServiceError> {
    let product = svc.create_product(input, actor(&headers).as_deref())?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Query string of `GET /products`. Kept flat: the urlencoded
/// deserializer cannot flatten numeric fields.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductQuery {
    #[serde(rename = "type")]
    product_type: Option<String>,
    category: Option<String>,
    missing_code: Option<bool>,
    q: Option<String>,
    limit: Option<usize>,
    offset: Option<usize>,
}

impl ProductQuery {
    fn split(self) -> Result<(ProductFilter, ListParams), ServiceError> {
        let product_type = self
            .product_type
            .map(|t| t.parse::<ProductType>())
            .transpose()
            .map_err(|e| ServiceError::Validation(e.to_string()))?;
        let defaults = ListParams::default();
        Ok((
            ProductFilter {
                product_type,
                category: self.category,
                missing_code: self.missing_code,
            },
            ListParams {
                limit: self.limit.unwrap_or(defaults.limit),
                offset: self.offset.unwrap_or(defaults.offset),
                q: self.q,
            },
        ))
    }
}

async fn list_products(
    State(svc): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<ListResult<Product>>, ServiceError> {
    let (filter, params) = query.split()?;
    Ok(Json(svc.list_products(&filter, &params)?))
}

async fn get_product(
    State(svc): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Product>, ServiceError> {
    Ok(Json(svc.get_product_by_code(&code)?))
}

async fn update_product(
    State(svc): State<AppState>,
    Path(code): Path<String>,
    Json(patch): Json<Value>,
) -> Result<Json<Product>, ServiceError> {
    Ok(Json(svc.update_product(&code, &patch)?))
}

async fn delete_product(
    State(svc): State<AppState>,
    Path(code): Path<String>,
) -> Result<StatusCode, ServiceError> {
    svc.delete_product(&code)?;
    Ok(StatusCode::NO_CONTENT)
}
