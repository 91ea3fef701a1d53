//! Stateless code endpoints (generator, QR codec) plus scan resolution.

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use granthalaya_core::ServiceError;

use crate::code::{self, parse_sequence, ProductType, ScanEvent, ScanKind};
use crate::service::ResolvedScan;

use super::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/codes/generate", post(generate_code))
        .route("/qr/encode", post(encode_payload))
        .route("/qr/decode", post(decode_payload))
        .route("/scan", post(scan))
}

#[derive(Deserialize)]
struct GenerateBody {
    #[serde(rename = "type")]
    product_type: String,
    name: String,
    /// Number or numeric string; omitted means the default sequence.
    #[serde(default)]
    sequence: Option<Value>,
}

#[derive(Serialize)]
struct CodeResponse {
    code: String,
}

fn sequence_from(value: Option<Value>) -> Result<Option<u64>, ServiceError> {
    let invalid = |v: &Value| ServiceError::Validation(format!("sequence {v} is not a non-negative integer"));
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_u64().map(Some).ok_or_else(|| invalid(&Value::Number(n.clone()))),
        Some(Value::String(s)) => parse_sequence(&s)
            .map(Some)
            .map_err(|e| ServiceError::Validation(e.to_string())),
        Some(other) => Err(invalid(&other)),
    }
}

async fn generate_code(Json(body): Json<GenerateBody>) -> Result<Json<CodeResponse>, ServiceError> {
    let product_type: ProductType = body
        .product_type
        .parse()
        .map_err(|e: code::CodeError| ServiceError::Validation(e.to_string()))?;
    let sequence = sequence_from(body.sequence)?;
    let code = code::generate_code(product_type, &body.name, sequence)
        .map_err(|e| ServiceError::Validation(e.to_string()))?;
    Ok(Json(CodeResponse { code }))
}

#[derive(Deserialize)]
struct EncodeBody {
    kind: ScanKind,
    id: String,
}

#[derive(Serialize)]
struct PayloadResponse {
    payload: String,
}

async fn encode_payload(Json(body): Json<EncodeBody>) -> Json<PayloadResponse> {
    Json(PayloadResponse {
        payload: code::encode(body.kind, &body.id),
    })
}

#[derive(Deserialize)]
struct DecodeBody {
    payload: String,
}

async fn decode_payload(Json(body): Json<DecodeBody>) -> Result<Json<ScanEvent>, ServiceError> {
    code::decode(&body.payload)
        .map(Json)
        .ok_or_else(|| ServiceError::Validation("payload carries no recognized identifier".into()))
}

#[derive(Deserialize)]
struct ScanBody {
    raw: String,
}

async fn scan(
    State(svc): State<AppState>,
    Json(body): Json<ScanBody>,
) -> Result<Json<ResolvedScan>, ServiceError> {
    Ok(Json(svc.scan_input(&body.raw)?))
}
