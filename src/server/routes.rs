//! Request handlers and their error mapping.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::AppState;
use crate::agent::AnalysisReport;
use crate::elasticity::{fit_price_elasticity, ElasticityFit, PricePoint, PriceType};
use crate::error::Error;

/// JSON error body with the status the failure maps to.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::Validation(_) | Error::Fit(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Deserialize)]
pub struct ProductParams {
    pub product_id: i64,
    #[serde(default)]
    pub price_type: PriceType,
}

#[derive(Debug, Deserialize)]
pub struct CustomerParams {
    pub customer_id: i64,
    #[serde(default)]
    pub price_type: PriceType,
}

#[derive(Debug, Deserialize)]
pub struct PairParams {
    pub customer_id: i64,
    pub product_id: i64,
    #[serde(default)]
    pub price_type: PriceType,
}

#[derive(Debug, Serialize)]
pub struct ElasticityResponse {
    pub scope: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<i64>,
    pub price_type: PriceType,
    #[serde(flatten)]
    pub fit: ElasticityFit,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn product_elasticity(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ProductParams>,
) -> ApiResult<Json<ElasticityResponse>> {
    let fit = fit_on_demand(&state, Some(params.product_id), None, params.price_type).await?;
    Ok(Json(ElasticityResponse {
        scope: "product",
        product_id: Some(params.product_id),
        customer_id: None,
        price_type: params.price_type,
        fit,
    }))
}

pub async fn customer_elasticity(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CustomerParams>,
) -> ApiResult<Json<ElasticityResponse>> {
    let fit = fit_on_demand(&state, None, Some(params.customer_id), params.price_type).await?;
    Ok(Json(ElasticityResponse {
        scope: "customer",
        product_id: None,
        customer_id: Some(params.customer_id),
        price_type: params.price_type,
        fit,
    }))
}

pub async fn customer_product_elasticity(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PairParams>,
) -> ApiResult<Json<ElasticityResponse>> {
    let fit = fit_on_demand(
        &state,
        Some(params.product_id),
        Some(params.customer_id),
        params.price_type,
    )
    .await?;
    Ok(Json(ElasticityResponse {
        scope: "customer_product",
        product_id: Some(params.product_id),
        customer_id: Some(params.customer_id),
        price_type: params.price_type,
        fit,
    }))
}

pub async fn ask(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AskRequest>,
) -> ApiResult<Json<AnalysisReport>> {
    let pipeline = state.pipeline.as_ref().ok_or_else(|| {
        ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "no LLM API key configured; /ask is disabled",
        )
    })?;

    let report = pipeline.run(&request.question).await?;
    Ok(Json(report))
}

async fn fit_on_demand(
    state: &AppState,
    product_id: Option<i64>,
    customer_id: Option<i64>,
    price_type: PriceType,
) -> ApiResult<ElasticityFit> {
    let rows = state
        .db
        .fetch_observations_filtered(product_id, customer_id)
        .await?;
    if rows.is_empty() {
        return Err(ApiError::from(Error::NotFound(
            "no matching orders".to_string(),
        )));
    }

    let points: Vec<PricePoint> = rows.iter().map(|r| r.price_point(price_type)).collect();
    let fit = fit_price_elasticity(&points).map_err(Error::Fit)?;
    Ok(fit)
}
