//! Product statistics endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use common::ProductId;
use order_store::Backend;
use serde::{Deserialize, Serialize};
use statistics::MonthlySeries;

use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsQuery {
    pub product_id: Option<String>,
    pub year: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductOrdersResponse {
    pub status: &'static str,
    pub product_orders: MonthlySeries,
}

fn required<T: std::str::FromStr>(field: &str, raw: Option<&str>) -> Result<T, ApiError> {
    let raw = raw.ok_or_else(|| ApiError::Validation(format!("{field}: is required")))?;
    raw.trim()
        .parse()
        .map_err(|_| ApiError::Validation(format!("{field}: must be an integer, got {raw:?}")))
}

/// GET /orders/statistics: ordered quantity per month for one product.
#[tracing::instrument(skip(state))]
pub async fn monthly<S: Backend>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<StatisticsQuery>,
) -> Result<Json<ProductOrdersResponse>, ApiError> {
    let product_id: i64 = required("productId", query.product_id.as_deref())?;
    let year: i32 = required("year", query.year.as_deref())?;

    let product_orders = state
        .statistics
        .monthly_series(ProductId::new(product_id), year)
        .await?;

    Ok(Json(ProductOrdersResponse {
        status: "ok",
        product_orders,
    }))
}
