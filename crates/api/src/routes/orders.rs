//! Checkout, status and queue endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use common::{AggregateId, BranchId, PaymentTypeId, ProductId};
use domain::{ChangeStatus, Checkout, CheckoutItem};
use order_store::{Backend, HydratedAggregate};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::caller::Caller;
use crate::error::{ApiError, parse_id};

// -- Request types --

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub branch_id: i64,
    pub payment_type_id: i64,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub line_items: Vec<LineItemRequest>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemRequest {
    pub product_id: i64,
    pub quantity: i64,
}

#[derive(Deserialize)]
pub struct ChangeStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingQuery {
    pub branch_id: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderResponse {
    pub status: &'static str,
    pub new_order: HydratedAggregate,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifiedOrderResponse {
    pub status: &'static str,
    pub modified_order: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingOrdersResponse {
    pub status: &'static str,
    pub not_received_orders: Vec<HydratedAggregate>,
}

#[derive(Serialize)]
pub struct PendingOrderResponse {
    pub status: &'static str,
    pub order: Option<HydratedAggregate>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPendingOrdersResponse {
    pub status: &'static str,
    pub user_not_received_orders: Vec<HydratedAggregate>,
}

// -- Handlers --

/// POST /orders: check out the caller's selection.
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: Backend>(
    State(state): State<Arc<AppState<S>>>,
    Caller(user_id): Caller,
    payload: Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<Json<NewOrderResponse>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;

    let line_items = req
        .line_items
        .into_iter()
        .map(|item| CheckoutItem::new(ProductId::new(item.product_id), item.quantity))
        .collect();
    let cmd = Checkout {
        user_id,
        branch_id: BranchId::new(req.branch_id),
        payment_type_id: PaymentTypeId::new(req.payment_type_id),
        address: req.address,
        message: req.message,
        line_items,
    };

    let new_order = state.lifecycle.create_order(cmd).await?;
    Ok(Json(NewOrderResponse {
        status: "ok",
        new_order,
    }))
}

/// PUT /orders/{id}/status: move an order along the workflow.
#[tracing::instrument(skip(state, payload))]
pub async fn change_status<S: Backend>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    payload: Result<Json<ChangeStatusRequest>, JsonRejection>,
) -> Result<Json<ModifiedOrderResponse>, ApiError> {
    let aggregate_id = AggregateId::new(parse_id("id", &id)?);
    let Json(req) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;

    let outcome = state
        .lifecycle
        .change_status(ChangeStatus::new(aggregate_id, req.status))
        .await?;

    Ok(Json(ModifiedOrderResponse {
        status: "ok",
        modified_order: outcome.affected(),
    }))
}

/// GET /orders/pending: the operator queue, optionally for one branch.
///
/// An absent, empty or literal `null` branch id means every branch.
#[tracing::instrument(skip(state))]
pub async fn list_pending<S: Backend>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<PendingQuery>,
) -> Result<Json<PendingOrdersResponse>, ApiError> {
    let branch_id = match query.branch_id.as_deref().map(str::trim) {
        None | Some("") | Some("null") => None,
        Some(raw) => Some(BranchId::new(parse_id("branchId", raw)?)),
    };

    let not_received_orders = state.lifecycle.list_pending(branch_id).await?;
    Ok(Json(PendingOrdersResponse {
        status: "ok",
        not_received_orders,
    }))
}

/// GET /orders/pending/{id}: one non-received order, or `null`.
#[tracing::instrument(skip(state))]
pub async fn get_pending<S: Backend>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<PendingOrderResponse>, ApiError> {
    let aggregate_id = AggregateId::new(parse_id("id", &id)?);
    let order = state.lifecycle.get_pending_order(aggregate_id).await?;
    Ok(Json(PendingOrderResponse {
        status: "ok",
        order,
    }))
}

/// GET /orders/mine: the caller's own non-received orders.
#[tracing::instrument(skip(state))]
pub async fn list_mine<S: Backend>(
    State(state): State<Arc<AppState<S>>>,
    Caller(user_id): Caller,
) -> Result<Json<UserPendingOrdersResponse>, ApiError> {
    let user_not_received_orders = state.lifecycle.list_user_pending(user_id).await?;
    Ok(Json(UserPendingOrdersResponse {
        status: "ok",
        user_not_received_orders,
    }))
}
