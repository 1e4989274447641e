//! Subscription lifecycle handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use std::time::Instant;

use tiffin_core::NewSubscription;
use tiffin_types::{ChefId, PlanId, SubscriptionId, UserId};

use crate::error::{ApiError, ApiResult};
use crate::extractors::Actor;
use crate::handlers::shared::{AddressPayload, DeliveryResponse, SubscriptionResponse};
use crate::state::AppState;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateSubscriptionRequest {
    pub chef_id: Option<String>,
    pub plan_id: Option<String>,
    pub plan_name: String,
    pub meals_per_week: i32,
    pub price_cents: i64,
    pub address: AddressPayload,
}

#[derive(Debug, Deserialize)]
pub struct AttachPaymentOrderRequest {
    pub order_ref: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAddressRequest {
    pub address: AddressPayload,
}

fn parse_id(id: &str) -> Result<SubscriptionId, ApiError> {
    SubscriptionId::parse(id)
        .map_err(|_| ApiError::BadRequest("Invalid subscription id".to_string()))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/subscriptions
pub async fn create_subscription(
    State(state): State<AppState>,
    Actor(user_id): Actor,
    Json(req): Json<CreateSubscriptionRequest>,
) -> ApiResult<(StatusCode, Json<SubscriptionResponse>)> {
    let start = Instant::now();

    let chef_id = req
        .chef_id
        .as_deref()
        .map(ChefId::parse)
        .transpose()
        .map_err(|_| ApiError::BadRequest("Invalid chef_id".to_string()))?;
    let plan_id = req
        .plan_id
        .as_deref()
        .map(PlanId::parse)
        .transpose()
        .map_err(|_| ApiError::BadRequest("Invalid plan_id".to_string()))?;

    let sub = state
        .subscriptions
        .create_pending(NewSubscription {
            user_id: UserId(user_id),
            chef_id,
            plan_id,
            plan_name: req.plan_name,
            meals_per_week: req.meals_per_week,
            price_cents: req.price_cents,
            address: req.address.into(),
        })
        .await?;

    metrics::counter!("subscriptions_created_total").increment(1);
    metrics::histogram!("subscription_operation_duration_seconds", "operation" => "create")
        .record(start.elapsed().as_secs_f64());

    tracing::info!(subscription_id = %sub.id, "Subscription created");

    Ok((StatusCode::CREATED, Json(sub.into())))
}

/// GET /api/v1/subscriptions/{id}
pub async fn get_subscription(
    State(state): State<AppState>,
    Actor(user_id): Actor,
    Path(id): Path<String>,
) -> ApiResult<Json<SubscriptionResponse>> {
    let id = parse_id(&id)?;
    let sub = state.subscriptions.get(id, UserId(user_id)).await?;
    Ok(Json(sub.into()))
}

/// POST /api/v1/subscriptions/{id}/payment-order
///
/// Called by the checkout flow once the gateway has issued an order.
pub async fn attach_payment_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AttachPaymentOrderRequest>,
) -> ApiResult<Json<SubscriptionResponse>> {
    let id = parse_id(&id)?;
    let sub = state
        .subscriptions
        .attach_payment_order(id, &req.order_ref)
        .await?;
    Ok(Json(sub.into()))
}

/// POST /api/v1/subscriptions/{id}/pause
pub async fn pause_subscription(
    State(state): State<AppState>,
    Actor(user_id): Actor,
    Path(id): Path<String>,
) -> ApiResult<Json<SubscriptionResponse>> {
    let start = Instant::now();

    let id = parse_id(&id)?;
    let sub = state.subscriptions.pause(id, UserId(user_id)).await?;

    metrics::histogram!("subscription_operation_duration_seconds", "operation" => "pause")
        .record(start.elapsed().as_secs_f64());

    Ok(Json(sub.into()))
}

/// POST /api/v1/subscriptions/{id}/resume
pub async fn resume_subscription(
    State(state): State<AppState>,
    Actor(user_id): Actor,
    Path(id): Path<String>,
) -> ApiResult<Json<SubscriptionResponse>> {
    let start = Instant::now();

    let id = parse_id(&id)?;
    let sub = state.subscriptions.resume(id, UserId(user_id)).await?;

    metrics::histogram!("subscription_operation_duration_seconds", "operation" => "resume")
        .record(start.elapsed().as_secs_f64());

    Ok(Json(sub.into()))
}

/// POST /api/v1/subscriptions/{id}/cancel
pub async fn cancel_subscription(
    State(state): State<AppState>,
    Actor(user_id): Actor,
    Path(id): Path<String>,
) -> ApiResult<Json<SubscriptionResponse>> {
    let start = Instant::now();

    let id = parse_id(&id)?;
    let sub = state.subscriptions.cancel(id, UserId(user_id)).await?;

    metrics::counter!("subscriptions_cancelled_total").increment(1);
    metrics::histogram!("subscription_operation_duration_seconds", "operation" => "cancel")
        .record(start.elapsed().as_secs_f64());

    Ok(Json(sub.into()))
}

/// PUT /api/v1/subscriptions/{id}/address
pub async fn update_subscription_address(
    State(state): State<AppState>,
    Actor(user_id): Actor,
    Path(id): Path<String>,
    Json(req): Json<UpdateAddressRequest>,
) -> ApiResult<Json<SubscriptionResponse>> {
    let id = parse_id(&id)?;
    let sub = state
        .subscriptions
        .update_address(id, UserId(user_id), req.address.into())
        .await?;
    Ok(Json(sub.into()))
}

/// GET /api/v1/subscriptions/{id}/deliveries
pub async fn list_subscription_deliveries(
    State(state): State<AppState>,
    Actor(user_id): Actor,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<DeliveryResponse>>> {
    let id = parse_id(&id)?;
    let deliveries = state
        .subscriptions
        .list_deliveries(id, UserId(user_id))
        .await?;
    Ok(Json(deliveries.into_iter().map(Into::into).collect()))
}
