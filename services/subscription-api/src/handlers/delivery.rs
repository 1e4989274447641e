//! Delivery modification handlers

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use std::time::Instant;

use tiffin_types::{ChefId, DeliveryId, UserId};

use crate::error::{ApiError, ApiResult};
use crate::extractors::Actor;
use crate::handlers::shared::{AddressPayload, DeliveryResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChangeDeliveryAddressRequest {
    pub address: AddressPayload,
}

fn parse_id(id: &str) -> Result<DeliveryId, ApiError> {
    DeliveryId::parse(id).map_err(|_| ApiError::BadRequest("Invalid delivery id".to_string()))
}

/// POST /api/v1/deliveries/{id}/skip
pub async fn skip_delivery(
    State(state): State<AppState>,
    Actor(user_id): Actor,
    Path(id): Path<String>,
) -> ApiResult<Json<DeliveryResponse>> {
    let start = Instant::now();

    let id = parse_id(&id)?;
    let delivery = state.deliveries.skip(id, UserId(user_id)).await?;

    metrics::counter!("deliveries_skipped_total").increment(1);
    metrics::histogram!("subscription_operation_duration_seconds", "operation" => "skip")
        .record(start.elapsed().as_secs_f64());

    Ok(Json(delivery.into()))
}

/// PUT /api/v1/deliveries/{id}/address
pub async fn change_delivery_address(
    State(state): State<AppState>,
    Actor(user_id): Actor,
    Path(id): Path<String>,
    Json(req): Json<ChangeDeliveryAddressRequest>,
) -> ApiResult<Json<DeliveryResponse>> {
    let start = Instant::now();

    let id = parse_id(&id)?;
    let delivery = state
        .deliveries
        .change_address(id, UserId(user_id), req.address.into())
        .await?;

    metrics::histogram!("subscription_operation_duration_seconds", "operation" => "change_address")
        .record(start.elapsed().as_secs_f64());

    Ok(Json(delivery.into()))
}

/// POST /api/v1/deliveries/{id}/delivered
///
/// The acting user must be the delivery's chef.
pub async fn mark_delivered(
    State(state): State<AppState>,
    Actor(user_id): Actor,
    Path(id): Path<String>,
) -> ApiResult<Json<DeliveryResponse>> {
    let start = Instant::now();

    let id = parse_id(&id)?;
    let delivery = state.deliveries.mark_delivered(id, ChefId(user_id)).await?;

    metrics::counter!("deliveries_completed_total").increment(1);
    metrics::histogram!("subscription_operation_duration_seconds", "operation" => "mark_delivered")
        .record(start.elapsed().as_secs_f64());

    Ok(Json(delivery.into()))
}
