//! Payment gateway webhook handler

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use chrono::Utc;
use std::time::Instant;

use tiffin_core::{CoreError, PaymentEventType};

use crate::state::AppState;

/// POST /webhooks/payment
///
/// Handle payment gateway events with signature verification.
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let start = Instant::now();

    let Some(sig_header) = headers.get("x-gateway-signature") else {
        tracing::warn!("Missing x-gateway-signature header");
        return StatusCode::BAD_REQUEST;
    };

    let Ok(signature) = sig_header.to_str() else {
        tracing::warn!("Invalid x-gateway-signature header encoding");
        return StatusCode::BAD_REQUEST;
    };

    let event = match state
        .webhook
        .verify_and_parse(&body, signature, Utc::now().timestamp())
    {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(error = ?e, "Webhook verification failed");
            metrics::counter!("payment_webhooks_processed_total", "status" => "rejected")
                .increment(1);
            return StatusCode::BAD_REQUEST;
        }
    };

    let status = match event.event_type {
        PaymentEventType::PaymentConfirmed => {
            let Some(payment_ref) = event.payment_ref.as_deref() else {
                tracing::warn!(event_id = %event.id, "Confirmation event without payment_ref");
                return StatusCode::BAD_REQUEST;
            };

            match state
                .subscriptions
                .confirm_payment(&event.order_ref, payment_ref)
                .await
            {
                Ok(sub) => {
                    tracing::info!(
                        event_id = %event.id,
                        subscription_id = %sub.id,
                        "Payment confirmed"
                    );
                    StatusCode::OK
                }
                // The gateway retries on non-2xx; an order we no longer
                // know about will never succeed, so acknowledge it.
                Err(CoreError::NotFound) => {
                    tracing::warn!(event_id = %event.id, "Payment event for unknown order");
                    StatusCode::OK
                }
                Err(e @ CoreError::Conflict(_)) => {
                    tracing::warn!(event_id = %event.id, error = ?e, "Payment event conflicted");
                    StatusCode::CONFLICT
                }
                Err(e) => {
                    tracing::error!(event_id = %event.id, error = ?e, "Payment processing failed");
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            }
        }
        PaymentEventType::PaymentFailed => {
            tracing::info!(event_id = %event.id, order_ref = %event.order_ref, "Payment failed");
            StatusCode::OK
        }
        PaymentEventType::Unknown(ref kind) => {
            tracing::debug!(event_id = %event.id, kind = %kind, "Ignoring unknown event type");
            StatusCode::OK
        }
    };

    let outcome = if status == StatusCode::OK { "success" } else { "error" };
    metrics::counter!("payment_webhooks_processed_total", "status" => outcome).increment(1);
    metrics::histogram!(
        "subscription_operation_duration_seconds",
        "operation" => "process_webhook"
    )
    .record(start.elapsed().as_secs_f64());

    status
}
