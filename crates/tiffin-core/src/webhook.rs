//! Payment gateway webhook handling
//!
//! The gateway confirms or rejects payments out of band. Events arrive
//! signed; verification happens here, against the raw body, before any
//! parsing. What the gateway asserts about a payment is trusted once
//! the signature checks out.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use tracing::{debug, error, warn};

use crate::error::CoreError;

/// Maximum age of a webhook timestamp in seconds
const MAX_TIMESTAMP_SKEW_SECS: i64 = 300;

/// Webhook event types we handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEventType {
    /// Payment captured successfully
    PaymentConfirmed,
    /// Payment attempt failed
    PaymentFailed,
    /// Unknown event type
    Unknown(String),
}

impl From<&str> for PaymentEventType {
    fn from(s: &str) -> Self {
        match s {
            "payment.confirmed" => Self::PaymentConfirmed,
            "payment.failed" => Self::PaymentFailed,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// Parsed payment webhook event
#[derive(Debug, Clone)]
pub struct PaymentEvent {
    /// Event ID
    pub id: String,
    /// Event type
    pub event_type: PaymentEventType,
    /// Payment order reference the event concerns
    pub order_ref: String,
    /// Gateway payment reference
    pub payment_ref: Option<String>,
    /// When the event was created (Unix timestamp)
    pub created: i64,
}

/// Webhook verifier for payment gateway events
#[derive(Clone)]
pub struct WebhookVerifier {
    webhook_secret: String,
}

impl WebhookVerifier {
    /// Create a new webhook verifier
    pub fn new(webhook_secret: impl Into<String>) -> Self {
        Self {
            webhook_secret: webhook_secret.into(),
        }
    }

    /// Verify and parse a webhook payload
    ///
    /// `signature` is the gateway's header value in the
    /// `t=<timestamp>,v1=<hex hmac>` format; `now_ts` is the current
    /// Unix timestamp, injected so freshness is testable.
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature: &str,
        now_ts: i64,
    ) -> Result<PaymentEvent, CoreError> {
        self.verify_signature(payload, signature, now_ts)?;

        let raw: RawPaymentEvent = serde_json::from_slice(payload)
            .map_err(|e| CoreError::BadInput(format!("malformed webhook payload: {e}")))?;

        debug!(event_id = %raw.id, event_type = %raw.event_type, "Parsed webhook event");

        Ok(PaymentEvent {
            id: raw.id,
            event_type: PaymentEventType::from(raw.event_type.as_str()),
            order_ref: raw.data.order_ref,
            payment_ref: raw.data.payment_ref,
            created: raw.created,
        })
    }

    /// Verify the gateway signature header
    fn verify_signature(
        &self,
        payload: &[u8],
        signature: &str,
        now_ts: i64,
    ) -> Result<(), CoreError> {
        // Parse signature header: t=timestamp,v1=signature
        let mut timestamp: Option<&str> = None;
        let mut sig_v1: Option<&str> = None;

        for part in signature.split(',') {
            if let Some((key, value)) = part.split_once('=') {
                match key {
                    "t" => timestamp = Some(value),
                    "v1" => sig_v1 = Some(value),
                    _ => {}
                }
            }
        }

        let timestamp = timestamp.ok_or_else(|| {
            warn!("Missing timestamp in webhook signature");
            CoreError::BadInput("missing webhook timestamp".to_string())
        })?;

        let sig_v1 = sig_v1.ok_or_else(|| {
            warn!("Missing v1 signature in webhook signature");
            CoreError::BadInput("missing webhook signature".to_string())
        })?;

        let signed_payload = format!(
            "{}.{}",
            timestamp,
            std::str::from_utf8(payload)
                .map_err(|_| CoreError::BadInput("invalid payload encoding".to_string()))?
        );

        let mut mac = Hmac::<Sha256>::new_from_slice(self.webhook_secret.as_bytes())
            .map_err(|_| CoreError::Internal("HMAC error".to_string()))?;
        mac.update(signed_payload.as_bytes());
        let expected = hex::encode(mac.finalize().into_bytes());

        if !constant_time_eq(sig_v1.as_bytes(), expected.as_bytes()) {
            error!("Webhook signature verification failed");
            return Err(CoreError::BadInput(
                "signature verification failed".to_string(),
            ));
        }

        let ts: i64 = timestamp
            .parse()
            .map_err(|_| CoreError::BadInput("invalid timestamp format".to_string()))?;
        if (now_ts - ts).abs() > MAX_TIMESTAMP_SKEW_SECS {
            warn!(timestamp = ts, now = now_ts, "Webhook timestamp too old");
            return Err(CoreError::BadInput("timestamp too old".to_string()));
        }

        Ok(())
    }

    /// Sign a payload the way the gateway does (test helper)
    #[doc(hidden)]
    pub fn sign_for_tests(&self, payload: &[u8], timestamp: i64) -> String {
        let signed_payload = format!(
            "{}.{}",
            timestamp,
            std::str::from_utf8(payload).expect("test payload is utf8")
        );
        let mut mac = Hmac::<Sha256>::new_from_slice(self.webhook_secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(signed_payload.as_bytes());
        format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
    }
}

/// Constant-time comparison
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0, |acc, (x, y)| acc | (x ^ y)) == 0
}

// Raw gateway event for parsing
#[derive(Debug, Deserialize)]
struct RawPaymentEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: RawPaymentData,
    created: i64,
}

#[derive(Debug, Deserialize)]
struct RawPaymentData {
    order_ref: String,
    payment_ref: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";

    fn event_body() -> Vec<u8> {
        serde_json::json!({
            "id": "evt_001",
            "type": "payment.confirmed",
            "created": 1_709_290_000,
            "data": {
                "order_ref": "order_123",
                "payment_ref": "pay_456"
            }
        })
        .to_string()
        .into_bytes()
    }

    #[test]
    fn test_valid_signature_roundtrip() {
        let verifier = WebhookVerifier::new(SECRET);
        let body = event_body();
        let sig = verifier.sign_for_tests(&body, 1_709_290_000);

        let event = verifier
            .verify_and_parse(&body, &sig, 1_709_290_010)
            .unwrap();
        assert_eq!(event.event_type, PaymentEventType::PaymentConfirmed);
        assert_eq!(event.order_ref, "order_123");
        assert_eq!(event.payment_ref.as_deref(), Some("pay_456"));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let verifier = WebhookVerifier::new(SECRET);
        let body = event_body();
        let sig = verifier.sign_for_tests(&body, 1_709_290_000);

        let mut tampered = body.clone();
        tampered[10] ^= 1;

        assert!(verifier
            .verify_and_parse(&tampered, &sig, 1_709_290_010)
            .is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let signer = WebhookVerifier::new("whsec_other");
        let verifier = WebhookVerifier::new(SECRET);
        let body = event_body();
        let sig = signer.sign_for_tests(&body, 1_709_290_000);

        assert!(verifier
            .verify_and_parse(&body, &sig, 1_709_290_010)
            .is_err());
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let verifier = WebhookVerifier::new(SECRET);
        let body = event_body();
        let sig = verifier.sign_for_tests(&body, 1_709_290_000);

        let result = verifier.verify_and_parse(&body, &sig, 1_709_290_000 + 301);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_signature_parts_rejected() {
        let verifier = WebhookVerifier::new(SECRET);
        let body = event_body();

        assert!(verifier
            .verify_and_parse(&body, "t=1709290000", 1_709_290_000)
            .is_err());
        assert!(verifier
            .verify_and_parse(&body, "v1=deadbeef", 1_709_290_000)
            .is_err());
        assert!(verifier.verify_and_parse(&body, "", 1_709_290_000).is_err());
    }

    #[test]
    fn test_unknown_event_type_parsed() {
        let verifier = WebhookVerifier::new(SECRET);
        let body = serde_json::json!({
            "id": "evt_002",
            "type": "refund.created",
            "created": 1_709_290_000,
            "data": { "order_ref": "order_123", "payment_ref": null }
        })
        .to_string()
        .into_bytes();
        let sig = verifier.sign_for_tests(&body, 1_709_290_000);

        let event = verifier
            .verify_and_parse(&body, &sig, 1_709_290_000)
            .unwrap();
        assert_eq!(
            event.event_type,
            PaymentEventType::Unknown("refund.created".to_string())
        );
    }
}
