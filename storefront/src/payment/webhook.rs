use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

use super::SessionPaymentStatus;
use crate::model::OrderId;

pub const SIGNATURE_HEADER: &str = "stripe-signature";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WebhookError {
    #[error("missing signature header")]
    MissingSignature,
    #[error("malformed signature header")]
    MalformedSignature,
    #[error("signature timestamp outside tolerance")]
    Expired,
    #[error("signature mismatch")]
    Mismatch,
    #[error("invalid webhook payload: {0}")]
    InvalidPayload(String),
}

/// Hex HMAC-SHA256 of `"{timestamp}.{payload}"`.
pub fn sign(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Checks a `t=<unix>,v1=<hex>[,v1=<hex>]` header against the raw body.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance_secs: i64,
    now: i64,
) -> Result<(), WebhookError> {
    let mut timestamp: Option<i64> = None;
    let mut signatures: Vec<Vec<u8>> = Vec::new();
    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            return Err(WebhookError::MalformedSignature);
        };
        match key {
            "t" => timestamp = Some(value.parse().map_err(|_| WebhookError::MalformedSignature)?),
            "v1" => signatures.push(hex::decode(value).map_err(|_| WebhookError::MalformedSignature)?),
            _ => {}
        }
    }
    let timestamp = timestamp.ok_or(WebhookError::MalformedSignature)?;
    if signatures.is_empty() {
        return Err(WebhookError::MalformedSignature);
    }
    if (now - timestamp).abs() > tolerance_secs {
        return Err(WebhookError::Expired);
    }

    let matches = signatures.iter().any(|signature| {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        mac.verify_slice(signature).is_ok()
    });
    if matches { Ok(()) } else { Err(WebhookError::Mismatch) }
}

#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

#[derive(Debug, Deserialize)]
pub struct EventData {
    pub object: SessionObject,
}

#[derive(Debug, Deserialize)]
pub struct SessionObject {
    pub id: String,
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub metadata: std::collections::HashMap<String, String>,
}

/// Payment outcome carried by a checkout-session event.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentEvent {
    pub session_id: String,
    pub status: SessionPaymentStatus,
    pub order_id: Option<OrderId>,
}

impl WebhookEvent {
    pub fn parse(payload: &[u8]) -> Result<Self, WebhookError> {
        serde_json::from_slice(payload).map_err(|e| WebhookError::InvalidPayload(e.to_string()))
    }

    /// `None` for event types that do not settle a payment.
    pub fn payment_event(&self) -> Option<PaymentEvent> {
        let session = &self.data.object;
        let status = match self.event_type.as_str() {
            "checkout.session.completed" => {
                SessionPaymentStatus::from_gateway(session.payment_status.as_deref().unwrap_or(""))
            }
            "checkout.session.async_payment_succeeded" => SessionPaymentStatus::Succeeded,
            "checkout.session.async_payment_failed" | "checkout.session.expired" => SessionPaymentStatus::Failed,
            _ => return None,
        };
        Some(PaymentEvent {
            session_id: session.id.clone(),
            status,
            order_id: session
                .metadata
                .get("order_id")
                .filter(|id| !id.is_empty())
                .map(|id| OrderId::from(id.as_str())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";

    #[test]
    fn test_valid_signature_is_accepted() {
        let body = br#"{"type":"checkout.session.completed"}"#;
        let header = format!("t=1700000000,v1={}", sign(SECRET, 1_700_000_000, body));
        assert_eq!(verify_signature(body, &header, SECRET, 300, 1_700_000_100), Ok(()));
    }

    #[test]
    fn test_tampered_body_is_rejected() {
        let header = format!("t=1700000000,v1={}", sign(SECRET, 1_700_000_000, b"original"));
        assert_eq!(
            verify_signature(b"tampered", &header, SECRET, 300, 1_700_000_000),
            Err(WebhookError::Mismatch)
        );
    }

    #[test]
    fn test_stale_and_malformed_headers() {
        let body = b"{}";
        let header = format!("t=1700000000,v1={}", sign(SECRET, 1_700_000_000, body));
        assert_eq!(
            verify_signature(body, &header, SECRET, 300, 1_700_001_000),
            Err(WebhookError::Expired)
        );
        assert_eq!(
            verify_signature(body, "v1=abcd", SECRET, 300, 0),
            Err(WebhookError::MalformedSignature)
        );
        assert_eq!(
            verify_signature(body, "garbage", SECRET, 300, 0),
            Err(WebhookError::MalformedSignature)
        );
    }

    #[test]
    fn test_event_mapping() {
        let raw = br#"{
            "id": "evt_1",
            "type": "checkout.session.completed",
            "data": {"object": {"id": "cs_1", "payment_status": "paid", "metadata": {"order_id": "ORD-0003"}}}
        }"#;
        let event = WebhookEvent::parse(raw).unwrap().payment_event().unwrap();
        assert_eq!(event.status, SessionPaymentStatus::Succeeded);
        assert_eq!(event.order_id, Some(OrderId::from("ORD-0003")));

        let ignored = br#"{"type": "customer.created", "data": {"object": {"id": "cus_1"}}}"#;
        assert!(WebhookEvent::parse(ignored).unwrap().payment_event().is_none());
    }
}
