//! Stripe webhook verification and entitlement reconciliation.
//!
//! Signature scheme: https://stripe.com/docs/webhooks/signatures

use std::collections::HashMap;

use axum::{extract::State, http::HeaderMap, Json};
use bytes::Bytes;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, error, info, instrument, warn};

use super::dto::WebhookAck;
use crate::{
    entitlements::Activation,
    error::{AppError, AppResult},
    state::AppState,
};

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Maximum age of a signed timestamp, in seconds.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Tier recorded when a completed checkout carries no plan metadata.
const DEFAULT_TIER: &str = "pro";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing timestamp in signature header")]
    MissingTimestamp,
    #[error("missing v1 signature in signature header")]
    MissingSignature,
    #[error("timestamp outside tolerance")]
    Stale,
    #[error("signature mismatch")]
    Mismatch,
}

/// Checks a `t=<unix>,v1=<hex>` header against an HMAC-SHA256 of
/// `"{t}.{payload}"`. Any one matching `v1` entry is accepted.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    now: i64,
    tolerance_secs: i64,
) -> Result<(), SignatureError> {
    let mut timestamp: Option<i64> = None;
    let mut candidates: Vec<&str> = Vec::new();

    for part in header.split(',') {
        let part = part.trim();
        if let Some(rest) = part.strip_prefix("t=") {
            timestamp = rest.parse().ok();
        } else if let Some(rest) = part.strip_prefix("v1=") {
            candidates.push(rest);
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::MissingTimestamp)?;
    if candidates.is_empty() {
        return Err(SignatureError::MissingSignature);
    }
    if now.abs_diff(timestamp) > tolerance_secs.unsigned_abs() {
        return Err(SignatureError::Stale);
    }

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::Mismatch)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);

    let matched = candidates.iter().any(|candidate| {
        hex::decode(candidate)
            .map(|provided| mac.clone().verify_slice(&provided).is_ok())
            .unwrap_or(false)
    });

    if matched {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

#[derive(Debug, Deserialize)]
struct EventEnvelope {
    id: Option<String>,
    #[serde(rename = "type")]
    kind: String,
    data: EventData,
}

#[derive(Debug, Deserialize)]
struct EventData {
    object: serde_json::Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerDetails {
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutSession {
    pub id: Option<String>,
    pub subscription: Option<String>,
    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,
    #[serde(default)]
    pub customer_details: Option<CustomerDetails>,
}

impl CheckoutSession {
    fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.get(key))
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Entitlement change implied by this session, if it names a user.
    pub fn activation(&self) -> Option<Activation> {
        let user_id = self.metadata_value("clerkUserId")?;
        Some(Activation {
            user_id: user_id.to_string(),
            email: self
                .customer_details
                .as_ref()
                .and_then(|c| c.email.clone())
                .unwrap_or_default(),
            subscription_tier: self
                .metadata_value("planType")
                .unwrap_or(DEFAULT_TIER)
                .to_string(),
            stripe_subscription_id: self.subscription.clone(),
        })
    }
}

/// Payment events this service understands. Everything else is `Ignored`.
#[derive(Debug, Clone)]
pub enum PaymentEvent {
    CheckoutSessionCompleted(CheckoutSession),
    Ignored { kind: String },
}

impl PaymentEvent {
    pub fn parse(payload: &[u8]) -> anyhow::Result<(Option<String>, PaymentEvent)> {
        let envelope: EventEnvelope = serde_json::from_slice(payload)?;
        let event = match envelope.kind.as_str() {
            "checkout.session.completed" => {
                PaymentEvent::CheckoutSessionCompleted(serde_json::from_value(envelope.data.object)?)
            }
            _ => PaymentEvent::Ignored {
                kind: envelope.kind,
            },
        };
        Ok((envelope.id, event))
    }
}

/// Verifies and reconciles a Stripe event. Signature failures are rejected
/// before the payload is decoded or the store is touched.
#[instrument(skip(state, headers, body), fields(body_len = body.len()))]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<WebhookAck>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let now = OffsetDateTime::now_utc().unix_timestamp();
    if let Err(e) = verify_signature(
        &body,
        signature,
        &state.config.stripe.webhook_secret,
        now,
        DEFAULT_TOLERANCE_SECS,
    ) {
        warn!(error = %e, "webhook signature rejected");
        return Err(AppError::InvalidSignature);
    }

    let (event_id, event) = PaymentEvent::parse(&body).map_err(|e| {
        warn!(error = %e, "verified webhook payload could not be decoded");
        AppError::Validation("Invalid event payload".into())
    })?;

    match event {
        PaymentEvent::CheckoutSessionCompleted(session) => {
            let Some(activation) = session.activation() else {
                info!(event_id = ?event_id, session_id = ?session.id, "checkout completed without user metadata; ignoring");
                return Ok(Json(WebhookAck { received: true }));
            };

            // A failed write is reported as 500 so Stripe redelivers; the
            // upsert converges on replay.
            state.entitlements.activate(&activation).await.map_err(|e| {
                error!(error = ?e, event_id = ?event_id, user_id = %activation.user_id, "entitlement upsert failed");
                AppError::Internal("Webhook processing failed".into())
            })?;

            info!(
                event_id = ?event_id,
                user_id = %activation.user_id,
                tier = %activation.subscription_tier,
                "subscription activated"
            );
        }
        PaymentEvent::Ignored { kind } => {
            debug!(event_id = ?event_id, event_type = %kind, "unhandled event type");
        }
    }

    Ok(Json(WebhookAck { received: true }))
}
