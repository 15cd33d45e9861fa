use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use tracing::{debug, error};

use crate::config::StripeConfig;

/// Everything needed to open a hosted subscription checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionParams {
    pub price_id: String,
    pub customer_email: String,
    pub user_id: String,
    pub plan_type: String,
    pub success_url: String,
    pub cancel_url: String,
}

impl CheckoutSessionParams {
    /// Form fields for `POST /v1/checkout/sessions`.
    pub fn to_form(&self) -> Vec<(&'static str, String)> {
        vec![
            ("mode", "subscription".to_string()),
            ("payment_method_types[0]", "card".to_string()),
            ("line_items[0][price]", self.price_id.clone()),
            ("line_items[0][quantity]", "1".to_string()),
            ("customer_email", self.customer_email.clone()),
            ("metadata[clerkUserId]", self.user_id.clone()),
            ("metadata[planType]", self.plan_type.clone()),
            ("success_url", self.success_url.clone()),
            ("cancel_url", self.cancel_url.clone()),
        ]
    }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a hosted checkout session and returns its redirect URL.
    async fn create_checkout_session(&self, params: &CheckoutSessionParams)
        -> anyhow::Result<String>;
}

/// Minimal Stripe REST client.
#[derive(Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    api_base: String,
    secret_key: String,
}

#[derive(Debug, Deserialize)]
struct StripeErrorEnvelope {
    error: StripeErrorDetails,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetails {
    #[serde(rename = "type")]
    type_: Option<String>,
    code: Option<String>,
    message: Option<String>,
}

impl StripeClient {
    pub fn new(cfg: &StripeConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("build stripe http client")?;
        Ok(Self {
            http,
            api_base: cfg.api_base.trim_end_matches('/').to_string(),
            secret_key: cfg.secret_key.clone(),
        })
    }

    async fn ensure_success(
        resp: reqwest::Response,
        context: &str,
    ) -> anyhow::Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        let details = serde_json::from_str::<StripeErrorEnvelope>(&body)
            .ok()
            .map(|e| e.error);

        error!(
            %status,
            stripe_error_type = ?details.as_ref().and_then(|d| d.type_.as_deref()),
            stripe_error_code = ?details.as_ref().and_then(|d| d.code.as_deref()),
            context = %context,
            "stripe api request failed"
        );

        match details.and_then(|d| d.message) {
            Some(message) => anyhow::bail!(message),
            None => anyhow::bail!("Stripe API request failed: {} (status {})", context, status),
        }
    }
}

#[async_trait]
impl PaymentGateway for StripeClient {
    async fn create_checkout_session(
        &self,
        params: &CheckoutSessionParams,
    ) -> anyhow::Result<String> {
        let resp = self
            .http
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .form(&params.to_form())
            .send()
            .await
            .context("stripe checkout request")?;
        let resp = Self::ensure_success(resp, "create checkout session").await?;

        #[derive(Deserialize)]
        struct CheckoutResp {
            id: Option<String>,
            url: Option<String>,
        }

        let parsed: CheckoutResp = resp.json().await.context("decode checkout session")?;
        debug!(session_id = ?parsed.id, "checkout session created");
        parsed
            .url
            .filter(|u| !u.is_empty())
            .ok_or_else(|| anyhow::anyhow!("Stripe Checkout session URL is missing"))
    }
}
