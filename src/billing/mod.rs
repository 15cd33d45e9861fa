use crate::state::AppState;
use axum::{routing::post, Router};

mod checkout;
mod dto;
pub mod stripe;
pub mod webhook;

pub use stripe::{CheckoutSessionParams, PaymentGateway, StripeClient};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(checkout::create_checkout))
        .route("/webhooks/stripe", post(webhook::stripe_webhook))
}
