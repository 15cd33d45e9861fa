use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use tracing::{error, info, instrument, warn};

use super::{
    dto::{CheckoutRequest, CheckoutResponse},
    stripe::CheckoutSessionParams,
};
use crate::{
    error::{AppError, AppResult},
    state::AppState,
};

/// Trimmed, non-empty fields of a checkout request.
#[derive(Debug, PartialEq, Eq)]
struct ValidCheckout {
    plan_type: String,
    user_id: String,
    email: String,
}

fn validate(req: CheckoutRequest) -> AppResult<ValidCheckout> {
    let required = |v: Option<String>| {
        v.map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::Validation("Missing fields".into()))
    };
    Ok(ValidCheckout {
        plan_type: required(req.plan_type)?,
        user_id: required(req.user_id)?,
        email: required(req.email)?,
    })
}

/// Opens a hosted checkout for the requested plan. Nothing is persisted
/// here; the profile changes only when the completion webhook arrives.
#[instrument(skip(state, payload))]
pub async fn create_checkout(
    State(state): State<AppState>,
    payload: Result<Json<CheckoutRequest>, JsonRejection>,
) -> AppResult<Json<CheckoutResponse>> {
    let Json(payload) = payload.map_err(|e| {
        warn!(error = %e, "undecodable checkout body");
        AppError::Validation("Missing fields".into())
    })?;

    let req = validate(payload).map_err(|e| {
        warn!(error = %e, "checkout request rejected");
        e
    })?;

    let plan = state
        .catalog
        .find(&req.plan_type)
        .ok_or_else(|| AppError::UnknownPlan(req.plan_type.clone()))?;

    let params = CheckoutSessionParams {
        price_id: plan.price_reference.clone(),
        customer_email: req.email,
        user_id: req.user_id,
        plan_type: plan.identifier.to_string(),
        success_url: format!("{}/mealplan", state.config.public_base_url),
        cancel_url: format!("{}/subscribe", state.config.public_base_url),
    };

    let url = state
        .payments
        .create_checkout_session(&params)
        .await
        .map_err(|e| {
            error!(error = ?e, user_id = %params.user_id, plan = %params.plan_type, "checkout session failed");
            AppError::Upstream(e.to_string())
        })?;

    info!(user_id = %params.user_id, plan = %params.plan_type, "checkout session created");
    Ok(Json(CheckoutResponse { url }))
}
