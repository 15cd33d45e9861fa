use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tracing::{error, instrument};

use crate::{
    auth::AuthUser,
    error::{AppError, AppResult},
    plans::Plan,
    state::AppState,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatusResponse {
    pub subscription_tier: Option<String>,
    pub subscription_active: bool,
    /// Display details for the current tier, when it names a known plan.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<Plan>,
}

pub fn status_routes() -> Router<AppState> {
    Router::new().route("/profile/subscription-status", get(subscription_status))
}

/// Returns the caller's entitlement, provisioning an inactive profile on
/// first access.
#[instrument(skip(state, user), fields(user_id = %user.user_id))]
pub async fn subscription_status(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<SubscriptionStatusResponse>> {
    let record = state
        .entitlements
        .find_or_provision(&user.user_id, &user.email)
        .await
        .map_err(|e| {
            error!(error = ?e, "subscription status lookup failed");
            AppError::Internal("Internal Error".into())
        })?;

    let plan = record
        .subscription_tier
        .as_deref()
        .and_then(|tier| state.catalog.find(tier))
        .cloned();

    Ok(Json(SubscriptionStatusResponse {
        subscription_tier: record.subscription_tier,
        subscription_active: record.subscription_active,
        plan,
    }))
}
