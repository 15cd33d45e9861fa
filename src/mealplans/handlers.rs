use std::time::Duration;

use axum::{extract::State, routing::post, Json, Router};
use bytes::Bytes;
use tracing::{error, instrument};

use super::{
    dto::{MealPlanRequest, MealPlanResponse},
    services::generate_meal_plan,
};
use crate::{
    error::{AppError, AppResult},
    state::AppState,
};

pub fn mealplan_routes() -> Router<AppState> {
    Router::new().route("/generate-mealplan", post(generate))
}

/// Always 200 once the body decodes; model failures show up only as the
/// `warning` field.
#[instrument(skip(state, body))]
pub async fn generate(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<MealPlanResponse>> {
    let req: MealPlanRequest = serde_json::from_slice(&body).map_err(|e| {
        error!(error = %e, "meal plan request could not be decoded");
        AppError::Internal("Unexpected server error".into())
    })?;

    let timeout = Duration::from_secs(state.config.llm.timeout_secs);
    let outcome = generate_meal_plan(state.meal_planner.as_ref(), &req, timeout).await;
    Ok(Json(outcome.into_response()))
}
