use axum::{extract::State, routing::get, Json, Router};

use super::catalog::Plan;
use crate::state::AppState;

pub fn plan_routes() -> Router<AppState> {
    Router::new().route("/plans", get(list_plans))
}

pub async fn list_plans(State(state): State<AppState>) -> Json<Vec<Plan>> {
    Json(state.catalog.plans().to_vec())
}
