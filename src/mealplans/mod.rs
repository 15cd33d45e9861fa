use crate::state::AppState;
use axum::Router;

pub mod dto;
mod handlers;
pub mod llm;
pub mod services;

pub use llm::{ChatCompletionsClient, MealPlanModel};

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::mealplan_routes())
}
