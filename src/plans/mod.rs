use crate::state::AppState;
use axum::Router;

pub mod catalog;
mod handlers;

pub use catalog::{Plan, PlanCatalog};

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::plan_routes())
}
