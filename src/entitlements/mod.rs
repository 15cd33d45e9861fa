use crate::state::AppState;
use axum::Router;

mod handlers;
pub mod repo;
mod repo_types;

pub use repo::{EntitlementStore, PgEntitlementStore};
pub use repo_types::{Activation, EntitlementRecord};

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::status_routes())
}
