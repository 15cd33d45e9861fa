use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Profile row holding a user's paid access. One per `user_id`.
#[derive(Debug, Clone, FromRow)]
pub struct EntitlementRecord {
    pub id: Uuid,
    pub user_id: String,                        // auth provider user ID
    pub email: String,
    pub subscription_tier: Option<String>,      // plan identifier, set when active
    pub subscription_active: bool,
    pub stripe_subscription_id: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Fields written when a completed checkout is reconciled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    pub user_id: String,
    /// Only used when the record does not exist yet.
    pub email: String,
    pub subscription_tier: String,
    pub stripe_subscription_id: Option<String>,
}
