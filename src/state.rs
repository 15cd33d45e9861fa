use std::sync::Arc;

use sqlx::PgPool;

use crate::{
    billing::{PaymentGateway, StripeClient},
    config::AppConfig,
    db,
    entitlements::{EntitlementStore, PgEntitlementStore},
    mealplans::{ChatCompletionsClient, MealPlanModel},
    plans::PlanCatalog,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub catalog: Arc<PlanCatalog>,
    pub entitlements: Arc<dyn EntitlementStore>,
    pub payments: Arc<dyn PaymentGateway>,
    pub meal_planner: Arc<dyn MealPlanModel>,
}

impl AppState {
    /// Builds the production state. Also returns the pool so the caller can
    /// run migrations before serving.
    pub async fn init() -> anyhow::Result<(Self, PgPool)> {
        let config = Arc::new(AppConfig::from_env()?);
        let pool = db::connect(&config.database_url).await?;

        let catalog = Arc::new(PlanCatalog::from_stripe_config(&config.stripe));
        if catalog.plans().is_empty() {
            tracing::warn!("no Stripe price IDs configured; checkout will reject every plan");
        }

        let entitlements =
            Arc::new(PgEntitlementStore::new(pool.clone())) as Arc<dyn EntitlementStore>;
        let payments = Arc::new(StripeClient::new(&config.stripe)?) as Arc<dyn PaymentGateway>;
        let meal_planner =
            Arc::new(ChatCompletionsClient::new(&config.llm)?) as Arc<dyn MealPlanModel>;

        Ok((
            Self::from_parts(config, catalog, entitlements, payments, meal_planner),
            pool,
        ))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        catalog: Arc<PlanCatalog>,
        entitlements: Arc<dyn EntitlementStore>,
        payments: Arc<dyn PaymentGateway>,
        meal_planner: Arc<dyn MealPlanModel>,
    ) -> Self {
        Self {
            config,
            catalog,
            entitlements,
            payments,
            meal_planner,
        }
    }
}
