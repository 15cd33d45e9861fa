use serde::Serialize;

use crate::config::StripeConfig;

/// A purchasable subscription plan.
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    /// Billing interval, also the tier name stored on a profile.
    #[serde(rename = "interval")]
    pub identifier: &'static str,
    #[serde(rename = "name")]
    pub display_name: &'static str,
    #[serde(skip_serializing)]
    pub price_reference: String,
    #[serde(rename = "amount")]
    pub unit_amount: f64,
    #[serde(rename = "currency")]
    pub currency_code: &'static str,
    #[serde(rename = "isPopular")]
    pub is_highlighted: bool,
    pub features: Vec<&'static str>,
}

#[derive(Debug, Clone, Default)]
pub struct PlanCatalog {
    plans: Vec<Plan>,
}

impl PlanCatalog {
    /// Builds the catalog from configured price ids. Intervals without a
    /// configured price are left out.
    pub fn from_stripe_config(cfg: &StripeConfig) -> Self {
        let mut plans = Vec::with_capacity(3);
        if let Some(price) = &cfg.price_week {
            plans.push(Plan {
                identifier: "week",
                display_name: "Weekly Plan",
                price_reference: price.clone(),
                unit_amount: 9.99,
                currency_code: "USD",
                is_highlighted: false,
                features: vec![
                    "Unlimited AI meal plans",
                    "AI nutrition insights",
                    "Cancel anytime",
                ],
            });
        }
        if let Some(price) = &cfg.price_month {
            plans.push(Plan {
                identifier: "month",
                display_name: "Monthly Plan",
                price_reference: price.clone(),
                unit_amount: 39.99,
                currency_code: "USD",
                is_highlighted: true,
                features: vec![
                    "Unlimited AI meal plans",
                    "Priority AI support",
                    "Cancel anytime",
                ],
            });
        }
        if let Some(price) = &cfg.price_year {
            plans.push(Plan {
                identifier: "year",
                display_name: "Yearly Plan",
                price_reference: price.clone(),
                unit_amount: 299.99,
                currency_code: "USD",
                is_highlighted: false,
                features: vec![
                    "Unlimited AI meal plans",
                    "All premium features",
                    "Save over 35% vs monthly",
                ],
            });
        }
        Self { plans }
    }

    pub fn plans(&self) -> &[Plan] {
        &self.plans
    }

    /// Case- and whitespace-insensitive lookup, shared by checkout and
    /// profile display.
    pub fn find(&self, identifier: &str) -> Option<&Plan> {
        let wanted = normalize(identifier);
        if wanted.is_empty() {
            return None;
        }
        self.plans.iter().find(|p| p.identifier == wanted)
    }
}

fn normalize(identifier: &str) -> String {
    identifier.trim().to_ascii_lowercase()
}
