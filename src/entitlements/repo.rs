use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;

use super::repo_types::{Activation, EntitlementRecord};

#[async_trait]
pub trait EntitlementStore: Send + Sync {
    async fn find_by_user(&self, user_id: &str) -> anyhow::Result<Option<EntitlementRecord>>;

    /// Returns the record for `user_id`, creating an inactive one first if
    /// none exists. Never creates a second row.
    async fn find_or_provision(
        &self,
        user_id: &str,
        email: &str,
    ) -> anyhow::Result<EntitlementRecord>;

    /// Atomic create-or-update marking the subscription active.
    async fn activate(&self, activation: &Activation) -> anyhow::Result<EntitlementRecord>;
}

const RECORD_COLUMNS: &str = "id, user_id, email, subscription_tier, subscription_active, \
                              stripe_subscription_id, created_at, updated_at";

#[derive(Clone)]
pub struct PgEntitlementStore {
    db: PgPool,
}

impl PgEntitlementStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EntitlementStore for PgEntitlementStore {
    async fn find_by_user(&self, user_id: &str) -> anyhow::Result<Option<EntitlementRecord>> {
        let record = sqlx::query_as::<_, EntitlementRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM profiles WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .context("select profile")?;
        Ok(record)
    }

    async fn find_or_provision(
        &self,
        user_id: &str,
        email: &str,
    ) -> anyhow::Result<EntitlementRecord> {
        // Separate statements: the SELECT must see a row committed by a
        // concurrent provisioner whose insert won the conflict.
        let inserted = sqlx::query_as::<_, EntitlementRecord>(&format!(
            r#"
            INSERT INTO profiles (user_id, email, subscription_active)
            VALUES ($1, $2, FALSE)
            ON CONFLICT (user_id) DO NOTHING
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("provision profile")?;

        if let Some(record) = inserted {
            tracing::info!(user_id = %user_id, "profile provisioned");
            return Ok(record);
        }

        self.find_by_user(user_id)
            .await?
            .with_context(|| format!("profile {user_id} vanished after conflict"))
    }

    async fn activate(&self, activation: &Activation) -> anyhow::Result<EntitlementRecord> {
        let record = sqlx::query_as::<_, EntitlementRecord>(&format!(
            r#"
            INSERT INTO profiles (user_id, email, subscription_active, subscription_tier, stripe_subscription_id)
            VALUES ($1, $2, TRUE, $3, $4)
            ON CONFLICT (user_id) DO UPDATE
               SET subscription_active    = TRUE,
                   subscription_tier      = EXCLUDED.subscription_tier,
                   stripe_subscription_id = EXCLUDED.stripe_subscription_id,
                   updated_at             = now()
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(&activation.user_id)
        .bind(&activation.email)
        .bind(&activation.subscription_tier)
        .bind(&activation.stripe_subscription_id)
        .fetch_one(&self.db)
        .await
        .context("upsert profile subscription")?;
        Ok(record)
    }
}

#[cfg(test)]
mod pg_tests {
    use super::*;

    fn activation(tier: &str, sub: &str) -> Activation {
        Activation {
            user_id: "user_pg".into(),
            email: "pg@example.com".into(),
            subscription_tier: tier.into(),
            stripe_subscription_id: Some(sub.into()),
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn provision_is_idempotent(pool: PgPool) {
        let store = PgEntitlementStore::new(pool.clone());
        let first = store.find_or_provision("user_pg", "pg@example.com").await.unwrap();
        let second = store.find_or_provision("user_pg", "other@example.com").await.unwrap();
        assert_eq!(first.id, second.id);
        assert!(!second.subscription_active);
        assert_eq!(second.email, "pg@example.com");

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM profiles")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn activate_upserts_single_row(pool: PgPool) {
        let store = PgEntitlementStore::new(pool.clone());
        store.find_or_provision("user_pg", "pg@example.com").await.unwrap();
        for _ in 0..3 {
            store.activate(&activation("month", "sub_1")).await.unwrap();
        }
        let record = store.activate(&activation("year", "sub_2")).await.unwrap();
        assert!(record.subscription_active);
        assert_eq!(record.subscription_tier.as_deref(), Some("year"));
        assert_eq!(record.stripe_subscription_id.as_deref(), Some("sub_2"));

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM profiles")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
