use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::config_model::{FreePlan, Stripe as StripeConfig};
use crate::domain::{
    entities::plans::UpsertPlanEntity,
    repositories::plans::PlanRepository,
    value_objects::{
        enums::billing_intervals::BillingInterval,
        plans::{PlanDto, free_plan_upsert, generation_quota_for},
    },
};
use crate::services::stripe_client::StripeCatalogEntry;
use crate::usecases::subscriptions::StripeGateway;

#[derive(Debug, Error)]
pub enum PlanCatalogError {
    #[error("no subscription plans found")]
    NoPlansFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl PlanCatalogError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            PlanCatalogError::NoPlansFound => StatusCode::NOT_FOUND,
            PlanCatalogError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, PlanCatalogError>;

/// Mirrors the recognized slice of the Stripe product/price list into the
/// plans table, and keeps the free tier seeded from configuration.
pub struct PlanCatalogUseCase<P, Stripe>
where
    P: PlanRepository + Send + Sync + 'static,
    Stripe: StripeGateway + Send + Sync + 'static,
{
    plan_repo: Arc<P>,
    stripe_client: Arc<Stripe>,
    recognized_price_ids: Vec<String>,
    free_plan: FreePlan,
}

impl<P, Stripe> PlanCatalogUseCase<P, Stripe>
where
    P: PlanRepository + Send + Sync + 'static,
    Stripe: StripeGateway + Send + Sync + 'static,
{
    pub fn new(
        plan_repo: Arc<P>,
        stripe_client: Arc<Stripe>,
        stripe_config: &StripeConfig,
        free_plan: FreePlan,
    ) -> Self {
        Self {
            plan_repo,
            stripe_client,
            recognized_price_ids: stripe_config.recognized_price_ids.clone(),
            free_plan,
        }
    }

    pub async fn list_plans(&self) -> UseCaseResult<Vec<PlanDto>> {
        let plans = self
            .plan_repo
            .list_active_plans()
            .await
            .map_err(|err| {
                error!(db_error = ?err, "plan_catalog: failed to list active plans");
                PlanCatalogError::Internal(err)
            })?;

        if plans.is_empty() {
            return Err(PlanCatalogError::NoPlansFound);
        }

        Ok(plans.into_iter().map(PlanDto::from).collect())
    }

    /// Pulls the active product/price list from Stripe and upserts every
    /// recognized price. Unchanged plans are skipped entirely, so a second
    /// run against identical upstream data performs zero writes. Each upsert
    /// commits on its own; a failure aborts the sync but does not roll back
    /// plans already written.
    pub async fn sync_catalog(&self) -> UseCaseResult<()> {
        let entries = self.stripe_client.list_active_prices().await.map_err(|err| {
            error!(error = ?err, "plan_catalog: failed to fetch stripe catalog");
            PlanCatalogError::Internal(err)
        })?;

        let mut written = 0usize;
        let mut skipped = 0usize;

        for entry in entries {
            if !self.recognized_price_ids.contains(&entry.price_id) {
                continue;
            }

            let Some(candidate) = self.plan_from_entry(&entry) else {
                continue;
            };

            if self.upsert_if_changed(candidate).await? {
                written += 1;
            } else {
                skipped += 1;
            }
        }

        info!(written, skipped, "plan_catalog: stripe catalog synced");

        Ok(())
    }

    /// Exactly one monthly free plan, reconciled against configuration.
    pub async fn ensure_free_plan(&self) -> UseCaseResult<()> {
        if self.upsert_if_changed(free_plan_upsert(&self.free_plan)).await? {
            info!("plan_catalog: free plan seeded");
        }

        Ok(())
    }

    fn plan_from_entry(&self, entry: &StripeCatalogEntry) -> Option<UpsertPlanEntity> {
        let interval_str = entry.interval.as_deref().unwrap_or("month");
        let Some(interval) = BillingInterval::from_str(interval_str) else {
            warn!(
                price_id = %entry.price_id,
                interval = interval_str,
                "plan_catalog: unsupported billing interval, skipping price"
            );
            return None;
        };

        let max_generations = if entry.price_id == self.free_plan.price_id {
            self.free_plan.max_generations
        } else {
            match generation_quota_for(&entry.name, interval) {
                Some(quota) => quota,
                None => {
                    warn!(
                        plan_name = %entry.name,
                        interval = %interval,
                        "plan_catalog: no quota configured for plan, defaulting to unlimited"
                    );
                    0
                }
            }
        };

        Some(UpsertPlanEntity {
            name: entry.name.clone(),
            description: entry.description.clone(),
            max_generations,
            stripe_price_id: Some(entry.price_id.clone()),
            unit_amount: i32::try_from(entry.unit_amount).unwrap_or(i32::MAX),
            currency: entry.currency.clone(),
            interval: interval.as_str().to_string(),
            interval_count: entry.interval_count.unwrap_or(1),
            price_type: entry.price_type.clone(),
            is_active: true,
        })
    }

    async fn upsert_if_changed(&self, candidate: UpsertPlanEntity) -> UseCaseResult<bool> {
        let price_id = candidate
            .stripe_price_id
            .clone()
            .unwrap_or_default();

        let existing = self
            .plan_repo
            .find_by_stripe_price_id(&price_id)
            .await
            .map_err(PlanCatalogError::Internal)?;

        if let Some(existing) = existing.as_ref() {
            if UpsertPlanEntity::from(existing) == candidate {
                return Ok(false);
            }
        }

        let action = if existing.is_some() { "updated" } else { "created" };

        self.plan_repo
            .upsert_by_stripe_price_id(candidate.clone())
            .await
            .map_err(|err| {
                error!(
                    price_id,
                    db_error = ?err,
                    "plan_catalog: failed to upsert plan"
                );
                PlanCatalogError::Internal(err)
            })?;

        info!(price_id, plan_name = %candidate.name, action, "plan_catalog: plan written");

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        entities::plans::PlanEntity, repositories::plans::MockPlanRepository,
        value_objects::plans::FREE_PLAN_NAME,
    };
    use crate::usecases::subscriptions::MockStripeGateway;
    use mockall::predicate::eq;
    use uuid::Uuid;

    fn stripe_config(recognized: Vec<&str>) -> StripeConfig {
        StripeConfig {
            secret_key: "sk_test".to_string(),
            webhook_secret: "whsec_test".to_string(),
            success_url: "http://localhost/success".to_string(),
            cancel_url: "http://localhost/cancel".to_string(),
            recognized_price_ids: recognized.into_iter().map(String::from).collect(),
        }
    }

    fn free_plan_config() -> FreePlan {
        FreePlan {
            price_id: "price_free_plan".to_string(),
            max_generations: 5,
            currency: "brl".to_string(),
        }
    }

    fn basic_entry() -> StripeCatalogEntry {
        StripeCatalogEntry {
            price_id: "price_basic_m".to_string(),
            name: "Basic".to_string(),
            description: Some("Essential plan for active agents.".to_string()),
            unit_amount: 2000,
            currency: "brl".to_string(),
            interval: Some("month".to_string()),
            interval_count: Some(1),
            price_type: "recurring".to_string(),
        }
    }

    fn stored_basic_plan() -> PlanEntity {
        PlanEntity {
            id: Uuid::new_v4(),
            name: "Basic".to_string(),
            description: Some("Essential plan for active agents.".to_string()),
            max_generations: 20,
            stripe_price_id: Some("price_basic_m".to_string()),
            unit_amount: 2000,
            currency: "brl".to_string(),
            interval: "month".to_string(),
            interval_count: 1,
            price_type: "recurring".to_string(),
            is_active: true,
        }
    }

    #[tokio::test]
    async fn sync_creates_recognized_plans_with_table_quota() {
        let mut stripe = MockStripeGateway::new();
        stripe
            .expect_list_active_prices()
            .returning(|| Ok(vec![basic_entry()]));

        let mut plan_repo = MockPlanRepository::new();
        plan_repo
            .expect_find_by_stripe_price_id()
            .with(eq("price_basic_m"))
            .returning(|_| Box::pin(async { Ok(None) }));
        plan_repo
            .expect_upsert_by_stripe_price_id()
            .withf(|plan| plan.name == "Basic" && plan.max_generations == 20 && plan.is_active)
            .times(1)
            .returning(|_| {
                let plan = stored_basic_plan();
                Box::pin(async move { Ok(plan) })
            });

        let usecase = PlanCatalogUseCase::new(
            Arc::new(plan_repo),
            Arc::new(stripe),
            &stripe_config(vec!["price_basic_m"]),
            free_plan_config(),
        );

        usecase.sync_catalog().await.unwrap();
    }

    #[tokio::test]
    async fn sync_skips_unrecognized_prices() {
        let mut stripe = MockStripeGateway::new();
        stripe.expect_list_active_prices().returning(|| {
            let mut entry = basic_entry();
            entry.price_id = "price_rogue".to_string();
            Ok(vec![entry])
        });

        // No recognized entries, so the repository is never touched.
        let plan_repo = MockPlanRepository::new();

        let usecase = PlanCatalogUseCase::new(
            Arc::new(plan_repo),
            Arc::new(stripe),
            &stripe_config(vec!["price_basic_m"]),
            free_plan_config(),
        );

        usecase.sync_catalog().await.unwrap();
    }

    #[tokio::test]
    async fn sync_with_unchanged_upstream_data_performs_zero_writes() {
        let mut stripe = MockStripeGateway::new();
        stripe
            .expect_list_active_prices()
            .returning(|| Ok(vec![basic_entry()]));

        let mut plan_repo = MockPlanRepository::new();
        plan_repo
            .expect_find_by_stripe_price_id()
            .returning(|_| {
                let plan = stored_basic_plan();
                Box::pin(async move { Ok(Some(plan)) })
            });
        plan_repo.expect_upsert_by_stripe_price_id().times(0);

        let usecase = PlanCatalogUseCase::new(
            Arc::new(plan_repo),
            Arc::new(stripe),
            &stripe_config(vec!["price_basic_m"]),
            free_plan_config(),
        );

        usecase.sync_catalog().await.unwrap();
    }

    #[tokio::test]
    async fn sync_overwrites_drifted_fields() {
        let mut stripe = MockStripeGateway::new();
        stripe.expect_list_active_prices().returning(|| {
            let mut entry = basic_entry();
            entry.unit_amount = 2500;
            Ok(vec![entry])
        });

        let mut plan_repo = MockPlanRepository::new();
        plan_repo
            .expect_find_by_stripe_price_id()
            .returning(|_| {
                let plan = stored_basic_plan();
                Box::pin(async move { Ok(Some(plan)) })
            });
        plan_repo
            .expect_upsert_by_stripe_price_id()
            .withf(|plan| plan.unit_amount == 2500)
            .times(1)
            .returning(|_| {
                let mut plan = stored_basic_plan();
                plan.unit_amount = 2500;
                Box::pin(async move { Ok(plan) })
            });

        let usecase = PlanCatalogUseCase::new(
            Arc::new(plan_repo),
            Arc::new(stripe),
            &stripe_config(vec!["price_basic_m"]),
            free_plan_config(),
        );

        usecase.sync_catalog().await.unwrap();
    }

    #[tokio::test]
    async fn ensure_free_plan_seeds_from_configuration() {
        let mut plan_repo = MockPlanRepository::new();
        plan_repo
            .expect_find_by_stripe_price_id()
            .with(eq("price_free_plan"))
            .returning(|_| Box::pin(async { Ok(None) }));
        plan_repo
            .expect_upsert_by_stripe_price_id()
            .withf(|plan| {
                plan.name == FREE_PLAN_NAME
                    && plan.max_generations == 5
                    && plan.unit_amount == 0
                    && plan.interval == "month"
            })
            .times(1)
            .returning(|_| {
                let mut plan = stored_basic_plan();
                plan.name = FREE_PLAN_NAME.to_string();
                Box::pin(async move { Ok(plan) })
            });

        let usecase = PlanCatalogUseCase::new(
            Arc::new(plan_repo),
            Arc::new(MockStripeGateway::new()),
            &stripe_config(vec![]),
            free_plan_config(),
        );

        usecase.ensure_free_plan().await.unwrap();
    }

    #[tokio::test]
    async fn list_plans_with_empty_catalog_is_not_found() {
        let mut plan_repo = MockPlanRepository::new();
        plan_repo
            .expect_list_active_plans()
            .returning(|| Box::pin(async { Ok(vec![]) }));

        let usecase = PlanCatalogUseCase::new(
            Arc::new(plan_repo),
            Arc::new(MockStripeGateway::new()),
            &stripe_config(vec![]),
            free_plan_config(),
        );

        let result = usecase.list_plans().await;
        assert!(matches!(result, Err(PlanCatalogError::NoPlansFound)));
    }
}
