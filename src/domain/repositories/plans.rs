use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::plans::{PlanEntity, UpsertPlanEntity},
    value_objects::enums::billing_intervals::BillingInterval,
};

#[async_trait]
#[automock]
pub trait PlanRepository {
    async fn find_by_id(&self, plan_id: Uuid) -> Result<Option<PlanEntity>>;
    async fn find_by_stripe_price_id(&self, price_id: &str) -> Result<Option<PlanEntity>>;
    async fn find_active_by_name_and_interval(
        &self,
        name: &str,
        interval: BillingInterval,
    ) -> Result<Option<PlanEntity>>;
    async fn list_active_plans(&self) -> Result<Vec<PlanEntity>>;
    async fn upsert_by_stripe_price_id(&self, plan: UpsertPlanEntity) -> Result<PlanEntity>;
}
