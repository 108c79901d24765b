use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, prelude::*};
use uuid::Uuid;

use crate::domain::{
    entities::plans::{PlanEntity, UpsertPlanEntity},
    repositories::plans::PlanRepository,
    value_objects::enums::billing_intervals::BillingInterval,
};
use crate::infrastructure::postgres::{
    postgres_connection::PgPoolSquad, schema::subscription_plans,
};

pub struct PlanPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PlanPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PlanRepository for PlanPostgres {
    async fn find_by_id(&self, plan_id: Uuid) -> Result<Option<PlanEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let plan = subscription_plans::table
            .filter(subscription_plans::id.eq(plan_id))
            .select(PlanEntity::as_select())
            .first::<PlanEntity>(&mut conn)
            .optional()?;

        Ok(plan)
    }

    async fn find_by_stripe_price_id(&self, price_id: &str) -> Result<Option<PlanEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let plan = subscription_plans::table
            .filter(subscription_plans::stripe_price_id.eq(price_id))
            .select(PlanEntity::as_select())
            .first::<PlanEntity>(&mut conn)
            .optional()?;

        Ok(plan)
    }

    async fn find_active_by_name_and_interval(
        &self,
        name: &str,
        interval: BillingInterval,
    ) -> Result<Option<PlanEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let plan = subscription_plans::table
            .filter(subscription_plans::name.eq(name))
            .filter(subscription_plans::interval.eq(interval.as_str()))
            .filter(subscription_plans::is_active.eq(true))
            .select(PlanEntity::as_select())
            .first::<PlanEntity>(&mut conn)
            .optional()?;

        Ok(plan)
    }

    async fn list_active_plans(&self) -> Result<Vec<PlanEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let plans = subscription_plans::table
            .filter(subscription_plans::is_active.eq(true))
            .order(subscription_plans::unit_amount.asc())
            .select(PlanEntity::as_select())
            .load::<PlanEntity>(&mut conn)?;

        Ok(plans)
    }

    async fn upsert_by_stripe_price_id(&self, plan: UpsertPlanEntity) -> Result<PlanEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let upserted = diesel::insert_into(subscription_plans::table)
            .values((subscription_plans::id.eq(Uuid::new_v4()), plan.clone()))
            .on_conflict(subscription_plans::stripe_price_id)
            .do_update()
            .set(plan)
            .returning(PlanEntity::as_returning())
            .get_result::<PlanEntity>(&mut conn)?;

        Ok(upserted)
    }
}
