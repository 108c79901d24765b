use serde::Serialize;
use uuid::Uuid;

use crate::config::config_model::FreePlan;
use crate::domain::{
    entities::plans::{PlanEntity, UpsertPlanEntity},
    value_objects::enums::{billing_intervals::BillingInterval, plan_types::PlanType},
};

pub const FREE_PLAN_NAME: &str = "Free";

/// The free-tier plan row as derived from configuration. Used by the startup
/// seeding pass and as a registration-time backstop when the row is missing.
pub fn free_plan_upsert(config: &FreePlan) -> UpsertPlanEntity {
    UpsertPlanEntity {
        name: FREE_PLAN_NAME.to_string(),
        description: Some("Free plan with limited generations".to_string()),
        max_generations: config.max_generations,
        stripe_price_id: Some(config.price_id.clone()),
        unit_amount: 0,
        currency: config.currency.clone(),
        interval: BillingInterval::Month.as_str().to_string(),
        interval_count: 1,
        price_type: PlanType::Recurring.as_str().to_string(),
        is_active: true,
    }
}

/// Generation quotas are not carried by Stripe prices; they are a product
/// decision keyed on (plan name, billing interval). The free tier bypasses
/// this table in favor of the configured constant.
pub fn generation_quota_for(name: &str, interval: BillingInterval) -> Option<i32> {
    match (name, interval) {
        ("Basic", BillingInterval::Month) => Some(20),
        ("Basic", BillingInterval::Year) => Some(240),
        ("Premium", BillingInterval::Month) => Some(50),
        ("Premium", BillingInterval::Year) => Some(600),
        // 0 means unlimited
        ("Unlimited", BillingInterval::Month) => Some(0),
        ("Unlimited", BillingInterval::Year) => Some(0),
        _ => None,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanDto {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub max_generations: i32,
    pub stripe_price_id: Option<String>,
    pub unit_amount: i32,
    pub currency: String,
    pub interval: String,
    pub interval_count: i32,
    pub price_type: String,
}

impl From<PlanEntity> for PlanDto {
    fn from(value: PlanEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            description: value.description,
            max_generations: value.max_generations,
            stripe_price_id: value.stripe_price_id,
            unit_amount: value.unit_amount,
            currency: value.currency,
            interval: value.interval,
            interval_count: value.interval_count,
            price_type: value.price_type,
        }
    }
}
