use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::subscription_plans;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = subscription_plans)]
pub struct PlanEntity {
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
    pub is_active: bool,
}

/// Everything the catalog sync is allowed to rewrite on a plan.
/// Create-or-update is a single upsert keyed on `stripe_price_id`.
#[derive(Debug, Clone, PartialEq, Eq, Insertable, AsChangeset)]
#[diesel(table_name = subscription_plans)]
#[diesel(treat_none_as_null = true)]
pub struct UpsertPlanEntity {
    pub name: String,
    pub description: Option<String>,
    pub max_generations: i32,
    pub stripe_price_id: Option<String>,
    pub unit_amount: i32,
    pub currency: String,
    pub interval: String,
    pub interval_count: i32,
    pub price_type: String,
    pub is_active: bool,
}

impl From<&PlanEntity> for UpsertPlanEntity {
    fn from(value: &PlanEntity) -> Self {
        Self {
            name: value.name.clone(),
            description: value.description.clone(),
            max_generations: value.max_generations,
            stripe_price_id: value.stripe_price_id.clone(),
            unit_amount: value.unit_amount,
            currency: value.currency.clone(),
            interval: value.interval.clone(),
            interval_count: value.interval_count,
            price_type: value.price_type.clone(),
            is_active: value.is_active,
        }
    }
}
