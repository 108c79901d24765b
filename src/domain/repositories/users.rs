use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::users::{RegisterUserEntity, UserEntity};

#[async_trait]
#[automock]
pub trait UserRepository {
    async fn create(&self, register_user_entity: RegisterUserEntity) -> Result<UserEntity>;
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<UserEntity>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>>;
    async fn find_by_stripe_customer_id(&self, customer_id: &str)
    -> Result<Option<UserEntity>>;
    async fn set_stripe_customer_id(&self, user_id: Uuid, customer_id: &str) -> Result<()>;
    async fn update_password_hash(&self, user_id: Uuid, password_hash: &str) -> Result<()>;

    /// Rewrites the user's entitlement in one statement: plan reference,
    /// subscription id, and a usage counter reset to zero. A blind overwrite,
    /// so webhook redeliveries converge to the same state.
    async fn assign_plan(
        &self,
        user_id: Uuid,
        plan_id: Uuid,
        stripe_subscription_id: Option<String>,
    ) -> Result<()>;

    /// Atomic `count = count + 1`, returning the new counter value.
    async fn increment_generation_count(&self, user_id: Uuid) -> Result<i32>;

    async fn list_all(&self) -> Result<Vec<UserEntity>>;

    /// Zeroes counters and stamps `last_reset` for all given users inside a
    /// single transaction; any failure rolls the whole batch back.
    async fn reset_usage(&self, user_ids: Vec<Uuid>, reset_at: DateTime<Utc>) -> Result<()>;
}
