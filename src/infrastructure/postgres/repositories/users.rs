use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{Connection, RunQueryDsl, prelude::*};
use uuid::Uuid;

use crate::domain::{
    entities::users::{RegisterUserEntity, UserEntity},
    repositories::users::UserRepository,
};
use crate::infrastructure::postgres::{postgres_connection::PgPoolSquad, schema::users};

pub struct UserPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl UserPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl UserRepository for UserPostgres {
    async fn create(&self, register_user_entity: RegisterUserEntity) -> Result<UserEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let user = diesel::insert_into(users::table)
            .values(register_user_entity)
            .returning(UserEntity::as_returning())
            .get_result::<UserEntity>(&mut conn)?;

        Ok(user)
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<UserEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let user = users::table
            .filter(users::id.eq(user_id))
            .select(UserEntity::as_select())
            .first::<UserEntity>(&mut conn)
            .optional()?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let user = users::table
            .filter(users::email.eq(email))
            .select(UserEntity::as_select())
            .first::<UserEntity>(&mut conn)
            .optional()?;

        Ok(user)
    }

    async fn find_by_stripe_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<UserEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let user = users::table
            .filter(users::stripe_customer_id.eq(customer_id))
            .select(UserEntity::as_select())
            .first::<UserEntity>(&mut conn)
            .optional()?;

        Ok(user)
    }

    async fn set_stripe_customer_id(&self, user_id: Uuid, customer_id: &str) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        diesel::update(users::table.filter(users::id.eq(user_id)))
            .set((
                users::stripe_customer_id.eq(customer_id),
                users::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn update_password_hash(&self, user_id: Uuid, password_hash: &str) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        diesel::update(users::table.filter(users::id.eq(user_id)))
            .set((
                users::password_hash.eq(password_hash),
                users::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn assign_plan(
        &self,
        user_id: Uuid,
        plan_id: Uuid,
        stripe_subscription_id: Option<String>,
    ) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        diesel::update(users::table.filter(users::id.eq(user_id)))
            .set((
                users::subscription_plan_id.eq(Some(plan_id)),
                users::stripe_subscription_id.eq(stripe_subscription_id),
                users::content_generations_count.eq(0),
                users::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn increment_generation_count(&self, user_id: Uuid) -> Result<i32> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let new_count = diesel::update(users::table.filter(users::id.eq(user_id)))
            .set((
                users::content_generations_count.eq(users::content_generations_count + 1),
                users::updated_at.eq(Utc::now()),
            ))
            .returning(users::content_generations_count)
            .get_result::<i32>(&mut conn)?;

        Ok(new_count)
    }

    async fn list_all(&self) -> Result<Vec<UserEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let all_users = users::table
            .select(UserEntity::as_select())
            .load::<UserEntity>(&mut conn)?;

        Ok(all_users)
    }

    async fn reset_usage(&self, user_ids: Vec<Uuid>, reset_at: DateTime<Utc>) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        conn.transaction::<_, anyhow::Error, _>(|conn| {
            diesel::update(users::table.filter(users::id.eq_any(&user_ids)))
                .set((
                    users::content_generations_count.eq(0),
                    users::last_reset.eq(Some(reset_at)),
                    users::updated_at.eq(reset_at),
                ))
                .execute(conn)?;

            Ok(())
        })?;

        Ok(())
    }
}
