use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, prelude::*};
use uuid::Uuid;

use crate::domain::{
    entities::generated_contents::{GeneratedContentEntity, InsertGeneratedContentEntity},
    repositories::generated_contents::GeneratedContentRepository,
    value_objects::generated_contents::HistoryFilter,
};
use crate::infrastructure::postgres::{
    postgres_connection::PgPoolSquad, schema::generated_contents,
};

pub struct GeneratedContentPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl GeneratedContentPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl GeneratedContentRepository for GeneratedContentPostgres {
    async fn insert(
        &self,
        insert_entity: InsertGeneratedContentEntity,
    ) -> Result<GeneratedContentEntity> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let content = diesel::insert_into(generated_contents::table)
            .values(insert_entity)
            .returning(GeneratedContentEntity::as_returning())
            .get_result::<GeneratedContentEntity>(&mut conn)?;

        Ok(content)
    }

    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        filter: HistoryFilter,
    ) -> Result<Vec<GeneratedContentEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let mut query = generated_contents::table
            .filter(generated_contents::owner_id.eq(owner_id))
            .into_boxed();

        if let Some(is_favorite) = filter.is_favorite {
            query = query.filter(generated_contents::is_favorite.eq(is_favorite));
        }

        if let Some(search) = filter.search {
            let pattern = format!("%{}%", search);
            query = query.filter(
                generated_contents::prompt_used
                    .ilike(pattern.clone())
                    .or(generated_contents::generated_text.ilike(pattern)),
            );
        }

        if let Some(start_date) = filter.start_date {
            query = query.filter(generated_contents::created_at.ge(start_date));
        }

        if let Some(end_date) = filter.end_date {
            query = query.filter(generated_contents::created_at.le(end_date));
        }

        let contents = query
            .order(generated_contents::created_at.desc())
            .offset(filter.skip)
            .limit(filter.limit)
            .select(GeneratedContentEntity::as_select())
            .load::<GeneratedContentEntity>(&mut conn)?;

        Ok(contents)
    }

    async fn set_favorite(
        &self,
        content_id: i64,
        owner_id: Uuid,
        is_favorite: bool,
    ) -> Result<Option<GeneratedContentEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let content = diesel::update(
            generated_contents::table
                .filter(generated_contents::id.eq(content_id))
                .filter(generated_contents::owner_id.eq(owner_id)),
        )
        .set(generated_contents::is_favorite.eq(is_favorite))
        .returning(GeneratedContentEntity::as_returning())
        .get_result::<GeneratedContentEntity>(&mut conn)
        .optional()?;

        Ok(content)
    }
}
