use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::generated_contents::{GeneratedContentEntity, InsertGeneratedContentEntity},
    value_objects::generated_contents::HistoryFilter,
};

#[async_trait]
#[automock]
pub trait GeneratedContentRepository {
    async fn insert(
        &self,
        insert_entity: InsertGeneratedContentEntity,
    ) -> Result<GeneratedContentEntity>;
    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        filter: HistoryFilter,
    ) -> Result<Vec<GeneratedContentEntity>>;
    async fn set_favorite(
        &self,
        content_id: i64,
        owner_id: Uuid,
        is_favorite: bool,
    ) -> Result<Option<GeneratedContentEntity>>;
}
