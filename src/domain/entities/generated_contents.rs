use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::generated_contents;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = generated_contents)]
pub struct GeneratedContentEntity {
    pub id: i64,
    pub owner_id: Uuid,
    pub prompt_used: String,
    pub generated_text: String,
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = generated_contents)]
pub struct InsertGeneratedContentEntity {
    pub owner_id: Uuid,
    pub prompt_used: String,
    pub generated_text: String,
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
}
