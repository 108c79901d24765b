use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::{
    repositories::generated_contents::GeneratedContentRepository,
    value_objects::generated_contents::HistoryFilter,
};
use crate::infrastructure::axum_http::{auth::AuthUser, error_responses};
use crate::infrastructure::postgres::{
    postgres_connection::PgPoolSquad, repositories::generated_contents::GeneratedContentPostgres,
};
use crate::usecases::history::HistoryUseCase;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub is_favorite: Option<bool>,
    pub search: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    20
}

impl From<HistoryQuery> for HistoryFilter {
    fn from(query: HistoryQuery) -> Self {
        Self {
            is_favorite: query.is_favorite,
            search: query.search,
            start_date: query.start_date,
            end_date: query.end_date,
            skip: query.skip,
            limit: query.limit,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FavoriteModel {
    pub is_favorite: bool,
}

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let content_repository = GeneratedContentPostgres::new(Arc::clone(&db_pool));
    let history_usecase = HistoryUseCase::new(Arc::new(content_repository));

    Router::new()
        .route("/contents", get(list))
        .route("/contents/:content_id/favorite", patch(set_favorite))
        .with_state(Arc::new(history_usecase))
}

pub async fn list<C>(
    State(history_usecase): State<Arc<HistoryUseCase<C>>>,
    auth: AuthUser,
    Query(query): Query<HistoryQuery>,
) -> impl IntoResponse
where
    C: GeneratedContentRepository + Send + Sync + 'static,
{
    match history_usecase.list(auth.user_id, query.into()).await {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(e) => error_responses::failure(e.status_code(), e),
    }
}

pub async fn set_favorite<C>(
    State(history_usecase): State<Arc<HistoryUseCase<C>>>,
    auth: AuthUser,
    Path(content_id): Path<i64>,
    Json(favorite_model): Json<FavoriteModel>,
) -> impl IntoResponse
where
    C: GeneratedContentRepository + Send + Sync + 'static,
{
    match history_usecase
        .set_favorite(auth.user_id, content_id, favorite_model.is_favorite)
        .await
    {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(e) => error_responses::failure(e.status_code(), e),
    }
}
