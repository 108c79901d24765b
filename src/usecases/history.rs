use std::sync::Arc;

use thiserror::Error;
use tracing::error;
use uuid::Uuid;

use crate::domain::{
    repositories::generated_contents::GeneratedContentRepository,
    value_objects::generated_contents::{GeneratedContentDto, HistoryFilter},
};

const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("content not found")]
    ContentNotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl HistoryError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            HistoryError::ContentNotFound => StatusCode::NOT_FOUND,
            HistoryError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, HistoryError>;

/// Per-user generation history: filtered listing and the favorite toggle.
pub struct HistoryUseCase<C>
where
    C: GeneratedContentRepository + Send + Sync + 'static,
{
    content_repo: Arc<C>,
}

impl<C> HistoryUseCase<C>
where
    C: GeneratedContentRepository + Send + Sync + 'static,
{
    pub fn new(content_repo: Arc<C>) -> Self {
        Self { content_repo }
    }

    pub async fn list(
        &self,
        owner_id: Uuid,
        mut filter: HistoryFilter,
    ) -> UseCaseResult<Vec<GeneratedContentDto>> {
        filter.skip = filter.skip.max(0);
        if filter.limit <= 0 || filter.limit > MAX_PAGE_SIZE {
            filter.limit = MAX_PAGE_SIZE;
        }

        let records = self
            .content_repo
            .list_by_owner(owner_id, filter)
            .await
            .map_err(|err| {
                error!(owner_id = %owner_id, db_error = ?err, "history: listing failed");
                HistoryError::Internal(err)
            })?;

        Ok(records.into_iter().map(GeneratedContentDto::from).collect())
    }

    /// Ownership is enforced in the query itself: flipping someone else's
    /// record reports not-found rather than leaking its existence.
    pub async fn set_favorite(
        &self,
        owner_id: Uuid,
        content_id: i64,
        is_favorite: bool,
    ) -> UseCaseResult<GeneratedContentDto> {
        let updated = self
            .content_repo
            .set_favorite(content_id, owner_id, is_favorite)
            .await
            .map_err(|err| {
                error!(
                    owner_id = %owner_id,
                    content_id,
                    db_error = ?err,
                    "history: favorite update failed"
                );
                HistoryError::Internal(err)
            })?;

        updated
            .map(GeneratedContentDto::from)
            .ok_or(HistoryError::ContentNotFound)
    }
}
