use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::{
    entities::{generated_contents::InsertGeneratedContentEntity, plans::PlanEntity},
    repositories::{
        generated_contents::GeneratedContentRepository, plans::PlanRepository,
        users::UserRepository,
    },
    value_objects::generated_contents::{GenerateTextRequest, GeneratedContentDto},
};
use crate::services::ai_client::GeminiClient;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("prompt must not be empty")]
    EmptyPrompt,
    #[error("user not found")]
    UserNotFound,
    #[error("subscription plan could not be determined")]
    PlanUndetermined,
    #[error("generation limit of {limit} reached for the {plan_name} plan")]
    QuotaExceeded { plan_name: String, limit: i32 },
    #[error("content generation failed")]
    GenerationFailed,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl GenerationError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            GenerationError::EmptyPrompt => StatusCode::BAD_REQUEST,
            GenerationError::UserNotFound => StatusCode::NOT_FOUND,
            GenerationError::PlanUndetermined => StatusCode::FORBIDDEN,
            GenerationError::QuotaExceeded { .. } => StatusCode::PAYMENT_REQUIRED,
            GenerationError::GenerationFailed | GenerationError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, GenerationError>;

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ContentGenerationGateway: Send + Sync {
    async fn generate_text(&self, prompt: &str) -> Result<String>;
}

#[async_trait::async_trait]
impl ContentGenerationGateway for GeminiClient {
    async fn generate_text(&self, prompt: &str) -> Result<String> {
        GeminiClient::generate_text(self, prompt).await
    }
}

/// Quota-gated content generation: plan lookup, limit check, model call,
/// then persist and count the generation.
pub struct ContentGeneratorUseCase<U, P, C, G>
where
    U: UserRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    C: GeneratedContentRepository + Send + Sync + 'static,
    G: ContentGenerationGateway + 'static,
{
    user_repo: Arc<U>,
    plan_repo: Arc<P>,
    content_repo: Arc<C>,
    ai_client: Arc<G>,
}

impl<U, P, C, G> ContentGeneratorUseCase<U, P, C, G>
where
    U: UserRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    C: GeneratedContentRepository + Send + Sync + 'static,
    G: ContentGenerationGateway + 'static,
{
    pub fn new(
        user_repo: Arc<U>,
        plan_repo: Arc<P>,
        content_repo: Arc<C>,
        ai_client: Arc<G>,
    ) -> Self {
        Self {
            user_repo,
            plan_repo,
            content_repo,
            ai_client,
        }
    }

    pub async fn generate(
        &self,
        user_id: Uuid,
        request: GenerateTextRequest,
    ) -> UseCaseResult<GeneratedContentDto> {
        let prompt = request.to_prompt();
        if prompt.is_empty() {
            return Err(GenerationError::EmptyPrompt);
        }

        let user = self
            .user_repo
            .find_by_id(user_id)
            .await
            .map_err(GenerationError::Internal)?
            .ok_or(GenerationError::UserNotFound)?;

        let plan = self.resolve_plan(user.subscription_plan_id).await?;

        // 0 means unlimited; counting is skipped entirely for those plans.
        if plan.max_generations > 0 && user.content_generations_count >= plan.max_generations {
            info!(
                user_id = %user_id,
                plan_name = %plan.name,
                limit = plan.max_generations,
                "generation blocked by quota"
            );
            return Err(GenerationError::QuotaExceeded {
                plan_name: plan.name,
                limit: plan.max_generations,
            });
        }

        let generated_text = self.ai_client.generate_text(&prompt).await.map_err(|err| {
            error!(user_id = %user_id, error = ?err, "model call failed");
            GenerationError::GenerationFailed
        })?;

        let record = self
            .content_repo
            .insert(InsertGeneratedContentEntity {
                owner_id: user_id,
                prompt_used: prompt,
                generated_text,
                is_favorite: false,
                created_at: Utc::now(),
            })
            .await
            .map_err(|err| {
                error!(user_id = %user_id, db_error = ?err, "failed to persist generated content");
                GenerationError::Internal(err)
            })?;

        // The counter only moves after a successful generation and insert.
        // A failed model call must never consume quota.
        if plan.max_generations > 0 {
            match self.user_repo.increment_generation_count(user_id).await {
                Ok(new_count) => {
                    info!(
                        user_id = %user_id,
                        count = new_count,
                        limit = plan.max_generations,
                        "generation counted"
                    );
                }
                Err(err) => {
                    // The user already has their content; losing one tick of
                    // the counter is the lesser failure.
                    warn!(user_id = %user_id, db_error = ?err, "failed to count generation");
                }
            }
        }

        Ok(GeneratedContentDto::from(record))
    }

    async fn resolve_plan(&self, plan_id: Option<Uuid>) -> UseCaseResult<PlanEntity> {
        let Some(plan_id) = plan_id else {
            warn!("user has no subscription plan assigned");
            return Err(GenerationError::PlanUndetermined);
        };

        let plan = self
            .plan_repo
            .find_by_id(plan_id)
            .await
            .map_err(GenerationError::Internal)?;

        match plan {
            Some(plan) => Ok(plan),
            None => {
                warn!(plan_id = %plan_id, "user references a plan that no longer exists");
                Err(GenerationError::PlanUndetermined)
            }
        }
    }
}
