use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};

use crate::config::config_model::DotEnvyConfig;
use crate::domain::{
    repositories::{
        generated_contents::GeneratedContentRepository, plans::PlanRepository,
        users::UserRepository,
    },
    value_objects::generated_contents::GenerateTextRequest,
};
use crate::infrastructure::axum_http::{auth::AuthUser, error_responses};
use crate::infrastructure::postgres::{
    postgres_connection::PgPoolSquad,
    repositories::{
        generated_contents::GeneratedContentPostgres, plans::PlanPostgres, users::UserPostgres,
    },
};
use crate::services::ai_client::GeminiClient;
use crate::usecases::content_generator::{ContentGenerationGateway, ContentGeneratorUseCase};

pub fn routes(db_pool: Arc<PgPoolSquad>, config: Arc<DotEnvyConfig>) -> Router {
    let user_repository = UserPostgres::new(Arc::clone(&db_pool));
    let plan_repository = PlanPostgres::new(Arc::clone(&db_pool));
    let content_repository = GeneratedContentPostgres::new(Arc::clone(&db_pool));
    let gemini_client = GeminiClient::new(config.gemini.api_key.clone(), config.gemini.model.clone());

    let content_generator_usecase = ContentGeneratorUseCase::new(
        Arc::new(user_repository),
        Arc::new(plan_repository),
        Arc::new(content_repository),
        Arc::new(gemini_client),
    );

    Router::new()
        .route("/generate-text", post(generate))
        .with_state(Arc::new(content_generator_usecase))
}

pub async fn generate<U, P, C, G>(
    State(content_generator_usecase): State<Arc<ContentGeneratorUseCase<U, P, C, G>>>,
    auth: AuthUser,
    Json(generate_text_request): Json<GenerateTextRequest>,
) -> impl IntoResponse
where
    U: UserRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    C: GeneratedContentRepository + Send + Sync + 'static,
    G: ContentGenerationGateway + 'static,
{
    match content_generator_usecase
        .generate(auth.user_id, generate_text_request)
        .await
    {
        Ok(content) => (StatusCode::CREATED, Json(content)).into_response(),
        Err(e) => error_responses::failure(e.status_code(), e),
    }
}
