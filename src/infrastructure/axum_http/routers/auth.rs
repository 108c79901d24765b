use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use crate::config::config_model::DotEnvyConfig;
use crate::domain::{
    repositories::{plans::PlanRepository, users::UserRepository},
    value_objects::users::{LoginModel, RegisterUserModel},
};
use crate::infrastructure::axum_http::{auth::AuthUser, error_responses};
use crate::infrastructure::postgres::{
    postgres_connection::PgPoolSquad,
    repositories::{plans::PlanPostgres, users::UserPostgres},
};
use crate::services::email_client::Mailer;
use crate::usecases::auth::AuthUseCase;

pub fn routes(db_pool: Arc<PgPoolSquad>, config: Arc<DotEnvyConfig>, mailer: Mailer) -> Router {
    let user_repository = UserPostgres::new(Arc::clone(&db_pool));
    let plan_repository = PlanPostgres::new(Arc::clone(&db_pool));
    let auth_usecase = AuthUseCase::new(
        Arc::new(user_repository),
        Arc::new(plan_repository),
        mailer,
        config.auth.clone(),
        config.free_plan.clone(),
    );

    Router::new()
        .route("/register", post(register))
        .route("/token", post(login))
        .route("/me", get(profile))
        .with_state(Arc::new(auth_usecase))
}

pub async fn register<U, P>(
    State(auth_usecase): State<Arc<AuthUseCase<U, P>>>,
    Json(register_user_model): Json<RegisterUserModel>,
) -> impl IntoResponse
where
    U: UserRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
{
    match auth_usecase.register(register_user_model).await {
        Ok(profile) => (StatusCode::CREATED, Json(profile)).into_response(),
        Err(e) => error_responses::failure(e.status_code(), e),
    }
}

pub async fn login<U, P>(
    State(auth_usecase): State<Arc<AuthUseCase<U, P>>>,
    Json(login_model): Json<LoginModel>,
) -> impl IntoResponse
where
    U: UserRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
{
    match auth_usecase.login(login_model).await {
        Ok(token) => (StatusCode::OK, Json(token)).into_response(),
        Err(e) => error_responses::failure(e.status_code(), e),
    }
}

pub async fn profile<U, P>(
    State(auth_usecase): State<Arc<AuthUseCase<U, P>>>,
    auth: AuthUser,
) -> impl IntoResponse
where
    U: UserRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
{
    match auth_usecase.profile(auth.user_id).await {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(e) => error_responses::failure(e.status_code(), e),
    }
}
