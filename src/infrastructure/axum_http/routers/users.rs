use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::put,
};

use crate::config::config_model::DotEnvyConfig;
use crate::domain::{
    repositories::{plans::PlanRepository, users::UserRepository},
    value_objects::users::PasswordChangeModel,
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
        .route("/me/password", put(change_password))
        .with_state(Arc::new(auth_usecase))
}

pub async fn change_password<U, P>(
    State(auth_usecase): State<Arc<AuthUseCase<U, P>>>,
    auth: AuthUser,
    Json(password_change_model): Json<PasswordChangeModel>,
) -> impl IntoResponse
where
    U: UserRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
{
    match auth_usecase
        .change_password(auth.user_id, password_change_model)
        .await
    {
        Ok(()) => (StatusCode::OK, "Password changed").into_response(),
        Err(e) => error_responses::failure(e.status_code(), e),
    }
}
