use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use serde::Serialize;

use crate::config::config_model::DotEnvyConfig;
use crate::domain::repositories::{plans::PlanRepository, users::UserRepository};
use crate::infrastructure::axum_http::{auth::AuthUser, error_responses};
use crate::infrastructure::postgres::{
    postgres_connection::PgPoolSquad,
    repositories::{plans::PlanPostgres, users::UserPostgres},
};
use crate::services::email_client::Mailer;
use crate::services::stripe_client::StripeClient;
use crate::usecases::{
    plan_catalog::PlanCatalogUseCase,
    subscriptions::{StripeGateway, SubscriptionUseCase},
};

#[derive(Debug, Serialize)]
struct CheckoutResponse {
    checkout_url: String,
}

#[derive(Debug, Serialize)]
struct CancellationResponse {
    ends_at: chrono::DateTime<chrono::Utc>,
}

pub fn routes(db_pool: Arc<PgPoolSquad>, config: Arc<DotEnvyConfig>, mailer: Mailer) -> Router {
    let user_repository = Arc::new(UserPostgres::new(Arc::clone(&db_pool)));
    let plan_repository = Arc::new(PlanPostgres::new(Arc::clone(&db_pool)));
    let stripe_client = Arc::new(StripeClient::new(
        config.stripe.secret_key.clone(),
        config.stripe.webhook_secret.clone(),
        config.stripe.success_url.clone(),
        config.stripe.cancel_url.clone(),
    ));

    let subscription_usecase = SubscriptionUseCase::new(
        Arc::clone(&user_repository),
        Arc::clone(&plan_repository),
        Arc::clone(&stripe_client),
        mailer,
    );
    let plan_catalog_usecase = PlanCatalogUseCase::new(
        plan_repository,
        stripe_client,
        &config.stripe,
        config.free_plan.clone(),
    );

    Router::new()
        .route(
            "/create-checkout-session/:price_id",
            post(create_checkout_session),
        )
        .route("/cancel", post(cancel_subscription))
        .route("/webhook", post(stripe_webhook))
        .with_state(Arc::new(subscription_usecase))
        .merge(
            Router::new()
                .route("/plans", get(list_plans))
                .with_state(Arc::new(plan_catalog_usecase)),
        )
}

pub async fn list_plans<P, S>(
    State(plan_catalog_usecase): State<Arc<PlanCatalogUseCase<P, S>>>,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
    S: StripeGateway + Send + Sync + 'static,
{
    match plan_catalog_usecase.list_plans().await {
        Ok(plans) => (StatusCode::OK, Json(plans)).into_response(),
        Err(e) => error_responses::failure(e.status_code(), e),
    }
}

pub async fn create_checkout_session<U, P, S>(
    State(subscription_usecase): State<Arc<SubscriptionUseCase<U, P, S>>>,
    auth: AuthUser,
    Path(price_id): Path<String>,
) -> impl IntoResponse
where
    U: UserRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    S: StripeGateway + Send + Sync + 'static,
{
    match subscription_usecase
        .create_checkout_session(auth.user_id, &price_id)
        .await
    {
        Ok(checkout_url) => (StatusCode::OK, Json(CheckoutResponse { checkout_url })).into_response(),
        Err(e) => error_responses::failure(e.status_code(), e),
    }
}

pub async fn cancel_subscription<U, P, S>(
    State(subscription_usecase): State<Arc<SubscriptionUseCase<U, P, S>>>,
    auth: AuthUser,
) -> impl IntoResponse
where
    U: UserRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    S: StripeGateway + Send + Sync + 'static,
{
    match subscription_usecase.cancel_subscription(auth.user_id).await {
        Ok(ends_at) => (StatusCode::OK, Json(CancellationResponse { ends_at })).into_response(),
        Err(e) => error_responses::failure(e.status_code(), e),
    }
}

/// Unauthenticated by design; trust comes from the signature header.
pub async fn stripe_webhook<U, P, S>(
    State(subscription_usecase): State<Arc<SubscriptionUseCase<U, P, S>>>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse
where
    U: UserRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
    S: StripeGateway + Send + Sync + 'static,
{
    let signature = headers
        .get("stripe-signature")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    match subscription_usecase
        .handle_stripe_webhook(&body, signature)
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "received": true })),
        )
            .into_response(),
        Err(e) => error_responses::failure(e.status_code(), e),
    }
}
