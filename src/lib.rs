pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod services;
pub mod usecases;

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::infrastructure::axum_http::http_serve;
use crate::infrastructure::postgres::{
    postgres_connection,
    repositories::{plans::PlanPostgres, users::UserPostgres},
};
use crate::services::{
    email_client::{Mailer, ResendClient},
    stripe_client::StripeClient,
};
use crate::usecases::{plan_catalog::PlanCatalogUseCase, usage_reset::UsageResetUseCase};

pub async fn run() -> Result<()> {
    let dotenvy_env = config::config_loader::load()?;
    info!("ENV has been loaded");

    let postgres_pool = postgres_connection::establish_connection(&dotenvy_env.database.url)?;
    info!("Postgres connection has been established");

    let config = Arc::new(dotenvy_env);
    let db_pool = Arc::new(postgres_pool);

    let mailer = Mailer::new(Arc::new(ResendClient::new(
        config.resend.api_key.clone(),
        config.resend.from_address.clone(),
    )));

    let user_repository = Arc::new(UserPostgres::new(Arc::clone(&db_pool)));
    let plan_repository = Arc::new(PlanPostgres::new(Arc::clone(&db_pool)));
    let stripe_client = Arc::new(StripeClient::new(
        config.stripe.secret_key.clone(),
        config.stripe.webhook_secret.clone(),
        config.stripe.success_url.clone(),
        config.stripe.cancel_url.clone(),
    ));

    // Seed the plan catalog before serving traffic. The free plan is a hard
    // requirement (registration and webhook downgrades depend on it); the
    // Stripe mirror can fail and catch up on the next restart.
    let plan_catalog_usecase = PlanCatalogUseCase::new(
        Arc::clone(&plan_repository),
        stripe_client,
        &config.stripe,
        config.free_plan.clone(),
    );
    plan_catalog_usecase.ensure_free_plan().await?;
    if let Err(error) = plan_catalog_usecase.sync_catalog().await {
        warn!(error = %error, "Stripe catalog sync failed at startup; serving with stored plans");
    }

    let usage_reset_usecase = Arc::new(UsageResetUseCase::new(user_repository, plan_repository));
    tokio::spawn(usage_reset_usecase.run_daily());
    info!("Usage reset scheduler has been started");

    http_serve::start(config, db_pool, mailer).await?;

    Ok(())
}
