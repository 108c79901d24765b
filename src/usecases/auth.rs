use std::sync::Arc;

use argon2::password_hash::{PasswordHash, SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::config_model::{Auth as AuthConfig, FreePlan};
use crate::domain::{
    entities::users::RegisterUserEntity,
    repositories::{plans::PlanRepository, users::UserRepository},
    value_objects::{
        plans::{PlanDto, free_plan_upsert},
        users::{LoginModel, PasswordChangeModel, RegisterUserModel, TokenDto, UserProfileDto},
    },
};
use crate::services::email_client::{Mailer, OutboundEmail};

const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("email is already registered")]
    EmailTaken,
    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters")]
    WeakPassword,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("user not found")]
    UserNotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            AuthError::EmailTaken | AuthError::WeakPassword => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, AuthError>;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub exp: usize,
}

pub struct AuthUseCase<U, P>
where
    U: UserRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
{
    user_repo: Arc<U>,
    plan_repo: Arc<P>,
    mailer: Mailer,
    auth_config: AuthConfig,
    free_plan: FreePlan,
}

impl<U, P> AuthUseCase<U, P>
where
    U: UserRepository + Send + Sync + 'static,
    P: PlanRepository + Send + Sync + 'static,
{
    pub fn new(
        user_repo: Arc<U>,
        plan_repo: Arc<P>,
        mailer: Mailer,
        auth_config: AuthConfig,
        free_plan: FreePlan,
    ) -> Self {
        Self {
            user_repo,
            plan_repo,
            mailer,
            auth_config,
            free_plan,
        }
    }

    /// Creates an account on the free plan and queues a welcome email.
    pub async fn register(&self, model: RegisterUserModel) -> UseCaseResult<UserProfileDto> {
        let email = model.email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(AuthError::InvalidCredentials);
        }
        if model.password.len() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::WeakPassword);
        }

        if self
            .user_repo
            .find_by_email(&email)
            .await
            .map_err(AuthError::Internal)?
            .is_some()
        {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = hash_password(&model.password)?;
        let free_plan = self.resolve_free_plan().await?;

        let now = Utc::now();
        let user = self
            .user_repo
            .create(RegisterUserEntity {
                id: Uuid::new_v4(),
                email: email.clone(),
                password_hash,
                is_active: true,
                subscription_plan_id: Some(free_plan.id),
                content_generations_count: 0,
                created_at: now,
                updated_at: now,
            })
            .await
            .map_err(|err| {
                error!(db_error = ?err, "auth: failed to create user");
                AuthError::Internal(err)
            })?;

        info!(user_id = %user.id, "auth: user registered");

        self.mailer.try_send(OutboundEmail::Welcome { to: email });

        Ok(UserProfileDto::from_entity(user, Some(free_plan)))
    }

    pub async fn login(&self, model: LoginModel) -> UseCaseResult<TokenDto> {
        let email = model.email.trim().to_lowercase();
        let user = self
            .user_repo
            .find_by_email(&email)
            .await
            .map_err(AuthError::Internal)?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.is_active {
            warn!(user_id = %user.id, "auth: login attempt on inactive account");
            return Err(AuthError::InvalidCredentials);
        }

        let parsed = PasswordHash::new(&user.password_hash)
            .map_err(|err| AuthError::Internal(anyhow::anyhow!("bad stored hash: {}", err)))?;
        if Argon2::default()
            .verify_password(model.password.as_bytes(), &parsed)
            .is_err()
        {
            return Err(AuthError::InvalidCredentials);
        }

        let exp = (Utc::now() + Duration::minutes(self.auth_config.token_ttl_minutes)).timestamp()
            as usize;
        let claims = Claims { sub: user.id, exp };
        let access_token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.auth_config.jwt_secret.as_bytes()),
        )
        .map_err(|err| AuthError::Internal(anyhow::anyhow!("token encoding failed: {}", err)))?;

        Ok(TokenDto {
            access_token,
            token_type: "bearer".to_string(),
        })
    }

    pub async fn profile(&self, user_id: Uuid) -> UseCaseResult<UserProfileDto> {
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await
            .map_err(AuthError::Internal)?
            .ok_or(AuthError::UserNotFound)?;

        let plan = match user.subscription_plan_id {
            Some(plan_id) => self
                .plan_repo
                .find_by_id(plan_id)
                .await
                .map_err(AuthError::Internal)?
                .map(PlanDto::from),
            None => None,
        };

        Ok(UserProfileDto::from_entity(user, plan))
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        model: PasswordChangeModel,
    ) -> UseCaseResult<()> {
        if model.new_password.len() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::WeakPassword);
        }

        let user = self
            .user_repo
            .find_by_id(user_id)
            .await
            .map_err(AuthError::Internal)?
            .ok_or(AuthError::UserNotFound)?;

        let parsed = PasswordHash::new(&user.password_hash)
            .map_err(|err| AuthError::Internal(anyhow::anyhow!("bad stored hash: {}", err)))?;
        if Argon2::default()
            .verify_password(model.current_password.as_bytes(), &parsed)
            .is_err()
        {
            return Err(AuthError::InvalidCredentials);
        }

        let new_hash = hash_password(&model.new_password)?;
        self.user_repo
            .update_password_hash(user_id, &new_hash)
            .await
            .map_err(|err| {
                error!(user_id = %user_id, db_error = ?err, "auth: failed to update password");
                AuthError::Internal(err)
            })?;

        info!(user_id = %user_id, "auth: password changed");

        self.mailer
            .try_send(OutboundEmail::PasswordChanged { to: user.email });

        Ok(())
    }

    /// Registration normally finds the free plan seeded at startup. If the
    /// row is missing anyway, recreate it from configuration rather than
    /// turning away the signup.
    async fn resolve_free_plan(&self) -> UseCaseResult<PlanDto> {
        let existing = self
            .plan_repo
            .find_by_stripe_price_id(&self.free_plan.price_id)
            .await
            .map_err(AuthError::Internal)?;

        if let Some(plan) = existing {
            return Ok(PlanDto::from(plan));
        }

        warn!("auth: free plan missing at registration, reseeding from configuration");
        let plan = self
            .plan_repo
            .upsert_by_stripe_price_id(free_plan_upsert(&self.free_plan))
            .await
            .map_err(|err| {
                error!(db_error = ?err, "auth: failed to reseed free plan");
                AuthError::Internal(err)
            })?;

        Ok(PlanDto::from(plan))
    }
}

fn hash_password(password: &str) -> UseCaseResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AuthError::Internal(anyhow::anyhow!("password hashing failed: {}", err)))
}
