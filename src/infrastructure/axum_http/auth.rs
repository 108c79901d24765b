use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use uuid::Uuid;

use crate::usecases::auth::Claims;

/// Token-signing secret carried as a request extension, injected once at
/// startup from the loaded configuration.
#[derive(Clone)]
pub struct JwtSecret(Arc<String>);

impl JwtSecret {
    pub fn new(secret: String) -> Self {
        Self(Arc::new(secret))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

/// Authenticated request context, extracted from the bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
}

pub fn validate_token(token: &str, secret: &str) -> anyhow::Result<Claims> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::new(jsonwebtoken::Algorithm::HS256);

    let token_data = decode::<Claims>(token, &decoding_key, &validation)
        .map_err(|e| anyhow::anyhow!("JWT validation failed: {}", e))?;

    Ok(token_data.claims)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .ok_or((
                StatusCode::UNAUTHORIZED,
                "Missing Authorization header".to_string(),
            ))?;

        let auth_str = auth_header.to_str().map_err(|_| {
            (
                StatusCode::UNAUTHORIZED,
                "Invalid Authorization header".to_string(),
            )
        })?;

        if !auth_str.starts_with("Bearer ") {
            return Err((
                StatusCode::UNAUTHORIZED,
                "Invalid Authorization header format".to_string(),
            ));
        }

        let token = &auth_str[7..];

        let secret = parts.extensions.get::<JwtSecret>().cloned().ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Server misconfiguration".to_string(),
        ))?;

        let claims = validate_token(token, secret.expose())
            .map_err(|e| (StatusCode::UNAUTHORIZED, e.to_string()))?;

        Ok(AuthUser {
            user_id: claims.sub,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn token_for(user_id: Uuid, secret: &str, ttl_minutes: i64) -> String {
        let exp = (Utc::now() + Duration::minutes(ttl_minutes)).timestamp() as usize;
        let claims = Claims { sub: user_id, exp };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn valid_token_round_trips_the_user_id() {
        let user_id = Uuid::new_v4();
        let token = token_for(user_id, "secret", 30);
        let claims = validate_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, user_id);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = token_for(Uuid::new_v4(), "secret", 30);
        assert!(validate_token(&token, "other-secret").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = token_for(Uuid::new_v4(), "secret", -10);
        assert!(validate_token(&token, "secret").is_err());
    }

    fn parts_with(token: &str, secret: Option<&str>) -> Parts {
        let mut request = axum::http::Request::builder()
            .header(axum::http::header::AUTHORIZATION, format!("Bearer {token}"))
            .body(())
            .unwrap();
        if let Some(secret) = secret {
            request
                .extensions_mut()
                .insert(JwtSecret::new(secret.to_string()));
        }
        request.into_parts().0
    }

    #[tokio::test]
    async fn extractor_resolves_the_user_with_the_injected_secret() {
        let user_id = Uuid::new_v4();
        let token = token_for(user_id, "configured-secret", 30);
        let mut parts = parts_with(&token, Some("configured-secret"));

        let auth = AuthUser::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(auth.user_id, user_id);
    }

    #[tokio::test]
    async fn extractor_rejects_a_token_signed_with_another_secret() {
        let token = token_for(Uuid::new_v4(), "rogue-secret", 30);
        let mut parts = parts_with(&token, Some("configured-secret"));

        let (status, _) = AuthUser::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn extractor_without_an_injected_secret_is_a_server_error() {
        let token = token_for(Uuid::new_v4(), "configured-secret", 30);
        let mut parts = parts_with(&token, None);

        let (status, _) = AuthUser::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
