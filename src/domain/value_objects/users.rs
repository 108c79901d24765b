use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{entities::users::UserEntity, value_objects::plans::PlanDto};

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterUserModel {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginModel {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PasswordChangeModel {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenDto {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserProfileDto {
    pub id: Uuid,
    pub email: String,
    pub is_active: bool,
    pub content_generations_count: i32,
    pub plan: Option<PlanDto>,
}

impl UserProfileDto {
    pub fn from_entity(user: UserEntity, plan: Option<PlanDto>) -> Self {
        Self {
            id: user.id,
            email: user.email,
            is_active: user.is_active,
            content_generations_count: user.content_generations_count,
            plan,
        }
    }
}
