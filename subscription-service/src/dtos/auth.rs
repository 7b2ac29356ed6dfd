use crate::dtos::users::UserResponse;
use crate::utils::validate_password_strength;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Self-service sign-up. Always yields a `user`; unknown keys such as `role`
/// are ignored, and admins grant roles through the users API.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email"))]
    pub email: String,
    #[validate(custom(function = "validate_password_strength"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthPayload {
    pub user: UserResponse,
}
