use crate::config::AdminBootstrap;
use crate::dtos::auth::{LoginRequest, RegisterRequest};
use crate::models::{Role, User};
use crate::services::error::ServiceError;
use crate::services::jwt::JwtService;
use crate::services::users::UserService;
use crate::utils::{verify_password, Password, PasswordHashString};

/// A signed-in user and their bearer token.
#[derive(Debug)]
pub struct Session {
    pub user: User,
    pub token: String,
}

#[derive(Clone)]
pub struct AuthService {
    users: UserService,
    jwt: JwtService,
}

impl AuthService {
    pub fn new(users: UserService, jwt: JwtService) -> Self {
        Self { users, jwt }
    }

    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<Session, ServiceError> {
        if self.users.find_by_email(&req.email).await?.is_some() {
            return Err(ServiceError::UserAlreadyExists);
        }

        let user = self
            .users
            .create(
                req.name,
                req.email,
                Password::new(req.password),
                Role::User,
            )
            .await?;

        tracing::info!(user_id = %user.id, "User registered");
        self.session(user)
    }

    /// Unknown email and wrong password fail the same way.
    pub async fn login(&self, req: LoginRequest) -> Result<Session, ServiceError> {
        let user = self
            .users
            .find_by_email(&req.email)
            .await?
            .ok_or(ServiceError::InvalidCredentials)?;

        let hash = PasswordHashString::new(user.password.clone());
        if verify_password(&Password::new(req.password), &hash).is_err() {
            tracing::warn!(user_id = %user.id, "Login failed: wrong password");
            return Err(ServiceError::InvalidCredentials);
        }

        tracing::info!(user_id = %user.id, "User logged in");
        self.session(user)
    }

    /// Creates the configured admin account when no user holds its email.
    /// An existing account is left untouched.
    pub async fn ensure_admin(&self, admin: &AdminBootstrap) -> Result<(), ServiceError> {
        if let Some(existing) = self.users.find_by_email(&admin.email).await? {
            if !existing.is_admin() {
                tracing::warn!(
                    user_id = %existing.id,
                    "Bootstrap admin email belongs to a non-admin user"
                );
            }
            return Ok(());
        }

        let user = self
            .users
            .create(
                admin.name.clone(),
                admin.email.clone(),
                Password::new(admin.password.clone()),
                Role::Admin,
            )
            .await?;
        tracing::info!(user_id = %user.id, "Bootstrap admin created");
        Ok(())
    }

    fn session(&self, user: User) -> Result<Session, ServiceError> {
        let token = self
            .jwt
            .generate_access_token(&user.id, &user.email, user.role)?;
        Ok(Session { user, token })
    }
}
