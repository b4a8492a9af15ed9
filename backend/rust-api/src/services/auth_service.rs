use anyhow::Context;
use std::sync::Arc;

use crate::error::{ApiError, StoreError};
use crate::middlewares::auth::{JwtClaims, JwtService};
use crate::models::user::{AuthResponse, LoginRequest, NewUser, RegisterRequest, User};
use crate::store::Store;

pub struct AuthService {
    store: Arc<dyn Store>,
    jwt_service: JwtService,
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>, jwt_service: JwtService) -> Self {
        Self { store, jwt_service }
    }

    /// Hash a password using bcrypt
    pub fn hash_password(&self, password: &str) -> Result<String, ApiError> {
        bcrypt::hash(password, bcrypt::DEFAULT_COST)
            .context("Failed to hash password")
            .map_err(ApiError::Storage)
    }

    /// Verify a password against a hash
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, ApiError> {
        bcrypt::verify(password, hash)
            .context("Failed to verify password")
            .map_err(ApiError::Storage)
    }

    /// Register a new user and issue an access token
    pub async fn register(&self, req: RegisterRequest) -> Result<AuthResponse, ApiError> {
        let password_hash = self.hash_password(&req.password)?;

        let user = self
            .store
            .insert_user(NewUser {
                email: req.email,
                password_hash,
                display_name: req.display_name,
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict => ApiError::Conflict("Email already registered".to_string()),
                other => other.into(),
            })?;

        tracing::info!(user_id = %user.id, email = %user.email, "User registered");

        let token = self.issue_token(&user)?;
        Ok(AuthResponse {
            token,
            display_name: user.display_name,
        })
    }

    /// Login with email and password. Unknown email and wrong password are
    /// indistinguishable to the caller.
    pub async fn login(&self, req: LoginRequest) -> Result<AuthResponse, ApiError> {
        let user = self
            .store
            .find_user_by_email(&req.email)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;

        if !self.verify_password(&req.password, &user.password_hash)? {
            tracing::warn!(email = %req.email, "Failed login attempt: invalid password");
            return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
        }

        tracing::info!(user_id = %user.id, email = %user.email, "Successful login");

        let token = self.issue_token(&user)?;
        Ok(AuthResponse {
            token,
            display_name: user.display_name,
        })
    }

    fn issue_token(&self, user: &User) -> Result<String, ApiError> {
        let claims = JwtClaims::new(&user.id, &user.email);
        self.jwt_service
            .generate_token(claims)
            .map_err(|e| ApiError::Unauthorized(e.to_string()))
    }
}
