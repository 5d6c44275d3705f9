//! Domain service for accounts and login.
//!
//! Handles sign-up, credential checks and profile pictures. Session handling
//! stays in the HTTP layer.

use serde::Serialize;
use thiserror::Error;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User already exists: {0}")]
    UsernameTaken(String),

    #[error("User not found")]
    UserNotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Default role for accounts created without an explicit one.
pub const DEFAULT_ACCOUNT_TYPE: &str = "staff";

/// User info DTO for responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub username: String,
    pub email: String,
    pub account_type: String,
    pub profile_picture: Option<String>,
    pub created: String,
}

/// What a successful login writes into the session.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub username: String,
    pub account_type: String,
}

#[derive(Debug, Clone)]
pub struct SignUpRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    pub account_type: Option<String>,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies credentials.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for an unknown user or a wrong password.
    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError>;

    /// Creates an account.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UsernameTaken`] when the username exists and
    /// [`AuthError::Validation`] for empty credentials.
    async fn sign_up(&self, request: SignUpRequest) -> Result<UserInfo, AuthError>;

    async fn get_user_info(&self, username: &str) -> Result<UserInfo, AuthError>;

    /// Stores a new profile picture reference for the user.
    async fn set_profile_picture(&self, username: &str, picture: &str) -> Result<(), AuthError>;
}
