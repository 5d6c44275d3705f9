//! `SeaORM` implementation of the `AuthService` trait.

use crate::db::{NewUser, Store, User};
use crate::services::auth_service::{
    AuthError, AuthService, DEFAULT_ACCOUNT_TYPE, LoginResult, SignUpRequest, UserInfo,
};
use async_trait::async_trait;

pub struct SeaOrmAuthService {
    store: Store,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

fn to_user_info(user: User) -> UserInfo {
    UserInfo {
        username: user.username,
        email: user.email,
        account_type: user.account_type,
        profile_picture: user.profile_picture,
        created: user.created_at,
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError> {
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let user = self
            .store
            .verify_user_password(username, password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        Ok(LoginResult {
            username: user.username,
            account_type: user.account_type,
        })
    }

    async fn sign_up(&self, request: SignUpRequest) -> Result<UserInfo, AuthError> {
        let username = request.username.trim();
        if username.is_empty() {
            return Err(AuthError::Validation("Username is required".to_string()));
        }
        if request.password.is_empty() {
            return Err(AuthError::Validation("Password is required".to_string()));
        }

        let account_type = request
            .account_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_ACCOUNT_TYPE);

        let user = self
            .store
            .create_user(NewUser {
                email: request.email.trim(),
                username,
                password: &request.password,
                account_type,
            })
            .await?
            .ok_or_else(|| AuthError::UsernameTaken(username.to_string()))?;

        tracing::info!(username = %user.username, account_type = %user.account_type, "User created");
        Ok(to_user_info(user))
    }

    async fn get_user_info(&self, username: &str) -> Result<UserInfo, AuthError> {
        let user = self
            .store
            .get_user_by_username(username)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(to_user_info(user))
    }

    async fn set_profile_picture(&self, username: &str, picture: &str) -> Result<(), AuthError> {
        if self.store.update_profile_picture(username, picture).await? {
            Ok(())
        } else {
            Err(AuthError::UserNotFound)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn service() -> SeaOrmAuthService {
        let store = Store::new("sqlite::memory:").await.unwrap();
        SeaOrmAuthService::new(store)
    }

    fn request(username: &str) -> SignUpRequest {
        SignUpRequest {
            email: format!("{username}@example.com"),
            username: username.to_string(),
            password: "hunter22".to_string(),
            account_type: None,
        }
    }

    #[tokio::test]
    async fn test_sign_up_then_login() {
        let service = service().await;

        let info = service.sign_up(request("alice")).await.unwrap();
        assert_eq!(info.account_type, DEFAULT_ACCOUNT_TYPE);

        let login = service.login("alice", "hunter22").await.unwrap();
        assert_eq!(login.username, "alice");

        assert!(matches!(
            service.login("alice", "wrong").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            service.login("bob", "hunter22").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let service = service().await;
        service.sign_up(request("alice")).await.unwrap();

        assert!(matches!(
            service.sign_up(request("alice")).await,
            Err(AuthError::UsernameTaken(_))
        ));
    }

    #[tokio::test]
    async fn test_profile_picture_update() {
        let service = service().await;
        service.sign_up(request("alice")).await.unwrap();

        service
            .set_profile_picture("alice", "/images/alice.png")
            .await
            .unwrap();
        let info = service.get_user_info("alice").await.unwrap();
        assert_eq!(info.profile_picture.as_deref(), Some("/images/alice.png"));

        assert!(matches!(
            service.set_profile_picture("nobody", "/images/x.png").await,
            Err(AuthError::UserNotFound)
        ));
    }
}
