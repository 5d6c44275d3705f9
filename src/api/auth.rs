use axum::{
    Form, Json,
    extract::{Multipart, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tower_sessions::Session;

use super::flash::{self, NoticeLevel};
use super::{ApiError, ApiResponse, AppState, LoginForm, ProfilePage, PublicPage, SignUpForm};
use crate::services::{AuthError, SignUpRequest};

// ============================================================================
// Session keys
// ============================================================================

pub const LOGGED_IN_KEY: &str = "loggedin";
pub const CURRENT_USER_KEY: &str = "currentuser";
pub const ACCOUNT_TYPE_KEY: &str = "account_type";

// ============================================================================
// Middleware
// ============================================================================

async fn is_logged_in(session: &Session) -> bool {
    matches!(session.get::<bool>(LOGGED_IN_KEY).await, Ok(Some(true)))
}

async fn record_user(session: &Session) {
    if let Ok(Some(user)) = session.get::<String>(CURRENT_USER_KEY).await {
        tracing::Span::current().record("user_id", &user);
    }
}

/// Page routes: anonymous visitors are sent back to `/`.
pub async fn require_login(session: Session, request: Request, next: Next) -> Response {
    if is_logged_in(&session).await {
        record_user(&session).await;
        return next.run(request).await;
    }

    flash::found("/")
}

/// JSON routes: anonymous callers get a 401 body instead of a redirect.
pub async fn require_login_api(session: Session, request: Request, next: Next) -> Response {
    if is_logged_in(&session).await {
        record_user(&session).await;
        return next.run(request).await;
    }

    ApiError::Unauthorized("Not authenticated".to_string()).into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /
pub async fn index(session: Session) -> Json<ApiResponse<PublicPage>> {
    Json(ApiResponse::success(PublicPage {
        logged_in: is_logged_in(&session).await,
        notices: flash::take(&session).await,
    }))
}

/// GET /users
/// Sign-up page data
pub async fn users_page(session: Session) -> Json<ApiResponse<PublicPage>> {
    index(session).await
}

/// POST /signUp
pub async fn sign_up(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(form): Form<SignUpForm>,
) -> Result<Response, ApiError> {
    let request = SignUpRequest {
        email: form.email,
        username: form.username,
        password: form.password,
        account_type: form.account_type,
    };

    match state.auth_service().sign_up(request).await {
        Ok(user) => Ok(flash::redirect_with(
            &session,
            "/",
            NoticeLevel::Success,
            format!("Account {} created, please log in", user.username),
        )
        .await),
        Err(AuthError::UsernameTaken(username)) => Ok(flash::redirect_with(
            &session,
            "/users",
            NoticeLevel::Warning,
            format!("Username {username} is already taken"),
        )
        .await),
        Err(e) => Err(e.into()),
    }
}

/// POST /login
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, ApiError> {
    match state
        .auth_service()
        .login(form.username.trim(), &form.password)
        .await
    {
        Ok(result) => {
            session.cycle_id().await?;
            session.insert(LOGGED_IN_KEY, true).await?;
            session.insert(CURRENT_USER_KEY, &result.username).await?;
            session.insert(ACCOUNT_TYPE_KEY, &result.account_type).await?;

            tracing::info!(username = %result.username, "User logged in");
            Ok(flash::found("/dashboard"))
        }
        Err(AuthError::InvalidCredentials) => {
            tracing::info!(username = %form.username.trim(), "Rejected login attempt");
            Ok(flash::redirect_with(
                &session,
                "/",
                NoticeLevel::Error,
                "Incorrect username or password",
            )
            .await)
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /logout
pub async fn logout(session: Session) -> Response {
    let _ = session.remove::<bool>(LOGGED_IN_KEY).await;
    let _ = session.flush().await;
    flash::found("/")
}

/// GET /profile
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<ProfilePage>>, ApiError> {
    let username = get_session_username(&session).await?;
    let user = state.auth_service().get_user_info(&username).await?;

    Ok(Json(ApiResponse::success(ProfilePage {
        user,
        notices: flash::take(&session).await,
    })))
}

/// POST /profile
/// Multipart upload of a new profile picture (`image` part)
pub async fn upload_profile_picture(
    State(state): State<Arc<AppState>>,
    session: Session,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let username = get_session_username(&session).await?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() == Some("image") {
            let file_name = field.file_name().unwrap_or("upload.jpg").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::validation(format!("Failed to read upload: {e}")))?;
            upload = Some((file_name, bytes));
        }
    }

    let Some((file_name, bytes)) = upload.filter(|(_, bytes)| !bytes.is_empty()) else {
        return Err(ApiError::validation("No image uploaded"));
    };

    let picture = state
        .image_service()
        .save_upload(&file_name, &bytes)
        .await
        .map_err(|e| ApiError::validation(e.to_string()))?;
    state
        .auth_service()
        .set_profile_picture(&username, &picture)
        .await?;

    Ok(flash::redirect_with(&session, "/profile", NoticeLevel::Success, "Profile picture updated").await)
}

// ============================================================================
// Helpers
// ============================================================================

/// Get username from session, returns error if not authenticated
pub(crate) async fn get_session_username(session: &Session) -> Result<String, ApiError> {
    session
        .get::<String>(CURRENT_USER_KEY)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))
}
