/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/register` - Create an account and open a session (public)
/// - `POST /api/login` - Open a session (public)
/// - `POST /api/logout` - Revoke the presented session, if any (public)
/// - `GET /api/user` - Current user
/// - `PUT /api/user` - Update full name / email of the current user
///
/// Register and login respond with the user object plus a `token` field. The
/// token is sent back as `Authorization: Bearer <token>` on later requests.

use crate::{
    app::AppState,
    error::{validate, ApiError, ApiResult},
    extract::ApiJson,
    middleware::auth::bearer_token,
};
use axum::{extract::State, http::HeaderMap, http::StatusCode, Extension, Json};
use seodesk_shared::{
    auth::{password, session::AuthContext},
    models::{
        activity_log::ActivityAction,
        user::{CreateUser, UpdateUser, User},
    },
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Register request
///
/// Every field is optional at the JSON level so that an incomplete body is
/// reported as "Missing required fields" rather than a deserialization error.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: Option<String>,

    pub password: Option<String>,

    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,

    pub full_name: Option<String>,

    pub role: Option<String>,
}

impl RegisterRequest {
    fn required(&self) -> Option<(&str, &str, &str, &str)> {
        fn present(field: &Option<String>) -> Option<&str> {
            field
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
        }

        Some((
            present(&self.username)?,
            self.password.as_deref().filter(|p| !p.is_empty())?,
            present(&self.email)?,
            present(&self.full_name)?,
        ))
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,

    pub password: Option<String>,
}

/// User object with the session token alongside
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    #[serde(flatten)]
    pub user: User,

    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Register a new account
///
/// # Errors
///
/// - `400 Bad Request`: Missing fields, invalid email, duplicate username or email
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    let (username, plain_password, email, full_name) = req
        .required()
        .ok_or_else(|| ApiError::BadRequest("Missing required fields".to_string()))?;

    validate(&req, "Invalid registration data")?;

    // Checked up front to avoid hashing for an obvious duplicate; the store
    // enforces both again on insert.
    if state.store.get_user_by_username(username).await?.is_some() {
        return Err(ApiError::Conflict("Username already exists".to_string()));
    }
    if state.store.get_user_by_email(email).await?.is_some() {
        return Err(ApiError::Conflict("Email already exists".to_string()));
    }

    let password_hash = password::hash_password(plain_password)?;

    let user = state
        .store
        .create_user(CreateUser {
            username: username.to_string(),
            password_hash,
            email: email.to_string(),
            full_name: full_name.to_string(),
            role: req.role.clone(),
        })
        .await?;

    let (_, token) = state.sessions.open(&user).await?;

    state.activity.account(user.id, ActivityAction::Registered).await;
    tracing::info!(user_id = user.id, username = %user.username, "User registered");

    Ok((StatusCode::CREATED, Json(SessionResponse { user, token })))
}

/// Log in with username and password
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown username, wrong password or missing credentials
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let (Some(username), Some(plain_password)) = (req.username, req.password) else {
        return Err(ApiError::Unauthorized("Invalid username or password".to_string()));
    };

    let user = state.sessions.authenticate(&username, &plain_password).await?;
    let (_, token) = state.sessions.open(&user).await?;

    state.activity.account(user.id, ActivityAction::LoggedIn).await;
    tracing::info!(user_id = user.id, "User logged in");

    Ok(Json(SessionResponse { user, token }))
}

/// Log out
///
/// Always 200. A valid session, when presented, is revoked and logged.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<MessageResponse>> {
    if let Some(token) = bearer_token(&headers) {
        match state.sessions.resolve(&token).await {
            Ok(auth) => {
                if state.sessions.close(auth.session_id).await? {
                    state
                        .activity
                        .account(auth.user_id(), ActivityAction::LoggedOut)
                        .await;
                    tracing::info!(user_id = auth.user_id(), "User logged out");
                }
            }
            Err(e) if e.is_unauthenticated() => {
                tracing::debug!(error = %e, "Logout with an unusable token");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(Json(MessageResponse {
        message: "Logged out".to_string(),
    }))
}

/// Current user
pub async fn current_user(Extension(auth): Extension<AuthContext>) -> Json<User> {
    Json(auth.user)
}

/// Update the current user's profile
///
/// # Errors
///
/// - `400 Bad Request`: Invalid email or empty name, email taken by another user
pub async fn update_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(changes): ApiJson<UpdateUser>,
) -> ApiResult<Json<User>> {
    validate(&changes, "Invalid user data")?;

    let user = state
        .store
        .update_user(auth.user_id(), changes)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    state.activity.account(user.id, ActivityAction::Updated).await;

    Ok(Json(user))
}
