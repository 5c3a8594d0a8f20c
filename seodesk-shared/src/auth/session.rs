/// Login sessions and bearer tokens
///
/// A successful login creates a server-side `Session` row and hands the client
/// an HS256-signed token naming it. Each request's token is verified, then its
/// session is loaded from the store, so logout (which deletes the row) revokes
/// the token immediately.
///
/// # Token Structure
///
/// ```json
/// {
///   "sub": 42,
///   "sid": "6f1d...",
///   "iss": "seodesk",
///   "iat": 1704067200,
///   "nbf": 1704067200,
///   "exp": 1704672000
/// }
/// ```
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use chrono::Duration;
/// use seodesk_shared::auth::session::SessionManager;
/// use seodesk_shared::store::memory::MemoryStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = Arc::new(MemoryStore::new());
/// let sessions = SessionManager::new(store, "a-secret-of-at-least-32-characters!", Duration::days(7));
///
/// let user = sessions.authenticate("jdoe", "password").await?;
/// let (_session, token) = sessions.open(&user).await?;
///
/// let auth = sessions.resolve(&token).await?;
/// assert_eq!(auth.user_id(), user.id);
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::password::{verify_password, PasswordError};
use crate::models::session::Session;
use crate::models::user::User;
use crate::models::Id;
use crate::store::{Store, StoreError};

/// Token issuer
pub const ISSUER: &str = "seodesk";

/// Token signing/verification error
#[derive(Debug, thiserror::Error)]
pub enum SessionTokenError {
    #[error("Failed to create token: {0}")]
    CreateError(String),

    #[error("Token has expired")]
    Expired,

    #[error("Invalid token: {0}")]
    Invalid(String),
}

/// Claims carried by a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User ID
    pub sub: Id,

    /// Session ID
    pub sid: Uuid,

    pub iss: String,

    pub iat: i64,

    pub nbf: i64,

    pub exp: i64,
}

impl SessionClaims {
    /// Claims for `session`, expiring with it
    pub fn for_session(session: &Session) -> Self {
        Self {
            sub: session.user_id,
            sid: session.id,
            iss: ISSUER.to_string(),
            iat: session.created_at.timestamp(),
            nbf: session.created_at.timestamp(),
            exp: session.expires_at.timestamp(),
        }
    }
}

/// Signs claims with HS256
pub fn issue_token(claims: &SessionClaims, secret: &str) -> Result<String, SessionTokenError> {
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&Header::new(Algorithm::HS256), claims, &key)
        .map_err(|e| SessionTokenError::CreateError(e.to_string()))
}

/// Verifies signature, issuer and time claims of a token
pub fn decode_token(token: &str, secret: &str) -> Result<SessionClaims, SessionTokenError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let data = decode::<SessionClaims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => SessionTokenError::Expired,
        _ => SessionTokenError::Invalid(e.to_string()),
    })?;

    Ok(data.claims)
}

/// Session management error
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Unknown username or wrong password
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error(transparent)]
    Token(#[from] SessionTokenError),

    /// The session row is gone (logged out)
    #[error("Session has been revoked")]
    Revoked,

    #[error("Session has expired")]
    Expired,

    /// Token and session disagree, or the user no longer exists
    #[error("Session does not match a known user")]
    UnknownUser,

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SessionError {
    /// True when the failure means "not authenticated" rather than a fault
    pub fn is_unauthenticated(&self) -> bool {
        !matches!(
            self,
            SessionError::Password(_)
                | SessionError::Store(_)
                | SessionError::Token(SessionTokenError::CreateError(_))
        )
    }
}

/// Identity resolved from a request's token
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Current user (password hash never serialized)
    pub user: User,

    /// Session the request was made with
    pub session_id: Uuid,
}

impl AuthContext {
    pub fn user_id(&self) -> Id {
        self.user.id
    }
}

/// Verifies credentials and opens, resolves and closes sessions
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn Store>,
    secret: String,
    ttl: Duration,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("backend", &self.store.backend())
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    pub fn new(store: Arc<dyn Store>, secret: impl Into<String>, ttl: Duration) -> Self {
        Self {
            store,
            secret: secret.into(),
            ttl,
        }
    }

    /// Checks a username/password pair
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, SessionError> {
        let Some(user) = self.store.get_user_by_username(username).await? else {
            debug!(username = %username, "Login for unknown username");
            return Err(SessionError::InvalidCredentials);
        };

        if !verify_password(password, &user.password_hash)? {
            debug!(user_id = user.id, "Login with wrong password");
            return Err(SessionError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Opens a session for `user` and returns it with its bearer token
    pub async fn open(&self, user: &User) -> Result<(Session, String), SessionError> {
        let now = Utc::now();
        let swept = self.store.delete_expired_sessions(now).await?;
        if swept > 0 {
            debug!(swept, "Expired sessions removed");
        }

        let session = Session::new(user.id, now + self.ttl);
        let token = issue_token(&SessionClaims::for_session(&session), &self.secret)?;
        let session = self.store.create_session(session).await?;

        debug!(user_id = user.id, session_id = %session.id, "Session opened");
        Ok((session, token))
    }

    /// Resolves a bearer token to the current user
    pub async fn resolve(&self, token: &str) -> Result<AuthContext, SessionError> {
        let claims = decode_token(token, &self.secret)?;

        let session = self
            .store
            .get_session(claims.sid)
            .await?
            .ok_or(SessionError::Revoked)?;

        if session.is_expired(Utc::now()) {
            self.store.delete_session(session.id).await?;
            return Err(SessionError::Expired);
        }
        if session.user_id != claims.sub {
            return Err(SessionError::UnknownUser);
        }

        let user = self
            .store
            .get_user(session.user_id)
            .await?
            .ok_or(SessionError::UnknownUser)?;

        Ok(AuthContext {
            user,
            session_id: session.id,
        })
    }

    /// Revokes a session; returns false if it was already gone
    pub async fn close(&self, session_id: Uuid) -> Result<bool, SessionError> {
        let removed = self.store.delete_session(session_id).await?;
        debug!(session_id = %session_id, removed, "Session closed");
        Ok(removed)
    }
}
