/// Error handling for the API server
///
/// Every handler returns `ApiResult<T>`. Library errors convert into `ApiError`
/// through the `From` impls below, so handlers can use `?` throughout.
///
/// # Response Format
///
/// ```json
/// { "message": "Invalid client data", "errors": [{ "field": "email", "message": "Invalid email address" }] }
/// ```
///
/// `errors` is only present for validation failures.
///
/// # Example
///
/// ```
/// use seodesk_api::error::{ApiError, ApiResult};
/// use axum::Json;
///
/// async fn handler(id: i32) -> ApiResult<Json<i32>> {
///     if id <= 0 {
///         return Err(ApiError::NotFound("Client not found".to_string()));
///     }
///     Ok(Json(id))
/// }
/// ```

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::{Validate, ValidationErrors};

use seodesk_shared::auth::authorization::AuthzError;
use seodesk_shared::auth::password::PasswordError;
use seodesk_shared::auth::session::SessionError;
use seodesk_shared::store::{ParentRef, StoreError};

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthenticated (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Duplicate unique value (400 with a specific message)
    Conflict(String),

    /// Request validation failed (400 with field details)
    ValidationError {
        message: String,
        errors: Vec<ValidationErrorDetail>,
    },

    /// Internal server error (500), details are logged, never returned
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation (camelCase, as sent by the client)
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub message: String,

    /// Validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    /// Builds a 400 from validator output
    pub fn invalid(message: impl Into<String>, errors: &ValidationErrors) -> Self {
        let mut details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, field_errors)| {
                let field = camel_case(&field.to_string());
                field_errors.iter().map(move |e| ValidationErrorDetail {
                    field: field.clone(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value ({})", e.code)),
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));

        ApiError::ValidationError {
            message: message.into(),
            errors: details,
        }
    }

    /// Single-field validation failure
    pub fn invalid_field(
        message: impl Into<String>,
        field: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            errors: vec![ValidationErrorDetail {
                field: field.into(),
                message: detail.into(),
            }],
        }
    }
}

/// Runs `validator` checks, mapping failures to a 400 with `message`
pub fn validate<T: Validate>(value: &T, message: &str) -> ApiResult<()> {
    value
        .validate()
        .map_err(|errors| ApiError::invalid(message, &errors))
}

fn camel_case(snake: &str) -> String {
    let mut out = String::with_capacity(snake.len());
    let mut upper = false;
    for c in snake.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError { message, errors } => {
                write!(f, "{}: {} errors", message, errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, errors) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            ApiError::Conflict(msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::ValidationError { message, errors } => {
                (StatusCode::BAD_REQUEST, message, Some(errors))
            }
            ApiError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        (status, Json(ErrorResponse { message, errors })).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate("username") => {
                ApiError::Conflict("Username already exists".to_string())
            }
            StoreError::Duplicate("email") => ApiError::Conflict("Email already exists".to_string()),
            StoreError::Duplicate(field) => ApiError::Conflict(format!("{} already exists", field)),
            StoreError::MissingReference(field) => {
                ApiError::invalid_field("Invalid reference", field, "Referenced user does not exist")
            }
            StoreError::GuardRejected(ParentRef::Client(_)) => {
                ApiError::Forbidden("Invalid client or permission denied".to_string())
            }
            StoreError::GuardRejected(ParentRef::Project(_)) => {
                ApiError::Forbidden("Invalid project or permission denied".to_string())
            }
            StoreError::Database(e) => ApiError::InternalError(format!("Database error: {}", e)),
        }
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::NotFound(_) => ApiError::NotFound(err.to_string()),
            AuthzError::Forbidden => ApiError::Forbidden("Forbidden".to_string()),
            AuthzError::Store(e) => e.into(),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::InvalidCredentials => ApiError::Unauthorized(err.to_string()),
            SessionError::Store(e) => e.into(),
            SessionError::Password(e) => e.into(),
            e if e.is_unauthenticated() => ApiError::Unauthorized("Unauthorized".to_string()),
            e => ApiError::InternalError(format!("Session error: {}", e)),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        match rejection {
            PathRejection::FailedToDeserializePathParams(_) => {
                ApiError::NotFound("Not found".to_string())
            }
            other => ApiError::InternalError(format!("Path extraction failed: {}", other.body_text())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seodesk_shared::models::activity_log::EntityType;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("Client not found".to_string());
        assert_eq!(err.to_string(), "Not found: Client not found");
    }

    #[test]
    fn test_store_error_mapping() {
        assert!(matches!(
            ApiError::from(StoreError::Duplicate("email")),
            ApiError::Conflict(msg) if msg == "Email already exists"
        ));
        assert!(matches!(
            ApiError::from(StoreError::GuardRejected(ParentRef::Project(4))),
            ApiError::Forbidden(msg) if msg == "Invalid project or permission denied"
        ));
        assert!(matches!(
            ApiError::from(StoreError::Database(sqlx::Error::PoolTimedOut)),
            ApiError::InternalError(_)
        ));
    }

    #[test]
    fn test_authz_error_mapping() {
        assert!(matches!(
            ApiError::from(AuthzError::NotFound(EntityType::Task)),
            ApiError::NotFound(msg) if msg == "Task not found"
        ));
        assert!(matches!(
            ApiError::from(AuthzError::Forbidden),
            ApiError::Forbidden(_)
        ));
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::Conflict("dup".into()), StatusCode::BAD_REQUEST),
            (ApiError::Unauthorized("no".into()), StatusCode::UNAUTHORIZED),
            (ApiError::Forbidden("no".into()), StatusCode::FORBIDDEN),
            (ApiError::NotFound("no".into()), StatusCode::NOT_FOUND),
            (ApiError::InternalError("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("contact_person"), "contactPerson");
        assert_eq!(camel_case("email"), "email");
    }
}
