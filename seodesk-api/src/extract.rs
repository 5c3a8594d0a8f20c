/// Request extractors
///
/// `ApiJson` is `axum::Json` with its rejection mapped to `ApiError`, so a
/// malformed body produces the same `{message}` shape as every other error.
/// `ApiPath` does the same for route parameters: an id that does not parse
/// cannot name a row, so it is reported as 404.
///
/// Update handlers take `Result<ApiJson<T>, ApiError>` and only unwrap it after
/// the target has been authorized, so a missing or foreign entity reports
/// 404/403 even when the body is also bad.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::ApiError;

/// JSON body extractor with API-shaped rejections
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Path parameter extractor with API-shaped rejections
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);
