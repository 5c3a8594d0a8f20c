/// Middleware for the API server
///
/// - `auth`: Bearer session resolution for the `/api` routes

pub mod auth;
