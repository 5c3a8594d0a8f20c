/// API route handlers
///
/// Handlers are organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Register, login, logout, current user
/// - `clients`: Client CRUD
/// - `projects`: Project CRUD and per-project listings
/// - `tasks`: Task CRUD and upcoming deadlines
/// - `reports`: Report generation and listing
/// - `dashboard`: Per-user dashboard snapshot

pub mod auth;
pub mod clients;
pub mod dashboard;
pub mod health;
pub mod projects;
pub mod reports;
pub mod tasks;
