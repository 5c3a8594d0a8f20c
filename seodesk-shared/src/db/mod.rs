/// PostgreSQL plumbing
///
/// # Modules
///
/// - `pool`: Connection pool creation with a startup health check
/// - `migrations`: Embedded schema migrations
///
/// Table access lives in `models`; the `store` module wraps both behind the
/// `Store` trait.

pub mod migrations;
pub mod pool;
