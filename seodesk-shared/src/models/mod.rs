/// Database models for seodesk
///
/// Each model file holds the row struct, its create/update inputs, and the
/// PostgreSQL queries for that table. The queries are generic over
/// `sqlx::PgExecutor` so the store can run them inside a transaction.
///
/// # Models
///
/// - `user`: Agency staff accounts
/// - `session`: Server-side login sessions
/// - `client`: Agency clients (top of the ownership chain)
/// - `project`: SEO projects, each belonging to a client
/// - `task`: Work items inside a project
/// - `report`: Generated project reports
/// - `activity_log`: Append-only audit trail
///
/// # Example
///
/// ```no_run
/// use seodesk_shared::models::client::{Client, CreateClient};
/// use seodesk_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let client = Client::create(&pool, &CreateClient {
///     name: "Acme Co".to_string(),
///     contact_person: "Jane Roe".to_string(),
///     email: "jane@acme.test".to_string(),
///     phone: None,
///     website: Some("https://acme.test".to_string()),
///     notes: None,
///     created_by: 1,
/// }).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

pub mod activity_log;
pub mod client;
pub mod project;
pub mod report;
pub mod session;
pub mod task;
pub mod user;

/// Row identifier (PostgreSQL `SERIAL`)
pub type Id = i32;

/// Common accessors used for "newest first" ordering
pub trait Record {
    /// Row ID
    fn id(&self) -> Id;

    /// Creation timestamp
    fn created_at(&self) -> DateTime<Utc>;
}

/// Sorts records newest first, breaking timestamp ties by descending ID
pub fn sort_newest_first<T: Record>(records: &mut [T]) {
    records.sort_by(|a, b| {
        b.created_at()
            .cmp(&a.created_at())
            .then_with(|| b.id().cmp(&a.id()))
    });
}

/// Deserializes a field that distinguishes "absent" from "explicit null"
///
/// Used with `#[serde(default, deserialize_with = "double_option")]` on
/// `Option<Option<T>>` fields of partial updates: an absent field stays `None`,
/// `null` becomes `Some(None)` (clear the column), and a value becomes
/// `Some(Some(value))`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
