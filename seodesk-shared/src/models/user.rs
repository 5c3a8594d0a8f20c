/// User model and database operations
///
/// Users are agency staff accounts. They are created at registration and are
/// never deleted. Every client, project, task and report records the user who
/// created it in `created_by`.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id SERIAL PRIMARY KEY,
///     username TEXT NOT NULL UNIQUE,
///     password_hash TEXT NOT NULL,
///     email TEXT NOT NULL UNIQUE,
///     full_name TEXT NOT NULL,
///     role TEXT NOT NULL DEFAULT 'user',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use seodesk_shared::models::user::{User, CreateUser};
/// use seodesk_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let new_user = CreateUser {
///     username: "jdoe".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     email: "jdoe@agency.test".to_string(),
///     full_name: "John Doe".to_string(),
///     role: None,
/// };
///
/// let user = User::create(&pool, &new_user).await?;
/// println!("Created user: {}", user.id);
///
/// let found = User::find_by_username(&pool, "jdoe").await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use validator::Validate;

use super::{Id, Record};

/// Role assigned when registration does not name one
pub const DEFAULT_ROLE: &str = "user";

/// User model representing a staff account
///
/// The role is informational only; no permission decision reads it.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID
    pub id: Id,

    /// Login name, unique across all users
    pub username: String,

    /// Argon2id password hash in PHC format
    ///
    /// Never serialized into API responses.
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Email address, unique across all users
    pub email: String,

    /// Display name
    pub full_name: String,

    /// Free-form role label (defaults to `"user"`)
    pub role: String,

    /// When the account was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Login name
    pub username: String,

    /// Argon2id password hash (NOT the plaintext password)
    pub password_hash: String,

    /// Email address
    pub email: String,

    /// Display name
    pub full_name: String,

    /// Optional role label, `DEFAULT_ROLE` when absent
    pub role: Option<String>,
}

impl CreateUser {
    /// Role that will be stored for this user
    pub fn role_or_default(&self) -> &str {
        self.role
            .as_deref()
            .filter(|role| !role.trim().is_empty())
            .unwrap_or(DEFAULT_ROLE)
    }
}

/// Profile changes a user may make to their own account
///
/// Only non-None fields are applied. Username, password and role are not
/// editable through this path.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    /// New display name
    #[validate(length(min = 1, max = 255, message = "Full name must not be empty"))]
    pub full_name: Option<String>,

    /// New email address
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
}

impl UpdateUser {
    /// Merges the changes into an existing user
    pub fn apply(&self, user: &mut User) {
        if let Some(full_name) = &self.full_name {
            user.full_name = full_name.clone();
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
    }
}

impl Record for User {
    fn id(&self) -> Id {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl User {
    /// Creates a new user in the database
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Username or email already exists (unique constraint violation)
    /// - Database connection fails
    pub async fn create<'e, E>(executor: E, data: &CreateUser) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash, email, full_name, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, password_hash, email, full_name, role, created_at
            "#,
        )
        .bind(&data.username)
        .bind(&data.password_hash)
        .bind(&data.email)
        .bind(&data.full_name)
        .bind(data.role_or_default())
        .fetch_one(executor)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id<'e, E>(executor: E, id: Id) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, email, full_name, role, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(user)
    }

    /// Finds a user by login name (exact match)
    pub async fn find_by_username<'e, E>(
        executor: E,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, email, full_name, role, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(executor)
        .await?;

        Ok(user)
    }

    /// Finds a user by email address (exact match)
    pub async fn find_by_email<'e, E>(executor: E, email: &str) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, email, full_name, role, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(executor)
        .await?;

        Ok(user)
    }

    /// Updates the profile fields of an existing user
    ///
    /// `created_at`, `username` and `password_hash` are never written.
    ///
    /// # Returns
    ///
    /// The updated user if found, None if the user doesn't exist
    pub async fn update<'e, E>(
        executor: E,
        id: Id,
        data: &UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET full_name = COALESCE($2, full_name),
                email = COALESCE($3, email)
            WHERE id = $1
            RETURNING id, username, password_hash, email, full_name, role, created_at
            "#,
        )
        .bind(id)
        .bind(&data.full_name)
        .bind(&data.email)
        .fetch_optional(executor)
        .await?;

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: 7,
            username: "jdoe".to_string(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            email: "jdoe@agency.test".to_string(),
            full_name: "John Doe".to_string(),
            role: DEFAULT_ROLE.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_password_hash_is_never_serialized() {
        let json = serde_json::to_value(sample_user()).unwrap();

        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["fullName"], "John Doe");
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn test_role_defaults_to_user() {
        let mut data = CreateUser {
            username: "jdoe".to_string(),
            password_hash: "hash".to_string(),
            email: "jdoe@agency.test".to_string(),
            full_name: "John Doe".to_string(),
            role: None,
        };
        assert_eq!(data.role_or_default(), "user");

        data.role = Some("  ".to_string());
        assert_eq!(data.role_or_default(), "user");

        data.role = Some("admin".to_string());
        assert_eq!(data.role_or_default(), "admin");
    }

    #[test]
    fn test_update_user_apply_only_touches_present_fields() {
        let mut user = sample_user();
        let created_at = user.created_at;

        UpdateUser {
            full_name: Some("Jane Doe".to_string()),
            email: None,
        }
        .apply(&mut user);

        assert_eq!(user.full_name, "Jane Doe");
        assert_eq!(user.email, "jdoe@agency.test");
        assert_eq!(user.created_at, created_at);
    }

    #[test]
    fn test_update_user_rejects_bad_email() {
        let update = UpdateUser {
            full_name: None,
            email: Some("not-an-email".to_string()),
        };
        assert!(update.validate().is_err());
    }
}
