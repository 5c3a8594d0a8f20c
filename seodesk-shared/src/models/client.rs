/// Client model and database operations
///
/// Clients are the top of the ownership chain: a client belongs to the user
/// in `created_by`, and projects reference a client by `client_id`.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE clients (
///     id SERIAL PRIMARY KEY,
///     name TEXT NOT NULL,
///     contact_person TEXT NOT NULL,
///     email TEXT NOT NULL,
///     phone TEXT,
///     website TEXT,
///     notes TEXT,
///     created_by INTEGER NOT NULL REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use validator::Validate;

use super::{double_option, Id, Record};

/// Client model representing an agency customer
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    /// Unique client ID
    pub id: Id,

    /// Company or brand name
    pub name: String,

    /// Main contact at the client
    pub contact_person: String,

    /// Contact email
    pub email: String,

    /// Contact phone number
    pub phone: Option<String>,

    /// Client website
    pub website: Option<String>,

    /// Free-form notes
    pub notes: Option<String>,

    /// Owning user
    pub created_by: Id,

    /// When the client was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new client
#[derive(Debug, Clone)]
pub struct CreateClient {
    pub name: String,
    pub contact_person: String,
    pub email: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub notes: Option<String>,

    /// Owning user, always taken from the authenticated session
    pub created_by: Id,
}

/// Partial update of a client
///
/// Absent fields are left untouched. Nullable fields accept an explicit
/// `null` to clear the stored value.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClient {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: Option<String>,

    #[validate(length(min = 1, message = "Contact person is required"))]
    pub contact_person: Option<String>,

    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub website: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
}

impl UpdateClient {
    /// Merges the changes into an existing client
    ///
    /// `id`, `created_by` and `created_at` are never changed.
    pub fn apply(&self, client: &mut Client) {
        if let Some(name) = &self.name {
            client.name = name.clone();
        }
        if let Some(contact_person) = &self.contact_person {
            client.contact_person = contact_person.clone();
        }
        if let Some(email) = &self.email {
            client.email = email.clone();
        }
        if let Some(phone) = &self.phone {
            client.phone = phone.clone();
        }
        if let Some(website) = &self.website {
            client.website = website.clone();
        }
        if let Some(notes) = &self.notes {
            client.notes = notes.clone();
        }
    }
}

impl Record for Client {
    fn id(&self) -> Id {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Client {
    /// Inserts a new client
    pub async fn create<'e, E>(executor: E, data: &CreateClient) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let client = sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clients (name, contact_person, email, phone, website, notes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, name, contact_person, email, phone, website, notes,
                      created_by, created_at
            "#,
        )
        .bind(&data.name)
        .bind(&data.contact_person)
        .bind(&data.email)
        .bind(&data.phone)
        .bind(&data.website)
        .bind(&data.notes)
        .bind(data.created_by)
        .fetch_one(executor)
        .await?;

        Ok(client)
    }

    /// Finds a client by ID
    pub async fn find_by_id<'e, E>(executor: E, id: Id) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let client = sqlx::query_as::<_, Client>(
            r#"
            SELECT id, name, contact_person, email, phone, website, notes,
                   created_by, created_at
            FROM clients
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(client)
    }

    /// Finds a client by ID and locks the row until the transaction ends
    pub async fn find_for_update<'e, E>(executor: E, id: Id) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let client = sqlx::query_as::<_, Client>(
            r#"
            SELECT id, name, contact_person, email, phone, website, notes,
                   created_by, created_at
            FROM clients
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(client)
    }

    /// Returns the owner of a client, taking a share lock on its row
    ///
    /// Used by ownership guards so the parent cannot be deleted or handed to
    /// another owner while the guarded write is in flight.
    pub async fn lock_owner<'e, E>(executor: E, id: Id) -> Result<Option<Id>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar::<_, Id>("SELECT created_by FROM clients WHERE id = $1 FOR SHARE")
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Lists all clients, newest first
    pub async fn list<'e, E>(executor: E) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let clients = sqlx::query_as::<_, Client>(
            r#"
            SELECT id, name, contact_person, email, phone, website, notes,
                   created_by, created_at
            FROM clients
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(executor)
        .await?;

        Ok(clients)
    }

    /// Lists the clients owned by a user, newest first
    pub async fn list_by_owner<'e, E>(executor: E, owner: Id) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let clients = sqlx::query_as::<_, Client>(
            r#"
            SELECT id, name, contact_person, email, phone, website, notes,
                   created_by, created_at
            FROM clients
            WHERE created_by = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(owner)
        .fetch_all(executor)
        .await?;

        Ok(clients)
    }

    /// Writes every mutable column of `client` back to its row
    pub async fn save<'e, E>(executor: E, client: &Client) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let saved = sqlx::query_as::<_, Client>(
            r#"
            UPDATE clients
            SET name = $2, contact_person = $3, email = $4,
                phone = $5, website = $6, notes = $7
            WHERE id = $1
            RETURNING id, name, contact_person, email, phone, website, notes,
                      created_by, created_at
            "#,
        )
        .bind(client.id)
        .bind(&client.name)
        .bind(&client.contact_person)
        .bind(&client.email)
        .bind(&client.phone)
        .bind(&client.website)
        .bind(&client.notes)
        .fetch_one(executor)
        .await?;

        Ok(saved)
    }

    /// Deletes a client by ID
    ///
    /// Projects referencing the client are left in place.
    ///
    /// # Returns
    ///
    /// True if a row was removed
    pub async fn delete<'e, E>(executor: E, id: Id) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts a user's clients that have at least one in-progress project
    pub async fn count_active_by_owner<'e, E>(executor: E, owner: Id) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(DISTINCT c.id)
            FROM clients c
            INNER JOIN projects p ON p.client_id = c.id
            WHERE c.created_by = $1 AND p.status = 'in_progress'
            "#,
        )
        .bind(owner)
        .fetch_one(executor)
        .await
    }
}
