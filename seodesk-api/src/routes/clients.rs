/// Client endpoints
///
/// # Endpoints
///
/// - `GET /api/clients` - Caller's clients, newest first
/// - `POST /api/clients` - Create a client owned by the caller
/// - `GET /api/clients/:id` - One client
/// - `PUT /api/clients/:id` - Partial update
/// - `DELETE /api/clients/:id` - Delete (projects are left in place)
/// - `GET /api/clients/:clientId/projects` - Projects of an owned client

use crate::{
    app::AppState,
    error::{validate, ApiError, ApiResult},
    extract::{ApiJson, ApiPath},
};
use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use seodesk_shared::{
    auth::{authorization::authorize_client, session::AuthContext},
    models::{
        activity_log::{ActivityAction, EntityType},
        client::{Client, CreateClient, UpdateClient},
        project::Project,
        Id,
    },
};
use serde::Deserialize;
use validator::Validate;

const INVALID: &str = "Invalid client data";

/// Create client request
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateClientRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[validate(length(min = 1, message = "Contact person is required"))]
    pub contact_person: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    pub phone: Option<String>,

    pub website: Option<String>,

    pub notes: Option<String>,
}

impl CreateClientRequest {
    fn into_create(self, created_by: Id) -> CreateClient {
        CreateClient {
            name: self.name,
            contact_person: self.contact_person,
            email: self.email,
            phone: self.phone,
            website: self.website,
            notes: self.notes,
            created_by,
        }
    }
}

pub async fn list_clients(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Client>>> {
    let clients = state.store.list_clients_by_owner(auth.user_id()).await?;
    Ok(Json(clients))
}

pub async fn get_client(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Id>,
) -> ApiResult<Json<Client>> {
    let client = authorize_client(state.store.as_ref(), auth.user_id(), id).await?;
    Ok(Json(client))
}

pub async fn create_client(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateClientRequest>,
) -> ApiResult<(StatusCode, Json<Client>)> {
    validate(&req, INVALID)?;

    let client = state
        .store
        .create_client(req.into_create(auth.user_id()))
        .await?;

    state
        .activity
        .mutation(
            auth.user_id(),
            ActivityAction::Created,
            EntityType::Client,
            client.id,
            &client.name,
        )
        .await;

    Ok((StatusCode::CREATED, Json(client)))
}

pub async fn update_client(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Id>,
    body: Result<ApiJson<UpdateClient>, ApiError>,
) -> ApiResult<Json<Client>> {
    let existing = authorize_client(state.store.as_ref(), auth.user_id(), id).await?;

    let ApiJson(changes) = body?;
    validate(&changes, INVALID)?;

    let client = state
        .store
        .update_client(id, changes)
        .await?
        .ok_or_else(|| ApiError::NotFound("Client not found".to_string()))?;

    state
        .activity
        .mutation(
            auth.user_id(),
            ActivityAction::Updated,
            EntityType::Client,
            id,
            &existing.name,
        )
        .await;

    Ok(Json(client))
}

pub async fn delete_client(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Id>,
) -> ApiResult<StatusCode> {
    let existing = authorize_client(state.store.as_ref(), auth.user_id(), id).await?;

    if !state.store.delete_client(id).await? {
        return Err(ApiError::NotFound("Client not found".to_string()));
    }

    state
        .activity
        .mutation(
            auth.user_id(),
            ActivityAction::Deleted,
            EntityType::Client,
            id,
            &existing.name,
        )
        .await;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_client_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(client_id): ApiPath<Id>,
) -> ApiResult<Json<Vec<Project>>> {
    authorize_client(state.store.as_ref(), auth.user_id(), client_id).await?;

    let projects = state.store.list_projects_by_client(client_id).await?;
    Ok(Json(projects))
}
