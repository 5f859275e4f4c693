use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use scrivener_crypto::{AuthError, ValidationError};
use scrivener_types::api::{
    KindQuery, StoreTextRequest, TextIdResponse, TextListResponse, UpdateTextRequest,
};
use scrivener_types::models::{TextArtifact, TextKind};

use crate::auth::{AppState, blocking};
use crate::error::{ApiError, NotFoundError};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::Owner;

/// Check that `{login}` in the path names the signer.
///
/// An unknown login is reported as such even to a signed caller; a known login
/// belonging to someone else is `AccessDenied`.
pub(crate) async fn authorize_path(state: &AppState, owner: &Owner, login: &str) -> Result<(), ApiError> {
    if owner.login == login {
        return Ok(());
    }
    let login = login.to_string();
    let exists = blocking(state, move |db| Ok(db.find_user_by_login(&login)?.is_some())).await?;
    if exists {
        Err(AuthError::AccessDenied.into())
    } else {
        Err(NotFoundError::UnknownUser.into())
    }
}

/// POST /users/{login}/texts
pub async fn store_text(
    State(state): State<AppState>,
    ApiPath(login): ApiPath<String>,
    Extension(owner): Extension<Owner>,
    ApiJson(req): ApiJson<StoreTextRequest>,
) -> Result<impl IntoResponse, ApiError> {
    authorize_path(&state, &owner, &login).await?;
    if req.text.is_empty() {
        return Err(ValidationError::EmptyText.into());
    }

    let owner_id = owner.id;
    let id = blocking(&state, move |db| db.put_text(owner_id, TextKind::Plain, &req.text)).await?;

    info!("User {} stored plain text {}", owner.id, id);
    Ok((StatusCode::CREATED, Json(TextIdResponse { id })))
}

/// GET /users/{login}/texts?kind=
pub async fn list_texts(
    State(state): State<AppState>,
    ApiPath(login): ApiPath<String>,
    ApiQuery(query): ApiQuery<KindQuery>,
    Extension(owner): Extension<Owner>,
) -> Result<Json<TextListResponse>, ApiError> {
    authorize_path(&state, &owner, &login).await?;

    let kind = query.kind.unwrap_or_default();
    let owner_id = owner.id;
    let rows = blocking(&state, move |db| db.list_texts(owner_id, kind)).await?;

    let texts = rows
        .into_iter()
        .map(|row| TextArtifact {
            id: row.id,
            kind,
            text: row.content,
        })
        .collect();
    Ok(Json(TextListResponse { texts }))
}

/// GET /users/{login}/texts/{id}?kind=
pub async fn get_text(
    State(state): State<AppState>,
    ApiPath((login, id)): ApiPath<(String, i64)>,
    ApiQuery(query): ApiQuery<KindQuery>,
    Extension(owner): Extension<Owner>,
) -> Result<Json<TextArtifact>, ApiError> {
    authorize_path(&state, &owner, &login).await?;

    let kind = query.kind.unwrap_or_default();
    let owner_id = owner.id;
    let text = blocking(&state, move |db| db.get_text(owner_id, kind, id))
        .await?
        .ok_or(NotFoundError::ArtifactNotFound)?;

    Ok(Json(TextArtifact { id, kind, text }))
}

/// PUT /users/{login}/texts/{id}
pub async fn update_text(
    State(state): State<AppState>,
    ApiPath((login, id)): ApiPath<(String, i64)>,
    Extension(owner): Extension<Owner>,
    ApiJson(req): ApiJson<UpdateTextRequest>,
) -> Result<Json<TextArtifact>, ApiError> {
    authorize_path(&state, &owner, &login).await?;
    if req.text.is_empty() {
        return Err(ValidationError::EmptyText.into());
    }

    let kind = req.kind.unwrap_or_default();
    let owner_id = owner.id;
    let text = req.text.clone();
    let updated = blocking(&state, move |db| db.update_text(owner_id, kind, id, &text)).await?;
    if !updated {
        return Err(NotFoundError::ArtifactNotFound.into());
    }

    info!("User {} updated {} text {}", owner.id, kind, id);
    Ok(Json(TextArtifact {
        id,
        kind,
        text: req.text,
    }))
}

/// DELETE /users/{login}/texts/{id}?kind=
pub async fn delete_text(
    State(state): State<AppState>,
    ApiPath((login, id)): ApiPath<(String, i64)>,
    ApiQuery(query): ApiQuery<KindQuery>,
    Extension(owner): Extension<Owner>,
) -> Result<StatusCode, ApiError> {
    authorize_path(&state, &owner, &login).await?;

    let kind = query.kind.unwrap_or_default();
    let owner_id = owner.id;
    let deleted = blocking(&state, move |db| db.delete_text(owner_id, kind, id)).await?;
    if !deleted {
        return Err(NotFoundError::ArtifactNotFound.into());
    }

    info!("User {} deleted {} text {}", owner.id, kind, id);
    Ok(StatusCode::NO_CONTENT)
}
