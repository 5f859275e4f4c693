use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use scrivener_crypto::{CipherKey, ValidationError};
use scrivener_types::api::{CipherRequest, CipherResponse};
use scrivener_types::models::TextKind;

use crate::auth::{AppState, blocking};
use crate::error::{ApiError, NotFoundError};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::Owner;
use crate::texts::authorize_path;

#[derive(Clone, Copy)]
enum Operation {
    Encrypt,
    Decrypt,
}

impl Operation {
    /// Kind a `text_id` refers to.
    fn source(self) -> TextKind {
        match self {
            Self::Encrypt => TextKind::Plain,
            Self::Decrypt => TextKind::Encrypted,
        }
    }

    /// Kind the result is stored under.
    fn target(self) -> TextKind {
        match self {
            Self::Encrypt => TextKind::Encrypted,
            Self::Decrypt => TextKind::Decrypted,
        }
    }

    fn apply(self, text: &str, key: &CipherKey) -> String {
        match self {
            Self::Encrypt => scrivener_crypto::encrypt(text, key),
            Self::Decrypt => scrivener_crypto::decrypt(text, key),
        }
    }
}

/// POST /users/{login}/encrypt
pub async fn encrypt(
    State(state): State<AppState>,
    ApiPath(login): ApiPath<String>,
    Extension(owner): Extension<Owner>,
    ApiJson(req): ApiJson<CipherRequest>,
) -> Result<impl IntoResponse, ApiError> {
    run(state, login, owner, req, Operation::Encrypt).await
}

/// POST /users/{login}/decrypt
pub async fn decrypt(
    State(state): State<AppState>,
    ApiPath(login): ApiPath<String>,
    Extension(owner): Extension<Owner>,
    ApiJson(req): ApiJson<CipherRequest>,
) -> Result<impl IntoResponse, ApiError> {
    run(state, login, owner, req, Operation::Decrypt).await
}

async fn run(
    state: AppState,
    login: String,
    owner: Owner,
    req: CipherRequest,
    op: Operation,
) -> Result<(StatusCode, Json<CipherResponse>), ApiError> {
    authorize_path(&state, &owner, &login).await?;

    // Key is validated before anything is read or written.
    let key = CipherKey::parse(&req.key)?;

    let owner_id = owner.id;
    let input = match (req.text, req.text_id) {
        (Some(text), None) => text,
        (None, Some(text_id)) => blocking(&state, move |db| db.get_text(owner_id, op.source(), text_id))
            .await?
            .ok_or(NotFoundError::ArtifactNotFound)?,
        (None, None) => return Err(ValidationError::EmptyText.into()),
        (Some(_), Some(_)) => {
            return Err(ValidationError::MalformedPayload(
                "text and text_id are mutually exclusive".into(),
            )
            .into());
        }
    };
    if input.is_empty() {
        return Err(ValidationError::EmptyText.into());
    }

    let output = op.apply(&input, &key);
    let stored = output.clone();
    let id = blocking(&state, move |db| db.put_text(owner_id, op.target(), &stored)).await?;

    info!("User {} stored {} text {}", owner.id, op.target(), id);
    Ok((StatusCode::CREATED, Json(CipherResponse { id, text: output })))
}
