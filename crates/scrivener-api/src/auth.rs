use std::sync::Arc;

use axum::{Json, extract::State};
use tracing::{error, info, warn};

use scrivener_crypto::{SignatureScheme, ValidationError};
use scrivener_db::{CreateOutcome, Database};
use scrivener_types::api::{AuthRequest, AuthResponse, RegisterRequest};

use crate::error::ApiError;
use crate::extract::ApiJson;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub scheme: SignatureScheme,
    /// Upper bound on a request body buffered for canonicalization.
    pub max_body_bytes: usize,
}

/// Run a store operation off the async runtime.
pub(crate) async fn blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow::anyhow!("worker task failed"))
        })?
        .map_err(|e| {
            error!("Storage error: {:#}", e);
            ApiError::Internal(e)
        })
}

/// POST /users/regist
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let outcome = blocking(&state, move |db| {
        db.create_user(&req.login, &req.email, &req.password)
    })
    .await?;

    match outcome {
        CreateOutcome::Created(user) => Ok(Json(AuthResponse {
            login: user.login,
            token: user.technical_token,
        })),
        CreateOutcome::DuplicateLogin => {
            warn!("Registration rejected: login already taken");
            Err(ValidationError::DuplicateLogin.into())
        }
    }
}

/// POST /users/auth
pub async fn authenticate(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<AuthRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let login = req.login.clone();
    let user = blocking(&state, move |db| db.find_user_by_login(&login)).await?;

    // Passwords are stored and compared as plain text.
    match user {
        Some(user) if user.password == req.password => {
            info!("User {} authenticated", user.id);
            Ok(Json(AuthResponse {
                login: user.login,
                token: user.technical_token,
            }))
        }
        _ => {
            warn!("Authentication failed");
            Err(ValidationError::InvalidCredentials.into())
        }
    }
}
