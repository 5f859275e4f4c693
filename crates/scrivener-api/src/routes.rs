use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};

use crate::auth::{self, AppState};
use crate::middleware::require_signature;
use crate::{cipher, texts};

/// All routes. Transport layers (CORS, tracing) are added by the binary.
pub fn router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.max_body_bytes);

    let public_routes = Router::new()
        .route("/users/regist", post(auth::register))
        .route("/users/auth", post(auth::authenticate))
        .route("/health", get(health))
        .with_state(state.clone());

    let signed_routes = Router::new()
        .route(
            "/users/{login}/texts",
            get(texts::list_texts).post(texts::store_text),
        )
        .route(
            "/users/{login}/texts/{id}",
            get(texts::get_text)
                .put(texts::update_text)
                .delete(texts::delete_text),
        )
        .route("/users/{login}/encrypt", post(cipher::encrypt))
        .route("/users/{login}/decrypt", post(cipher::decrypt))
        .layer(middleware::from_fn_with_state(state.clone(), require_signature))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(signed_routes)
        .layer(body_limit)
}

async fn health() -> &'static str {
    "ok"
}
