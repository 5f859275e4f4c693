use axum::{
    body::{Body, Bytes},
    extract::{FromRequest, Query, Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use scrivener_crypto::{AuthError, SignatureScheme, canonical_payload, unix_now};
use scrivener_types::api::SIGNATURE_HEADER;

use crate::auth::{AppState, blocking};
use crate::error::ApiError;

/// Account a request was signed by. Inserted as a request extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    pub id: i64,
    pub login: String,
}

/// Verify the request signature and attach the signing [`Owner`].
///
/// Order matters: header shape and timestamp freshness are settled before the
/// payload is canonicalized or any credential is hashed.
pub async fn require_signature(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let now = unix_now();
    let (parts, body) = req.into_parts();

    let header = parts
        .headers
        .get(SIGNATURE_HEADER)
        .map(|v| v.to_str().map_err(|_| AuthError::MalformedSignature))
        .transpose()
        .and_then(|h| state.scheme.parse_header(h, now))
        .inspect_err(|e| warn!("{} {}: signature rejected: {}", parts.method, parts.uri.path(), e))?;

    // Buffered under the router's `DefaultBodyLimit`; oversize bodies are 413.
    let bytes = Bytes::from_request(Request::from_parts(parts.clone(), body), &state).await?;

    let Query(query) = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri)?;

    let payload = canonical_payload(parts.method.as_str(), query, &bytes)?;

    let scheme = state.scheme;
    let owner = blocking(&state, move |db| {
        // Only the clear-token scheme can use the token index; every other
        // scheme hides the token behind a hash and needs the full set.
        let candidates: Vec<_> = match scheme {
            SignatureScheme::Token => db.find_user_by_token(header.hash())?.into_iter().collect(),
            _ => db.list_users()?,
        };
        let matched = header
            .find_match(
                &payload,
                now,
                candidates.iter().map(|c| (c, c.technical_token.as_str())),
            )
            .map(|c| Owner {
                id: c.id,
                login: c.login.clone(),
            });
        Ok(matched)
    })
    .await?
    .inspect_err(|e| warn!("{} {}: signature rejected: {}", parts.method, parts.uri.path(), e))?;

    debug!("Request signed by user {}", owner.id);

    let mut req = Request::from_parts(parts, Body::from(bytes));
    req.extensions_mut().insert(owner);
    Ok(next.run(req).await)
}
