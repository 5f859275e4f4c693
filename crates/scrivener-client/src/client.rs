use reqwest::{Method, Response, StatusCode, header::CONTENT_TYPE};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use scrivener_crypto::signature::{canonical_body, canonical_query, reads_query};
use scrivener_crypto::{SessionContext, SignatureScheme, unix_now};
use scrivener_types::api::{
    AuthRequest, AuthResponse, CipherRequest, CipherResponse, ErrorResponse, RegisterRequest,
    SIGNATURE_HEADER, StoreTextRequest, TextIdResponse, TextListResponse, UpdateTextRequest,
};
use scrivener_types::models::{TextArtifact, TextKind};

use crate::error::ClientError;

/// Source text for an encrypt or decrypt call.
#[derive(Debug, Clone)]
pub enum CipherInput {
    Text(String),
    /// A stored text: plain for encryption, encrypted for decryption.
    Stored(i64),
}

/// A signed request ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Prepared {
    signature: String,
    body: Option<String>,
}

pub struct Client {
    http: reqwest::Client,
    base_url: String,
    scheme: SignatureScheme,
}

impl Client {
    pub fn new(base_url: impl Into<String>, scheme: SignatureScheme) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            scheme,
        }
    }

    // -- Auth --

    /// Register and derive the session token for this moment.
    pub async fn register(&self, login: &str, email: &str, password: &str) -> Result<SessionContext, ClientError> {
        let req = RegisterRequest {
            login: login.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let resp = self.http.post(self.url("/users/regist")).json(&req).send().await?;
        let auth: AuthResponse = parse(resp).await?;
        Ok(SessionContext::establish(auth.login, auth.token, self.scheme, unix_now()))
    }

    /// Authenticate and derive a fresh session token.
    pub async fn authenticate(&self, login: &str, password: &str) -> Result<SessionContext, ClientError> {
        let req = AuthRequest {
            login: login.to_string(),
            password: password.to_string(),
        };
        let resp = self.http.post(self.url("/users/auth")).json(&req).send().await?;
        let auth: AuthResponse = parse(resp).await?;
        Ok(SessionContext::establish(auth.login, auth.token, self.scheme, unix_now()))
    }

    // -- Texts --

    pub async fn store_text(&self, ctx: &SessionContext, text: &str) -> Result<i64, ClientError> {
        let body = StoreTextRequest { text: text.to_string() };
        let path = format!("/users/{}/texts", ctx.login);
        let resp: TextIdResponse = parse(self.signed(ctx, Method::POST, &path, &[], Some(&body)).await?).await?;
        Ok(resp.id)
    }

    pub async fn list_texts(&self, ctx: &SessionContext, kind: TextKind) -> Result<Vec<TextArtifact>, ClientError> {
        let path = format!("/users/{}/texts", ctx.login);
        let query = [("kind", kind.as_str())];
        let resp: TextListResponse = parse(self.signed(ctx, Method::GET, &path, &query, None::<&()>).await?).await?;
        Ok(resp.texts)
    }

    pub async fn get_text(&self, ctx: &SessionContext, kind: TextKind, id: i64) -> Result<TextArtifact, ClientError> {
        let path = format!("/users/{}/texts/{}", ctx.login, id);
        let query = [("kind", kind.as_str())];
        parse(self.signed(ctx, Method::GET, &path, &query, None::<&()>).await?).await
    }

    pub async fn update_text(
        &self,
        ctx: &SessionContext,
        kind: TextKind,
        id: i64,
        text: &str,
    ) -> Result<TextArtifact, ClientError> {
        let path = format!("/users/{}/texts/{}", ctx.login, id);
        let body = UpdateTextRequest {
            kind: Some(kind),
            text: text.to_string(),
        };
        parse(self.signed(ctx, Method::PUT, &path, &[], Some(&body)).await?).await
    }

    pub async fn delete_text(&self, ctx: &SessionContext, kind: TextKind, id: i64) -> Result<(), ClientError> {
        let path = format!("/users/{}/texts/{}", ctx.login, id);
        let query = [("kind", kind.as_str())];
        let resp = self.signed(ctx, Method::DELETE, &path, &query, None::<&()>).await?;
        check(resp).await.map(|_| ())
    }

    // -- Cipher --

    pub async fn encrypt(&self, ctx: &SessionContext, input: CipherInput, key: &str) -> Result<CipherResponse, ClientError> {
        self.cipher(ctx, "encrypt", input, key).await
    }

    pub async fn decrypt(&self, ctx: &SessionContext, input: CipherInput, key: &str) -> Result<CipherResponse, ClientError> {
        self.cipher(ctx, "decrypt", input, key).await
    }

    async fn cipher(
        &self,
        ctx: &SessionContext,
        op: &str,
        input: CipherInput,
        key: &str,
    ) -> Result<CipherResponse, ClientError> {
        let (text, text_id) = match input {
            CipherInput::Text(text) => (Some(text), None),
            CipherInput::Stored(id) => (None, Some(id)),
        };
        let body = CipherRequest {
            key: key.to_string(),
            text,
            text_id,
        };
        let path = format!("/users/{}/{}", ctx.login, op);
        parse(self.signed(ctx, Method::POST, &path, &[], Some(&body)).await?).await
    }

    // -- Signing --

    /// Send a signed request. An `EXPIRED_TIMESTAMP` rejection is retried
    /// once with a fresh timestamp; anything else is returned as is.
    async fn signed<B: Serialize>(
        &self,
        ctx: &SessionContext,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&B>,
    ) -> Result<Response, ClientError> {
        let mut retried = false;
        loop {
            let prepared = prepare(ctx, &method, query, body, unix_now())?;

            let mut req = self
                .http
                .request(method.clone(), self.url(path))
                .header(SIGNATURE_HEADER, &prepared.signature);
            if !query.is_empty() {
                req = req.query(query);
            }
            if let Some(raw) = prepared.body {
                req = req.header(CONTENT_TYPE, "application/json").body(raw);
            }

            let resp = req.send().await?;
            if resp.status() != StatusCode::UNAUTHORIZED || retried {
                return Ok(resp);
            }

            match check(resp).await {
                Err(err) if err.is_expired() => {
                    warn!("{} {}: signature expired, retrying once", method, path);
                    retried = true;
                }
                other => return other,
            }
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Canonicalize the payload exactly as the server will and sign it.
fn prepare<B: Serialize>(
    ctx: &SessionContext,
    method: &Method,
    query: &[(&str, &str)],
    body: Option<&B>,
    now: i64,
) -> Result<Prepared, ClientError> {
    let body = body.map(serde_json::to_string).transpose()?;
    let payload = if reads_query(method.as_str()) {
        canonical_query(query.iter().copied())
    } else {
        canonical_body(body.as_deref().unwrap_or("").as_bytes())?
    };
    debug!("Signing {} request with {}", method, ctx.scheme);
    Ok(Prepared {
        signature: ctx.sign(&payload, now),
        body,
    })
}

async fn check(resp: Response) -> Result<Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let bytes = resp.bytes().await?;
    let (code, message) = match serde_json::from_slice::<ErrorResponse>(&bytes) {
        Ok(body) => (body.error.code, body.error.message),
        Err(_) => (String::new(), String::from_utf8_lossy(&bytes).into_owned()),
    };
    Err(ClientError::Api {
        status: status.as_u16(),
        code,
        message,
    })
}

async fn parse<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
    Ok(check(resp).await?.json::<T>().await?)
}
