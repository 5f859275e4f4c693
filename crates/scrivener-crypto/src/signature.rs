use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{AuthError, ValidationError};
use crate::replay::ReplayWindow;
use crate::session::{candidate_buckets, derive_session_token};

/// Replay window for `Timestamped` signatures.
pub const TIMESTAMPED_WINDOW_SECS: u64 = 180;

/// Replay window for `Session` signatures.
pub const SESSION_WINDOW_SECS: u64 = 300;

pub(crate) fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Request signing scheme. A deployment runs exactly one.
///
/// | scheme        | header           | hash input                         |
/// |---------------|------------------|------------------------------------|
/// | `Token`       | `token`          | none, the token travels in clear   |
/// | `Timestamped` | `hash:timestamp` | technical token, timestamp         |
/// | `PayloadBound`| `hash`           | technical token, payload           |
/// | `Session`     | `hash:timestamp` | session token, payload, timestamp  |
///
/// `Token` and `PayloadBound` carry no timestamp and can be replayed
/// indefinitely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureScheme {
    Token = 1,
    Timestamped = 2,
    PayloadBound = 3,
    Session = 4,
}

impl SignatureScheme {
    pub const ALL: [SignatureScheme; 4] = [
        Self::Token,
        Self::Timestamped,
        Self::PayloadBound,
        Self::Session,
    ];

    pub fn variant(&self) -> u8 {
        *self as u8
    }

    pub fn binds_timestamp(&self) -> bool {
        matches!(self, Self::Timestamped | Self::Session)
    }

    pub fn binds_payload(&self) -> bool {
        matches!(self, Self::PayloadBound | Self::Session)
    }

    pub fn replay_window(&self) -> Option<ReplayWindow> {
        match self {
            Self::Timestamped => Some(ReplayWindow::new(TIMESTAMPED_WINDOW_SECS)),
            Self::Session => Some(ReplayWindow::new(SESSION_WINDOW_SECS)),
            Self::Token | Self::PayloadBound => None,
        }
    }

    /// Build the header value a client sends.
    pub fn sign(
        &self,
        technical_token: &str,
        session_token: &str,
        canonical_payload: &str,
        now: i64,
    ) -> String {
        match self {
            Self::Token => technical_token.to_string(),
            Self::Timestamped => {
                format!("{}:{}", sha256_hex(&format!("{}{}", technical_token, now)), now)
            }
            Self::PayloadBound => sha256_hex(&format!("{}{}", technical_token, canonical_payload)),
            Self::Session => format!(
                "{}:{}",
                sha256_hex(&format!("{}{}{}", session_token, canonical_payload, now)),
                now
            ),
        }
    }

    /// Split the header and, for timestamped schemes, enforce the replay
    /// window. Freshness is decided here, before any hash is compared.
    pub fn parse_header(&self, header: Option<&str>, now: i64) -> Result<ParsedSignature, AuthError> {
        let raw = header
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or(AuthError::MissingHeader)?;

        if !self.binds_timestamp() {
            return Ok(ParsedSignature {
                scheme: *self,
                hash: raw.to_string(),
                timestamp: None,
            });
        }

        let (hash, ts_raw) = raw.split_once(':').ok_or(AuthError::MalformedSignature)?;
        if hash.is_empty() {
            return Err(AuthError::MalformedSignature);
        }
        let timestamp: i64 = ts_raw.parse().map_err(|_| AuthError::MalformedSignature)?;

        if let Some(window) = self.replay_window() {
            window.check(timestamp, now)?;
        }

        Ok(ParsedSignature {
            scheme: *self,
            hash: hash.to_string(),
            timestamp: Some(ts_raw.to_string()),
        })
    }
}

impl fmt::Display for SignatureScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Token => "token",
            Self::Timestamped => "timestamped",
            Self::PayloadBound => "payload",
            Self::Session => "session",
        };
        write!(f, "{} (variant {})", name, self.variant())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown signature scheme: {0:?}")]
pub struct UnknownScheme(pub String);

impl FromStr for SignatureScheme {
    type Err = UnknownScheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "token" => Ok(Self::Token),
            "2" | "timestamped" => Ok(Self::Timestamped),
            "3" | "payload" => Ok(Self::PayloadBound),
            "4" | "session" => Ok(Self::Session),
            other => Err(UnknownScheme(other.to_string())),
        }
    }
}

/// A syntactically valid, fresh signature header awaiting a credential match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSignature {
    scheme: SignatureScheme,
    hash: String,
    // Hash input uses the timestamp exactly as sent.
    timestamp: Option<String>,
}

impl ParsedSignature {
    /// Hash part of the header; for `Token` this is the technical token itself.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Return the key of the first candidate whose technical token reproduces
    /// the submitted hash.
    ///
    /// `Session` signatures are tried against every bucket in
    /// [`candidate_buckets`] for each candidate.
    pub fn find_match<'a, K>(
        &self,
        canonical_payload: &str,
        now: i64,
        candidates: impl IntoIterator<Item = (K, &'a str)>,
    ) -> Result<K, AuthError> {
        let ts = self.timestamp.as_deref().unwrap_or("");
        let mut tried = 0usize;

        for (key, technical_token) in candidates {
            tried += 1;
            let matched = match self.scheme {
                SignatureScheme::Token => technical_token == self.hash,
                SignatureScheme::Timestamped => sha256_hex(&format!("{}{}", technical_token, ts)) == self.hash,
                SignatureScheme::PayloadBound => {
                    sha256_hex(&format!("{}{}", technical_token, canonical_payload)) == self.hash
                }
                SignatureScheme::Session => candidate_buckets(now).any(|bucket| {
                    let session_token = derive_session_token(technical_token, bucket);
                    sha256_hex(&format!("{}{}{}", session_token, canonical_payload, ts)) == self.hash
                }),
            };
            if matched {
                return Ok(key);
            }
        }

        debug!("{} signature matched none of {} credentials", self.scheme, tried);
        Err(AuthError::InvalidSignature)
    }
}

/// Canonical payload for a request.
///
/// Reads the query parameters for `GET`, `HEAD` and `DELETE`, the JSON body
/// for everything else. Empty input canonicalizes to `""`.
pub fn canonical_payload<I, K, V>(method: &str, query: I, body: &[u8]) -> Result<String, ValidationError>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: AsRef<str>,
{
    if reads_query(method) {
        Ok(canonical_query(query))
    } else {
        canonical_body(body)
    }
}

pub fn reads_query(method: &str) -> bool {
    matches!(method.to_ascii_uppercase().as_str(), "GET" | "HEAD" | "DELETE")
}

/// Sorted-key JSON of query parameters. Values made only of ASCII digits
/// become integers.
pub fn canonical_query<I, K, V>(query: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: AsRef<str>,
{
    let map: Map<String, Value> = query
        .into_iter()
        .map(|(k, v)| (k.into(), coerce_query_value(v.as_ref())))
        .collect();
    render(Value::Object(map))
}

/// Sorted-key JSON of a request body.
pub fn canonical_body(body: &[u8]) -> Result<String, ValidationError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(String::new());
    }
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ValidationError::MalformedPayload(e.to_string()))?;
    Ok(render(value))
}

fn coerce_query_value(v: &str) -> Value {
    if !v.is_empty() && v.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(n) = v.parse::<u64>() {
            return Value::from(n);
        }
    }
    Value::String(v.to_string())
}

fn render(value: Value) -> String {
    match &value {
        Value::Null => String::new(),
        Value::Object(map) if map.is_empty() => String::new(),
        _ => sorted(value).to_string(),
    }
}

fn sorted(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().map(|(k, v)| (k, sorted(v))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sorted).collect()),
        other => other,
    }
}
