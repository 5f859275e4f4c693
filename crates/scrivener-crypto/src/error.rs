/// Authorization failures raised while checking a request signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("signature header is missing")]
    MissingHeader,

    #[error("signature header is malformed")]
    MalformedSignature,

    #[error("signature timestamp is outside the replay window")]
    ExpiredTimestamp,

    #[error("signature does not match any credential")]
    InvalidSignature,

    #[error("access denied")]
    AccessDenied,
}

impl AuthError {
    /// Stable machine-readable code used on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingHeader => "MISSING_HEADER",
            Self::MalformedSignature => "MALFORMED_SIGNATURE",
            Self::ExpiredTimestamp => "EXPIRED_TIMESTAMP",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::AccessDenied => "ACCESS_DENIED",
        }
    }
}

/// Client input that was rejected before any work was done.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("text must not be empty")]
    EmptyText,

    #[error("cipher key must be a non-empty sequence of digits")]
    InvalidKey,

    #[error("request payload is not valid JSON: {0}")]
    MalformedPayload(String),

    #[error("request body exceeds the size limit")]
    PayloadTooLarge,

    #[error("login is already taken")]
    DuplicateLogin,

    #[error("login or password is incorrect")]
    InvalidCredentials,
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyText => "EMPTY_TEXT",
            Self::InvalidKey => "INVALID_KEY",
            Self::MalformedPayload(_) => "MALFORMED_PAYLOAD",
            Self::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            Self::DuplicateLogin => "DUPLICATE_LOGIN",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
        }
    }
}
