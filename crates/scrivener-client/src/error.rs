use scrivener_crypto::ValidationError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server rejected request ({status}): {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error(transparent)]
    Payload(#[from] ValidationError),

    #[error("failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ClientError {
    /// Server error code, when the server produced one.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Rejection caused by clock drift rather than a bad signature.
    pub fn is_expired(&self) -> bool {
        self.code() == Some("EXPIRED_TIMESTAMP")
    }
}
