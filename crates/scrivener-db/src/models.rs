//! Database row types. These map directly to SQLite rows.
//! Distinct from scrivener-types API models to keep the DB layer independent.

/// A registered account.
///
/// `password` is stored exactly as submitted. This is a known weakness kept
/// for compatibility with existing clients; nothing hashes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRow {
    pub id: i64,
    pub login: String,
    pub email: String,
    pub password: String,
    pub technical_token: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRow {
    pub seq: i64,
    pub id: i64,
    pub owner_id: i64,
    pub kind: String,
    pub content: String,
}

/// Result of an atomic registration attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(CredentialRow),
    DuplicateLogin,
}
