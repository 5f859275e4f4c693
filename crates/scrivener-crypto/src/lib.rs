//! Scrivener Crypto Library
//!
//! Everything here is pure computation, no I/O:
//! - Gronsfeld substitution cipher over Cyrillic and Latin alphabets
//! - Technical token issuance and session token derivation
//! - Request signing and verification for the four signature schemes
//! - Replay window checks for timestamped schemes
//!
//! The server and the client both link this crate so that the two sides
//! always agree on canonicalization and hash inputs.

pub mod cipher;
pub mod error;
pub mod keys;
pub mod replay;
pub mod session;
pub mod signature;

pub use cipher::{CipherKey, decrypt, encrypt};
pub use error::{AuthError, ValidationError};
pub use replay::{ReplayWindow, unix_now};
pub use session::{SessionContext, derive_session_token};
pub use signature::{ParsedSignature, SignatureScheme, canonical_payload};
