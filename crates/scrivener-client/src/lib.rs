//! HTTP client for a scrivener server.
//!
//! Registration and authentication hand back a [`SessionContext`]; every
//! other call takes that context explicitly and signs the request with it.

mod client;
mod error;

pub use client::{CipherInput, Client};
pub use error::ClientError;
pub use scrivener_crypto::{SessionContext, SignatureScheme};
