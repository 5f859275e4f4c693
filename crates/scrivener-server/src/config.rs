use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;

use scrivener_crypto::SignatureScheme;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the HTTP listener to
    pub bind_address: SocketAddr,

    /// Path to the SQLite database
    pub database_path: PathBuf,

    /// Signature scheme every protected route is verified with
    pub scheme: SignatureScheme,

    /// Largest request body buffered for signature canonicalization
    pub max_body_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let host = var("SCRIVENER_HOST", "0.0.0.0");
        let port: u16 = var("SCRIVENER_PORT", "8000")
            .parse()
            .context("SCRIVENER_PORT must be a port number")?;
        let bind_address = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", host, port))?;

        let database_path = var("SCRIVENER_DB_PATH", "scrivener.db").into();

        let scheme = var("SCRIVENER_SIGNATURE_SCHEME", "4").parse()?;

        let max_body_bytes = var("SCRIVENER_MAX_BODY_BYTES", "1048576")
            .parse()
            .context("SCRIVENER_MAX_BODY_BYTES must be a byte count")?;

        Ok(Config {
            bind_address,
            database_path,
            scheme,
            max_body_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:8000".parse().unwrap());
        assert_eq!(config.database_path, PathBuf::from("scrivener.db"));
        assert_eq!(config.scheme, SignatureScheme::Session);
        assert_eq!(config.max_body_bytes, 1024 * 1024);
    }

    #[test]
    fn overrides() {
        let config = load(&[
            ("SCRIVENER_HOST", "127.0.0.1"),
            ("SCRIVENER_PORT", "9100"),
            ("SCRIVENER_DB_PATH", "/tmp/s.db"),
            ("SCRIVENER_SIGNATURE_SCHEME", "timestamped"),
        ])
        .unwrap();
        assert_eq!(config.bind_address, "127.0.0.1:9100".parse().unwrap());
        assert_eq!(config.database_path, PathBuf::from("/tmp/s.db"));
        assert_eq!(config.scheme, SignatureScheme::Timestamped);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(load(&[("SCRIVENER_PORT", "eighty")]).is_err());
        assert!(load(&[("SCRIVENER_SIGNATURE_SCHEME", "7")]).is_err());
        assert!(load(&[("SCRIVENER_HOST", "not a host")]).is_err());
    }
}
