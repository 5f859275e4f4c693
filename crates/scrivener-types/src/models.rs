use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which stage of the cipher workflow a stored text belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextKind {
    #[default]
    Plain,
    Encrypted,
    Decrypted,
}

impl TextKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Encrypted => "encrypted",
            Self::Decrypted => "decrypted",
        }
    }
}

impl fmt::Display for TextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TextKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plain" => Ok(Self::Plain),
            "encrypted" => Ok(Self::Encrypted),
            "decrypted" => Ok(Self::Decrypted),
            other => Err(format!("unknown text kind: {}", other)),
        }
    }
}

/// A stored text as returned to its owner.
///
/// `id` is the creation unix timestamp. Two texts created in the same second
/// share an id; lookups resolve to the earlier one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextArtifact {
    pub id: i64,
    pub kind: TextKind,
    pub text: String,
}
