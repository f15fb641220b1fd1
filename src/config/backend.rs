//! Refresh token storage backend selection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Available storage backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Plaintext file with owner-only permissions (default).
    #[default]
    File,
    /// System keychain. Needs the `keyring` feature.
    Keyring,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::File => write!(f, "file"),
            StorageBackend::Keyring => write!(f, "keyring"),
        }
    }
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "file" => Ok(StorageBackend::File),
            "keyring" | "keychain" => Ok(StorageBackend::Keyring),
            _ => Err(format!("Unknown storage backend: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_backend() {
        assert_eq!("File".parse::<StorageBackend>(), Ok(StorageBackend::File));
        assert_eq!("keychain".parse::<StorageBackend>(), Ok(StorageBackend::Keyring));
        assert!("vault".parse::<StorageBackend>().is_err());
    }
}
