//! Durable storage backends for the refresh token.
//!
//! The refresh token is the only secret that outlives the process. Storage
//! is synchronous: a save has completed by the time it returns.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{Error, Result};

/// A single-secret store.
pub trait SecretStorage: Send + Sync {
    /// Load the stored secret. `Ok(None)` means nothing is stored.
    fn load(&self) -> Result<Option<String>>;

    /// Replace the stored secret.
    fn save(&self, secret: &str) -> Result<()>;

    /// Remove the stored secret. Removing nothing is not an error.
    fn clear(&self) -> Result<()>;

    /// Human readable location, used in log lines.
    fn describe(&self) -> String;
}

/// Plaintext file holding one secret.
#[derive(Debug, Clone)]
pub struct FileSecretStorage {
    path: PathBuf,
}

impl FileSecretStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SecretStorage for FileSecretStorage {
    fn load(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                let secret = content.trim();
                if secret.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(secret.to_string()))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Storage(format!(
                "failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn save(&self, secret: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        fs::write(&self.path, secret).map_err(|e| {
            Error::Storage(format!("failed to write {}: {}", self.path.display(), e))
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Storage(format!(
                "failed to remove {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory storage. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemorySecretStorage {
    secret: Mutex<Option<String>>,
}

impl MemorySecretStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>> {
        self.secret
            .lock()
            .map_err(|_| Error::Storage("memory storage lock poisoned".into()))
    }
}

impl SecretStorage for MemorySecretStorage {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.lock()?.clone())
    }

    fn save(&self, secret: &str) -> Result<()> {
        *self.lock()? = Some(secret.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.lock()? = None;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// System keychain entry.
#[cfg(feature = "keyring")]
#[derive(Debug, Clone)]
pub struct KeyringSecretStorage {
    service: String,
    user: String,
}

#[cfg(feature = "keyring")]
impl KeyringSecretStorage {
    pub fn new(service: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            user: user.into(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service, &self.user)
            .map_err(|e| Error::Storage(format!("keychain entry unavailable: {}", e)))
    }
}

#[cfg(feature = "keyring")]
impl SecretStorage for KeyringSecretStorage {
    fn load(&self) -> Result<Option<String>> {
        match self.entry()?.get_password() {
            Ok(secret) if secret.trim().is_empty() => Ok(None),
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(Error::Storage(format!("keychain read failed: {}", e))),
        }
    }

    fn save(&self, secret: &str) -> Result<()> {
        self.entry()?
            .set_password(secret)
            .map_err(|e| Error::Storage(format!("keychain write failed: {}", e)))
    }

    fn clear(&self) -> Result<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(Error::Storage(format!("keychain delete failed: {}", e))),
        }
    }

    fn describe(&self) -> String {
        format!("keychain {}/{}", self.service, self.user)
    }
}
