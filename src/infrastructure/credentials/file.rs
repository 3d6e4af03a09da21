use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::domain::{CredentialStore, DomainError, SessionToken};

/// On-disk shape: a single named slot
#[derive(Debug, Default, Serialize, Deserialize)]
struct TokenDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
}

/// Credential store persisted as a small JSON file, so the session survives
/// a restart of the application
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "token".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn read_document(&self) -> Result<Option<TokenDocument>, DomainError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(DomainError::storage(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        serde_json::from_str(&raw).map(Some).map_err(|e| {
            DomainError::storage(format!("Failed to parse {}: {}", self.path.display(), e))
        })
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> Option<SessionToken> {
        match self.read_document() {
            Ok(document) => document
                .and_then(|d| d.token)
                .filter(|token| !token.is_empty())
                .map(SessionToken::new),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable credential file");
                None
            }
        }
    }

    fn set(&self, token: &SessionToken) -> Result<(), DomainError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                DomainError::storage(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let document = TokenDocument {
            token: Some(token.as_str().to_string()),
        };
        let body = serde_json::to_vec(&document)
            .map_err(|e| DomainError::internal(format!("Failed to encode token: {}", e)))?;

        // Rename so a concurrent reader never sees a partial write
        let staging = self.staging_path();
        std::fs::write(&staging, body).map_err(|e| {
            DomainError::storage(format!("Failed to write {}: {}", staging.display(), e))
        })?;
        std::fs::rename(&staging, &self.path).map_err(|e| {
            DomainError::storage(format!("Failed to replace {}: {}", self.path.display(), e))
        })?;

        tracing::debug!(path = %self.path.display(), "Stored session token");
        Ok(())
    }

    fn clear(&self) -> Result<(), DomainError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "Cleared session token");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DomainError::storage(format!(
                "Failed to remove {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn store_name(&self) -> &'static str {
        "file"
    }
}
