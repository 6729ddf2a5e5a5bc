use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use docchat_types::Credential;

use crate::atomic_write::{atomic_write, ensure_private_dir};

const CREDENTIAL_FILE: &str = "credential";

/// The one credential string kept on disk between runs.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.docchat/credential`, or `None` without a home directory.
    #[must_use]
    pub fn open_default() -> Option<Self> {
        crate::data_dir().map(|dir| Self::new(dir.join(CREDENTIAL_FILE)))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing or blank file is no credential, not an error.
    pub fn load(&self) -> io::Result<Option<Credential>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(Credential::new(content).ok()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub fn save(&self, credential: &Credential) -> io::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            ensure_private_dir(parent)?;
        }
        atomic_write(&self.path, credential.expose().as_bytes())?;
        tracing::debug!(path = %self.path.display(), "Saved credential");
        Ok(())
    }

    /// Remove the stored credential. Returns whether a file was removed.
    pub fn clear(&self) -> io::Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "Cleared credential");
                Ok(true)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err),
        }
    }
}
