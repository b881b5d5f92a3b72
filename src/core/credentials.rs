//! Bearer credential sources handed to the gateway

use crate::core::error::SyncError;
use std::path::PathBuf;

pub trait CredentialProvider: Send + Sync {
    fn bearer_token(&self) -> Result<String, SyncError>;
}

pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: &str) -> Self {
        Self(token.to_string())
    }
}

impl CredentialProvider for StaticToken {
    fn bearer_token(&self) -> Result<String, SyncError> {
        non_empty(self.0.clone(), "configured token")
    }
}

/// Reads the token from an environment variable on every request so a
/// re-login in another process is picked up without restarting.
pub struct EnvToken {
    var: String,
}

impl EnvToken {
    pub fn new(var: &str) -> Self {
        Self {
            var: var.to_string(),
        }
    }
}

impl CredentialProvider for EnvToken {
    fn bearer_token(&self) -> Result<String, SyncError> {
        let token = std::env::var(&self.var).map_err(|_| {
            SyncError::Authentication(format!("environment variable {} is not set", self.var))
        })?;
        non_empty(token, &self.var)
    }
}

pub struct FileToken {
    path: PathBuf,
}

impl FileToken {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialProvider for FileToken {
    fn bearer_token(&self) -> Result<String, SyncError> {
        let token = std::fs::read_to_string(&self.path).map_err(|e| {
            SyncError::Authentication(format!(
                "cannot read token file {}: {e}",
                self.path.display()
            ))
        })?;
        non_empty(token, &self.path.display().to_string())
    }
}

/// Used when no credential source is configured; every request fails the same way.
pub struct MissingToken;

impl CredentialProvider for MissingToken {
    fn bearer_token(&self) -> Result<String, SyncError> {
        Err(SyncError::Authentication(
            "no credential configured".to_string(),
        ))
    }
}

fn non_empty(token: String, source: &str) -> Result<String, SyncError> {
    let token = token.trim().to_string();
    if token.is_empty() {
        return Err(SyncError::Authentication(format!("{source} is empty")));
    }
    Ok(token)
}
