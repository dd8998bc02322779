use std::collections::HashMap;
use std::env;
use std::fs;

use crate::error::Error;

pub const DEFAULT_PROFILE_PATH: &str = "/etc/reportmail/auth";

const TOKEN_FILE_VAR: &str = "RESOURCE_PRINCIPAL_TOKEN_FILE";
const PROFILE_PATH_VAR: &str = "REPORTMAIL_AUTH_FILE";

/// Capability interface for obtaining a bearer token for the storage
/// and vault gateways. The variant is selected once at startup based
/// on deployment context; callers never touch the environment again.
pub trait CredentialProvider {
    fn bearer_token(&self) -> Result<String, Error>;
}

/// Managed deployments: the platform injects a short-lived session
/// token into a file and rotates it in place. The token is re-read on
/// every call so a rotation mid-process is picked up.
pub struct ResourcePrincipal {
    token_path: String,
}

impl ResourcePrincipal {
    pub fn new(token_path: String) -> Self {
        Self { token_path }
    }
}

impl CredentialProvider for ResourcePrincipal {
    fn bearer_token(&self) -> Result<String, Error> {
        let token = fs::read_to_string(&self.token_path).map_err(|e| {
            Error::Authentication(format!(
                "failed to read session token {}: {}",
                self.token_path, e
            ))
        })?;

        let token = token.trim();
        if token.is_empty() {
            return Err(Error::Authentication(format!(
                "session token file {} is empty",
                self.token_path
            )));
        }

        Ok(token.to_string())
    }
}

/// Workstation deployments: a key=value profile file holding a
/// long-lived `auth_token`. The token is read once at construction.
pub struct LocalProfile {
    token: String,
}

impl LocalProfile {
    pub fn from_file(path: &str) -> Result<Self, Error> {
        let mut cfg = config::Config::default();
        cfg.merge(config::File::new(path, config::FileFormat::Ini))
            .map_err(|e| Error::Authentication(format!("{}: {}", path, e)))?;

        let map = cfg
            .try_into::<HashMap<String, String>>()
            .map_err(|e| Error::Authentication(e.to_string()))?;

        match map.get("auth_token") {
            Some(token) if !token.is_empty() => Ok(Self {
                token: token.clone(),
            }),
            _ => Err(Error::Authentication(format!(
                "no auth_token found in profile {}",
                path
            ))),
        }
    }
}

impl CredentialProvider for LocalProfile {
    fn bearer_token(&self) -> Result<String, Error> {
        Ok(self.token.clone())
    }
}

/// Select the provider for this deployment. A platform-injected token
/// file wins; otherwise fall back to the local profile.
pub fn from_environment() -> Result<Box<dyn CredentialProvider>, Error> {
    if let Ok(token_path) = env::var(TOKEN_FILE_VAR) {
        log::info!("Using resource-principal authentication");
        return Ok(Box::new(ResourcePrincipal::new(token_path)));
    }

    let path = env::var(PROFILE_PATH_VAR).unwrap_or_else(|_| DEFAULT_PROFILE_PATH.to_string());
    log::info!("Using local profile authentication from {}", path);
    Ok(Box::new(LocalProfile::from_file(&path)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_resource_principal_reads_token() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "tok-12345").unwrap();

        let provider = ResourcePrincipal::new(file.path().to_str().unwrap().to_string());
        assert_eq!(provider.bearer_token().unwrap(), "tok-12345");
    }

    #[test]
    fn test_resource_principal_rejects_empty_token() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "   ").unwrap();

        let provider = ResourcePrincipal::new(file.path().to_str().unwrap().to_string());
        match provider.bearer_token() {
            Err(Error::Authentication(_)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_resource_principal_missing_file() {
        let provider = ResourcePrincipal::new("/nonexistent/token".to_string());
        assert!(provider.bearer_token().is_err());
    }

    #[test]
    fn test_local_profile_token() {
        let mut file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        writeln!(file, "auth_token=profile-token").unwrap();

        let provider = LocalProfile::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(provider.bearer_token().unwrap(), "profile-token");
    }

    #[test]
    fn test_local_profile_without_token_key() {
        let mut file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        writeln!(file, "region=eu-frankfurt-1").unwrap();

        match LocalProfile::from_file(file.path().to_str().unwrap()) {
            Err(Error::Authentication(_)) => {}
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }
}
