//! Credential persistence
//!
//! A credential is an opaque set of HTTP headers (normally just
//! `Authorization: Token <token>`) obtained at login. It is written as a flat
//! JSON object to `~/.pcli/creds.json`, read before every authenticated
//! request and replaced with `{}` on logout.
//!
//! A missing file and an empty object both mean "not logged in".
//! On Unix the file is created with mode 0600.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CredentialError;

/// Credentials directory, relative to the user's home
const CREDENTIALS_DIR: &str = ".pcli";

/// Credentials file name
const CREDENTIALS_FILENAME: &str = "creds.json";

/// Header carrying the token
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Header map presented on authenticated requests
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(BTreeMap<String, String>);

impl Credential {
    /// Credential for a token returned by the login endpoint
    pub fn from_token(token: &str) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert(AUTHORIZATION_HEADER.to_string(), format!("Token {}", token));
        Self(headers)
    }

    /// Build from arbitrary header pairs
    pub fn from_headers<I, K, V>(headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            headers
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Header value by name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Iterate over (name, value) pairs
    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Key-value persistence for the active credential
pub trait CredentialStore: Send + Sync {
    /// Persist a credential, replacing any previous one
    fn store(&self, credential: &Credential) -> Result<(), CredentialError>;

    /// Load the stored credential; `None` when logged out
    fn load(&self) -> Result<Option<Credential>, CredentialError>;

    /// Forget the stored credential
    fn clear(&self) -> Result<(), CredentialError>;
}

/// Get the default path of the credentials file
///
/// Returns `~/.pcli/creds.json`.
pub fn default_credentials_path() -> Result<PathBuf, CredentialError> {
    let home = dirs::home_dir().ok_or(CredentialError::NoHomeDir)?;
    Ok(home.join(CREDENTIALS_DIR).join(CREDENTIALS_FILENAME))
}

/// Credential store backed by a JSON file
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Store at an explicit path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `~/.pcli/creds.json`
    pub fn default_location() -> Result<Self, CredentialError> {
        default_credentials_path().map(Self::new)
    }

    /// Location of the credentials file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> CredentialError {
        CredentialError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn ensure_dir(&self) -> Result<(), CredentialError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        Ok(())
    }

    fn write(&self, credential: &Credential) -> Result<(), CredentialError> {
        self.ensure_dir()?;

        let json = serde_json::to_string(credential).map_err(|source| CredentialError::Malformed {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, json).map_err(|e| self.io_error(e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&self.path, permissions).map_err(|e| self.io_error(e))?;
        }

        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn store(&self, credential: &Credential) -> Result<(), CredentialError> {
        self.write(credential)?;
        tracing::debug!("Stored credentials at {:?}", self.path);
        Ok(())
    }

    fn load(&self) -> Result<Option<Credential>, CredentialError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let credential: Credential =
                    serde_json::from_str(&contents).map_err(|source| CredentialError::Malformed {
                        path: self.path.clone(),
                        source,
                    })?;
                Ok(Some(credential).filter(|c| !c.is_empty()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn clear(&self) -> Result<(), CredentialError> {
        self.write(&Credential::default())?;
        tracing::debug!("Cleared credentials at {:?}", self.path);
        Ok(())
    }
}
