/// API credentials for signed Bitkub requests.
use std::fmt;

use crate::errors::BitkubError;

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "BITKUB_API_KEY";
/// Environment variable holding the API secret.
pub const API_SECRET_ENV: &str = "BITKUB_API_SECRET";

/// An API key and its HMAC secret. Immutable once constructed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    key: String,
    secret: Vec<u8>,
}

impl Credentials {
    pub fn new(key: impl Into<String>, secret: impl AsRef<[u8]>) -> Self {
        Self {
            key: key.into(),
            secret: secret.as_ref().to_vec(),
        }
    }

    /// Read credentials from `BITKUB_API_KEY` and `BITKUB_API_SECRET`.
    pub fn from_env() -> Result<Self, BitkubError> {
        let key = std::env::var(API_KEY_ENV)
            .map_err(|_| BitkubError::EnvVarNotSet(API_KEY_ENV.to_string()))?;
        let secret = std::env::var(API_SECRET_ENV)
            .map_err(|_| BitkubError::EnvVarNotSet(API_SECRET_ENV.to_string()))?;
        if key.is_empty() {
            return Err(BitkubError::InvalidCredentials("empty API key".into()));
        }
        Ok(Self::new(key, secret))
    }

    /// The value sent in the `X-BTK-APIKEY` header.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn secret(&self) -> &[u8] {
        &self.secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown: String = self.key.chars().take(8).collect();
        f.debug_struct("Credentials")
            .field("key", &format!("{shown}..."))
            .field("secret", &"[REDACTED]")
            .finish()
    }
}
