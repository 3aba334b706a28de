/// Construction-time configuration for the Bitkub client.
use std::time::Duration;

use crate::credentials::Credentials;

/// Production REST endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.bitkub.com/";

/// Default `User-Agent` header value.
pub const DEFAULT_USER_AGENT: &str = concat!("bitkub-sdk/", env!("CARGO_PKG_VERSION"));

/// Header carrying the API key on signed requests.
pub const API_KEY_HEADER: &str = "X-BTK-APIKEY";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client configuration. Every field has a default.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub user_agent: String,
    /// Applied only when the SDK builds its own HTTP client.
    pub timeout: Duration,
    /// Client-level credentials used when a call does not override them.
    pub credentials: Option<Credentials>,
    /// A pre-built HTTP client to use instead of the SDK's own.
    pub http_client: Option<reqwest::Client>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            user_agent: DEFAULT_USER_AGENT.into(),
            timeout: DEFAULT_TIMEOUT,
            credentials: None,
            http_client: None,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }
}
