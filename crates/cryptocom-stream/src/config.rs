/*
[INPUT]:  Endpoint URLs, API credentials, cache bounds, account type
[OUTPUT]: Validated client configuration
[POS]:    Configuration layer - shared by connection setup and cache sizing
[UPDATE]: When adding connection options or cache tunables
*/

use url::Url;

use crate::error::{Result, StreamError};
use crate::types::AccountType;

/// Production endpoints
pub const PUBLIC_WS_URL: &str = "wss://stream.crypto.com/v2/market";
pub const PRIVATE_WS_URL: &str = "wss://stream.crypto.com/v2/user";

/// Sandbox (UAT) endpoints
pub const SANDBOX_PUBLIC_WS_URL: &str = "wss://uat-stream.3ona.co/v2/market";
pub const SANDBOX_PRIVATE_WS_URL: &str = "wss://uat-stream.3ona.co/v2/user";

const DEFAULT_CACHE_LIMIT: usize = 1000;
const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// API key pair used by the signed login
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            secret: secret.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Streaming client configuration
#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub public_url: String,
    pub private_url: String,
    pub credentials: Option<Credentials>,
    pub account_type: AccountType,
    pub trades_limit: usize,
    pub ohlcv_limit: usize,
    pub orders_limit: usize,
    /// Inbound frame queue depth per connection
    pub channel_capacity: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            public_url: PUBLIC_WS_URL.to_string(),
            private_url: PRIVATE_WS_URL.to_string(),
            credentials: None,
            account_type: AccountType::Spot,
            trades_limit: DEFAULT_CACHE_LIMIT,
            ohlcv_limit: DEFAULT_CACHE_LIMIT,
            orders_limit: DEFAULT_CACHE_LIMIT,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl StreamConfig {
    /// Configuration pointed at the UAT sandbox
    pub fn sandbox() -> Self {
        Self {
            public_url: SANDBOX_PUBLIC_WS_URL.to_string(),
            private_url: SANDBOX_PRIVATE_WS_URL.to_string(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_urls(mut self, public_url: impl Into<String>, private_url: impl Into<String>) -> Self {
        self.public_url = public_url.into();
        self.private_url = private_url.into();
        self
    }

    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    #[must_use]
    pub fn with_account_type(mut self, account_type: AccountType) -> Self {
        self.account_type = account_type;
        self
    }

    #[must_use]
    pub fn with_trades_limit(mut self, limit: usize) -> Self {
        self.trades_limit = limit;
        self
    }

    #[must_use]
    pub fn with_ohlcv_limit(mut self, limit: usize) -> Self {
        self.ohlcv_limit = limit;
        self
    }

    #[must_use]
    pub fn with_orders_limit(mut self, limit: usize) -> Self {
        self.orders_limit = limit;
        self
    }

    #[must_use]
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a URL is not a websocket URL or a bound is zero.
    pub fn validate(&self) -> Result<()> {
        validate_ws_url("public_url", &self.public_url)?;
        validate_ws_url("private_url", &self.private_url)?;

        for (name, value) in [
            ("trades_limit", self.trades_limit),
            ("ohlcv_limit", self.ohlcv_limit),
            ("orders_limit", self.orders_limit),
            ("channel_capacity", self.channel_capacity),
        ] {
            if value == 0 {
                return Err(StreamError::Config(format!("{name} must be greater than zero")));
            }
        }

        Ok(())
    }

    /// Credentials required by private channels
    pub(crate) fn require_credentials(&self) -> Result<&Credentials> {
        match &self.credentials {
            Some(creds) if !creds.api_key.is_empty() && !creds.secret.is_empty() => Ok(creds),
            _ => Err(StreamError::Authentication {
                message: "apiKey and secret credentials are required for private channels"
                    .to_string(),
            }),
        }
    }
}

fn validate_ws_url(name: &str, raw: &str) -> Result<()> {
    if raw.is_empty() {
        return Err(StreamError::Config(format!("{name} cannot be empty")));
    }
    let url = Url::parse(raw)?;
    match url.scheme() {
        "ws" | "wss" => Ok(()),
        other => Err(StreamError::Config(format!(
            "{name} must use ws:// or wss://, got {other}://"
        ))),
    }
}
