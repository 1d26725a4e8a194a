//! Client and per-call configuration

use crate::{ClientError, Result};
use std::fmt;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Basic authentication credentials
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    /// User name
    pub username: String,
    /// Password
    pub password: String,
}

impl BasicAuth {
    /// Create credentials from a user name and password
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Client configuration
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Server base URL
    pub server: String,
    /// Basic authentication credentials
    pub basic_auth: Option<BasicAuth>,
    /// Default keepalive flag
    pub keepalive: bool,
    /// Default request timeout, `None` for no timeout
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: "http://localhost:8080".to_string(),
            basic_auth: None,
            keepalive: false,
            timeout: None,
        }
    }
}

impl ClientConfig {
    /// Create a new config with the given server
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            ..Default::default()
        }
    }

    /// Set basic authentication credentials
    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.basic_auth = Some(BasicAuth::new(username, password));
        self
    }

    /// Set the default keepalive flag
    pub fn with_keepalive(mut self, keepalive: bool) -> Self {
        self.keepalive = keepalive;
        self
    }

    /// Set the default timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Parse the server address
    pub fn base_url(&self) -> Result<Url> {
        let url = Url::parse(&self.server)
            .map_err(|e| ClientError::Config(format!("invalid server URL {:?}: {}", self.server, e)))?;
        if url.cannot_be_a_base() {
            return Err(ClientError::Config(format!(
                "server URL {:?} cannot be a base",
                self.server
            )));
        }
        Ok(url)
    }
}

/// Per-call timeout override
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Timeout {
    /// Abort the call after this duration
    After(Duration),
    /// No timeout for this call, whatever the client default is
    Disabled,
}

impl From<Duration> for Timeout {
    fn from(duration: Duration) -> Self {
        Self::After(duration)
    }
}

/// Options for a single call.
///
/// Every field left as `None` falls back to the [`ClientConfig`] default.
#[derive(Clone, Debug, Default)]
pub struct CallOptions {
    /// Cancel the call when this token is cancelled
    pub signal: Option<CancellationToken>,
    /// Keepalive override
    pub keepalive: Option<bool>,
    /// Timeout override
    pub timeout: Option<Timeout>,
}

impl CallOptions {
    /// Create empty options
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the call with `token`
    pub fn with_signal(mut self, token: CancellationToken) -> Self {
        self.signal = Some(token);
        self
    }

    /// Override the keepalive flag
    pub fn with_keepalive(mut self, keepalive: bool) -> Self {
        self.keepalive = Some(keepalive);
        self
    }

    /// Override the timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(Timeout::After(timeout));
        self
    }

    /// Disable the timeout for this call
    pub fn without_timeout(mut self) -> Self {
        self.timeout = Some(Timeout::Disabled);
        self
    }
}
