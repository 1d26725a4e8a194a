//! Common types for the client SDK

use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Name of a stream on the server.
///
/// The identifier is opaque to the client and is placed into the request
/// path as given.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StreamId(String);

impl StreamId {
    /// Create a new identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StreamId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for StreamId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&String> for StreamId {
    fn from(id: &String) -> Self {
        Self(id.clone())
    }
}

impl AsRef<str> for StreamId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Stream configuration sent when a stream is created
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfiguration {
    /// Time to live in milliseconds, `None` for no expiry
    #[serde(rename = "timeToLive")]
    pub time_to_live: Option<u64>,
}

impl StreamConfiguration {
    /// A stream that never expires
    pub fn persistent() -> Self {
        Self { time_to_live: None }
    }

    /// A stream that expires after `ttl`
    pub fn expiring_after(ttl: Duration) -> Self {
        Self {
            time_to_live: Some(ttl.as_millis().min(u64::MAX as u128) as u64),
        }
    }
}

/// The operations exposed by the service
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    /// Create (or reconfigure) a stream
    Create,
    /// Append bytes to a stream
    Write,
    /// Read bytes from a stream
    Read,
}

impl Operation {
    /// HTTP method used for the operation
    pub fn method(self) -> Method {
        match self {
            Self::Create => Method::PUT,
            Self::Write => Method::POST,
            Self::Read => Method::GET,
        }
    }

    /// Whether a 404 from the server means the stream does not exist.
    ///
    /// Creation is never observed to answer 404, so it is left unmapped.
    pub(crate) fn maps_not_found(self) -> bool {
        matches!(self, Self::Write | Self::Read)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Create => "create",
            Self::Write => "write",
            Self::Read => "read",
        };
        f.write_str(name)
    }
}
