//! # Stream Client SDK
//!
//! A client SDK for an HTTP byte-stream storage service.
//!
//! ## Features
//!
//! - **Streams**: create a named stream with an optional time to live, write
//!   bytes to it and read them back as they arrive
//! - **Cancellation**: per-call cancellation tokens and timeouts, merged into
//!   one signal that also stops a body that is still streaming
//! - **Typed errors**: `409` and `404` surface as [`ClientError::StreamLocked`]
//!   and [`ClientError::StreamNotFound`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use stream_client::{CallOptions, ClientConfig, StreamClient, StreamConfiguration};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = StreamClient::new(
//!         ClientConfig::new("http://localhost:8080").with_basic_auth("user", "pass"),
//!     )?;
//!
//!     client
//!         .create_stream("logs", &StreamConfiguration::persistent(), CallOptions::default())
//!         .await?;
//!     client.write_stream("logs", "hello", CallOptions::default()).await?;
//!
//!     let data = client
//!         .read_stream("logs", CallOptions::default())
//!         .await?
//!         .collect_bytes()
//!         .await?;
//!     println!("{}", String::from_utf8_lossy(&data));
//!
//!     Ok(())
//! }
//! ```

mod body;
mod client;
mod config;
mod error;
mod request;
mod signal;
mod transport;
mod types;

pub use body::{adapt_response_body, Body, ByteStream};
pub use client::StreamClient;
pub use config::{BasicAuth, CallOptions, ClientConfig, Timeout};
pub use error::{translate, ClientError, Result};
pub use request::{RequestBuilder, RequestDescriptor, ACCEPT_VERSION};
pub use signal::{effective_timeout, AbortReason, EffectiveSignal};
pub use transport::{ReqwestTransport, Transport, TransportResponse};
pub use types::*;

// Re-export the token type callers cancel with
pub use tokio_util::sync::CancellationToken;

/// Server protocol version this client speaks, sent as `Accept-Version`
pub const EXPECTED_VERSION: &str = "^0.3.0";
