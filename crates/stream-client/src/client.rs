//! Main client implementation

use crate::{
    body::{adapt_response_body, Body, ByteStream},
    config::{CallOptions, ClientConfig},
    error::translate,
    request::{RequestBuilder, RequestDescriptor},
    transport::{ReqwestTransport, Transport, TransportResponse},
    types::{Operation, StreamConfiguration, StreamId},
    Result,
};
use std::sync::Arc;
use tracing::{debug, instrument};
use url::Url;

/// Stream storage client.
///
/// Cheap to clone; clones share the configuration and the transport.
#[derive(Clone)]
pub struct StreamClient {
    config: Arc<ClientConfig>,
    base_url: Url,
    transport: Arc<dyn Transport>,
}

impl StreamClient {
    /// Create a new client with the given configuration
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::with_transport(config, ReqwestTransport::new()?)
    }

    /// Create with a server URL and default settings
    pub fn from_server(server: &str) -> Result<Self> {
        Self::new(ClientConfig::new(server))
    }

    /// Create a client sending requests through `transport`
    pub fn with_transport(config: ClientConfig, transport: impl Transport + 'static) -> Result<Self> {
        let base_url = config.base_url()?;
        Ok(Self {
            config: Arc::new(config),
            base_url,
            transport: Arc::new(transport),
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Create a stream.
    ///
    /// Fails with [`ClientError::StreamLocked`](crate::ClientError::StreamLocked)
    /// when the stream is locked.
    #[instrument(skip(self, id, configuration, options), fields(id = id.as_ref()))]
    pub async fn create_stream(
        &self,
        id: impl AsRef<str>,
        configuration: &StreamConfiguration,
        options: CallOptions,
    ) -> Result<()> {
        let id = StreamId::new(id.as_ref());
        let request = self.builder(&options).create(&id, configuration)?;
        self.execute(Operation::Create, request).await?;
        Ok(())
    }

    /// Append `payload` to a stream.
    ///
    /// Fails with [`ClientError::StreamNotFound`](crate::ClientError::StreamNotFound)
    /// or [`ClientError::StreamLocked`](crate::ClientError::StreamLocked).
    #[instrument(skip(self, id, payload, options), fields(id = id.as_ref()))]
    pub async fn write_stream(
        &self,
        id: impl AsRef<str>,
        payload: impl Into<Body>,
        options: CallOptions,
    ) -> Result<()> {
        let id = StreamId::new(id.as_ref());
        let request = self.builder(&options).write(&id, payload.into())?;
        self.execute(Operation::Write, request).await?;
        Ok(())
    }

    /// Read a stream.
    ///
    /// The returned stream yields the body as it arrives. If the call's signal
    /// fires while it is being consumed, it yields
    /// [`ClientError::Aborted`](crate::ClientError::Aborted) and ends.
    #[instrument(skip(self, id, options), fields(id = id.as_ref()))]
    pub async fn read_stream(
        &self,
        id: impl AsRef<str>,
        options: CallOptions,
    ) -> Result<ByteStream> {
        let id = StreamId::new(id.as_ref());
        let request = self.builder(&options).read(&id)?;
        let signal = request.signal.clone();
        let response = self.execute(Operation::Read, request).await?;
        Ok(adapt_response_body(response.body)?.abort_on(signal))
    }

    fn builder<'a>(&'a self, options: &'a CallOptions) -> RequestBuilder<'a> {
        RequestBuilder::new(&self.base_url, &self.config, options)
    }

    async fn execute(&self, operation: Operation, request: RequestDescriptor) -> Result<TransportResponse> {
        let outcome = translate(self.transport.send(request).await, operation);
        match &outcome {
            Ok(response) => debug!("{} succeeded with {}", operation, response.status),
            Err(e) => debug!("{} failed: {}", operation, e),
        }
        outcome
    }
}

impl std::fmt::Debug for StreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamClient")
            .field("config", &self.config)
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}
