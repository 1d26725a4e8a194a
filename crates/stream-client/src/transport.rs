//! HTTP transport

use crate::{
    body::{Body, ByteStream},
    request::RequestDescriptor,
    ClientError, Result,
};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONNECTION};
use reqwest::{Client, StatusCode};
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

/// A response whose status is a success
#[derive(Debug)]
pub struct TransportResponse {
    /// Status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body, if the transport exposes one
    pub body: Option<Body>,
}

/// Sends request descriptors over the wire.
///
/// Implementations must stop waiting once the descriptor's signal fires and
/// return [`ClientError::Aborted`], and must turn non-success statuses into
/// [`ClientError::Status`] with the response text as the message.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue the request and wait for the response head
    async fn send(&self, request: RequestDescriptor) -> Result<TransportResponse>;
}

/// [`Transport`] backed by `reqwest`
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    /// Create a transport with a default `reqwest` client
    pub fn new() -> Result<Self> {
        let http = Client::builder().build().map_err(ClientError::Http)?;
        Ok(Self { http })
    }

    /// Use an existing `reqwest` client
    pub fn with_client(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: RequestDescriptor) -> Result<TransportResponse> {
        let RequestDescriptor {
            method,
            url,
            mut headers,
            body,
            signal,
            keepalive,
        } = request;

        if keepalive {
            headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        }

        let mut req = self.http.request(method.clone(), url.clone()).headers(headers);
        if let Some(body) = body {
            req = req.body(into_reqwest_body(body));
        }

        debug!("Sending {} request to {}", method, url);
        let response = tokio::select! {
            biased;
            reason = signal.fired() => {
                warn!(%reason, "{} {} aborted", method, url);
                return Err(ClientError::Aborted(reason));
            }
            response = req.send() => response?,
        };

        let status = response.status();
        if !status.is_success() {
            let text = tokio::select! {
                biased;
                reason = signal.fired() => return Err(ClientError::Aborted(reason)),
                text = response.text() => text.unwrap_or_default(),
            };
            let message = Some(text.trim().to_string()).filter(|m| !m.is_empty());
            debug!("{} {} failed with {}", method, url, status);
            return Err(ClientError::Status { status, message });
        }

        Ok(TransportResponse {
            status,
            headers: response.headers().clone(),
            body: Some(Body::Stream(ByteStream::new(response.bytes_stream()))),
        })
    }
}

/// Hand an outbound body to `reqwest` as it is
fn into_reqwest_body(body: Body) -> reqwest::Body {
    match body {
        Body::Reader(reader) => reqwest::Body::wrap_stream(ReaderStream::new(reader)),
        Body::Stream(stream) => reqwest::Body::wrap_stream(stream),
    }
}
