//! Request construction.
//!
//! [`RequestBuilder`] turns one call into a [`RequestDescriptor`] without
//! touching the network. Client defaults come from [`ClientConfig`], and
//! anything set in [`CallOptions`] overrides them.

use crate::{
    body::Body,
    config::{BasicAuth, CallOptions, ClientConfig},
    signal::EffectiveSignal,
    types::{Operation, StreamConfiguration, StreamId},
    ClientError, Result, EXPECTED_VERSION,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use url::Url;

/// Header carrying the protocol version the client expects
pub const ACCEPT_VERSION: HeaderName = HeaderName::from_static("accept-version");

const APPLICATION_JSON: &str = "application/json";
const APPLICATION_OCTET_STREAM: &str = "application/octet-stream";

/// A fully resolved request, ready for a [`Transport`](crate::Transport)
#[derive(Debug)]
pub struct RequestDescriptor {
    /// HTTP method
    pub method: Method,
    /// Target URL
    pub url: Url,
    /// Request headers
    pub headers: HeaderMap,
    /// Request body
    pub body: Option<Body>,
    /// Cancellation signal the transport must observe
    pub signal: EffectiveSignal,
    /// Ask the transport to keep the connection alive
    pub keepalive: bool,
}

impl RequestDescriptor {
    /// Create a bare request with no headers, body or signal
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            signal: EffectiveSignal::never(),
            keepalive: false,
        }
    }
}

/// Builds requests for one call
pub struct RequestBuilder<'a> {
    base: &'a Url,
    config: &'a ClientConfig,
    options: &'a CallOptions,
}

impl<'a> RequestBuilder<'a> {
    /// Create a builder for a call against `base`
    pub fn new(base: &'a Url, config: &'a ClientConfig, options: &'a CallOptions) -> Self {
        Self { base, config, options }
    }

    /// `PUT /streams/{id}` with the configuration as JSON
    pub fn create(&self, id: &StreamId, configuration: &StreamConfiguration) -> Result<RequestDescriptor> {
        let body = serde_json::to_vec(configuration)?;
        let mut request = self.common(Operation::Create, id)?;
        request
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        request.body = Some(Body::from(body));
        Ok(request)
    }

    /// `POST /streams/{id}` with the payload as raw bytes
    pub fn write(&self, id: &StreamId, payload: Body) -> Result<RequestDescriptor> {
        let mut request = self.common(Operation::Write, id)?;
        request
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_OCTET_STREAM));
        request.body = Some(payload);
        Ok(request)
    }

    /// `GET /streams/{id}`
    pub fn read(&self, id: &StreamId) -> Result<RequestDescriptor> {
        self.common(Operation::Read, id)
    }

    fn common(&self, operation: Operation, id: &StreamId) -> Result<RequestDescriptor> {
        let mut request = RequestDescriptor::new(operation.method(), stream_url(self.base, id));

        if let Some(auth) = &self.config.basic_auth {
            request.headers.insert(AUTHORIZATION, basic_auth(auth)?);
        }
        request.signal = EffectiveSignal::from_options(self.config, self.options);
        request.keepalive = self.options.keepalive.unwrap_or(self.config.keepalive);
        request
            .headers
            .insert(ACCEPT_VERSION, HeaderValue::from_static(EXPECTED_VERSION));

        Ok(request)
    }
}

/// Append `/streams/{id}` to the path of `base`
fn stream_url(base: &Url, id: &StreamId) -> Url {
    let mut url = base.clone();
    let path = format!("{}/streams/{}", base.path().trim_end_matches('/'), id);
    url.set_path(&path);
    url
}

fn basic_auth(auth: &BasicAuth) -> Result<HeaderValue> {
    let credentials = STANDARD.encode(format!("{}:{}", auth.username, auth.password));
    let mut value = HeaderValue::from_str(&format!("Basic {}", credentials))
        .map_err(|e| ClientError::Config(format!("invalid credentials: {}", e)))?;
    value.set_sensitive(true);
    Ok(value)
}
