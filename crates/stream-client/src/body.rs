//! Byte bodies and the read-path stream adapter

use crate::{signal::EffectiveSignal, ClientError, Result};
use bytes::{Bytes, BytesMut};
use futures::stream::{self, Stream, StreamExt, TryStreamExt};
use pin_project_lite::pin_project;
use std::fmt;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::io::StreamReader;

/// Size of the buffer native readers are drained through
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// A lazy sequence of byte chunks.
///
/// This is the one stream type the rest of the crate works with. It is
/// finite and can only be consumed once.
pub struct ByteStream {
    inner: Pin<Box<dyn Stream<Item = Result<Bytes>> + Send + 'static>>,
}

impl ByteStream {
    /// Wrap any stream of byte chunks
    pub fn new<S, E>(stream: S) -> Self
    where
        S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
        E: Into<ClientError> + 'static,
    {
        Self {
            inner: Box::pin(stream.map_err(Into::<ClientError>::into)),
        }
    }

    /// A stream yielding `data` as a single chunk
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        if data.is_empty() {
            return Self::empty();
        }
        Self::new(stream::once(async move { Ok::<_, ClientError>(data) }))
    }

    /// A stream with no chunks
    pub fn empty() -> Self {
        Self::new(stream::empty::<Result<Bytes>>())
    }

    /// Adapt a native reader.
    ///
    /// The reader fills one buffer over and over, so every chunk is copied
    /// out into its own allocation before it is yielded.
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let state = (reader, BytesMut::zeroed(READ_CHUNK_SIZE));
        Self::new(stream::try_unfold(state, |(mut reader, mut buf)| async move {
            let n = reader.read(&mut buf[..]).await?;
            if n == 0 {
                return Ok::<_, io::Error>(None);
            }
            let chunk = Bytes::copy_from_slice(&buf[..n]);
            Ok(Some((chunk, (reader, buf))))
        }))
    }

    /// Drain the stream into a single buffer
    pub async fn collect_bytes(mut self) -> Result<Bytes> {
        let mut out = BytesMut::new();
        while let Some(chunk) = self.next().await {
            out.extend_from_slice(&chunk?);
        }
        Ok(out.freeze())
    }

    /// View the stream as a tokio reader
    pub fn into_async_read(self) -> impl AsyncRead + Send + Unpin + 'static {
        StreamReader::new(self.map_err(io::Error::other))
    }

    /// End the stream with [`ClientError::Aborted`] once `signal` fires
    pub(crate) fn abort_on(self, signal: EffectiveSignal) -> Self {
        Self::new(Abortable {
            inner: self,
            abort: Some(Box::pin(async move { signal.fired().await })),
            done: false,
        })
    }
}

impl Stream for ByteStream {
    type Item = Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl fmt::Debug for ByteStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteStream").finish_non_exhaustive()
    }
}

type AbortFuture = Pin<Box<dyn Future<Output = crate::AbortReason> + Send>>;

pin_project! {
    struct Abortable<S> {
        #[pin]
        inner: S,
        abort: Option<AbortFuture>,
        done: bool,
    }
}

impl<S> Stream for Abortable<S>
where
    S: Stream<Item = Result<Bytes>>,
{
    type Item = Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        if *this.done {
            return Poll::Ready(None);
        }

        if let Some(abort) = this.abort.as_mut() {
            if let Poll::Ready(reason) = abort.as_mut().poll(cx) {
                *this.done = true;
                *this.abort = None;
                tracing::warn!(%reason, "Body stream aborted");
                return Poll::Ready(Some(Err(ClientError::Aborted(reason))));
            }
        }

        let item = futures::ready!(this.inner.poll_next(cx));
        if item.is_none() {
            // release the timer with the stream, not with its owner
            *this.done = true;
            *this.abort = None;
        }
        Poll::Ready(item)
    }
}

/// A request or response body in either of its two representations
pub enum Body {
    /// A native reader that refills its own buffer
    Reader(Box<dyn AsyncRead + Send + Unpin>),
    /// A stream of owned chunks
    Stream(ByteStream),
}

impl Body {
    /// Wrap a native reader
    pub fn reader<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        Self::Reader(Box::new(reader))
    }

    /// Normalize into a [`ByteStream`].
    ///
    /// A reader is adapted with [`ByteStream::from_reader`]; a stream is
    /// returned as is.
    pub fn into_stream(self) -> ByteStream {
        match self {
            Self::Reader(reader) => ByteStream::from_reader(reader),
            Self::Stream(stream) => stream,
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reader(_) => f.write_str("Body::Reader"),
            Self::Stream(_) => f.write_str("Body::Stream"),
        }
    }
}

impl From<ByteStream> for Body {
    fn from(stream: ByteStream) -> Self {
        Self::Stream(stream)
    }
}

impl From<Bytes> for Body {
    fn from(data: Bytes) -> Self {
        Self::Stream(ByteStream::from_bytes(data))
    }
}

impl From<Vec<u8>> for Body {
    fn from(data: Vec<u8>) -> Self {
        Self::from(Bytes::from(data))
    }
}

impl From<&'static [u8]> for Body {
    fn from(data: &'static [u8]) -> Self {
        Self::from(Bytes::from_static(data))
    }
}

impl From<&'static str> for Body {
    fn from(data: &'static str) -> Self {
        Self::from(Bytes::from_static(data.as_bytes()))
    }
}

impl From<String> for Body {
    fn from(data: String) -> Self {
        Self::from(Bytes::from(data))
    }
}

/// Turn the body of a successful read response into a [`ByteStream`].
///
/// A success without a body breaks the service contract and is reported as
/// [`ClientError::Contract`].
pub fn adapt_response_body(body: Option<Body>) -> Result<ByteStream> {
    let body = body.ok_or_else(|| ClientError::Contract("the response has no body".to_string()))?;
    Ok(body.into_stream())
}
