//! Request and response bodies.
//!
//! [`RequestBody`] is the lazy byte source of an outgoing request. [`Body`] wraps the
//! transport's [`ResponseBody`] and guarantees that closing it drains whatever the
//! caller left unread, so the transport can hand the connection back to its pool.
use crate::errors::{BoxError, Error};
use bytes::{Bytes, BytesMut};
use futures::future::BoxFuture;
use futures::stream::{self, BoxStream, Stream, TryStreamExt};
use std::fmt;
use std::pin::Pin;

/// Streaming request body. `Sync` is required by the reqwest transport.
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, BoxError>> + Send + Sync>>;

#[derive(Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Bytes(Bytes),
    Stream(BodyStream),
}

impl RequestBody {
    pub fn from_stream<S, E>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + Sync + 'static,
        E: Into<BoxError> + 'static,
    {
        RequestBody::Stream(Box::pin(stream.map_err(Into::into)))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, RequestBody::Empty)
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            RequestBody::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Copies the body. Streams cannot be replayed and return `None`.
    pub fn try_clone(&self) -> Option<Self> {
        match self {
            RequestBody::Empty => Some(RequestBody::Empty),
            RequestBody::Bytes(bytes) => Some(RequestBody::Bytes(bytes.clone())),
            RequestBody::Stream(_) => None,
        }
    }
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestBody::Empty => f.write_str("Empty"),
            RequestBody::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            RequestBody::Stream(_) => f.write_str("Stream"),
        }
    }
}

impl From<Bytes> for RequestBody {
    fn from(bytes: Bytes) -> Self {
        RequestBody::Bytes(bytes)
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(bytes: Vec<u8>) -> Self {
        RequestBody::Bytes(bytes.into())
    }
}

impl From<String> for RequestBody {
    fn from(text: String) -> Self {
        RequestBody::Bytes(text.into())
    }
}

impl From<&'static str> for RequestBody {
    fn from(text: &'static str) -> Self {
        RequestBody::Bytes(Bytes::from_static(text.as_bytes()))
    }
}

/// A live response body as produced by a transport.
pub trait ResponseBody: Send {
    /// Next chunk of the body, or `None` once the body is exhausted.
    fn chunk(&mut self) -> BoxFuture<'_, Result<Option<Bytes>, BoxError>>;

    /// Releases the underlying connection.
    fn close(&mut self) -> BoxFuture<'_, Result<(), BoxError>>;
}

/// Response body that drains itself before closing.
///
/// The wrapper is the sole owner of the transport body. `close` discards every
/// unread byte first, then closes the transport body. Dropping an unclosed `Body`
/// inside a tokio runtime drains at most [`DROP_DRAIN_LIMIT`] bytes on a background
/// task and then closes it; a longer remainder is abandoned with the connection.
/// Upper bound on what a dropped, unclosed [`Body`] reads before closing.
pub const DROP_DRAIN_LIMIT: usize = 64 * 1024;

pub struct Body {
    inner: Option<Box<dyn ResponseBody>>,
}

impl Body {
    pub(crate) fn new(inner: Box<dyn ResponseBody>) -> Self {
        Self { inner: Some(inner) }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }

    /// Reads the next chunk. A closed body reads as exhausted.
    pub async fn chunk(&mut self) -> Result<Option<Bytes>, Error> {
        match self.inner.as_mut() {
            Some(inner) => inner.chunk().await.map_err(Error::Io),
            None => Ok(None),
        }
    }

    /// Reads everything that is left without closing the body.
    pub async fn read_all(&mut self) -> Result<Bytes, Error> {
        let mut buf = BytesMut::new();
        while let Some(chunk) = self.chunk().await? {
            buf.extend_from_slice(&chunk);
        }
        Ok(buf.freeze())
    }

    /// Reads everything, then closes. The first error wins.
    pub async fn bytes(mut self) -> Result<Bytes, Error> {
        let read = self.read_all().await;
        let closed = self.close().await;
        let bytes = read?;
        closed?;
        Ok(bytes)
    }

    /// Reads at most `limit` bytes. Read errors end the capture early.
    pub(crate) async fn read_prefix(&mut self, limit: usize) -> Bytes {
        let mut buf = BytesMut::new();
        while buf.len() < limit {
            match self.chunk().await {
                Ok(Some(chunk)) => buf.extend_from_slice(&chunk),
                Ok(None) | Err(_) => break,
            }
        }
        buf.truncate(limit);
        buf.freeze()
    }

    /// Drains the unread remainder, then closes the transport body.
    ///
    /// A close failure is reported in preference to a drain failure; at most one
    /// error is returned. Closing an already closed body is a no-op.
    pub async fn close(&mut self) -> Result<(), Error> {
        match self.inner.take() {
            Some(mut inner) => shutdown(inner.as_mut()).await.map_err(Error::Io),
            None => Ok(()),
        }
    }

    /// Turns the body into a stream of chunks. The body is closed once the stream
    /// ends.
    pub fn into_stream(self) -> BoxStream<'static, Result<Bytes, Error>> {
        Box::pin(stream::unfold(Some(self), |state| async move {
            let mut body = state?;
            match body.chunk().await {
                Ok(Some(chunk)) => Some((Ok(chunk), Some(body))),
                Ok(None) => match body.close().await {
                    Ok(()) => None,
                    Err(err) => Some((Err(err), None)),
                },
                Err(err) => {
                    let _ = body.close().await;
                    Some((Err(err), None))
                }
            }
        }))
    }
}

async fn shutdown(inner: &mut dyn ResponseBody) -> Result<(), BoxError> {
    shutdown_bounded(inner, usize::MAX).await
}

/// Drains until the body ends or `limit` bytes were discarded, then closes.
async fn shutdown_bounded(inner: &mut dyn ResponseBody, limit: usize) -> Result<(), BoxError> {
    let mut discarded = 0usize;
    let drained = loop {
        if discarded >= limit {
            log::debug!("Body: gave up draining after {} bytes", discarded);
            break Ok(());
        }
        match inner.chunk().await {
            Ok(Some(chunk)) => discarded += chunk.len(),
            Ok(None) => break Ok(()),
            Err(err) => break Err(err),
        }
    };
    if discarded > 0 {
        log::trace!("Body: discarded {} unread bytes before close", discarded);
    }

    let closed = inner.close().await;
    closed.and(drained)
}

impl Drop for Body {
    fn drop(&mut self) {
        let Some(mut inner) = self.inner.take() else {
            return;
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = shutdown_bounded(inner.as_mut(), DROP_DRAIN_LIMIT).await {
                        log::debug!("Body: draining dropped body failed: {}", e);
                    }
                });
            }
            Err(_) => log::debug!("Body: dropped without close outside of a runtime"),
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body")
            .field("closed", &self.is_closed())
            .finish()
    }
}
