//! Request body options.
//!
//! Byte bodies also set `Content-Length`. Options that have to do fallible work
//! (encoding JSON, running a body producer) do it when applied and record a failure
//! on the request instead of setting a body.
use crate::errors::{BoxError, Error};
use crate::net::RequestBody;
use crate::option::header::{content_length, content_type};
use crate::option::{option_fn, RequestOption};
use crate::request::Request;
use bytes::Bytes;
use futures::Stream;
use serde::Serialize;
use std::sync::Mutex;

/// Streams the body. A stream can only be sent once; applying this option to a
/// second request records an error on it.
pub fn body<S, E>(stream: S) -> impl RequestOption + Send + Sync
where
    S: Stream<Item = Result<Bytes, E>> + Send + Sync + 'static,
    E: Into<BoxError> + 'static,
{
    let slot: Mutex<Option<RequestBody>> = Mutex::new(Some(RequestBody::from_stream(stream)));
    option_fn(move |r| {
        let taken = slot.lock().ok().and_then(|mut s| s.take());
        match taken {
            Some(body) => r.body = body,
            None => r.fail(Error::Body("request body stream was already used".into())),
        }
    })
}

/// Sets the body to `bytes` and `Content-Length` to its length.
pub fn body_bytes(bytes: impl Into<Bytes>) -> impl RequestOption + Send + Sync {
    let bytes = bytes.into();
    option_fn(move |r| set_bytes(r, bytes.clone()))
}

pub fn body_string(text: impl Into<String>) -> impl RequestOption + Send + Sync {
    body_bytes(text.into())
}

/// Encodes `value` as JSON when applied, with a JSON content type.
pub fn body_json<T>(value: T) -> impl RequestOption + Send + Sync
where
    T: Serialize + Send + Sync,
{
    option_fn(move |r| match serde_json::to_vec(&value) {
        Ok(encoded) => {
            content_type("application/json").charset("UTF-8").apply(r);
            set_bytes(r, encoded.into());
        }
        Err(e) => r.fail(e),
    })
}

/// Encodes the pairs as `application/x-www-form-urlencoded`, keys in sorted order.
pub fn body_form<I, K, V>(pairs: I) -> impl RequestOption + Send + Sync
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let mut pairs: Vec<(String, String)> = pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    let encoded = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(&pairs)
        .finish();
    let content_type = content_type("application/x-www-form-urlencoded").charset("UTF-8");
    let body = body_string(encoded);
    option_fn(move |r| {
        content_type.apply(r);
        body.apply(r);
    })
}

/// Runs `producer` when applied. A failure is recorded and leaves the body as it was.
pub fn body_fn<F, B, E>(producer: F) -> impl RequestOption + Send + Sync
where
    F: Fn() -> Result<B, E> + Send + Sync,
    B: Into<RequestBody>,
    E: Into<BoxError>,
{
    option_fn(move |r| match producer() {
        Ok(body) => r.body = body.into(),
        Err(e) => r.fail(Error::Body(e.into())),
    })
}

fn set_bytes(request: &mut Request, bytes: Bytes) {
    content_length(bytes.len() as u64).apply(request);
    request.body = RequestBody::Bytes(bytes);
}
