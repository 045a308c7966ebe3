//! The request-in-progress and its execution pipeline.
//!
//! A [`Request`] is built by applying options in order, then consumed by exactly
//! one execution method:
//!
//! - [`Request::send`] runs the pipeline and returns the raw response
//! - [`Request::open`] classifies the status and returns the live body
//! - [`Request::done`], [`Request::fetch`], [`Request::fetch_string`] and
//!   [`Request::fetch_json`] consume the body as well
//!
//! Options never abort the chain. A failing option records the first error on the
//! request and execution returns it before any network activity.
use crate::config::DEFAULT_ERROR_BODY_LIMIT;
use crate::context::Context;
use crate::errors::{redact, BoxError, Error, ResponseError, StatusError};
use crate::net::{default_transport, Body, OutgoingRequest, RequestBody, Transport};
use crate::option::header::accept;
use crate::option::RequestOption;
use bytes::Bytes;
use http::{HeaderMap, Method, Response};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Query parameters: key to ordered values, kept in key order.
pub type QueryValues = BTreeMap<String, Vec<String>>;

/// Callback run against the outgoing request before it is handed to the transport.
pub type PreHook = Arc<dyn Fn(&mut OutgoingRequest) -> Result<(), BoxError> + Send + Sync>;

/// Callback run against the response before it is handed to the caller.
pub type PostHook = Arc<dyn Fn(&mut Response<Body>) -> Result<(), BoxError> + Send + Sync>;

pub struct Request {
    pub(crate) method: Method,
    pub(crate) url: String,
    pub(crate) body: RequestBody,
    pub(crate) pending_error: Option<Error>,
    pub(crate) error_body_limit: usize,
    pub(crate) pre_hooks: Vec<PreHook>,
    pub(crate) post_hooks: Vec<PostHook>,
    pub(crate) query: QueryValues,
    pub(crate) header: HeaderMap,
    pub(crate) client: Arc<dyn Transport>,
    pub(crate) context: Option<Context>,
}

macro_rules! method_constructors {
    ($($name:ident => $method:ident),* $(,)?) => {
        $(
            #[doc = concat!("Creates a `", stringify!($method), "` request.")]
            pub fn $name(url: impl Into<String>) -> Self {
                Self::new(Method::$method, url)
            }
        )*
    };
}

impl Request {
    /// Creates a request with the default transport and no options applied.
    ///
    /// The URL is only parsed when the request is executed.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: RequestBody::Empty,
            pending_error: None,
            error_body_limit: DEFAULT_ERROR_BODY_LIMIT,
            pre_hooks: Vec::new(),
            post_hooks: Vec::new(),
            query: QueryValues::new(),
            header: HeaderMap::new(),
            client: default_transport(),
            context: None,
        }
    }

    method_constructors! {
        get => GET,
        head => HEAD,
        post => POST,
        put => PUT,
        patch => PATCH,
        delete => DELETE,
        connect => CONNECT,
        options => OPTIONS,
        trace => TRACE,
    }

    /// Applies one option.
    pub fn with<O: RequestOption>(mut self, option: O) -> Self {
        option.apply(&mut self);
        self
    }

    /// Applies options left to right.
    pub fn with_all<I>(mut self, options: I) -> Self
    where
        I: IntoIterator,
        I::Item: RequestOption,
    {
        for option in options {
            option.apply(&mut self);
        }
        self
    }

    /// Records an option failure. Only the first failure is kept.
    pub fn fail(&mut self, err: impl Into<Error>) {
        if self.pending_error.is_none() {
            self.pending_error = Some(err.into());
        }
    }

    pub fn pending_error(&self) -> Option<&Error> {
        self.pending_error.as_ref()
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.header
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.header
    }

    pub fn query(&self) -> &QueryValues {
        &self.query
    }

    pub fn query_mut(&mut self) -> &mut QueryValues {
        &mut self.query
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    pub fn set_body(&mut self, body: impl Into<RequestBody>) {
        self.body = body.into();
    }

    pub fn error_body_limit(&self) -> usize {
        self.error_body_limit
    }

    /// Copies the request for another execution.
    ///
    /// Returns `None` when an option failed or the body is a stream.
    pub fn try_clone(&self) -> Option<Request> {
        if self.pending_error.is_some() {
            return None;
        }

        Some(Request {
            method: self.method.clone(),
            url: self.url.clone(),
            body: self.body.try_clone()?,
            pending_error: None,
            error_body_limit: self.error_body_limit,
            pre_hooks: self.pre_hooks.clone(),
            post_hooks: self.post_hooks.clone(),
            query: self.query.clone(),
            header: self.header.clone(),
            client: self.client.clone(),
            context: self.context.clone(),
        })
    }

    /// Executes the request and returns the response with a draining body.
    ///
    /// No status classification happens here: a 404 is a successful `send`.
    pub async fn send(self) -> Result<Response<Body>, Error> {
        let (_, _, response) = self.execute().await?;
        Ok(response)
    }

    /// Executes the request and returns the live body of a non-error response.
    ///
    /// Status codes >= 400 become an [`Error::Response`] carrying a bounded body
    /// excerpt; that body is closed before returning. The caller owns the returned
    /// body and must close it.
    pub async fn open(self) -> Result<Body, Error> {
        let limit = self.error_body_limit;
        let (method, url, response) = self.execute().await?;

        let Some(kind) = StatusError::from_status(response.status()) else {
            return Ok(response.into_body());
        };

        let (parts, mut body) = response.into_parts();
        let excerpt = body.read_prefix(limit).await;
        let _ = body.close().await;

        Err(ResponseError::new(method, &url, parts.status, parts.headers, excerpt, kind).into())
    }

    /// Executes the request for its side effects only.
    pub async fn done(self) -> Result<(), Error> {
        let mut body = self.open().await?;
        body.close().await
    }

    /// Executes the request and buffers the whole body.
    pub async fn fetch(self) -> Result<Bytes, Error> {
        self.open().await?.bytes().await
    }

    /// Like [`fetch`](Self::fetch), decoding the body as UTF-8.
    pub async fn fetch_string(self) -> Result<String, Error> {
        let bytes = self.fetch().await?;
        String::from_utf8(bytes.to_vec()).map_err(|e| Error::Io(e.into()))
    }

    /// Executes the request with `Accept: application/json` and decodes the body.
    ///
    /// The whole body is buffered in memory before decoding, so this is meant for
    /// documents rather than unbounded streams; use [`open`](Self::open) and
    /// [`Body::chunk`] for those. A decode error takes precedence over a close
    /// error.
    pub async fn fetch_json<T: DeserializeOwned>(self) -> Result<T, Error> {
        let mut body = self.with(accept(["application/json"])).open().await?;

        let decoded = match body.read_all().await {
            Ok(bytes) => serde_json::from_slice::<T>(&bytes).map_err(Error::from),
            Err(err) => Err(err),
        };
        let closed = body.close().await;

        let value = decoded?;
        closed?;
        Ok(value)
    }

    async fn execute(self) -> Result<(Method, Url, Response<Body>), Error> {
        let Request {
            method,
            url,
            body,
            pending_error,
            pre_hooks,
            post_hooks,
            query,
            header,
            client,
            context,
            ..
        } = self;

        if let Some(err) = pending_error {
            return Err(err);
        }

        let url = resolve_url(&url, &query)?;
        log::debug!("Request[{} {}]: sending", method, redact(&url));

        let mut request = http::Request::builder()
            .method(method.clone())
            .uri(url.as_str())
            .body(body)?;

        if let Some(context) = context {
            request.extensions_mut().insert(context);
        }
        merge_headers(request.headers_mut(), &header);

        for hook in &pre_hooks {
            hook(&mut request).map_err(Error::Hook)?;
        }

        let response = client.execute(request).await.map_err(Error::Transport)?;
        let mut response = response.map(Body::new);
        log::debug!(
            "Request[{} {}]: received {}",
            method,
            redact(&url),
            response.status()
        );

        for hook in &post_hooks {
            if let Err(err) = hook(&mut response) {
                let _ = response.into_body().close().await;
                return Err(Error::Hook(err));
            }
        }

        Ok((method, url, response))
    }
}

/// Parses `raw` and replaces the query values of every key present in `query`.
///
/// Keys not present in `query` keep their values. The result is re-encoded with
/// keys in sorted order; an empty query removes the `?` entirely.
fn resolve_url(raw: &str, query: &QueryValues) -> Result<Url, Error> {
    let mut url = Url::parse(raw)?;
    url.set_fragment(None);

    let mut merged = QueryValues::new();
    for (key, value) in url.query_pairs() {
        merged
            .entry(key.into_owned())
            .or_default()
            .push(value.into_owned());
    }
    for (key, values) in query {
        merged.insert(key.clone(), values.clone());
    }

    let encoded = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(
            merged
                .iter()
                .flat_map(|(k, vs)| vs.iter().map(move |v| (k, v))),
        )
        .finish();
    log::trace!("Request: resolved query {:?}", encoded);

    if encoded.is_empty() {
        url.set_query(None);
    } else {
        url.set_query(Some(&encoded));
    }
    Ok(url)
}

/// Every key in `source` replaces the whole value list of that key in `target`.
fn merge_headers(target: &mut HeaderMap, source: &HeaderMap) {
    for name in source.keys() {
        target.remove(name);
        for value in source.get_all(name) {
            target.append(name.clone(), value.clone());
        }
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("body", &self.body)
            .field("pending_error", &self.pending_error)
            .field("error_body_limit", &self.error_body_limit)
            .field("pre_hooks", &self.pre_hooks.len())
            .field("post_hooks", &self.post_hooks.len())
            .field("query", &self.query)
            .field("header", &self.header)
            .finish()
    }
}
