//! Options: deferred mutations applied to a [`Request`] in order.
//!
//! Anything implementing [`RequestOption`] can be passed to
//! [`Request::with`]. Options take `&self`, so one option value (or a whole
//! template of them) can be applied to any number of requests.
//!
//! ```no_run
//! use gosub_request::option::{header::authorization_bearer, query::query, RequestOption};
//! use gosub_request::Request;
//!
//! # async fn run() -> Result<(), gosub_request::Error> {
//! let api: Vec<Box<dyn RequestOption + Send + Sync>> = vec![
//!     Box::new(authorization_bearer("token")),
//!     Box::new(query("lang", "en")),
//! ];
//!
//! let page = Request::get("https://example.com/items")
//!     .with(&api)
//!     .fetch_string()
//!     .await?;
//! # Ok(())
//! # }
//! ```
pub mod body;
pub mod header;
pub mod query;

use crate::context::Context;
use crate::errors::BoxError;
use crate::net::{join_url, Body, OutgoingRequest, Transport};
use crate::request::{PostHook, PreHook, Request};
use http::Response;
use std::sync::Arc;

pub trait RequestOption {
    fn apply(&self, request: &mut Request);
}

impl<O: RequestOption + ?Sized> RequestOption for &O {
    fn apply(&self, request: &mut Request) {
        (**self).apply(request)
    }
}

impl<O: RequestOption + ?Sized> RequestOption for Box<O> {
    fn apply(&self, request: &mut Request) {
        (**self).apply(request)
    }
}

impl<O: RequestOption + ?Sized> RequestOption for Arc<O> {
    fn apply(&self, request: &mut Request) {
        (**self).apply(request)
    }
}

impl<O: RequestOption> RequestOption for [O] {
    fn apply(&self, request: &mut Request) {
        for option in self {
            option.apply(request);
        }
    }
}

impl<O: RequestOption, const N: usize> RequestOption for [O; N] {
    fn apply(&self, request: &mut Request) {
        self.as_slice().apply(request)
    }
}

impl<O: RequestOption> RequestOption for Vec<O> {
    fn apply(&self, request: &mut Request) {
        self.as_slice().apply(request)
    }
}

/// `None` applies nothing.
impl<O: RequestOption> RequestOption for Option<O> {
    fn apply(&self, request: &mut Request) {
        if let Some(option) = self {
            option.apply(request);
        }
    }
}

/// Option built from a closure, see [`option_fn`].
#[derive(Clone)]
pub struct OptionFn<F>(F);

impl<F: Fn(&mut Request)> RequestOption for OptionFn<F> {
    fn apply(&self, request: &mut Request) {
        (self.0)(request)
    }
}

/// Turns a closure into an option.
pub fn option_fn<F: Fn(&mut Request)>(f: F) -> OptionFn<F> {
    OptionFn(f)
}

/// Uses `transport` instead of the shared default.
pub fn client(transport: Arc<dyn Transport>) -> impl RequestOption + Send + Sync {
    option_fn(move |r| r.client = transport.clone())
}

/// Attaches a cancellation/deadline context to the request.
pub fn context(ctx: Context) -> impl RequestOption + Send + Sync {
    option_fn(move |r| r.context = Some(ctx.clone()))
}

/// Bounds how much of an error response body is captured into the error.
pub fn error_body_limit(limit: usize) -> impl RequestOption + Send + Sync {
    option_fn(move |r| r.error_body_limit = limit)
}

/// Resolves the request URL against `base` with [`join_url`].
pub fn base_url(base: impl Into<String>) -> impl RequestOption + Send + Sync {
    let base = base.into();
    option_fn(move |r| r.url = join_url(&base, [r.url.as_str()]))
}

/// Appends a hook that runs against the outgoing request, after query and headers
/// were merged. An error aborts execution before the transport is called.
pub fn pre_hook<F>(hook: F) -> impl RequestOption + Send + Sync
where
    F: Fn(&mut OutgoingRequest) -> Result<(), BoxError> + Send + Sync + 'static,
{
    let hook: PreHook = Arc::new(hook);
    option_fn(move |r| r.pre_hooks.push(hook.clone()))
}

/// Appends a hook that runs against the response. An error closes the body and
/// aborts execution.
pub fn post_hook<F>(hook: F) -> impl RequestOption + Send + Sync
where
    F: Fn(&mut Response<Body>) -> Result<(), BoxError> + Send + Sync + 'static,
{
    let hook: PostHook = Arc::new(hook);
    option_fn(move |r| r.post_hooks.push(hook.clone()))
}

/// Logs the request line and headers, and the response status and headers, at
/// debug level. Sensitive header values are masked.
pub fn verbose() -> impl RequestOption + Send + Sync {
    [
        Box::new(pre_hook(|request| {
            log::debug!(
                "> {} {} {:?}",
                request.method(),
                request.uri().path(),
                request.version()
            );
            if let Some(host) = request.uri().host() {
                log::debug!("> host: {}", host);
            }
            log_headers('>', request.headers());
            Ok(())
        })) as Box<dyn RequestOption + Send + Sync>,
        Box::new(post_hook(|response| {
            log::debug!("< {:?} {}", response.version(), response.status());
            log_headers('<', response.headers());
            Ok(())
        })),
    ]
}

fn log_headers(direction: char, headers: &http::HeaderMap) {
    for (name, value) in headers {
        let shown = if value.is_sensitive() {
            "***"
        } else {
            value.to_str().unwrap_or("<binary>")
        };
        log::debug!("{} {}: {}", direction, name, shown);
    }
}
