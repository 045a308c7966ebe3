//! The HTTP transport collaborator.
//!
//! The executor only needs one operation from a transport: turn an outgoing
//! `http::Request` into an `http::Response` whose body can be read and closed.
//! Connection pooling, TLS, redirects and retries all live behind this trait.
use crate::config::ClientConfig;
use crate::context::Context;
use crate::errors::{BoxError, Error};
use crate::net::body::{RequestBody, ResponseBody};
use bytes::Bytes;
use futures::future::BoxFuture;
use lazy_static::lazy_static;
use std::sync::Arc;

pub type OutgoingRequest = http::Request<RequestBody>;
pub type TransportResponse = http::Response<Box<dyn ResponseBody>>;

pub trait Transport: Send + Sync {
    /// Performs one exchange. Failures here have no status code: DNS, TCP, TLS,
    /// timeouts and cancellation.
    ///
    /// A [`Context`] found in the request extensions must be honoured for the
    /// exchange and for reads of the returned body.
    fn execute(&self, request: OutgoingRequest) -> BoxFuture<'_, Result<TransportResponse, BoxError>>;
}

lazy_static! {
    static ref DEFAULT_TRANSPORT: Arc<dyn Transport> = {
        let transport = ReqwestTransport::with_config(&ClientConfig::default()).unwrap_or_else(|e| {
            log::warn!("Transport: default client configuration rejected, using plain client: {}", e);
            ReqwestTransport::new()
        });
        Arc::new(transport)
    };
}

/// Shared transport used by requests that do not pick their own.
pub fn default_transport() -> Arc<dyn Transport> {
    DEFAULT_TRANSPORT.clone()
}

/// Transport backed by a pooled [`reqwest::Client`].
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn with_config(config: &ClientConfig) -> Result<Self, Error> {
        let mut builder = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .gzip(config.gzip);

        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(|e| Error::Transport(e.into()))?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn execute(&self, request: OutgoingRequest) -> BoxFuture<'_, Result<TransportResponse, BoxError>> {
        Box::pin(async move {
            let context = request.extensions().get::<Context>().cloned();
            let (parts, body) = request.into_parts();

            let mut builder = self
                .client
                .request(parts.method, parts.uri.to_string())
                .version(parts.version)
                .headers(parts.headers);
            builder = match body {
                RequestBody::Empty => builder,
                RequestBody::Bytes(bytes) => builder.body(bytes),
                RequestBody::Stream(stream) => builder.body(reqwest::Body::wrap_stream(stream)),
            };

            let send = builder.send();
            let response = match &context {
                Some(ctx) => ctx.run(send).await?,
                None => send.await?,
            };

            let status = response.status();
            let version = response.version();
            let headers = response.headers().clone();
            let final_url = response.url().clone();

            let body: Box<dyn ResponseBody> = Box::new(ReqwestBody {
                response: Some(response),
                context,
            });
            let mut out = http::Response::new(body);
            *out.status_mut() = status;
            *out.version_mut() = version;
            *out.headers_mut() = headers;
            out.extensions_mut().insert(final_url);
            Ok(out)
        })
    }
}

struct ReqwestBody {
    response: Option<reqwest::Response>,
    context: Option<Context>,
}

impl ResponseBody for ReqwestBody {
    fn chunk(&mut self) -> BoxFuture<'_, Result<Option<Bytes>, BoxError>> {
        Box::pin(async move {
            let Some(response) = self.response.as_mut() else {
                return Ok(None);
            };
            match &self.context {
                Some(ctx) => ctx.run(response.chunk()).await,
                None => Ok(response.chunk().await?),
            }
        })
    }

    fn close(&mut self) -> BoxFuture<'_, Result<(), BoxError>> {
        // Dropping the response returns a fully read connection to the pool
        self.response.take();
        Box::pin(async { Ok(()) })
    }
}
