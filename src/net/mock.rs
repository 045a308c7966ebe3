//! Scripted in-memory transport used by the unit tests.
use crate::context::Context;
use crate::errors::BoxError;
use crate::net::body::{RequestBody, ResponseBody};
use crate::net::transport::{OutgoingRequest, Transport, TransportResponse};
use bytes::Bytes;
use futures::future::BoxFuture;
use http::{HeaderMap, Method, StatusCode};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Observes what happened to a [`MockBody`] after it was handed out.
#[derive(Debug, Clone, Default)]
pub(crate) struct Probe(Arc<Mutex<ProbeState>>);

#[derive(Debug, Default)]
struct ProbeState {
    bytes_read: usize,
    close_calls: usize,
    remaining_at_close: Option<usize>,
}

impl Probe {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut ProbeState) -> R) -> R {
        let mut state = self.0.lock().unwrap();
        f(&mut state)
    }

    pub(crate) fn closed(&self) -> bool {
        self.with(|s| s.close_calls > 0)
    }

    pub(crate) fn close_calls(&self) -> usize {
        self.with(|s| s.close_calls)
    }

    pub(crate) fn bytes_read(&self) -> usize {
        self.with(|s| s.bytes_read)
    }

    /// Number of chunks still unread when close was first called.
    pub(crate) fn remaining_at_close(&self) -> Option<usize> {
        self.with(|s| s.remaining_at_close)
    }
}

pub(crate) struct MockBody {
    chunks: VecDeque<Bytes>,
    probe: Probe,
    reads: usize,
    fail_read_after: Option<(usize, String)>,
    fail_close: Option<String>,
}

impl MockBody {
    pub(crate) fn new<I, C>(chunks: I, probe: Probe) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Bytes>,
    {
        Self {
            chunks: chunks.into_iter().map(Into::into).collect(),
            probe,
            reads: 0,
            fail_read_after: None,
            fail_close: None,
        }
    }

    /// Fails every read once `reads` chunks have been delivered.
    pub(crate) fn fail_read_after(mut self, reads: usize, msg: &str) -> Self {
        self.fail_read_after = Some((reads, msg.to_string()));
        self
    }

    pub(crate) fn fail_close(mut self, msg: &str) -> Self {
        self.fail_close = Some(msg.to_string());
        self
    }
}

impl ResponseBody for MockBody {
    fn chunk(&mut self) -> BoxFuture<'_, Result<Option<Bytes>, BoxError>> {
        Box::pin(async move {
            if let Some((after, msg)) = &self.fail_read_after {
                if self.reads >= *after {
                    return Err(msg.clone().into());
                }
            }
            let chunk = self.chunks.pop_front();
            if let Some(chunk) = &chunk {
                self.reads += 1;
                let len = chunk.len();
                self.probe.with(|s| s.bytes_read += len);
            }
            Ok(chunk)
        })
    }

    fn close(&mut self) -> BoxFuture<'_, Result<(), BoxError>> {
        Box::pin(async move {
            let remaining = self.chunks.len();
            self.probe.with(|s| {
                s.close_calls += 1;
                s.remaining_at_close.get_or_insert(remaining);
            });
            match &self.fail_close {
                Some(msg) => Err(msg.clone().into()),
                None => Ok(()),
            }
        })
    }
}

/// A response the mock transport will serve.
pub(crate) struct MockResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: MockBody,
}

impl MockResponse {
    pub(crate) fn new<I, C>(status: u16, chunks: I, probe: Probe) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Bytes>,
    {
        Self {
            status: StatusCode::from_u16(status).unwrap(),
            headers: HeaderMap::new(),
            body: MockBody::new(chunks, probe),
        }
    }

    pub(crate) fn header(mut self, name: &'static str, value: &'static str) -> Self {
        self.headers
            .append(name, http::HeaderValue::from_static(value));
        self
    }

    pub(crate) fn map_body(mut self, f: impl FnOnce(MockBody) -> MockBody) -> Self {
        self.body = f(self.body);
        self
    }
}

/// What the transport saw of an outgoing request.
#[derive(Debug, Clone)]
pub(crate) struct Recorded {
    pub method: Method,
    pub uri: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    pub streamed: bool,
    pub context: Option<Context>,
}

#[derive(Default)]
pub(crate) struct MockTransport {
    responses: Mutex<VecDeque<MockResponse>>,
    recorded: Mutex<Vec<Recorded>>,
    failure: Option<String>,
}

impl MockTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn serving(responses: Vec<MockResponse>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            ..Self::default()
        })
    }

    /// A transport whose every exchange fails like a network error.
    pub(crate) fn failing(msg: &str) -> Arc<Self> {
        Arc::new(Self {
            failure: Some(msg.to_string()),
            ..Self::default()
        })
    }

    pub(crate) fn recorded(&self) -> Vec<Recorded> {
        self.recorded.lock().unwrap().clone()
    }

    pub(crate) fn calls(&self) -> usize {
        self.recorded.lock().unwrap().len()
    }
}

impl Transport for MockTransport {
    fn execute(&self, request: OutgoingRequest) -> BoxFuture<'_, Result<TransportResponse, BoxError>> {
        Box::pin(async move {
            let context = request.extensions().get::<Context>().cloned();
            let (parts, body) = request.into_parts();
            let streamed = matches!(body, RequestBody::Stream(_));
            self.recorded.lock().unwrap().push(Recorded {
                method: parts.method,
                uri: parts.uri.to_string(),
                headers: parts.headers,
                body: body.as_bytes().cloned(),
                streamed,
                context,
            });

            if let Some(msg) = &self.failure {
                return Err(msg.clone().into());
            }

            let scripted = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| MockResponse::new(200, Vec::<Bytes>::new(), Probe::new()));

            let body: Box<dyn ResponseBody> = Box::new(scripted.body);
            let mut response = http::Response::new(body);
            *response.status_mut() = scripted.status;
            *response.headers_mut() = scripted.headers;
            Ok(response)
        })
    }
}
