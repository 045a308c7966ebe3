//! Network plumbing: the transport collaborator, request/response bodies and URL
//! joining.
pub mod body;
pub mod join;
pub mod transport;

#[cfg(test)]
pub(crate) mod mock;

pub use body::{Body, BodyStream, RequestBody, ResponseBody};
pub use join::join_url;
pub use transport::{default_transport, OutgoingRequest, ReqwestTransport, Transport, TransportResponse};
