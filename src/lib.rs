//! Composable HTTP requests.
//!
//! A [`Request`] starts from a method and URL and is shaped by options: headers,
//! query parameters, bodies, hooks, a transport and a cancellation [`Context`].
//! Options are plain values, so a set of them can be kept and reused as a template
//! for many requests.
//!
//! ```no_run
//! use gosub_request::option::{body::body_json, header::user_agent, query::query};
//! use gosub_request::Request;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize)]
//! struct NewItem<'a> {
//!     name: &'a str,
//! }
//!
//! #[derive(Deserialize)]
//! struct Item {
//!     id: u64,
//! }
//!
//! # async fn run() -> Result<(), gosub_request::Error> {
//! let item: Item = Request::post("https://example.com/items")
//!     .with(user_agent("inventory/1.0"))
//!     .with(query("notify", "false"))
//!     .with(body_json(NewItem { name: "lamp" }))
//!     .fetch_json()
//!     .await?;
//! println!("created {}", item.id);
//! # Ok(())
//! # }
//! ```
//!
//! Any response with a status of 400 or above becomes a [`ResponseError`] carrying
//! the status, headers and the first bytes of the body. Informational, success and
//! redirect responses are handed back as they are. Response bodies are always
//! drained before they are closed so the underlying connection can be reused.
pub mod config;
pub mod context;
pub mod errors;
pub mod net;
pub mod option;
pub mod request;

pub use config::{ClientConfig, DEFAULT_ERROR_BODY_LIMIT};
pub use context::{Context, ContextError};
pub use errors::{BoxError, Error, ResponseError, StatusError};
pub use net::{join_url, Body, RequestBody, ReqwestTransport, Transport};
pub use option::{option_fn, RequestOption};
pub use request::{QueryValues, Request};
