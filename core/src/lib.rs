//! Fetch-style HTTP over a synchronous host primitive.
//!
//! # Overview
//! Application code written against the asynchronous Fetch contract calls
//! [`FetchContext::fetch`]. The bridge turns that into exactly one call to
//! the host's blocking [`Host::send`] and wraps the response in a
//! [`FetchResult`] with `status`, `ok`, `status_text`, header entries and
//! lazily decoded `array_buffer` / `text` / `json` bodies.
//!
//! # Design
//! - The host handle travels in an explicit `FetchContext` rather than a
//!   process-wide global.
//! - Header inputs are one `HeaderSource` enum instead of duck typing.
//! - Results are `futures::future::Ready` values: async-shaped, already
//!   resolved, no executor involvement.
//! - No transport, retries, timeouts or streaming live here; the host owns
//!   the wire.

pub mod error;
pub mod fetch;
pub mod headers;
pub mod host;
pub mod http;
pub mod response;
pub mod status;

pub use error::FetchError;
pub use fetch::{build_request, fetch, FetchContext, FetchOptions};
pub use headers::{to_pair_list, HeaderEntries, HeaderSource, Headers};
pub use host::{host_fn, FnHost, Host, HostError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use response::FetchResult;
pub use status::StatusTextTable;
