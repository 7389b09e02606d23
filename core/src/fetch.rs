//! The `fetch` entry point.
//!
//! # Design
//! `FetchContext` carries the host handle and the status-text table that a
//! fetch-style API would otherwise find in ambient globals. Each call:
//!
//! 1. resolves the method (`GET` unless a non-empty one is given),
//! 2. flattens the headers into an ordered pair list,
//! 3. assembles a fresh `HttpRequest`,
//! 4. calls `Host::send` exactly once,
//! 5. wraps the response in a `FetchResult`,
//!
//! and hands the outcome back as an already-resolved future. There is no
//! scheduling, retry or caching in between.

use bytes::Bytes;
use futures::future::{ready, Ready};
use log::{debug, warn};
use serde_json::{Map, Value};

use crate::error::FetchError;
use crate::headers::{to_pair_list, HeaderSource};
use crate::host::Host;
use crate::http::{HttpMethod, HttpRequest};
use crate::response::FetchResult;
use crate::status::StatusTextTable;

/// Request fields the bridge computes itself; extensions cannot override them.
const RESERVED_FIELDS: [&str; 4] = ["method", "uri", "headers", "body"];

/// Options accepted by `fetch`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchOptions {
    pub method: Option<String>,
    pub headers: Option<HeaderSource>,
    pub body: Option<Bytes>,
    /// Extra fields forwarded to the host untouched.
    pub extensions: Map<String, Value>,
}

impl FetchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn headers(mut self, headers: impl Into<HeaderSource>) -> Self {
        self.headers = Some(headers.into());
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn extension(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extensions.insert(key.into(), value.into());
        self
    }
}

/// Assemble the request record for one call.
pub fn build_request(uri: impl Into<String>, options: Option<FetchOptions>) -> HttpRequest {
    let FetchOptions {
        method,
        headers,
        body,
        mut extensions,
    } = options.unwrap_or_default();

    for field in RESERVED_FIELDS {
        if extensions.remove(field).is_some() {
            warn!("ignoring extension field `{field}`; the computed value takes precedence");
        }
    }

    HttpRequest {
        method: HttpMethod::resolve(method.as_deref()),
        uri: uri.into(),
        headers: to_pair_list(headers.as_ref()),
        body,
        extensions,
    }
}

/// Issue one request through `host` and wrap the response.
pub fn fetch<H: Host + ?Sized>(
    host: &H,
    table: &StatusTextTable,
    uri: impl Into<String>,
    options: Option<FetchOptions>,
) -> Ready<Result<FetchResult, FetchError>> {
    let request = build_request(uri, options);
    debug!(
        "fetch {} {} ({} headers)",
        request.method,
        request.uri,
        request.headers.len()
    );

    let outcome = host
        .send(request)
        .map(|response| {
            debug!(
                "host responded {} ({} body bytes)",
                response.status,
                response.body.as_ref().map_or(0, Bytes::len)
            );
            FetchResult::from_response(response, table)
        })
        .map_err(FetchError::Host);
    ready(outcome)
}

/// Explicit context carrying the host primitive and the status-text table.
#[derive(Debug, Clone)]
pub struct FetchContext<H> {
    host: H,
    status_texts: StatusTextTable,
}

impl<H: Host> FetchContext<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            status_texts: StatusTextTable::STANDARD,
        }
    }

    pub fn with_status_texts(mut self, table: StatusTextTable) -> Self {
        self.status_texts = table;
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn fetch(
        &self,
        uri: impl Into<String>,
        options: Option<FetchOptions>,
    ) -> Ready<Result<FetchResult, FetchError>> {
        fetch(&self.host, &self.status_texts, uri, options)
    }
}
