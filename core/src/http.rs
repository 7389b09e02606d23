//! HTTP records exchanged with the host primitive.
//!
//! # Design
//! These types describe one round-trip as plain data. The bridge builds an
//! `HttpRequest`, hands it to the host's synchronous `send`, and wraps the
//! `HttpResponse` it gets back. Nothing here touches the network.
//!
//! Bodies are whole buffers held in `Bytes`, so handing the same body to
//! several decoders is a reference-count bump rather than a copy.

use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;
use serde_json::{Map, Value};

/// HTTP method for a request.
///
/// The common verbs get their own variants; any other token the caller
/// passes is carried through verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Other(String),
}

impl HttpMethod {
    pub fn as_str(&self) -> &str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Other(token) => token,
        }
    }

    /// Resolve the method for a fetch call: a present, non-empty token wins,
    /// anything else falls back to `GET`.
    pub fn resolve(method: Option<&str>) -> Self {
        match method {
            Some(token) if !token.is_empty() => HttpMethod::from(token),
            _ => HttpMethod::Get,
        }
    }
}

impl From<&str> for HttpMethod {
    fn from(token: &str) -> Self {
        match token {
            "GET" => HttpMethod::Get,
            "HEAD" => HttpMethod::Head,
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            "PATCH" => HttpMethod::Patch,
            "DELETE" => HttpMethod::Delete,
            "OPTIONS" => HttpMethod::Options,
            other => HttpMethod::Other(other.to_string()),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The request record handed to the host.
///
/// Built fresh by the bridge for every `fetch` call and never mutated
/// afterwards. `uri` is opaque: it is not parsed or validated here.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub uri: String,
    /// Header pairs in insertion order. Duplicate names are allowed.
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
    /// Extra option fields forwarded untouched for host-specific extensions.
    pub extensions: Map<String, Value>,
}

/// The response record returned by the host.
///
/// Read-only input to the bridge. Header names are unique keys and their
/// case is whatever the host reported. Headers are kept sorted by name, so
/// the order the host received them on the wire is not preserved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Bytes>,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }
}
