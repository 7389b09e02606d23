//! The fetch-result handed back to application code.
//!
//! # Design
//! `FetchResult` takes ownership of the host's body once and keeps it as an
//! immutable `Bytes`. Each decoder works from that stored buffer on every
//! call, so `array_buffer()`, `text()` and `json()` can be invoked in any
//! order, any number of times, and a failing `json()` leaves the others
//! untouched.
//!
//! Decoders return `futures::future::Ready`: the value is computed eagerly
//! and the future is already resolved. Await it from async code, or call
//! `into_inner()` from sync code.

use bytes::Bytes;
use futures::future::{ready, Ready};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::FetchError;
use crate::headers::Headers;
use crate::http::HttpResponse;
use crate::status::StatusTextTable;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone)]
pub struct FetchResult {
    status: u16,
    status_text: Option<&'static str>,
    headers: Headers,
    body: Bytes,
}

impl FetchResult {
    /// Wrap a host response. An absent body becomes an empty buffer.
    pub fn from_response(response: HttpResponse, table: &StatusTextTable) -> Self {
        let HttpResponse {
            status,
            headers,
            body,
        } = response;
        Self {
            status,
            status_text: table.lookup(status),
            headers: Headers::new(headers),
            body: body.unwrap_or_default(),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// `true` for any 2xx status.
    pub fn ok(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    pub fn status_text(&self) -> Option<&'static str> {
        self.status_text
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// The raw body bytes.
    pub fn array_buffer(&self) -> Ready<Bytes> {
        ready(self.body.clone())
    }

    /// The body decoded as UTF-8. A leading byte order mark is dropped and
    /// malformed sequences become U+FFFD.
    pub fn text(&self) -> Ready<String> {
        ready(self.decode_text())
    }

    /// The body decoded as UTF-8 and parsed as JSON.
    ///
    /// An empty body is not valid JSON and rejects like any other malformed
    /// text.
    pub fn json(&self) -> Ready<Result<Value, FetchError>> {
        ready(self.parse_json())
    }

    /// Like [`json`](Self::json) but deserializes into `T`.
    pub fn json_as<T: DeserializeOwned>(&self) -> Ready<Result<T, FetchError>> {
        ready(self.parse_json())
    }

    fn decode_text(&self) -> String {
        let body = self.body.strip_prefix(UTF8_BOM).unwrap_or(&self.body[..]);
        String::from_utf8_lossy(body).into_owned()
    }

    fn parse_json<T: DeserializeOwned>(&self) -> Result<T, FetchError> {
        let text = self.decode_text();
        Ok(serde_json::from_str(&text)?)
    }
}
