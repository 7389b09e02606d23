//! The seam to the host's synchronous send primitive.
//!
//! The host owns the wire: transport, retries, timeouts and pooling all
//! live behind `send`. The bridge only calls it.

use std::rc::Rc;
use std::sync::Arc;

use crate::http::{HttpRequest, HttpResponse};

/// Whatever the host reports when a send fails.
pub type HostError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A synchronous, blocking HTTP primitive supplied by the environment.
pub trait Host {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, HostError>;
}

/// Adapts a closure into a `Host`.
///
/// ```
/// use syncfetch_core::{host_fn, FetchContext, HttpResponse};
///
/// let ctx = FetchContext::new(host_fn(|_req| Ok(HttpResponse::new(204))));
/// let result = ctx.fetch("https://example.com", None).into_inner().unwrap();
/// assert_eq!(result.status(), 204);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FnHost<F>(pub F);

pub fn host_fn<F>(f: F) -> FnHost<F>
where
    F: Fn(HttpRequest) -> Result<HttpResponse, HostError>,
{
    FnHost(f)
}

impl<F> Host for FnHost<F>
where
    F: Fn(HttpRequest) -> Result<HttpResponse, HostError>,
{
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, HostError> {
        (self.0)(request)
    }
}

impl<H: Host + ?Sized> Host for &H {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, HostError> {
        (**self).send(request)
    }
}

impl<H: Host + ?Sized> Host for Box<H> {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, HostError> {
        (**self).send(request)
    }
}

impl<H: Host + ?Sized> Host for Arc<H> {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, HostError> {
        (**self).send(request)
    }
}

impl<H: Host + ?Sized> Host for Rc<H> {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, HostError> {
        (**self).send(request)
    }
}
