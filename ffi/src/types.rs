//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Two families of types live here. *Views* (`FfiHeaderView`,
//! `FfiHttpRequest`, `FfiHttpResponse`, `FfiFetchOptions`) borrow memory
//! owned by whoever filled them in and are never freed by this library.
//! *Owned* values (`FfiHeaderList`, `FfiBuffer`, `FfiFetchResult`, C strings)
//! are allocated here and released through the matching `syncfetch_free_*`.
//!
//! `FfiHost` adapts the host's C callback to the core `Host` trait, so the
//! bridge itself runs unchanged behind the C surface.

use std::collections::BTreeMap;
use std::ffi::{c_void, CStr, CString};
use std::os::raw::c_char;

use bytes::Bytes;
use log::error;
use syncfetch_core::{FetchContext, FetchError, FetchResult, Host, HostError, HttpRequest, HttpResponse};

// ---------------------------------------------------------------------------
// Borrowed views
// ---------------------------------------------------------------------------

/// A header pair borrowed from the other side of the boundary.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct FfiHeaderView {
    pub key: *const c_char,
    pub value: *const c_char,
}

/// The request handed to the host's `send` callback.
///
/// Every pointer is valid only for the duration of the callback.
/// `body` is null when the request has no body.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: *const c_char,
    pub uri: *const c_char,
    pub headers: *const FfiHeaderView,
    pub headers_len: u32,
    pub body: *const u8,
    pub body_len: usize,
}

/// The response the host's `send` callback fills in.
///
/// The host keeps ownership of everything it points at. Once the response
/// has been copied, the optional `release` callback is invoked so the host
/// can free it. A null `body` means the response has no body.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub headers: *const FfiHeaderView,
    pub headers_len: u32,
    pub body: *const u8,
    pub body_len: usize,
}

impl FfiHttpResponse {
    pub(crate) fn empty() -> Self {
        Self {
            status: 0,
            headers: std::ptr::null(),
            headers_len: 0,
            body: std::ptr::null(),
            body_len: 0,
        }
    }
}

/// Options for `syncfetch_fetch`. Every field is optional: a null `method`
/// means `GET`, a null `headers` means none, a null `body` means no body.
#[repr(C)]
pub struct FfiFetchOptions {
    pub method: *const c_char,
    pub headers: *const FfiHeaderView,
    pub headers_len: u32,
    pub body: *const u8,
    pub body_len: usize,
}

/// Host send callback. Returns 0 on success; any other value is a host fault.
pub type FfiSendFn = extern "C" fn(
    user_data: *mut c_void,
    request: *const FfiHttpRequest,
    response: *mut FfiHttpResponse,
) -> i32;

/// Called after a successful `send` once the response has been copied.
pub type FfiReleaseFn = extern "C" fn(user_data: *mut c_void, response: *mut FfiHttpResponse);

// ---------------------------------------------------------------------------
// Host adapter
// ---------------------------------------------------------------------------

/// The host primitive as registered from C.
pub struct FfiHost {
    pub(crate) send: FfiSendFn,
    pub(crate) release: Option<FfiReleaseFn>,
    pub(crate) user_data: *mut c_void,
}

/// Opaque handle to a fetch context. C callers receive a pointer to this
/// and pass it back into `syncfetch_fetch`.
pub struct FfiFetchContext {
    pub(crate) inner: FetchContext<FfiHost>,
}

impl Host for FfiHost {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, HostError> {
        let method = CString::new(request.method.as_str())?;
        let uri = CString::new(request.uri)?;
        let owned_headers = request
            .headers
            .into_iter()
            .map(|(k, v)| Ok((CString::new(k)?, CString::new(v)?)))
            .collect::<Result<Vec<_>, std::ffi::NulError>>()?;
        let header_views: Vec<FfiHeaderView> = owned_headers
            .iter()
            .map(|(k, v)| FfiHeaderView {
                key: k.as_ptr(),
                value: v.as_ptr(),
            })
            .collect();
        let (body, body_len) = match &request.body {
            Some(b) => (b.as_ptr(), b.len()),
            None => (std::ptr::null(), 0),
        };

        let ffi_req = FfiHttpRequest {
            method: method.as_ptr(),
            uri: uri.as_ptr(),
            headers: if header_views.is_empty() {
                std::ptr::null()
            } else {
                header_views.as_ptr()
            },
            headers_len: u32::try_from(header_views.len())?,
            body,
            body_len,
        };

        let mut ffi_resp = FfiHttpResponse::empty();
        let code = (self.send)(self.user_data, &ffi_req, &mut ffi_resp);
        if code != 0 {
            error!("host send callback returned {code}");
            return Err(format!("host send callback returned {code}").into());
        }

        let response = unsafe { response_from_view(&ffi_resp) };
        if let Some(release) = self.release {
            release(self.user_data, &mut ffi_resp);
        }
        Ok(response)
    }
}

/// Copy a host-filled response into an owned core `HttpResponse`.
///
/// Later duplicates of a header name replace earlier ones. Null names are
/// skipped; a null value reads as empty.
unsafe fn response_from_view(resp: &FfiHttpResponse) -> HttpResponse {
    let mut headers = BTreeMap::new();
    for view in unsafe { header_slice(resp.headers, resp.headers_len) } {
        if view.key.is_null() {
            continue;
        }
        headers.insert(unsafe { c_str_lossy(view.key) }, unsafe { c_str_lossy(view.value) });
    }
    let body = if resp.body.is_null() {
        None
    } else {
        Some(Bytes::copy_from_slice(unsafe {
            std::slice::from_raw_parts(resp.body, resp.body_len)
        }))
    };
    HttpResponse {
        status: resp.status,
        headers,
        body,
    }
}

pub(crate) unsafe fn header_slice<'a>(ptr: *const FfiHeaderView, len: u32) -> &'a [FfiHeaderView] {
    if ptr.is_null() || len == 0 {
        &[]
    } else {
        unsafe { std::slice::from_raw_parts(ptr, len as usize) }
    }
}

pub(crate) unsafe fn c_str_lossy(ptr: *const c_char) -> String {
    if ptr.is_null() {
        String::new()
    } else {
        unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
    }
}

// ---------------------------------------------------------------------------
// Owned outputs
// ---------------------------------------------------------------------------

/// A header pair owned by this library.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// Response header entries. Free with `syncfetch_free_headers`.
#[repr(C)]
pub struct FfiHeaderList {
    pub items: *mut FfiHeader,
    pub len: u32,
}

/// A byte buffer. Free with `syncfetch_free_buffer`.
#[repr(C)]
pub struct FfiBuffer {
    pub data: *mut u8,
    pub len: usize,
}

impl FfiBuffer {
    pub(crate) fn from_bytes(bytes: &[u8]) -> Self {
        let boxed: Box<[u8]> = bytes.into();
        let len = boxed.len();
        let data = Box::into_raw(boxed) as *mut u8;
        Self { data, len }
    }

    pub(crate) fn null() -> Self {
        Self {
            data: std::ptr::null_mut(),
            len: 0,
        }
    }
}

/// Opaque handle to a fetch-result.
pub struct FfiResponse {
    pub(crate) inner: FetchResult,
    /// NUL-terminated copy of the status text, borrowed out to C callers.
    pub(crate) status_text: Option<CString>,
}

impl FfiResponse {
    pub(crate) fn new(inner: FetchResult) -> Self {
        let status_text = inner.status_text().and_then(|text| CString::new(text).ok());
        Self { inner, status_text }
    }
}

// ---------------------------------------------------------------------------
// Result envelope
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiFetchResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    Host = 1,
    Decode = 2,
    NullArg = 3,
    InvalidArg = 4,
    Panic = 5,
}

/// Tag that tells `syncfetch_free_result` what `FfiFetchResult::data` points to.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiDataTag {
    None = 0,
    /// `data` is an `FfiResponse*`.
    Response = 1,
    /// `data` is a `char*` holding serialized JSON.
    Json = 2,
}

/// Result envelope for `syncfetch_fetch` and `syncfetch_response_json`.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `data`
/// points to the payload tagged by `data_tag`.
/// On failure `error_code` describes the category, `error_message` is a
/// human-readable C string, and `data` is null.
#[repr(C)]
pub struct FfiFetchResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub data_tag: FfiDataTag,
    pub data: *mut c_void,
}

impl FfiFetchResult {
    fn boxed(
        error_code: FfiErrorCode,
        error_message: Option<String>,
        data_tag: FfiDataTag,
        data: *mut c_void,
    ) -> *mut Self {
        let error_message = match error_message {
            Some(msg) => into_c_string_lossy(msg),
            None => std::ptr::null_mut(),
        };
        Box::into_raw(Box::new(FfiFetchResult {
            error_code,
            error_message,
            data_tag,
            data,
        }))
    }

    /// Build a success result carrying a response handle.
    pub(crate) fn ok_response(result: FetchResult) -> *mut Self {
        let response = Box::into_raw(Box::new(FfiResponse::new(result)));
        Self::boxed(
            FfiErrorCode::Ok,
            None,
            FfiDataTag::Response,
            response as *mut c_void,
        )
    }

    /// Build a success result carrying serialized JSON text.
    pub(crate) fn ok_json(json: String) -> *mut Self {
        Self::boxed(
            FfiErrorCode::Ok,
            None,
            FfiDataTag::Json,
            into_c_string_lossy(json) as *mut c_void,
        )
    }

    /// Build an error result from a `FetchError`.
    pub(crate) fn from_error(err: FetchError) -> *mut Self {
        let code = match &err {
            FetchError::Host(_) => FfiErrorCode::Host,
            FetchError::Json(_) => FfiErrorCode::Decode,
        };
        Self::boxed(code, Some(err.to_string()), FfiDataTag::None, std::ptr::null_mut())
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::boxed(
            FfiErrorCode::NullArg,
            Some(format!("null argument: {name}")),
            FfiDataTag::None,
            std::ptr::null_mut(),
        )
    }

    /// Build an error result for an argument that could not be read.
    pub(crate) fn invalid_arg(name: &str, reason: &str) -> *mut Self {
        Self::boxed(
            FfiErrorCode::InvalidArg,
            Some(format!("invalid argument {name}: {reason}")),
            FfiDataTag::None,
            std::ptr::null_mut(),
        )
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        error!("{msg}");
        Self::boxed(
            FfiErrorCode::Panic,
            Some(msg.to_string()),
            FfiDataTag::None,
            std::ptr::null_mut(),
        )
    }
}

/// Convert to a C string, dropping interior NULs rather than failing.
fn into_c_string_lossy(s: String) -> *mut c_char {
    let cleaned = match CString::new(s) {
        Ok(c) => return c.into_raw(),
        Err(err) => {
            let mut bytes = err.into_vec();
            bytes.retain(|&b| b != 0);
            bytes
        }
    };
    CString::new(cleaned).unwrap_or_default().into_raw()
}
