//! C-ABI wrapper around `syncfetch-core`.
//!
//! # Overview
//! Lets a native host plug its synchronous HTTP primitive into the fetch
//! bridge and lets C callers read the resulting fetch-result, without
//! linking to Rust's async machinery or serde directly.
//!
//! # Design
//! - The host registers a `send` callback (plus optional `release`) and an
//!   opaque `user_data` pointer; `FfiHost` adapts them to the core `Host`.
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - A single `FfiFetchResult` envelope with `FfiDataTag` + `void* data`
//!   conveys success payloads and errors uniformly.
//! - The C caller owns all returned pointers and must call the matching
//!   `syncfetch_free_*` function to release them.

pub mod types;

use std::ffi::{c_void, CStr, CString};
use std::os::raw::c_char;
use std::panic::catch_unwind;

use bytes::Bytes;
use syncfetch_core::{FetchContext, FetchOptions, HeaderSource};

use types::*;

// ---------------------------------------------------------------------------
// Context lifecycle
// ---------------------------------------------------------------------------

/// Create a fetch context that sends through `send`.
///
/// `release` may be null. `user_data` is passed back verbatim to both
/// callbacks and is never dereferenced here.
/// The caller must free the returned pointer with `syncfetch_context_free`.
#[unsafe(no_mangle)]
pub extern "C" fn syncfetch_context_new(
    send: FfiSendFn,
    release: Option<FfiReleaseFn>,
    user_data: *mut c_void,
) -> *mut FfiFetchContext {
    catch_unwind(|| {
        let host = FfiHost {
            send,
            release,
            user_data,
        };
        Box::into_raw(Box::new(FfiFetchContext {
            inner: FetchContext::new(host),
        }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a context created by `syncfetch_context_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn syncfetch_context_free(ctx: *mut FfiFetchContext) {
    if !ctx.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(ctx) });
        });
    }
}

// ---------------------------------------------------------------------------
// Fetch
// ---------------------------------------------------------------------------

/// Read borrowed C options into core `FetchOptions`.
unsafe fn options_from_ffi(opts: &FfiFetchOptions) -> Result<FetchOptions, &'static str> {
    let mut options = FetchOptions::new();
    if !opts.method.is_null() {
        let method = unsafe { CStr::from_ptr(opts.method) }
            .to_str()
            .map_err(|_| "method is not UTF-8")?;
        options = options.method(method);
    }
    if !opts.headers.is_null() {
        let mut pairs = Vec::with_capacity(opts.headers_len as usize);
        for view in unsafe { header_slice(opts.headers, opts.headers_len) } {
            if view.key.is_null() {
                return Err("header name is null");
            }
            pairs.push((unsafe { c_str_lossy(view.key) }, unsafe { c_str_lossy(view.value) }));
        }
        options = options.headers(HeaderSource::Pairs(pairs));
    }
    if !opts.body.is_null() {
        let body = unsafe { std::slice::from_raw_parts(opts.body, opts.body_len) };
        options = options.body(Bytes::copy_from_slice(body));
    }
    Ok(options)
}

/// Fetch `uri` through the context's host.
///
/// `options` may be null. On success the result has `data_tag = Response`
/// and `data` is an `FfiResponse*` usable with the `syncfetch_response_*`
/// accessors until the result is freed.
#[unsafe(no_mangle)]
pub extern "C" fn syncfetch_fetch(
    ctx: *const FfiFetchContext,
    uri: *const c_char,
    options: *const FfiFetchOptions,
) -> *mut FfiFetchResult {
    catch_unwind(|| {
        if ctx.is_null() {
            return FfiFetchResult::null_arg("ctx");
        }
        if uri.is_null() {
            return FfiFetchResult::null_arg("uri");
        }
        let ctx = unsafe { &*ctx };
        let uri = match unsafe { CStr::from_ptr(uri) }.to_str() {
            Ok(u) => u,
            Err(_) => return FfiFetchResult::invalid_arg("uri", "not UTF-8"),
        };
        let options = if options.is_null() {
            None
        } else {
            match unsafe { options_from_ffi(&*options) } {
                Ok(o) => Some(o),
                Err(reason) => return FfiFetchResult::invalid_arg("options", reason),
            }
        };
        match ctx.inner.fetch(uri, options).into_inner() {
            Ok(result) => FfiFetchResult::ok_response(result),
            Err(e) => FfiFetchResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiFetchResult::panic("panic in syncfetch_fetch"))
}

// ---------------------------------------------------------------------------
// Response accessors
// ---------------------------------------------------------------------------

/// HTTP status code, or 0 if `resp` is null.
#[unsafe(no_mangle)]
pub extern "C" fn syncfetch_response_status(resp: *const FfiResponse) -> u16 {
    if resp.is_null() {
        return 0;
    }
    unsafe { &*resp }.inner.status()
}

/// `true` for a 2xx status. `false` if `resp` is null.
#[unsafe(no_mangle)]
pub extern "C" fn syncfetch_response_ok(resp: *const FfiResponse) -> bool {
    if resp.is_null() {
        return false;
    }
    unsafe { &*resp }.inner.ok()
}

/// Reason phrase for the status, or null for codes without one.
///
/// The string is borrowed from `resp`; do not free it.
#[unsafe(no_mangle)]
pub extern "C" fn syncfetch_response_status_text(resp: *const FfiResponse) -> *const c_char {
    if resp.is_null() {
        return std::ptr::null();
    }
    match &unsafe { &*resp }.status_text {
        Some(text) => text.as_ptr(),
        None => std::ptr::null(),
    }
}

/// Response header entries.
///
/// Returns null if `resp` is null.
/// The caller must free the returned pointer with `syncfetch_free_headers`.
#[unsafe(no_mangle)]
pub extern "C" fn syncfetch_response_headers(resp: *const FfiResponse) -> *mut FfiHeaderList {
    catch_unwind(|| {
        if resp.is_null() {
            return std::ptr::null_mut();
        }
        let resp = unsafe { &*resp };
        let Ok(len) = u32::try_from(resp.inner.headers().len()) else {
            return std::ptr::null_mut();
        };
        let mut items: Vec<FfiHeader> = Vec::with_capacity(len as usize);
        for (k, v) in resp.inner.headers().entries() {
            // names/values with interior NUL cannot be represented in C
            let (Ok(key), Ok(value)) = (CString::new(k), CString::new(v)) else {
                continue;
            };
            items.push(FfiHeader {
                key: key.into_raw(),
                value: value.into_raw(),
            });
        }
        // skipped entries only shrink the list
        let len = u32::try_from(items.len()).unwrap_or(len);
        let items = if items.is_empty() {
            std::ptr::null_mut()
        } else {
            Box::into_raw(items.into_boxed_slice()) as *mut FfiHeader
        };
        Box::into_raw(Box::new(FfiHeaderList { items, len }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Copy of the raw body. Zero-length (with null `data`) for an absent body
/// or a null `resp`.
/// The caller must free the returned buffer with `syncfetch_free_buffer`.
#[unsafe(no_mangle)]
pub extern "C" fn syncfetch_response_array_buffer(resp: *const FfiResponse) -> FfiBuffer {
    catch_unwind(|| {
        if resp.is_null() {
            return FfiBuffer::null();
        }
        let bytes = unsafe { &*resp }.inner.array_buffer().into_inner();
        if bytes.is_empty() {
            FfiBuffer::null()
        } else {
            FfiBuffer::from_bytes(&bytes)
        }
    })
    .unwrap_or_else(|_| FfiBuffer::null())
}

/// Body decoded as UTF-8 text.
///
/// Returns null if `resp` is null or the text contains a NUL character.
/// The caller must free the returned string with `syncfetch_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn syncfetch_response_text(resp: *const FfiResponse) -> *mut c_char {
    catch_unwind(|| {
        if resp.is_null() {
            return std::ptr::null_mut();
        }
        let text = unsafe { &*resp }.inner.text().into_inner();
        CString::new(text)
            .map(CString::into_raw)
            .unwrap_or(std::ptr::null_mut())
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Body parsed as JSON.
///
/// On success the result has `data_tag = Json` and `data` is a `char*`
/// with the value re-serialized in compact form. A body that is not JSON
/// (including an empty one) yields `error_code = Decode`.
#[unsafe(no_mangle)]
pub extern "C" fn syncfetch_response_json(resp: *const FfiResponse) -> *mut FfiFetchResult {
    catch_unwind(|| {
        if resp.is_null() {
            return FfiFetchResult::null_arg("resp");
        }
        match unsafe { &*resp }.inner.json().into_inner() {
            Ok(value) => match serde_json::to_string(&value) {
                Ok(json) => FfiFetchResult::ok_json(json),
                Err(e) => FfiFetchResult::from_error(e.into()),
            },
            Err(e) => FfiFetchResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiFetchResult::panic("panic in syncfetch_response_json"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiFetchResult` and whatever its `data` points to.
/// Safe to call with null. Uses `data_tag` to determine what `data` is.
#[unsafe(no_mangle)]
pub extern "C" fn syncfetch_free_result(result: *mut FfiFetchResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        if !result.error_message.is_null() {
            drop(unsafe { CString::from_raw(result.error_message) });
        }
        if !result.data.is_null() {
            match result.data_tag {
                FfiDataTag::Response => {
                    drop(unsafe { Box::from_raw(result.data as *mut FfiResponse) });
                }
                FfiDataTag::Json => {
                    drop(unsafe { CString::from_raw(result.data as *mut c_char) });
                }
                FfiDataTag::None => {}
            }
        }
    });
}

/// Free an `FfiHeaderList` returned by `syncfetch_response_headers`.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn syncfetch_free_headers(list: *mut FfiHeaderList) {
    if list.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let list = unsafe { Box::from_raw(list) };
        if !list.items.is_null() && list.len > 0 {
            let items = unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                    list.items,
                    list.len as usize,
                ))
            };
            for h in items.iter() {
                if !h.key.is_null() {
                    drop(unsafe { CString::from_raw(h.key) });
                }
                if !h.value.is_null() {
                    drop(unsafe { CString::from_raw(h.value) });
                }
            }
        }
    });
}

/// Free a buffer returned by `syncfetch_response_array_buffer`.
/// Safe to call with a null `data`.
#[unsafe(no_mangle)]
pub extern "C" fn syncfetch_free_buffer(buffer: FfiBuffer) {
    if buffer.data.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        drop(unsafe {
            Box::from_raw(std::ptr::slice_from_raw_parts_mut(buffer.data, buffer.len))
        });
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn syncfetch_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { CString::from_raw(s) });
        });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    /// What the test host answers with, plus what it observed.
    struct Fixture {
        status: u16,
        headers: Vec<FfiHeaderView>,
        body: Option<&'static [u8]>,
        fail: bool,
        calls: Cell<u32>,
        releases: Cell<u32>,
        seen: RefCell<Vec<(String, String, Vec<(String, String)>, Option<Vec<u8>>)>>,
    }

    impl Fixture {
        fn new(status: u16, body: Option<&'static [u8]>) -> Self {
            Self {
                status,
                headers: Vec::new(),
                body,
                fail: false,
                calls: Cell::new(0),
                releases: Cell::new(0),
                seen: RefCell::new(Vec::new()),
            }
        }

        fn ctx(&self) -> *mut FfiFetchContext {
            syncfetch_context_new(
                fixture_send,
                Some(fixture_release),
                self as *const Fixture as *mut c_void,
            )
        }
    }

    extern "C" fn fixture_send(
        user_data: *mut c_void,
        request: *const FfiHttpRequest,
        response: *mut FfiHttpResponse,
    ) -> i32 {
        let fixture = unsafe { &*(user_data as *const Fixture) };
        let req = unsafe { &*request };
        fixture.calls.set(fixture.calls.get() + 1);

        let headers = unsafe { header_slice(req.headers, req.headers_len) }
            .iter()
            .map(|h| unsafe { (c_str_lossy(h.key), c_str_lossy(h.value)) })
            .collect();
        let body = if req.body.is_null() {
            None
        } else {
            Some(unsafe { std::slice::from_raw_parts(req.body, req.body_len) }.to_vec())
        };
        fixture.seen.borrow_mut().push((
            unsafe { c_str_lossy(req.method) },
            unsafe { c_str_lossy(req.uri) },
            headers,
            body,
        ));

        if fixture.fail {
            return -1;
        }
        let out = unsafe { &mut *response };
        out.status = fixture.status;
        out.headers = fixture.headers.as_ptr();
        out.headers_len = fixture.headers.len() as u32;
        if let Some(body) = fixture.body {
            out.body = body.as_ptr();
            out.body_len = body.len();
        }
        0
    }

    extern "C" fn fixture_release(user_data: *mut c_void, _response: *mut FfiHttpResponse) {
        let fixture = unsafe { &*(user_data as *const Fixture) };
        fixture.releases.set(fixture.releases.get() + 1);
    }

    fn response_of(result: *mut FfiFetchResult) -> *const FfiResponse {
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok);
        assert!(r.error_message.is_null());
        assert_eq!(r.data_tag, FfiDataTag::Response);
        r.data as *const FfiResponse
    }

    #[test]
    fn context_new_and_free() {
        let fixture = Fixture::new(200, None);
        let ctx = fixture.ctx();
        assert!(!ctx.is_null());
        syncfetch_context_free(ctx);
    }

    #[test]
    fn context_free_null_is_safe() {
        syncfetch_context_free(std::ptr::null_mut());
    }

    #[test]
    fn fetch_created_json() {
        let mut fixture = Fixture::new(201, Some(br#"{"id":7}"#));
        fixture.headers.push(FfiHeaderView {
            key: c"content-type".as_ptr(),
            value: c"application/json".as_ptr(),
        });
        let ctx = fixture.ctx();
        let uri = CString::new("https://example.com/items").unwrap();
        let result = syncfetch_fetch(ctx, uri.as_ptr(), std::ptr::null());
        let resp = response_of(result);

        assert_eq!(syncfetch_response_status(resp), 201);
        assert!(syncfetch_response_ok(resp));
        let text = unsafe { CStr::from_ptr(syncfetch_response_status_text(resp)) };
        assert_eq!(text.to_str().unwrap(), "Created");

        let list = syncfetch_response_headers(resp);
        let list_ref = unsafe { &*list };
        assert_eq!(list_ref.len, 1);
        let items = unsafe { std::slice::from_raw_parts(list_ref.items, list_ref.len as usize) };
        let key = unsafe { CStr::from_ptr(items[0].key) }.to_str().unwrap();
        let value = unsafe { CStr::from_ptr(items[0].value) }.to_str().unwrap();
        assert_eq!((key, value), ("content-type", "application/json"));
        syncfetch_free_headers(list);

        let json = syncfetch_response_json(resp);
        let json_ref = unsafe { &*json };
        assert_eq!(json_ref.error_code, FfiErrorCode::Ok);
        assert_eq!(json_ref.data_tag, FfiDataTag::Json);
        let json_text = unsafe { CStr::from_ptr(json_ref.data as *const c_char) };
        assert_eq!(json_text.to_str().unwrap(), r#"{"id":7}"#);
        syncfetch_free_result(json);

        assert_eq!(fixture.calls.get(), 1);
        assert_eq!(fixture.releases.get(), 1);
        let seen = fixture.seen.borrow();
        assert_eq!(seen[0].0, "GET");
        assert_eq!(seen[0].1, "https://example.com/items");
        assert!(seen[0].2.is_empty());
        assert!(seen[0].3.is_none());
        drop(seen);

        syncfetch_free_result(result);
        syncfetch_context_free(ctx);
    }

    #[test]
    fn fetch_passes_options_through() {
        let fixture = Fixture::new(204, None);
        let ctx = fixture.ctx();
        let uri = CString::new("/upload").unwrap();
        let headers = [
            FfiHeaderView {
                key: c"x-b".as_ptr(),
                value: c"2".as_ptr(),
            },
            FfiHeaderView {
                key: c"x-a".as_ptr(),
                value: c"1".as_ptr(),
            },
        ];
        let body = b"payload";
        let options = FfiFetchOptions {
            method: c"POST".as_ptr(),
            headers: headers.as_ptr(),
            headers_len: headers.len() as u32,
            body: body.as_ptr(),
            body_len: body.len(),
        };
        let result = syncfetch_fetch(ctx, uri.as_ptr(), &options);
        let resp = response_of(result);
        assert_eq!(syncfetch_response_status(resp), 204);
        assert_eq!(
            unsafe { CStr::from_ptr(syncfetch_response_status_text(resp)) }
                .to_str()
                .unwrap(),
            "No Content"
        );

        let seen = fixture.seen.borrow();
        assert_eq!(seen[0].0, "POST");
        assert_eq!(
            seen[0].2,
            vec![
                ("x-b".to_string(), "2".to_string()),
                ("x-a".to_string(), "1".to_string())
            ]
        );
        assert_eq!(seen[0].3.as_deref(), Some(&b"payload"[..]));
        drop(seen);

        syncfetch_free_result(result);
        syncfetch_context_free(ctx);
    }

    #[test]
    fn fetch_not_found_without_body() {
        let fixture = Fixture::new(404, None);
        let ctx = fixture.ctx();
        let uri = CString::new("/missing").unwrap();
        let result = syncfetch_fetch(ctx, uri.as_ptr(), std::ptr::null());
        let resp = response_of(result);

        assert!(!syncfetch_response_ok(resp));

        let buffer = syncfetch_response_array_buffer(resp);
        assert_eq!(buffer.len, 0);
        syncfetch_free_buffer(buffer);

        let text = syncfetch_response_text(resp);
        assert_eq!(unsafe { CStr::from_ptr(text) }.to_str().unwrap(), "");
        syncfetch_free_string(text);

        let json = syncfetch_response_json(resp);
        let json_ref = unsafe { &*json };
        assert_eq!(json_ref.error_code, FfiErrorCode::Decode);
        assert!(!json_ref.error_message.is_null());
        assert!(json_ref.data.is_null());
        syncfetch_free_result(json);

        syncfetch_free_result(result);
        syncfetch_context_free(ctx);
    }

    #[test]
    fn decoders_are_repeatable_across_the_boundary() {
        let fixture = Fixture::new(200, Some(b"hello"));
        let ctx = fixture.ctx();
        let uri = CString::new("/text").unwrap();
        let result = syncfetch_fetch(ctx, uri.as_ptr(), std::ptr::null());
        let resp = response_of(result);

        for _ in 0..2 {
            let buffer = syncfetch_response_array_buffer(resp);
            let bytes = unsafe { std::slice::from_raw_parts(buffer.data, buffer.len) };
            assert_eq!(bytes, b"hello");
            syncfetch_free_buffer(buffer);

            let text = syncfetch_response_text(resp);
            assert_eq!(unsafe { CStr::from_ptr(text) }.to_str().unwrap(), "hello");
            syncfetch_free_string(text);
        }

        syncfetch_free_result(result);
        syncfetch_context_free(ctx);
    }

    #[test]
    fn unknown_status_has_null_status_text() {
        let fixture = Fixture::new(299, None);
        let ctx = fixture.ctx();
        let uri = CString::new("/odd").unwrap();
        let result = syncfetch_fetch(ctx, uri.as_ptr(), std::ptr::null());
        let resp = response_of(result);

        assert!(syncfetch_response_ok(resp));
        assert!(syncfetch_response_status_text(resp).is_null());

        syncfetch_free_result(result);
        syncfetch_context_free(ctx);
    }

    #[test]
    fn host_failure_returns_host_error() {
        let mut fixture = Fixture::new(200, None);
        fixture.fail = true;
        let ctx = fixture.ctx();
        let uri = CString::new("/down").unwrap();
        let result = syncfetch_fetch(ctx, uri.as_ptr(), std::ptr::null());
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Host);
        assert!(r.data.is_null());
        let msg = unsafe { CStr::from_ptr(r.error_message) }.to_str().unwrap();
        assert!(msg.contains("returned -1"), "{msg}");

        assert_eq!(fixture.calls.get(), 1);
        assert_eq!(fixture.releases.get(), 0);

        syncfetch_free_result(result);
        syncfetch_context_free(ctx);
    }

    #[test]
    fn fetch_null_args_return_null_arg() {
        let fixture = Fixture::new(200, None);
        let ctx = fixture.ctx();
        let uri = CString::new("/").unwrap();

        let result = syncfetch_fetch(std::ptr::null(), uri.as_ptr(), std::ptr::null());
        assert_eq!(unsafe { &*result }.error_code, FfiErrorCode::NullArg);
        syncfetch_free_result(result);

        let result = syncfetch_fetch(ctx, std::ptr::null(), std::ptr::null());
        assert_eq!(unsafe { &*result }.error_code, FfiErrorCode::NullArg);
        syncfetch_free_result(result);

        assert_eq!(fixture.calls.get(), 0);
        syncfetch_context_free(ctx);
    }

    #[test]
    fn null_header_name_is_invalid_arg() {
        let fixture = Fixture::new(200, None);
        let ctx = fixture.ctx();
        let uri = CString::new("/").unwrap();
        let headers = [FfiHeaderView {
            key: std::ptr::null(),
            value: c"v".as_ptr(),
        }];
        let options = FfiFetchOptions {
            method: std::ptr::null(),
            headers: headers.as_ptr(),
            headers_len: 1,
            body: std::ptr::null(),
            body_len: 0,
        };
        let result = syncfetch_fetch(ctx, uri.as_ptr(), &options);
        assert_eq!(unsafe { &*result }.error_code, FfiErrorCode::InvalidArg);
        assert_eq!(fixture.calls.get(), 0);

        syncfetch_free_result(result);
        syncfetch_context_free(ctx);
    }

    #[test]
    fn accessors_tolerate_null_response() {
        assert_eq!(syncfetch_response_status(std::ptr::null()), 0);
        assert!(!syncfetch_response_ok(std::ptr::null()));
        assert!(syncfetch_response_status_text(std::ptr::null()).is_null());
        assert!(syncfetch_response_headers(std::ptr::null()).is_null());
        assert!(syncfetch_response_array_buffer(std::ptr::null()).data.is_null());
        assert!(syncfetch_response_text(std::ptr::null()).is_null());

        let json = syncfetch_response_json(std::ptr::null());
        assert_eq!(unsafe { &*json }.error_code, FfiErrorCode::NullArg);
        syncfetch_free_result(json);
    }

    #[test]
    fn free_functions_tolerate_null() {
        syncfetch_free_result(std::ptr::null_mut());
        syncfetch_free_headers(std::ptr::null_mut());
        syncfetch_free_buffer(FfiBuffer {
            data: std::ptr::null_mut(),
            len: 0,
        });
        syncfetch_free_string(std::ptr::null_mut());
    }
}
