//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, raw pointers instead of `Vec`, and
//! tagged enums with explicit discriminants. Conversion functions live here
//! to keep `lib.rs` focused on the `extern "C"` surface.

use std::ffi::{c_void, CString};
use std::os::raw::c_char;

use serde_json::Value;
use squatch_core::{HttpMethod, HttpRequest, SquatchClient, SquatchError};

/// Opaque handle to a `SquatchClient`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiSquatchClient {
    pub(crate) inner: SquatchClient,
}

/// Copy `s` into a C string owned by the caller. Interior NULs are dropped.
pub(crate) fn c_string(s: impl Into<String>) -> *mut c_char {
    let mut s = s.into();
    s.retain(|c| c != '\0');
    CString::new(s).unwrap_or_default().into_raw()
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Post = 0,
    Put = 1,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Put => FfiHttpMethod::Put,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// Produced by `squatch_build_*` functions inside an `FfiSquatchResult`. The
/// C caller executes the request and passes the response back through
/// `squatch_parse_*`. `body` is null when the request has no body.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
}

impl FfiHttpRequest {
    pub(crate) fn from_core(req: HttpRequest) -> *mut Self {
        let url = c_string(req.url);
        let body = match req.body {
            Some(b) => c_string(b),
            None => std::ptr::null_mut(),
        };

        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            // Exact capacity so `squatch_free_result` can rebuild the Vec.
            let ffi_headers: Box<[FfiHeader]> = req
                .headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: c_string(k),
                    value: c_string(v),
                })
                .collect();
            Box::into_raw(ffi_headers) as *mut FfiHeader
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            url,
            headers,
            headers_len,
            body,
        }))
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The C caller constructs this on the stack after executing an HTTP request,
/// then passes a pointer to a `squatch_parse_*` function. The FFI layer reads
/// but does not free these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

/// Which widget analytics beacon to build.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiAnalyticsEventKind {
    Loaded = 0,
    Shared = 1,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiSquatchResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    InvalidParameter = 1,
    IncompleteBuilder = 2,
    MalformedToken = 3,
    InvalidUrl = 4,
    Client = 5,
    Server = 6,
    BadInput = 7,
    BadResponse = 8,
    Api = 9,
    Serialization = 10,
    Panic = 11,
    NullArg = 12,
    /// An argument string is not UTF-8 or not the JSON it should be.
    InvalidArg = 13,
}

/// Tag that tells `squatch_free_result` what `FfiSquatchResult::data`
/// points to.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiDataTag {
    None = 0,
    /// `data` is an `FfiHttpRequest`.
    Request = 1,
    /// `data` is a NUL-terminated JSON document.
    Json = 2,
    /// `data` is a NUL-terminated HTML document.
    Html = 3,
}

/// Result envelope for all build and parse operations.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `data`
/// points to the payload (tagged by `data_tag`).
/// On failure `error_code` describes the category, `error_message` is a
/// human-readable C string, and `data` is null. `http_status` is set for
/// `Server` errors only.
#[repr(C)]
pub struct FfiSquatchResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub data_tag: FfiDataTag,
    pub data: *mut c_void,
}

/// A successful payload before it is lowered to C.
pub(crate) enum Payload {
    None,
    Request(HttpRequest),
    Json(Value),
    Html(String),
}

/// Why an FFI call failed before or inside the core.
pub(crate) enum Failure {
    NullArg(&'static str),
    InvalidArg(&'static str, String),
    Squatch(SquatchError),
}

impl From<SquatchError> for Failure {
    fn from(err: SquatchError) -> Self {
        Failure::Squatch(err)
    }
}

impl FfiSquatchResult {
    pub(crate) fn from_outcome(outcome: Result<Payload, Failure>) -> *mut Self {
        match outcome {
            Ok(payload) => Self::ok(payload),
            Err(Failure::NullArg(name)) => {
                Self::error(FfiErrorCode::NullArg, 0, format!("null argument: {name}"))
            }
            Err(Failure::InvalidArg(name, reason)) => {
                let msg = format!("invalid argument `{name}`: {reason}");
                Self::error(FfiErrorCode::InvalidArg, 0, msg)
            }
            Err(Failure::Squatch(err)) => Self::from_error(err),
        }
    }

    fn ok(payload: Payload) -> *mut Self {
        let (data_tag, data) = match payload {
            Payload::None => (FfiDataTag::None, std::ptr::null_mut()),
            Payload::Request(req) => {
                (FfiDataTag::Request, FfiHttpRequest::from_core(req) as *mut c_void)
            }
            Payload::Json(json) => (FfiDataTag::Json, c_string(json.to_string()) as *mut c_void),
            Payload::Html(html) => (FfiDataTag::Html, c_string(html) as *mut c_void),
        };
        Box::into_raw(Box::new(FfiSquatchResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            http_status: 0,
            data_tag,
            data,
        }))
    }

    fn from_error(err: SquatchError) -> *mut Self {
        let (error_code, http_status) = match &err {
            SquatchError::InvalidParameter { .. } => (FfiErrorCode::InvalidParameter, 0),
            SquatchError::IncompleteBuilder { .. } => (FfiErrorCode::IncompleteBuilder, 0),
            SquatchError::MalformedToken(_) => (FfiErrorCode::MalformedToken, 0),
            SquatchError::InvalidUrl(_) => (FfiErrorCode::InvalidUrl, 0),
            SquatchError::Client(_) => (FfiErrorCode::Client, 0),
            SquatchError::Server { response } => (FfiErrorCode::Server, response.status),
            SquatchError::BadInput { .. } => (FfiErrorCode::BadInput, 0),
            SquatchError::BadResponse { .. } => (FfiErrorCode::BadResponse, 0),
            SquatchError::Api { .. } => (FfiErrorCode::Api, 0),
            SquatchError::Serialization(_) => (FfiErrorCode::Serialization, 0),
        };
        Self::error(error_code, http_status, err.to_string())
    }

    fn error(error_code: FfiErrorCode, http_status: u16, msg: String) -> *mut Self {
        Box::into_raw(Box::new(FfiSquatchResult {
            error_code,
            error_message: c_string(msg),
            http_status,
            data_tag: FfiDataTag::None,
            data: std::ptr::null_mut(),
        }))
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::error(FfiErrorCode::Panic, 0, msg.to_string())
    }
}
