//! C-ABI wrapper around `squatch-core`.
//!
//! # Overview
//! Exposes the referral platform operations through `extern "C"` functions
//! so a native host (iOS, Android, desktop) can build and parse HTTP
//! requests/responses itself, without linking to Rust's async runtime.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Per-operation `build_*` / `parse_*` mirrors the core API 1:1.
//! - A single `FfiSquatchResult` envelope with `FfiDataTag` + `void* data`
//!   conveys requests, payloads and errors uniformly.
//! - Nullable `const char*` arguments are optional; documents are passed as
//!   JSON text.
//! - The C caller owns all returned pointers and must call the matching
//!   `squatch_free_*` function to release them.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::{catch_unwind, UnwindSafe};

use serde_json::Value;
use squatch_core::render::{with_viewport_meta, ERROR_PAGE_HTML};
use squatch_core::{
    AnalyticsEventKind, ClientOptions, GraphQLInput, HttpResponse, PushWidgetAnalyticsEventInput,
    RenderWidgetInput, SquatchClient, UserIdInput, WidgetType, WidgetUpsertInput,
};

use types::*;

// ---------------------------------------------------------------------------
// Argument helpers
// ---------------------------------------------------------------------------

/// Run `f` behind `catch_unwind` and lower its outcome to a result envelope.
fn guard(
    name: &str,
    f: impl FnOnce() -> Result<Payload, Failure> + UnwindSafe,
) -> *mut FfiSquatchResult {
    catch_unwind(f)
        .map(FfiSquatchResult::from_outcome)
        .unwrap_or_else(|_| FfiSquatchResult::panic(&format!("panic in {name}")))
}

fn client_arg<'a>(client: *const FfiSquatchClient) -> Result<&'a SquatchClient, Failure> {
    if client.is_null() {
        return Err(Failure::NullArg("client"));
    }
    Ok(&unsafe { &*client }.inner)
}

fn optional_str<'a>(ptr: *const c_char, name: &'static str) -> Result<Option<&'a str>, Failure> {
    if ptr.is_null() {
        return Ok(None);
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map(Some)
        .map_err(|_| Failure::InvalidArg(name, "not UTF-8".to_string()))
}

fn required_str<'a>(ptr: *const c_char, name: &'static str) -> Result<&'a str, Failure> {
    optional_str(ptr, name)?.ok_or(Failure::NullArg(name))
}

fn json_arg(ptr: *const c_char, name: &'static str) -> Result<Value, Failure> {
    serde_json::from_str(required_str(ptr, name)?)
        .map_err(|e| Failure::InvalidArg(name, e.to_string()))
}

/// `program_id` + `widget_key` as a program widget, `widget_key` alone as a
/// global widget, no widget type without a key.
fn widget_type_arg(program_id: Option<&str>, widget_key: Option<&str>) -> Option<WidgetType> {
    match (program_id, widget_key) {
        (Some(program_id), Some(key)) => Some(WidgetType::program(program_id, key)),
        (None, Some(key)) => Some(WidgetType::global(key)),
        (_, None) => None,
    }
}

fn response_arg(response: *const FfiHttpResponse) -> Result<HttpResponse, Failure> {
    if response.is_null() {
        return Err(Failure::NullArg("response"));
    }
    let resp = unsafe { &*response };
    let body = optional_str(resp.body, "response.body")?.unwrap_or_default().to_string();
    Ok(HttpResponse {
        status: resp.status,
        headers: Vec::new(),
        body,
    })
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a new `SquatchClient` for `tenant_alias`.
///
/// `app_domain` may be null to use the default platform domain.
/// Returns null if `tenant_alias` is null, if either value is rejected by
/// `ClientOptions`, or if an internal panic occurs.
/// The caller must free the returned pointer with `squatch_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn squatch_client_new(
    tenant_alias: *const c_char,
    app_domain: *const c_char,
) -> *mut FfiSquatchClient {
    catch_unwind(|| {
        let build = || -> Result<ClientOptions, Failure> {
            let mut builder =
                ClientOptions::builder().tenant_alias(required_str(tenant_alias, "tenant_alias")?)?;
            if let Some(app_domain) = optional_str(app_domain, "app_domain")? {
                builder = builder.app_domain(app_domain)?;
            }
            Ok(builder.build()?)
        };
        match build() {
            Ok(options) => Box::into_raw(Box::new(FfiSquatchClient {
                inner: SquatchClient::new(options),
            })),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a `SquatchClient` created by `squatch_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn squatch_client_free(client: *mut FfiSquatchClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Build a GraphQL request. `operation_name`, `variables_json` and
/// `user_jwt` may be null.
///
/// Returns a result with `data_tag = Request` on success.
#[unsafe(no_mangle)]
pub extern "C" fn squatch_build_graphql(
    client: *const FfiSquatchClient,
    query: *const c_char,
    operation_name: *const c_char,
    variables_json: *const c_char,
    user_jwt: *const c_char,
) -> *mut FfiSquatchResult {
    guard("squatch_build_graphql", || {
        let client = client_arg(client)?;
        let mut builder = GraphQLInput::builder().query(required_str(query, "query")?)?;
        if let Some(operation_name) = optional_str(operation_name, "operation_name")? {
            builder = builder.operation_name(operation_name)?;
        }
        if !variables_json.is_null() {
            builder = builder.variables(json_arg(variables_json, "variables_json")?);
        }
        let user_jwt = optional_str(user_jwt, "user_jwt")?;
        Ok(Payload::Request(client.build_graphql(&builder.build()?, user_jwt)?))
    })
}

/// Build a `renderWidget` request.
///
/// The user is `account_id` + `user_id` when both are given, otherwise it is
/// read from `user_jwt` when that is given, otherwise the render is
/// anonymous. Passing only one of `account_id` and `user_id` is an
/// `InvalidArg` error. Every argument except `client` and `locale` may be
/// null.
#[unsafe(no_mangle)]
pub extern "C" fn squatch_build_render_widget(
    client: *const FfiSquatchClient,
    user_jwt: *const c_char,
    account_id: *const c_char,
    user_id: *const c_char,
    program_id: *const c_char,
    widget_key: *const c_char,
    engagement_medium: *const c_char,
    locale: *const c_char,
) -> *mut FfiSquatchResult {
    guard("squatch_build_render_widget", || {
        let client = client_arg(client)?;
        let user_jwt = optional_str(user_jwt, "user_jwt")?;
        let account_id = optional_str(account_id, "account_id")?;
        let user_id = optional_str(user_id, "user_id")?;

        let mut builder = RenderWidgetInput::builder();
        builder = match (account_id, user_id, user_jwt) {
            (Some(account_id), Some(user_id), Some(jwt)) => {
                builder.user(UserIdInput::new(account_id, user_id)).user_jwt(jwt)?
            }
            (Some(account_id), Some(user_id), None) => {
                builder.user(UserIdInput::new(account_id, user_id))
            }
            (Some(_), None, _) => {
                return Err(Failure::InvalidArg("user_id", "required with `account_id`".into()));
            }
            (None, Some(_), _) => {
                return Err(Failure::InvalidArg("account_id", "required with `user_id`".into()));
            }
            (None, None, Some(jwt)) => builder.user_from_jwt(jwt)?,
            (None, None, None) => builder,
        };
        let widget_type = widget_type_arg(
            optional_str(program_id, "program_id")?,
            optional_str(widget_key, "widget_key")?,
        );
        if let Some(widget_type) = widget_type {
            builder = builder.widget_type(widget_type);
        }
        if let Some(engagement_medium) = optional_str(engagement_medium, "engagement_medium")? {
            builder = builder.engagement_medium(engagement_medium)?;
        }
        let input = builder.locale(required_str(locale, "locale")?)?.build()?;
        Ok(Payload::Request(client.build_render_widget(&input)?))
    })
}

/// Build a combined user upsert and widget render request.
///
/// `user_input_json` may be null to upsert the `user` of the token payload.
/// `program_id`, `widget_key` and `engagement_medium` may be null.
#[unsafe(no_mangle)]
pub extern "C" fn squatch_build_widget_upsert(
    client: *const FfiSquatchClient,
    user_input_json: *const c_char,
    user_jwt: *const c_char,
    program_id: *const c_char,
    widget_key: *const c_char,
    engagement_medium: *const c_char,
) -> *mut FfiSquatchResult {
    guard("squatch_build_widget_upsert", || {
        let client = client_arg(client)?;
        let user_jwt = required_str(user_jwt, "user_jwt")?;
        let mut builder = if user_input_json.is_null() {
            WidgetUpsertInput::builder().user_input_with_user_jwt(user_jwt)?
        } else {
            WidgetUpsertInput::builder()
                .user_input(json_arg(user_input_json, "user_input_json")?)?
                .user_jwt(user_jwt)?
        };
        let widget_type = widget_type_arg(
            optional_str(program_id, "program_id")?,
            optional_str(widget_key, "widget_key")?,
        );
        if let Some(widget_type) = widget_type {
            builder = builder.widget_type(widget_type);
        }
        if let Some(engagement_medium) = optional_str(engagement_medium, "engagement_medium")? {
            builder = builder.engagement_medium(engagement_medium)?;
        }
        Ok(Payload::Request(client.build_widget_upsert(&builder.build()?)?))
    })
}

/// Build a user upsert request. `user_input_json` may be null to upsert the
/// `user` of the token payload.
#[unsafe(no_mangle)]
pub extern "C" fn squatch_build_user_upsert(
    client: *const FfiSquatchClient,
    user_input_json: *const c_char,
    user_jwt: *const c_char,
) -> *mut FfiSquatchResult {
    guard("squatch_build_user_upsert", || {
        let client = client_arg(client)?;
        let user_jwt = required_str(user_jwt, "user_jwt")?;
        let req = if user_input_json.is_null() {
            client.build_user_upsert_with_user_jwt(user_jwt)?
        } else {
            client.build_user_upsert(&json_arg(user_input_json, "user_input_json")?, user_jwt)?
        };
        Ok(Payload::Request(req))
    })
}

/// Build a user event request from an event document.
#[unsafe(no_mangle)]
pub extern "C" fn squatch_build_log_user_event(
    client: *const FfiSquatchClient,
    user_event_input_json: *const c_char,
    user_jwt: *const c_char,
) -> *mut FfiSquatchResult {
    guard("squatch_build_log_user_event", || {
        let client = client_arg(client)?;
        let event = json_arg(user_event_input_json, "user_event_input_json")?;
        let req = client.build_log_user_event(&event, required_str(user_jwt, "user_jwt")?)?;
        Ok(Payload::Request(req))
    })
}

/// Build a widget analytics beacon. `program_id`, `engagement_medium` and
/// `share_medium` may be null.
///
/// A share medium on the `Loaded` beacon fails with `BadInput`.
#[unsafe(no_mangle)]
pub extern "C" fn squatch_build_widget_analytics_event(
    client: *const FfiSquatchClient,
    kind: FfiAnalyticsEventKind,
    account_id: *const c_char,
    user_id: *const c_char,
    user_jwt: *const c_char,
    program_id: *const c_char,
    engagement_medium: *const c_char,
    share_medium: *const c_char,
) -> *mut FfiSquatchResult {
    guard("squatch_build_widget_analytics_event", || {
        let client = client_arg(client)?;
        let user = UserIdInput::new(
            required_str(account_id, "account_id")?,
            required_str(user_id, "user_id")?,
        );
        let mut builder = PushWidgetAnalyticsEventInput::builder()
            .user(user)
            .user_jwt(required_str(user_jwt, "user_jwt")?)?;
        if let Some(program_id) = optional_str(program_id, "program_id")? {
            builder = builder.program_id(program_id)?;
        }
        if let Some(engagement_medium) = optional_str(engagement_medium, "engagement_medium")? {
            builder = builder.engagement_medium(engagement_medium)?;
        }
        if let Some(share_medium) = optional_str(share_medium, "share_medium")? {
            builder = builder.share_medium(share_medium)?;
        }
        let kind = match kind {
            FfiAnalyticsEventKind::Loaded => AnalyticsEventKind::Loaded,
            FfiAnalyticsEventKind::Shared => AnalyticsEventKind::Shared,
        };
        Ok(Payload::Request(client.build_widget_analytics_event(kind, &builder.build()?)?))
    })
}

// ---------------------------------------------------------------------------
// Parse response functions
// ---------------------------------------------------------------------------

/// Parse a GraphQL response. Returns `data_tag = Json` on success.
#[unsafe(no_mangle)]
pub extern "C" fn squatch_parse_graphql(
    client: *const FfiSquatchClient,
    response: *const FfiHttpResponse,
) -> *mut FfiSquatchResult {
    guard("squatch_parse_graphql", || {
        let client = client_arg(client)?;
        Ok(Payload::Json(client.parse_graphql(response_arg(response)?)?))
    })
}

/// Parse a `renderWidget` response. Returns `data_tag = Html` carrying the
/// widget template on success.
#[unsafe(no_mangle)]
pub extern "C" fn squatch_parse_render_widget(
    client: *const FfiSquatchClient,
    response: *const FfiHttpResponse,
) -> *mut FfiSquatchResult {
    guard("squatch_parse_render_widget", || {
        let client = client_arg(client)?;
        Ok(Payload::Html(client.parse_render_widget(response_arg(response)?)?))
    })
}

/// Parse the JSON response of a user upsert, widget upsert or user event
/// request. Returns `data_tag = Json` on success.
#[unsafe(no_mangle)]
pub extern "C" fn squatch_parse_json(
    client: *const FfiSquatchClient,
    response: *const FfiHttpResponse,
) -> *mut FfiSquatchResult {
    guard("squatch_parse_json", || {
        let client = client_arg(client)?;
        Ok(Payload::Json(client.parse_user_upsert(response_arg(response)?)?))
    })
}

/// Parse an analytics beacon response. Returns `data_tag = None` on success.
#[unsafe(no_mangle)]
pub extern "C" fn squatch_parse_widget_analytics_event(
    client: *const FfiSquatchClient,
    response: *const FfiHttpResponse,
) -> *mut FfiSquatchResult {
    guard("squatch_parse_widget_analytics_event", || {
        let client = client_arg(client)?;
        client.parse_widget_analytics_event(response_arg(response)?)?;
        Ok(Payload::None)
    })
}

// ---------------------------------------------------------------------------
// Rendering helpers
// ---------------------------------------------------------------------------

/// Add the responsive viewport meta tag to widget HTML before display.
///
/// Returns null if `html` is null or not UTF-8.
/// The caller must free the returned string with `squatch_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn squatch_prepare_widget_html(html: *const c_char) -> *mut c_char {
    catch_unwind(|| match required_str(html, "html") {
        Ok(html) => c_string(with_viewport_meta(html)),
        Err(_) => std::ptr::null_mut(),
    })
    .unwrap_or(std::ptr::null_mut())
}

/// The page to display when a widget cannot be loaded.
///
/// The caller must free the returned string with `squatch_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn squatch_error_page_html() -> *mut c_char {
    catch_unwind(|| c_string(ERROR_PAGE_HTML)).unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiSquatchResult` returned by any `squatch_build_*` or
/// `squatch_parse_*` function. Safe to call with null. Uses `data_tag` to
/// determine what `data` points to.
#[unsafe(no_mangle)]
pub extern "C" fn squatch_free_result(result: *mut FfiSquatchResult) {
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
                FfiDataTag::Request => free_request(result.data as *mut FfiHttpRequest),
                FfiDataTag::Json | FfiDataTag::Html => {
                    drop(unsafe { CString::from_raw(result.data as *mut c_char) });
                }
                FfiDataTag::None => {}
            }
        }
    });
}

/// Free an `FfiHttpRequest` together with its strings and headers.
fn free_request(req: *mut FfiHttpRequest) {
    let req = unsafe { Box::from_raw(req) };
    if !req.url.is_null() {
        drop(unsafe { CString::from_raw(req.url) });
    }
    if !req.body.is_null() {
        drop(unsafe { CString::from_raw(req.body) });
    }
    if !req.headers.is_null() && req.headers_len > 0 {
        let headers: Box<[FfiHeader]> = unsafe {
            Box::from_raw(std::ptr::slice_from_raw_parts_mut(req.headers, req.headers_len as usize))
        };
        for h in headers.iter() {
            if !h.key.is_null() {
                drop(unsafe { CString::from_raw(h.key) });
            }
            if !h.value.is_null() {
                drop(unsafe { CString::from_raw(h.value) });
            }
        }
    }
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn squatch_free_string(s: *mut c_char) {
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
    use std::ptr::{null, null_mut};

    fn new_client() -> *mut FfiSquatchClient {
        let tenant = CString::new("t1").unwrap();
        let domain = CString::new("app.example.com").unwrap();
        let client = squatch_client_new(tenant.as_ptr(), domain.as_ptr());
        assert!(!client.is_null());
        client
    }

    fn c(s: &str) -> CString {
        CString::new(s).unwrap()
    }

    fn text(ptr: *const c_char) -> String {
        unsafe { CStr::from_ptr(ptr) }.to_str().unwrap().to_string()
    }

    fn request(result: *mut FfiSquatchResult) -> &'static FfiHttpRequest {
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok, "{}", message(result));
        assert_eq!(r.data_tag, FfiDataTag::Request);
        unsafe { &*(r.data as *const FfiHttpRequest) }
    }

    fn message(result: *mut FfiSquatchResult) -> String {
        let r = unsafe { &*result };
        if r.error_message.is_null() {
            String::new()
        } else {
            text(r.error_message)
        }
    }

    fn headers(req: &FfiHttpRequest) -> Vec<(String, String)> {
        let headers = unsafe { std::slice::from_raw_parts(req.headers, req.headers_len as usize) };
        headers.iter().map(|h| (text(h.key), text(h.value))).collect()
    }

    #[test]
    fn client_new_and_free() {
        let client = new_client();
        squatch_client_free(client);
    }

    #[test]
    fn client_new_default_domain() {
        let tenant = c("t1");
        let client = squatch_client_new(tenant.as_ptr(), null());
        assert!(!client.is_null());
        let inner = unsafe { &(*client).inner };
        assert_eq!(inner.options().app_domain(), "app.referralsaasquatch.com");
        squatch_client_free(client);
    }

    #[test]
    fn client_new_rejects_bad_options() {
        assert!(squatch_client_new(null(), null()).is_null());

        let blank = c("  ");
        assert!(squatch_client_new(blank.as_ptr(), null()).is_null());

        let tenant = c("t1");
        let url = c("https://app.example.com");
        assert!(squatch_client_new(tenant.as_ptr(), url.as_ptr()).is_null());
    }

    #[test]
    fn client_free_null_is_safe() {
        squatch_client_free(null_mut());
    }

    #[test]
    fn build_graphql_without_token() {
        let client = new_client();
        let query = c("{ping}");
        let result = squatch_build_graphql(client, query.as_ptr(), null(), null(), null());
        let req = request(result);

        assert_eq!(req.method, FfiHttpMethod::Post);
        assert_eq!(text(req.url), "https://app.example.com/api/v1/t1/graphql");
        assert_eq!(
            headers(req),
            vec![("Content-Type".to_string(), "application/json".to_string())]
        );
        let body: Value = serde_json::from_str(&text(req.body)).unwrap();
        assert_eq!(body, serde_json::json!({"query": "{ping}"}));

        squatch_free_result(result);
        squatch_client_free(client);
    }

    #[test]
    fn build_graphql_rejects_bad_variables() {
        let client = new_client();
        let query = c("{ping}");
        let variables = c("{not json");
        let result =
            squatch_build_graphql(client, query.as_ptr(), null(), variables.as_ptr(), null());
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::InvalidArg);
        assert!(message(result).contains("variables_json"));
        assert!(r.data.is_null());

        squatch_free_result(result);
        squatch_client_free(client);
    }

    #[test]
    fn build_graphql_null_client() {
        let query = c("{ping}");
        let result = squatch_build_graphql(null(), query.as_ptr(), null(), null(), null());
        assert_eq!(unsafe { &*result }.error_code, FfiErrorCode::NullArg);
        squatch_free_result(result);
    }

    #[test]
    fn build_render_widget_program_widget() {
        let client = new_client();
        let (jwt, account, user) = (c("h.p.s"), c("a1"), c("u1"));
        let (program, key, locale) = (c("p1"), c("referrerWidget"), c("en_US"));
        let result = squatch_build_render_widget(
            client,
            jwt.as_ptr(),
            account.as_ptr(),
            user.as_ptr(),
            program.as_ptr(),
            key.as_ptr(),
            null(),
            locale.as_ptr(),
        );
        let req = request(result);

        let body: Value = serde_json::from_str(&text(req.body)).unwrap();
        assert_eq!(body["variables"]["widgetType"], "p/p1/w/referrerWidget");
        assert_eq!(body["variables"]["user"], serde_json::json!({"id": "u1", "accountId": "a1"}));
        assert_eq!(body["variables"]["engagementMedium"], "MOBILE");
        assert!(headers(req).contains(&("Authorization".to_string(), "Bearer h.p.s".to_string())));

        squatch_free_result(result);
        squatch_client_free(client);
    }

    #[test]
    fn build_render_widget_requires_locale() {
        let client = new_client();
        let result = squatch_build_render_widget(
            client,
            null(),
            null(),
            null(),
            null(),
            null(),
            null(),
            null(),
        );
        assert_eq!(unsafe { &*result }.error_code, FfiErrorCode::NullArg);
        squatch_free_result(result);
        squatch_client_free(client);
    }

    #[test]
    fn build_render_widget_malformed_token() {
        let client = new_client();
        let (jwt, locale) = (c("only.two"), c("en"));
        let result = squatch_build_render_widget(
            client,
            jwt.as_ptr(),
            null(),
            null(),
            null(),
            null(),
            null(),
            locale.as_ptr(),
        );
        assert_eq!(unsafe { &*result }.error_code, FfiErrorCode::MalformedToken);
        squatch_free_result(result);
        squatch_client_free(client);
    }

    #[test]
    fn build_render_widget_requires_both_ids() {
        let client = new_client();
        let (jwt, id, locale) = (c("h.p.s"), c("a1"), c("en"));
        let cases = [
            (null(), id.as_ptr(), null(), "user_id"),
            (jwt.as_ptr(), id.as_ptr(), null(), "user_id"),
            (null(), null(), id.as_ptr(), "account_id"),
            (jwt.as_ptr(), null(), id.as_ptr(), "account_id"),
        ];
        for (user_jwt, account_id, user_id, missing) in cases {
            let result = squatch_build_render_widget(
                client,
                user_jwt,
                account_id,
                user_id,
                null(),
                null(),
                null(),
                locale.as_ptr(),
            );
            let r = unsafe { &*result };
            assert_eq!(r.error_code, FfiErrorCode::InvalidArg);
            assert!(r.data.is_null());
            assert!(message(result).contains(missing), "{missing}");
            squatch_free_result(result);
        }
        squatch_client_free(client);
    }

    #[test]
    fn build_widget_upsert_global_widget() {
        let client = new_client();
        let (doc, jwt, key) = (
            c(r#"{"id":"u1","accountId":"a1"}"#),
            c("h.p.s"),
            c("referrerWidget"),
        );
        let result = squatch_build_widget_upsert(
            client,
            doc.as_ptr(),
            jwt.as_ptr(),
            null(),
            key.as_ptr(),
            null(),
        );
        let req = request(result);

        assert_eq!(req.method, FfiHttpMethod::Put);
        assert_eq!(
            text(req.url),
            "https://app.example.com/api/v1/t1/widget/account/a1/user/u1/upsert?widgetType=w%2FreferrerWidget&engagementMedium=MOBILE"
        );

        squatch_free_result(result);
        squatch_client_free(client);
    }

    #[test]
    fn build_widget_upsert_missing_id_is_invalid_parameter() {
        let client = new_client();
        let (doc, jwt) = (c(r#"{"accountId":"a1"}"#), c("h.p.s"));
        let result =
            squatch_build_widget_upsert(client, doc.as_ptr(), jwt.as_ptr(), null(), null(), null());
        assert_eq!(unsafe { &*result }.error_code, FfiErrorCode::InvalidParameter);
        squatch_free_result(result);
        squatch_client_free(client);
    }

    #[test]
    fn build_user_upsert_and_event() {
        let client = new_client();
        let (doc, jwt) = (c(r#"{"id":"u1","accountId":"a1"}"#), c("h.p.s"));
        let result = squatch_build_user_upsert(client, doc.as_ptr(), jwt.as_ptr());
        assert_eq!(
            text(request(result).url),
            "https://app.example.com/api/v1/t1/open/account/a1/user/u1"
        );
        squatch_free_result(result);

        let event = c(r#"{"userId":"u1","accountId":"a1","events":[]}"#);
        let result = squatch_build_log_user_event(client, event.as_ptr(), jwt.as_ptr());
        assert_eq!(
            text(request(result).url),
            "https://app.example.com/api/v1/t1/open/account/a1/user/u1/events"
        );
        squatch_free_result(result);

        let bad = c(r#"{"userId":"u1"}"#);
        let result = squatch_build_log_user_event(client, bad.as_ptr(), jwt.as_ptr());
        assert_eq!(unsafe { &*result }.error_code, FfiErrorCode::BadInput);
        squatch_free_result(result);

        squatch_client_free(client);
    }

    #[test]
    fn build_loaded_beacon_rejects_share_medium() {
        let client = new_client();
        let (account, user, jwt, share) = (c("a1"), c("u1"), c("h.p.s"), c("EMAIL"));
        let args = |kind| {
            squatch_build_widget_analytics_event(
                client,
                kind,
                account.as_ptr(),
                user.as_ptr(),
                jwt.as_ptr(),
                null(),
                null(),
                share.as_ptr(),
            )
        };

        let result = args(FfiAnalyticsEventKind::Loaded);
        assert_eq!(unsafe { &*result }.error_code, FfiErrorCode::BadInput);
        squatch_free_result(result);

        let result = args(FfiAnalyticsEventKind::Shared);
        let req = request(result);
        assert!(req.body.is_null());
        assert_eq!(
            text(req.url),
            "https://app.example.com/a/t1/widgets/analytics/shared?externalUserId=u1&externalAccountId=a1&engagementMedium=MOBILE&shareMedium=EMAIL"
        );
        squatch_free_result(result);

        squatch_client_free(client);
    }

    #[test]
    fn parse_render_widget_returns_html() {
        let client = new_client();
        let body = c(r#"{"data":{"renderWidget":{"template":"<p>hi</p>"}}}"#);
        let resp = FfiHttpResponse {
            status: 200,
            body: body.as_ptr(),
        };
        let result = squatch_parse_render_widget(client, &resp);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok);
        assert_eq!(r.data_tag, FfiDataTag::Html);
        assert_eq!(text(r.data as *const c_char), "<p>hi</p>");

        squatch_free_result(result);
        squatch_client_free(client);
    }

    #[test]
    fn parse_graphql_api_error() {
        let client = new_client();
        let body = c(r#"{"errors":[{"message":"nope"}]}"#);
        let resp = FfiHttpResponse {
            status: 200,
            body: body.as_ptr(),
        };
        let result = squatch_parse_graphql(client, &resp);
        assert_eq!(unsafe { &*result }.error_code, FfiErrorCode::Api);
        assert!(message(result).contains("nope"));

        squatch_free_result(result);
        squatch_client_free(client);
    }

    #[test]
    fn parse_json_server_error_carries_status() {
        let client = new_client();
        let body = c("unauthorized");
        let resp = FfiHttpResponse {
            status: 401,
            body: body.as_ptr(),
        };
        let result = squatch_parse_json(client, &resp);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Server);
        assert_eq!(r.http_status, 401);

        squatch_free_result(result);
        squatch_client_free(client);
    }

    #[test]
    fn parse_json_success() {
        let client = new_client();
        let body = c(r#"{"id":"u1"}"#);
        let resp = FfiHttpResponse {
            status: 200,
            body: body.as_ptr(),
        };
        let result = squatch_parse_json(client, &resp);
        let r = unsafe { &*result };
        assert_eq!(r.data_tag, FfiDataTag::Json);
        let json: Value = serde_json::from_str(&text(r.data as *const c_char)).unwrap();
        assert_eq!(json["id"], "u1");

        squatch_free_result(result);
        squatch_client_free(client);
    }

    #[test]
    fn parse_analytics_null_body_is_empty() {
        let client = new_client();
        let resp = FfiHttpResponse {
            status: 204,
            body: null(),
        };
        let result = squatch_parse_widget_analytics_event(client, &resp);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok);
        assert_eq!(r.data_tag, FfiDataTag::None);
        assert!(r.data.is_null());

        squatch_free_result(result);
        squatch_client_free(client);
    }

    #[test]
    fn parse_null_response_returns_null_arg() {
        let client = new_client();
        let result = squatch_parse_graphql(client, null());
        assert_eq!(unsafe { &*result }.error_code, FfiErrorCode::NullArg);
        assert_eq!(message(result), "null argument: response");

        squatch_free_result(result);
        squatch_client_free(client);
    }

    #[test]
    fn prepare_widget_html_injects_viewport() {
        let html = c("<html><head></head></html>");
        let prepared = squatch_prepare_widget_html(html.as_ptr());
        assert_eq!(
            text(prepared),
            r#"<html><head><meta name="viewport" content="initial-scale=1.0" /></head></html>"#
        );
        squatch_free_string(prepared);

        assert!(squatch_prepare_widget_html(null()).is_null());
    }

    #[test]
    fn error_page_html_is_the_fallback_page() {
        let page = squatch_error_page_html();
        assert!(text(page).contains("Our referral program is temporarily unavailable."));
        squatch_free_string(page);
    }

    #[test]
    fn free_result_null_is_safe() {
        squatch_free_result(null_mut());
    }

    #[test]
    fn free_string_null_is_safe() {
        squatch_free_string(null_mut());
    }
}
