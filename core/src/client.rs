//! Stateless HTTP request builder and response parser for the platform API.
//!
//! # Design
//! `SquatchClient` holds only `ClientOptions` and carries no mutable state
//! between calls. Each operation is split into a `build_*` method that
//! validates its input and produces an `HttpRequest`, and a `parse_*` method
//! that consumes the matching `HttpResponse`. Nothing here performs I/O; see
//! `Dispatcher` for the asynchronous round-trip.

use serde_json::{json, Value};
use url::Url;

use crate::error::SquatchError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::inputs::{
    document_user, GraphQLInput, PushWidgetAnalyticsEventInput, RenderWidgetInput,
    WidgetUpsertInput,
};
use crate::jwt::{jwt_payload, payload_user};
use crate::options::ClientOptions;
use crate::types::{is_blank, WidgetType};

pub const RENDER_WIDGET_QUERY: &str = r#"query renderWidget(
    $user: UserIdInput
    $widgetType: WidgetType
    $engagementMedium: UserEngagementMedium
    $locale: RSLocale
) {
    renderWidget(
        user: $user
        widgetType: $widgetType
        engagementMedium: $engagementMedium
        locale: $locale
    ) {
        template
    }
}"#;

/// Which widget analytics beacon to push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyticsEventKind {
    Loaded,
    Shared,
}

impl AnalyticsEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AnalyticsEventKind::Loaded => "loaded",
            AnalyticsEventKind::Shared => "shared",
        }
    }
}

/// Synchronous, stateless client for the platform API.
#[derive(Debug, Clone)]
pub struct SquatchClient {
    options: ClientOptions,
}

impl SquatchClient {
    pub fn new(options: ClientOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    // -----------------------------------------------------------------------
    // Build
    // -----------------------------------------------------------------------

    /// `POST /api/v1/{tenant}/graphql`. The token is optional here.
    pub fn build_graphql(
        &self,
        input: &GraphQLInput,
        user_jwt: Option<&str>,
    ) -> Result<HttpRequest, SquatchError> {
        let url = self.url(&["/api", "v1", self.options.tenant_alias(), "graphql"], &[])?;
        let body = serde_json::to_string(input).map_err(SquatchError::Serialization)?;
        Ok(request(HttpMethod::Post, url, user_jwt, Some(body)))
    }

    /// The fixed `renderWidget` query sent through `build_graphql`.
    pub fn build_render_widget(
        &self,
        input: &RenderWidgetInput,
    ) -> Result<HttpRequest, SquatchError> {
        let mut variables = json!({
            "engagementMedium": input.engagement_medium(),
            "locale": input.locale(),
        });
        if let Some(user) = input.user() {
            variables["user"] = json!({"id": user.user_id, "accountId": user.account_id});
        }
        if let Some(widget_type) = input.widget_type() {
            variables["widgetType"] = Value::String(widget_type.widget_type());
        }
        let query = GraphQLInput::builder()
            .query(RENDER_WIDGET_QUERY)?
            .variables(variables)
            .build()?;
        self.build_graphql(&query, input.user_jwt())
    }

    /// `PUT /api/v1/{tenant}/open/account/{accountId}/user/{userId}` with
    /// `user_input` as the body.
    pub fn build_user_upsert(
        &self,
        user_input: &Value,
        user_jwt: &str,
    ) -> Result<HttpRequest, SquatchError> {
        let user = document_user(user_input, "id").ok_or_else(|| {
            SquatchError::bad_input("`userInput` must include `id` and `accountId`")
        })?;
        require_token(user_jwt)?;
        self.upsert_request(&user.account_id, &user.user_id, user_input, user_jwt, None)
    }

    /// Same as `build_user_upsert`, with the `user` object of the token
    /// payload as the body.
    pub fn build_user_upsert_with_user_jwt(
        &self,
        user_jwt: &str,
    ) -> Result<HttpRequest, SquatchError> {
        require_token(user_jwt)?;
        let payload = jwt_payload(user_jwt)?;
        let user_input = payload
            .get("user")
            .ok_or_else(|| SquatchError::bad_input("JWT payload must include `user`"))?;
        let user = payload_user(&payload).ok_or_else(|| {
            SquatchError::bad_input("`user` in JWT must include `id` and `accountId`")
        })?;
        self.upsert_request(&user.account_id, &user.user_id, user_input, user_jwt, None)
    }

    /// `PUT /api/v1/{tenant}/widget/account/{accountId}/user/{userId}/upsert`.
    pub fn build_widget_upsert(
        &self,
        input: &WidgetUpsertInput,
    ) -> Result<HttpRequest, SquatchError> {
        self.upsert_request(
            input.account_id(),
            input.user_id(),
            input.user_input(),
            input.user_jwt(),
            Some((input.widget_type(), input.engagement_medium())),
        )
    }

    /// `POST /api/v1/{tenant}/open/account/{accountId}/user/{userId}/events`.
    pub fn build_log_user_event(
        &self,
        user_event_input: &Value,
        user_jwt: &str,
    ) -> Result<HttpRequest, SquatchError> {
        let user = document_user(user_event_input, "userId").ok_or_else(|| {
            SquatchError::bad_input("`userEventInput` must include `userId` and `accountId`")
        })?;
        require_token(user_jwt)?;
        let url = self.url(
            &[
                "/api",
                "v1",
                self.options.tenant_alias(),
                "open",
                "account",
                user.account_id.as_str(),
                "user",
                user.user_id.as_str(),
                "events",
            ],
            &[],
        )?;
        let body = serde_json::to_string(user_event_input).map_err(SquatchError::Serialization)?;
        Ok(request(HttpMethod::Post, url, Some(user_jwt), Some(body)))
    }

    /// `POST /a/{tenant}/widgets/analytics/{loaded|shared}` with an empty
    /// body. A share medium is only valid on the `shared` beacon.
    pub fn build_widget_analytics_event(
        &self,
        kind: AnalyticsEventKind,
        input: &PushWidgetAnalyticsEventInput,
    ) -> Result<HttpRequest, SquatchError> {
        let user = input.user();
        let mut query = vec![
            ("externalUserId", user.user_id.as_str()),
            ("externalAccountId", user.account_id.as_str()),
        ];
        if let Some(program_id) = input.program_id() {
            query.push(("programId", program_id));
        }
        query.push(("engagementMedium", input.engagement_medium()));
        if let Some(share_medium) = input.share_medium() {
            if kind == AnalyticsEventKind::Loaded {
                return Err(SquatchError::bad_input(
                    "shareMedium cannot be set for `loaded` analytics event",
                ));
            }
            query.push(("shareMedium", share_medium));
        }
        let url = self.url(
            &["/a", self.options.tenant_alias(), "widgets", "analytics", kind.as_str()],
            &query,
        )?;
        Ok(request(HttpMethod::Post, url, Some(input.user_jwt()), None))
    }

    fn upsert_request(
        &self,
        account_id: &str,
        user_id: &str,
        body: &Value,
        user_jwt: &str,
        widget: Option<(Option<&WidgetType>, &str)>,
    ) -> Result<HttpRequest, SquatchError> {
        let tenant_alias = self.options.tenant_alias();
        let (segments, query) = match widget {
            None => (
                vec!["/api", "v1", tenant_alias, "open", "account", account_id, "user", user_id],
                Vec::new(),
            ),
            Some((widget_type, engagement_medium)) => {
                let mut query = Vec::new();
                if let Some(widget_type) = widget_type {
                    query.push(("widgetType", widget_type.widget_type()));
                }
                query.push(("engagementMedium", engagement_medium.to_string()));
                let segments = vec![
                    "/api",
                    "v1",
                    tenant_alias,
                    "widget",
                    "account",
                    account_id,
                    "user",
                    user_id,
                    "upsert",
                ];
                (segments, query)
            }
        };
        let query: Vec<(&str, &str)> =
            query.iter().map(|(key, value)| (*key, value.as_str())).collect();
        let url = self.url(&segments, &query)?;
        let body = serde_json::to_string(body).map_err(SquatchError::Serialization)?;
        Ok(request(HttpMethod::Put, url, Some(user_jwt), Some(body)))
    }

    /// `https://<app domain>` + joined path segments + query pairs.
    fn url(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url, SquatchError> {
        let mut url = Url::parse(&format!("https://{}", self.options.app_domain()))?;
        url.set_path(&segments.join("/"));
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    // -----------------------------------------------------------------------
    // Parse
    // -----------------------------------------------------------------------

    /// The JSON body, or an `Api` error when it carries a GraphQL `errors`
    /// array.
    pub fn parse_graphql(&self, response: HttpResponse) -> Result<Value, SquatchError> {
        let json = parse_json(response)?;
        if let Some(errors) = json.get("errors").and_then(Value::as_array) {
            return Err(SquatchError::Api { errors: errors.clone() });
        }
        Ok(json)
    }

    /// `data.renderWidget.template` of a `renderWidget` response.
    pub fn parse_render_widget(&self, response: HttpResponse) -> Result<String, SquatchError> {
        let json = self.parse_graphql(response)?;
        json.pointer("/data/renderWidget/template")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| SquatchError::bad_response("missing `data.renderWidget.template`"))
    }

    pub fn parse_user_upsert(&self, response: HttpResponse) -> Result<Value, SquatchError> {
        parse_json(response)
    }

    pub fn parse_widget_upsert(&self, response: HttpResponse) -> Result<Value, SquatchError> {
        parse_json(response)
    }

    pub fn parse_log_user_event(&self, response: HttpResponse) -> Result<Value, SquatchError> {
        parse_json(response)
    }

    /// Beacons only report success or failure; the body is ignored.
    pub fn parse_widget_analytics_event(&self, response: HttpResponse) -> Result<(), SquatchError> {
        check_status(response)?;
        Ok(())
    }
}

fn request(
    method: HttpMethod,
    url: Url,
    user_jwt: Option<&str>,
    body: Option<String>,
) -> HttpRequest {
    let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
    if let Some(user_jwt) = user_jwt {
        headers.push(("Authorization".to_string(), format!("Bearer {user_jwt}")));
    }
    HttpRequest {
        method,
        url: url.into(),
        headers,
        body,
    }
}

fn require_token(user_jwt: &str) -> Result<(), SquatchError> {
    if is_blank(user_jwt) {
        return Err(SquatchError::bad_input("`userJwt` cannot be blank"));
    }
    Ok(())
}

/// Non-2xx responses become `Server` errors carrying the whole response.
fn check_status(response: HttpResponse) -> Result<HttpResponse, SquatchError> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(SquatchError::Server { response })
    }
}

fn parse_json(response: HttpResponse) -> Result<Value, SquatchError> {
    let response = check_status(response)?;
    serde_json::from_str(&response.body)
        .map_err(|e| SquatchError::bad_response(format!("body is not JSON: {e}")))
}
