//! Validated inputs for every client operation.
//!
//! # Design
//! Each input is immutable and can only be obtained from its builder. Setters
//! reject bad values immediately and return the builder for chaining with
//! `?`; `build()` only checks that the required setters were called. A failed
//! setter consumes the builder, so a partially valid input can never be
//! built.

use serde::Serialize;
use serde_json::Value;

use crate::error::SquatchError;
use crate::jwt::{jwt_payload, payload_user};
use crate::types::{is_blank, UserIdInput, WidgetType, DEFAULT_ENGAGEMENT_MEDIUM};

fn non_blank(param: &'static str, value: String) -> Result<String, SquatchError> {
    if is_blank(&value) {
        return Err(SquatchError::InvalidParameter {
            param,
            reason: "cannot be blank",
        });
    }
    Ok(value)
}

// ---------------------------------------------------------------------------
// GraphQL
// ---------------------------------------------------------------------------

/// A GraphQL request body: `{query, operationName?, variables?}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQLInput {
    query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    operation_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    variables: Option<Value>,
}

impl GraphQLInput {
    pub fn builder() -> GraphQLInputBuilder {
        GraphQLInputBuilder::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn operation_name(&self) -> Option<&str> {
        self.operation_name.as_deref()
    }

    pub fn variables(&self) -> Option<&Value> {
        self.variables.as_ref()
    }
}

#[derive(Debug, Default)]
pub struct GraphQLInputBuilder {
    query: Option<String>,
    operation_name: Option<String>,
    variables: Option<Value>,
}

impl GraphQLInputBuilder {
    pub fn query(mut self, query: impl Into<String>) -> Result<Self, SquatchError> {
        self.query = Some(non_blank("query", query.into())?);
        Ok(self)
    }

    pub fn operation_name(
        mut self,
        operation_name: impl Into<String>,
    ) -> Result<Self, SquatchError> {
        self.operation_name = Some(non_blank("operationName", operation_name.into())?);
        Ok(self)
    }

    pub fn variables(mut self, variables: Value) -> Self {
        self.variables = Some(variables);
        self
    }

    pub fn build(self) -> Result<GraphQLInput, SquatchError> {
        let query = self.query.ok_or(SquatchError::IncompleteBuilder {
            builder: "GraphQLInput",
            reason: "must call query",
        })?;
        Ok(GraphQLInput {
            query,
            operation_name: self.operation_name,
            variables: self.variables,
        })
    }
}

// ---------------------------------------------------------------------------
// Render widget
// ---------------------------------------------------------------------------

/// Parameters of the `renderWidget` query.
///
/// Only `RenderWidgetInput::builder` can produce one:
///
/// ```compile_fail
/// use squatch_core::RenderWidgetInput;
///
/// let input = RenderWidgetInput {
///     user: None,
///     user_jwt: None,
///     widget_type: None,
///     engagement_medium: String::new(),
///     locale: String::new(),
/// };
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RenderWidgetInput {
    user: Option<UserIdInput>,
    user_jwt: Option<String>,
    widget_type: Option<WidgetType>,
    engagement_medium: String,
    locale: String,
}

impl RenderWidgetInput {
    pub fn builder() -> RenderWidgetInputBuilder {
        RenderWidgetInputBuilder::default()
    }

    pub fn user(&self) -> Option<&UserIdInput> {
        self.user.as_ref()
    }

    pub fn user_jwt(&self) -> Option<&str> {
        self.user_jwt.as_deref()
    }

    pub fn widget_type(&self) -> Option<&WidgetType> {
        self.widget_type.as_ref()
    }

    pub fn engagement_medium(&self) -> &str {
        &self.engagement_medium
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }
}

#[derive(Debug)]
pub struct RenderWidgetInputBuilder {
    user: Option<UserIdInput>,
    user_jwt: Option<String>,
    widget_type: Option<WidgetType>,
    engagement_medium: String,
    locale: Option<String>,
}

impl Default for RenderWidgetInputBuilder {
    fn default() -> Self {
        Self {
            user: None,
            user_jwt: None,
            widget_type: None,
            engagement_medium: DEFAULT_ENGAGEMENT_MEDIUM.to_string(),
            locale: None,
        }
    }
}

impl RenderWidgetInputBuilder {
    pub fn user(mut self, user: UserIdInput) -> Self {
        self.user = Some(user);
        self
    }

    /// Set both the token and the user identity carried in its payload.
    pub fn user_from_jwt(mut self, user_jwt: impl Into<String>) -> Result<Self, SquatchError> {
        let user_jwt = non_blank("userJwt", user_jwt.into())?;
        let payload = jwt_payload(&user_jwt)?;
        let user = payload_user(&payload).ok_or(SquatchError::InvalidParameter {
            param: "userJwt",
            reason: "userJwt payload should include `user.id` and `user.accountId`",
        })?;
        self.user = Some(user);
        self.user_jwt = Some(user_jwt);
        Ok(self)
    }

    pub fn user_jwt(mut self, user_jwt: impl Into<String>) -> Result<Self, SquatchError> {
        self.user_jwt = Some(non_blank("userJwt", user_jwt.into())?);
        Ok(self)
    }

    pub fn widget_type(mut self, widget_type: WidgetType) -> Self {
        self.widget_type = Some(widget_type);
        self
    }

    /// Defaults to `MOBILE`.
    pub fn engagement_medium(
        mut self,
        engagement_medium: impl Into<String>,
    ) -> Result<Self, SquatchError> {
        self.engagement_medium = non_blank("engagementMedium", engagement_medium.into())?;
        Ok(self)
    }

    pub fn locale(mut self, locale: impl Into<String>) -> Result<Self, SquatchError> {
        self.locale = Some(non_blank("locale", locale.into())?);
        Ok(self)
    }

    pub fn build(self) -> Result<RenderWidgetInput, SquatchError> {
        let locale = self.locale.ok_or(SquatchError::IncompleteBuilder {
            builder: "RenderWidgetInput",
            reason: "must call locale",
        })?;
        Ok(RenderWidgetInput {
            user: self.user,
            user_jwt: self.user_jwt,
            widget_type: self.widget_type,
            engagement_medium: self.engagement_medium,
            locale,
        })
    }
}

// ---------------------------------------------------------------------------
// Widget upsert
// ---------------------------------------------------------------------------

/// Parameters of the combined user upsert and widget render.
///
/// `account_id` and `user_id` are always the `accountId` / `id` of
/// `user_input`; the builder extracts them, so a literal cannot be built:
///
/// ```compile_fail
/// use squatch_core::WidgetUpsertInput;
///
/// let input = WidgetUpsertInput {
///     user_input: serde_json::json!({"firstName": "Ada"}),
///     account_id: "a1".to_string(),
///     user_id: "u2".to_string(),
///     user_jwt: String::new(),
///     widget_type: None,
///     engagement_medium: String::new(),
/// };
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetUpsertInput {
    user_input: Value,
    account_id: String,
    user_id: String,
    user_jwt: String,
    widget_type: Option<WidgetType>,
    engagement_medium: String,
}

impl WidgetUpsertInput {
    pub fn builder() -> WidgetUpsertInputBuilder {
        WidgetUpsertInputBuilder::default()
    }

    /// The user document, forwarded verbatim as the request body.
    pub fn user_input(&self) -> &Value {
        &self.user_input
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn user(&self) -> UserIdInput {
        UserIdInput::new(self.account_id.clone(), self.user_id.clone())
    }

    pub fn user_jwt(&self) -> &str {
        &self.user_jwt
    }

    pub fn widget_type(&self) -> Option<&WidgetType> {
        self.widget_type.as_ref()
    }

    pub fn engagement_medium(&self) -> &str {
        &self.engagement_medium
    }
}

#[derive(Debug)]
pub struct WidgetUpsertInputBuilder {
    user: Option<(Value, UserIdInput)>,
    user_jwt: Option<String>,
    widget_type: Option<WidgetType>,
    engagement_medium: String,
}

impl Default for WidgetUpsertInputBuilder {
    fn default() -> Self {
        Self {
            user: None,
            user_jwt: None,
            widget_type: None,
            engagement_medium: DEFAULT_ENGAGEMENT_MEDIUM.to_string(),
        }
    }
}

impl WidgetUpsertInputBuilder {
    /// Set the user document. It must carry string `id` and `accountId`
    /// fields; any other fields are forwarded untouched.
    pub fn user_input(mut self, user_input: Value) -> Result<Self, SquatchError> {
        let user = document_user(&user_input, "id").ok_or(SquatchError::InvalidParameter {
            param: "userInput",
            reason: "must include `id` and `accountId`",
        })?;
        self.user = Some((user_input, user));
        Ok(self)
    }

    /// Use the `user` object of the token payload as the user document and
    /// the token itself for authorization.
    pub fn user_input_with_user_jwt(
        mut self,
        user_jwt: impl Into<String>,
    ) -> Result<Self, SquatchError> {
        let user_jwt = non_blank("userJwt", user_jwt.into())?;
        let payload = jwt_payload(&user_jwt)?;
        let user = payload_user(&payload).ok_or(SquatchError::InvalidParameter {
            param: "userJwt",
            reason: "userJwt payload should include `user` with `user.id` and `user.accountId`",
        })?;
        let user_input = payload.get("user").cloned().unwrap_or(Value::Null);
        self.user = Some((user_input, user));
        self.user_jwt = Some(user_jwt);
        Ok(self)
    }

    pub fn user_jwt(mut self, user_jwt: impl Into<String>) -> Result<Self, SquatchError> {
        self.user_jwt = Some(non_blank("userJwt", user_jwt.into())?);
        Ok(self)
    }

    pub fn widget_type(mut self, widget_type: WidgetType) -> Self {
        self.widget_type = Some(widget_type);
        self
    }

    /// Defaults to `MOBILE`.
    pub fn engagement_medium(
        mut self,
        engagement_medium: impl Into<String>,
    ) -> Result<Self, SquatchError> {
        self.engagement_medium = non_blank("engagementMedium", engagement_medium.into())?;
        Ok(self)
    }

    pub fn build(self) -> Result<WidgetUpsertInput, SquatchError> {
        let (user_input, user) = self.user.ok_or(SquatchError::IncompleteBuilder {
            builder: "WidgetUpsertInput",
            reason: "must call user_input or user_input_with_user_jwt",
        })?;
        let user_jwt = self.user_jwt.ok_or(SquatchError::IncompleteBuilder {
            builder: "WidgetUpsertInput",
            reason: "must call user_jwt or user_input_with_user_jwt",
        })?;
        Ok(WidgetUpsertInput {
            user_input,
            account_id: user.account_id,
            user_id: user.user_id,
            user_jwt,
            widget_type: self.widget_type,
            engagement_medium: self.engagement_medium,
        })
    }
}

/// Identity of a free-form document whose user id lives under `id_key`.
pub(crate) fn document_user(document: &Value, id_key: &str) -> Option<UserIdInput> {
    let user_id = document.get(id_key)?.as_str()?;
    let account_id = document.get("accountId")?.as_str()?;
    Some(UserIdInput::new(account_id, user_id))
}

// ---------------------------------------------------------------------------
// Widget analytics
// ---------------------------------------------------------------------------

/// Parameters of a widget `loaded` / `shared` analytics beacon.
///
/// `share_medium` is accepted here for both kinds; the `loaded` beacon
/// rejects it when the request is built.
///
/// ```compile_fail
/// use squatch_core::{PushWidgetAnalyticsEventInput, UserIdInput};
///
/// let input = PushWidgetAnalyticsEventInput {
///     user: UserIdInput::new("", ""),
///     user_jwt: " ".to_string(),
///     program_id: None,
///     engagement_medium: String::new(),
///     share_medium: None,
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushWidgetAnalyticsEventInput {
    user: UserIdInput,
    user_jwt: String,
    program_id: Option<String>,
    engagement_medium: String,
    share_medium: Option<String>,
}

impl PushWidgetAnalyticsEventInput {
    pub fn builder() -> PushWidgetAnalyticsEventInputBuilder {
        PushWidgetAnalyticsEventInputBuilder::default()
    }

    pub fn user(&self) -> &UserIdInput {
        &self.user
    }

    pub fn user_jwt(&self) -> &str {
        &self.user_jwt
    }

    pub fn program_id(&self) -> Option<&str> {
        self.program_id.as_deref()
    }

    pub fn engagement_medium(&self) -> &str {
        &self.engagement_medium
    }

    pub fn share_medium(&self) -> Option<&str> {
        self.share_medium.as_deref()
    }
}

#[derive(Debug)]
pub struct PushWidgetAnalyticsEventInputBuilder {
    user: Option<UserIdInput>,
    user_jwt: Option<String>,
    program_id: Option<String>,
    engagement_medium: String,
    share_medium: Option<String>,
}

impl Default for PushWidgetAnalyticsEventInputBuilder {
    fn default() -> Self {
        Self {
            user: None,
            user_jwt: None,
            program_id: None,
            engagement_medium: DEFAULT_ENGAGEMENT_MEDIUM.to_string(),
            share_medium: None,
        }
    }
}

impl PushWidgetAnalyticsEventInputBuilder {
    pub fn user(mut self, user: UserIdInput) -> Self {
        self.user = Some(user);
        self
    }

    pub fn user_jwt(mut self, user_jwt: impl Into<String>) -> Result<Self, SquatchError> {
        self.user_jwt = Some(non_blank("userJwt", user_jwt.into())?);
        Ok(self)
    }

    pub fn program_id(mut self, program_id: impl Into<String>) -> Result<Self, SquatchError> {
        self.program_id = Some(non_blank("programId", program_id.into())?);
        Ok(self)
    }

    pub fn engagement_medium(
        mut self,
        engagement_medium: impl Into<String>,
    ) -> Result<Self, SquatchError> {
        self.engagement_medium = non_blank("engagementMedium", engagement_medium.into())?;
        Ok(self)
    }

    pub fn share_medium(mut self, share_medium: impl Into<String>) -> Result<Self, SquatchError> {
        self.share_medium = Some(non_blank("shareMedium", share_medium.into())?);
        Ok(self)
    }

    pub fn build(self) -> Result<PushWidgetAnalyticsEventInput, SquatchError> {
        let user = self.user.ok_or(SquatchError::IncompleteBuilder {
            builder: "PushWidgetAnalyticsEventInput",
            reason: "must call user",
        })?;
        let user_jwt = self.user_jwt.ok_or(SquatchError::IncompleteBuilder {
            builder: "PushWidgetAnalyticsEventInput",
            reason: "must call user_jwt",
        })?;
        Ok(PushWidgetAnalyticsEventInput {
            user,
            user_jwt,
            program_id: self.program_id,
            engagement_medium: self.engagement_medium,
            share_medium: self.share_medium,
        })
    }
}
