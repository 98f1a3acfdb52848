//! Error types for the referral platform client.
//!
//! # Design
//! A single `SquatchError` covers both halves of an operation. Builder and
//! `build_*` failures (`InvalidParameter`, `IncompleteBuilder`, `BadInput`,
//! `MalformedToken`, `InvalidUrl`) happen before anything is sent. Everything
//! else is produced after a request went out and arrives through the
//! operation's future.

use serde_json::Value;
use thiserror::Error;

use crate::http::HttpResponse;

/// Boxed cause of a failed HTTP round-trip, as reported by a `Transport`.
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while peeking at a user JWT payload.
#[derive(Error, Debug)]
pub enum JwtError {
    /// The token does not split into exactly three non-empty segments.
    #[error("Invalid JWT, not enough parts")]
    NotEnoughParts,

    /// The payload segment is not valid base64url.
    #[error("Invalid JWT, couldn't extract payload bytes: {0}")]
    PayloadBytes(#[from] base64::DecodeError),

    /// The payload bytes are not a JSON document.
    #[error("Invalid JWT, payload is not JSON: {0}")]
    PayloadJson(#[from] serde_json::Error),
}

/// Errors returned by builders, `SquatchClient` and `Dispatcher`.
#[derive(Error, Debug)]
pub enum SquatchError {
    /// A builder setter received a value it cannot accept.
    #[error("Invalid builder parameter `{param}`: {reason}")]
    InvalidParameter {
        param: &'static str,
        reason: &'static str,
    },

    /// `build()` was called before a required setter.
    #[error("Incomplete builder `{builder}`: {reason}")]
    IncompleteBuilder {
        builder: &'static str,
        reason: &'static str,
    },

    /// The user JWT could not be decoded.
    #[error(transparent)]
    MalformedToken(#[from] JwtError),

    /// The request URL could not be assembled.
    #[error("Invalid url, check tenant alias: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The request never produced a response.
    #[error("Client error: {0}")]
    Client(#[source] TransportError),

    /// The server answered with a non-2xx status.
    #[error("Server error: HTTP {}", .response.status)]
    Server { response: HttpResponse },

    /// A caller-supplied document or argument is unusable.
    #[error("Bad input: {reason}")]
    BadInput { reason: String },

    /// A 2xx response whose body does not have the expected shape.
    #[error("Bad response from server: {reason}")]
    BadResponse { reason: String },

    /// A GraphQL envelope carrying application-level errors.
    #[error("API error: {}", join_errors(.errors))]
    Api { errors: Vec<Value> },

    /// A request body could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),
}

impl SquatchError {
    pub(crate) fn bad_input(reason: impl Into<String>) -> Self {
        SquatchError::BadInput {
            reason: reason.into(),
        }
    }

    pub(crate) fn bad_response(reason: impl Into<String>) -> Self {
        SquatchError::BadResponse {
            reason: reason.into(),
        }
    }
}

fn join_errors(errors: &[Value]) -> String {
    Value::Array(errors.to_vec()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_errors_name_field_and_reason() {
        let err = SquatchError::InvalidParameter {
            param: "tenantAlias",
            reason: "cannot be blank",
        };
        assert_eq!(
            err.to_string(),
            "Invalid builder parameter `tenantAlias`: cannot be blank"
        );

        let err = SquatchError::IncompleteBuilder {
            builder: "ClientOptions",
            reason: "must call tenant_alias",
        };
        assert_eq!(
            err.to_string(),
            "Incomplete builder `ClientOptions`: must call tenant_alias"
        );
    }

    #[test]
    fn server_error_reports_status() {
        let err = SquatchError::Server {
            response: HttpResponse {
                status: 503,
                headers: Vec::new(),
                body: "down".to_string(),
            },
        };
        assert_eq!(err.to_string(), "Server error: HTTP 503");
    }

    #[test]
    fn api_error_lists_errors() {
        let err = SquatchError::Api {
            errors: vec![serde_json::json!({"message": "nope"})],
        };
        assert_eq!(err.to_string(), r#"API error: [{"message":"nope"}]"#);
    }
}
