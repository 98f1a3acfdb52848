//! Shared domain values: user identity and widget types.
//!
//! # Design
//! `WidgetType` is a closed enum rather than a trait object; its encoded form
//! (`w/<key>` or `p/<programId>/w/<key>`) is part of the public contract and
//! is used both as a GraphQL variable and as a query-string value.

use serde::{Deserialize, Serialize};

/// Default engagement medium for every input that carries one.
pub const DEFAULT_ENGAGEMENT_MEDIUM: &str = "MOBILE";

/// A user ID and an account ID, which together identify a platform user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdInput {
    pub account_id: String,
    pub user_id: String,
}

impl UserIdInput {
    pub fn new(account_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            user_id: user_id.into(),
        }
    }
}

/// The kind of widget to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetType {
    /// Not tied to any program.
    Global { global_widget_key: String },
    /// Scoped to a single program.
    Program {
        program_id: String,
        program_widget_key: String,
    },
}

impl WidgetType {
    pub fn global(global_widget_key: impl Into<String>) -> Self {
        WidgetType::Global {
            global_widget_key: global_widget_key.into(),
        }
    }

    pub fn program(program_id: impl Into<String>, program_widget_key: impl Into<String>) -> Self {
        WidgetType::Program {
            program_id: program_id.into(),
            program_widget_key: program_widget_key.into(),
        }
    }

    /// Encoded path fragment with every part percent-encoded.
    pub fn widget_type(&self) -> String {
        match self {
            WidgetType::Global { global_widget_key } => {
                format!("w/{}", urlencoding::encode(global_widget_key))
            }
            WidgetType::Program {
                program_id,
                program_widget_key,
            } => format!(
                "p/{}/w/{}",
                urlencoding::encode(program_id),
                urlencoding::encode(program_widget_key)
            ),
        }
    }

    /// The program a Program widget belongs to.
    pub fn program_id(&self) -> Option<&str> {
        match self {
            WidgetType::Global { .. } => None,
            WidgetType::Program { program_id, .. } => Some(program_id),
        }
    }
}

/// Empty or whitespace-only.
pub(crate) fn is_blank(value: &str) -> bool {
    value.chars().all(char::is_whitespace)
}
