//! Connection configuration for `SquatchClient`.

use std::env::{self, VarError};

use crate::error::SquatchError;
use crate::types::is_blank;

/// App domain used when `ClientOptionsBuilder::app_domain` is never called.
pub const DEFAULT_APP_DOMAIN: &str = "app.referralsaasquatch.com";

const TENANT_ALIAS_VAR: &str = "SQUATCH_TENANT_ALIAS";
const APP_DOMAIN_VAR: &str = "SQUATCH_APP_DOMAIN";

/// Tenant alias and bare app domain (no scheme, no surrounding slashes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    tenant_alias: String,
    app_domain: String,
}

impl ClientOptions {
    pub fn builder() -> ClientOptionsBuilder {
        ClientOptionsBuilder::default()
    }

    /// Read `SQUATCH_TENANT_ALIAS` and the optional `SQUATCH_APP_DOMAIN`,
    /// validated exactly like the builder setters. A variable that is set
    /// but not unicode is an error, not a missing value.
    pub fn from_env() -> Result<Self, SquatchError> {
        let mut builder = Self::builder();
        if let Some(tenant_alias) = env_var(TENANT_ALIAS_VAR, "tenantAlias")? {
            builder = builder.tenant_alias(tenant_alias)?;
        }
        if let Some(app_domain) = env_var(APP_DOMAIN_VAR, "appDomain")? {
            builder = builder.app_domain(app_domain)?;
        }
        builder.build()
    }

    pub fn tenant_alias(&self) -> &str {
        &self.tenant_alias
    }

    pub fn app_domain(&self) -> &str {
        &self.app_domain
    }
}

#[derive(Debug)]
pub struct ClientOptionsBuilder {
    tenant_alias: Option<String>,
    app_domain: String,
}

impl Default for ClientOptionsBuilder {
    fn default() -> Self {
        Self {
            tenant_alias: None,
            app_domain: DEFAULT_APP_DOMAIN.to_string(),
        }
    }
}

impl ClientOptionsBuilder {
    pub fn tenant_alias(mut self, tenant_alias: impl Into<String>) -> Result<Self, SquatchError> {
        let tenant_alias = tenant_alias.into();
        if is_blank(&tenant_alias) {
            return Err(SquatchError::InvalidParameter {
                param: "tenantAlias",
                reason: "cannot be blank",
            });
        }
        self.tenant_alias = Some(tenant_alias);
        Ok(self)
    }

    /// Set the host requests are sent to, e.g. `app.referralsaasquatch.com`.
    pub fn app_domain(mut self, app_domain: impl Into<String>) -> Result<Self, SquatchError> {
        let app_domain = app_domain.into();
        if is_blank(&app_domain) {
            return Err(SquatchError::InvalidParameter {
                param: "appDomain",
                reason: "cannot be blank",
            });
        }
        if app_domain.contains("://") {
            return Err(SquatchError::InvalidParameter {
                param: "appDomain",
                reason: "should not have a protocol",
            });
        }
        if app_domain.starts_with('/') || app_domain.ends_with('/') {
            return Err(SquatchError::InvalidParameter {
                param: "appDomain",
                reason: "should not start or end with a slash",
            });
        }
        // Request paths are absolute; a path here would be overwritten.
        if app_domain.contains('/') {
            return Err(SquatchError::InvalidParameter {
                param: "appDomain",
                reason: "should not contain a path",
            });
        }
        self.app_domain = app_domain;
        Ok(self)
    }

    pub fn build(self) -> Result<ClientOptions, SquatchError> {
        let tenant_alias = self.tenant_alias.ok_or(SquatchError::IncompleteBuilder {
            builder: "ClientOptions",
            reason: "must call tenant_alias",
        })?;
        Ok(ClientOptions {
            tenant_alias,
            app_domain: self.app_domain,
        })
    }
}

fn env_var(key: &str, param: &'static str) -> Result<Option<String>, SquatchError> {
    match env::var(key) {
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(_)) => Err(SquatchError::InvalidParameter {
            param,
            reason: "must be valid unicode",
        }),
    }
}
