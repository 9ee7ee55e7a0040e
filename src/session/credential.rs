//! The resolved session credential and its format invariants.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimum length of a usable session token.
/// Salesforce session IDs are well past this; the floor filters out the
/// short marketing/analytics cookies that share a page with the session.
pub const MIN_TOKEN_LENGTH: usize = 15;

/// Number of token characters safe to include in log output.
const TOKEN_LOG_PREFIX_LEN: usize = 8;

/// Which strategy produced a credential. Diagnostics only - resolution
/// behavior never branches on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    /// Session cookie located by scanning the ordered root-domain list.
    DomainScan,
    /// Anchor cookie on the current host, used when the scan found nothing.
    CookieFallback,
    /// Classic `sforce.connection` session accessor.
    SforceConnection,
    /// Lightning `$Api` session accessor.
    ApiGlobal,
    /// Lightning `$A` runtime context access token.
    LightningContext,
    /// Vendor `__SALESFORCE_INSTANCE__` global.
    InstanceGlobal,
    /// Session-like cookie read from the page's own cookie header.
    PageCookie,
    /// Inline script matched by the pattern cascade.
    ScriptPattern,
    /// Meta tag with a session/token name and a valid value.
    MetaTag,
    /// Local or session storage entry.
    PageStorage,
}

impl ResolutionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DomainScan => "domain_scan",
            Self::CookieFallback => "cookie_fallback",
            Self::SforceConnection => "sforce_connection",
            Self::ApiGlobal => "api_global",
            Self::LightningContext => "lightning_context",
            Self::InstanceGlobal => "instance_global",
            Self::PageCookie => "page_cookie",
            Self::ScriptPattern => "script_pattern",
            Self::MetaTag => "meta_tag",
            Self::PageStorage => "page_storage",
        }
    }
}

impl fmt::Display for ResolutionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved Salesforce session.
///
/// Only constructible through [`Credential::new`], which enforces the
/// invariant that both the token and the API host are present and the
/// token passes the format check. A partially-resolved state is not a
/// credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub token: String,
    pub api_host: String,
    pub resolved_at: DateTime<Utc>,
    pub method: ResolutionMethod,
}

impl Credential {
    /// Build a credential, returning `None` when either field is empty or
    /// the token fails the format check.
    pub fn new(
        token: impl Into<String>,
        api_host: impl Into<String>,
        method: ResolutionMethod,
    ) -> Option<Self> {
        let token = token.into();
        let api_host = api_host.into();
        if api_host.is_empty() || !is_valid_token(&token) {
            return None;
        }
        Some(Self {
            token,
            api_host,
            resolved_at: Utc::now(),
            method,
        })
    }

    /// The org id prefix of the token (the part before the first `!`),
    /// when the token carries one.
    pub fn org_id(&self) -> Option<&str> {
        let (org_id, _) = self.token.split_once('!')?;
        Some(org_id)
    }

    /// Base URL for authenticated API requests.
    pub fn instance_url(&self) -> String {
        format!("https://{}", self.api_host)
    }

    /// Truncated token prefix for log output. Never log the full token.
    pub fn token_preview(&self) -> String {
        let prefix: String = self.token.chars().take(TOKEN_LOG_PREFIX_LEN).collect();
        format!("{}...", prefix)
    }
}

/// Validate the session token format: at least [`MIN_TOKEN_LENGTH`]
/// characters, alphanumeric plus `! . _ -`.
pub fn is_valid_token(token: &str) -> bool {
    token.len() >= MIN_TOKEN_LENGTH
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '!' | '.' | '_' | '-'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_token_format() {
        assert!(is_valid_token("00D1x0000008cL0!AQEAQabcdefghijk"));
        assert!(is_valid_token("abcdefghijklmno"));
        assert!(is_valid_token("a.b_c-d!e123456789"));
    }

    #[test]
    fn test_invalid_token_format() {
        // Too short
        assert!(!is_valid_token("00Dabc!short"));
        assert!(!is_valid_token(""));
        // Disallowed characters
        assert!(!is_valid_token("00Dabc!has space12345"));
        assert!(!is_valid_token("00Dabc!has\"quote12345"));
        assert!(!is_valid_token("00Dabc!has;semi123456"));
    }

    #[test]
    fn test_new_rejects_invalid_state() {
        assert!(Credential::new("short", "acme.my.salesforce.com", ResolutionMethod::DomainScan)
            .is_none());
        assert!(Credential::new(
            "00Dabc!xyz123456789012",
            "",
            ResolutionMethod::DomainScan
        )
        .is_none());
    }

    #[test]
    fn test_org_id_and_instance_url() {
        let cred = Credential::new(
            "00Dabc!xyz123456789012",
            "acme.my.salesforce.com",
            ResolutionMethod::DomainScan,
        )
        .unwrap();
        assert_eq!(cred.org_id(), Some("00Dabc"));
        assert_eq!(cred.instance_url(), "https://acme.my.salesforce.com");
    }

    #[test]
    fn test_token_preview_truncates() {
        let cred = Credential::new(
            "00Dabc!xyz123456789012",
            "acme.my.salesforce.com",
            ResolutionMethod::CookieFallback,
        )
        .unwrap();
        assert_eq!(cred.token_preview(), "00Dabc!x...");
    }
}
