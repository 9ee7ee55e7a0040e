//! Session resolution orchestration.
//!
//! Composes the cookie resolver and the page-context extractor with a
//! fixed precedence: cookies first (privileged, most reliable), page
//! extraction second. Successful resolutions are written to the
//! credential store. Failures are typed outcomes - nothing panics or
//! escapes this boundary as an unclassified error.

use thiserror::Error;
use tracing::{debug, info};

use crate::browser::{CookieJar, PageSnapshot};
use crate::session::cookies::resolve_from_cookies;
use crate::session::credential::Credential;
use crate::session::hosts::is_salesforce_host;
use crate::session::page::extract_from_page;
use crate::session::store::CredentialStore;

/// Why resolution produced no credential.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The current page is not on a recognized Salesforce domain;
    /// no extraction was attempted.
    #[error("not a Salesforce page: {hostname}")]
    NotSalesforcePage { hostname: String },

    /// Every available strategy was exhausted without a valid credential.
    #[error("no Salesforce session found")]
    NoSessionFound,
}

/// What a resolution request has to work with: the current page's
/// hostname, plus whichever browser surfaces are available. Either
/// surface may be absent (cookie access blocked, no capture yet).
pub struct ResolveContext<'a> {
    pub hostname: &'a str,
    pub cookies: Option<&'a dyn CookieJar>,
    pub page: Option<&'a PageSnapshot>,
}

/// Resolve the best available credential and persist it to the store.
pub fn resolve(
    ctx: &ResolveContext<'_>,
    store: &mut CredentialStore,
) -> Result<Credential, ResolveError> {
    if !is_salesforce_host(ctx.hostname) {
        debug!(hostname = ctx.hostname, "not a Salesforce host, skipping resolution");
        return Err(ResolveError::NotSalesforcePage {
            hostname: ctx.hostname.to_string(),
        });
    }

    if let Some(jar) = ctx.cookies {
        if let Some(cred) = resolve_from_cookies(jar, ctx.hostname) {
            info!(
                method = %cred.method,
                api_host = %cred.api_host,
                token = %cred.token_preview(),
                "session resolved from cookie store"
            );
            store.put(cred.clone());
            return Ok(cred);
        }
        debug!("cookie resolution failed, trying page context");
    }

    if let Some(page) = ctx.page {
        if let Some(cred) = extract_from_page(page) {
            info!(
                method = %cred.method,
                api_host = %cred.api_host,
                token = %cred.token_preview(),
                "session resolved from page context"
            );
            store.put(cred.clone());
            return Ok(cred);
        }
    }

    Err(ResolveError::NoSessionFound)
}
