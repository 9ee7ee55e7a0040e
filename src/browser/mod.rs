//! Browser-surface abstractions.
//!
//! Session resolution consumes two browser surfaces: the privileged
//! cookie store and the unprivileged page itself. Both are modeled as
//! explicit inputs so the resolution pipeline stays independent of how
//! the data was captured:
//!
//! - [`CookieJar`]: cookie lookup by host or by domain, with a
//!   JSON-snapshot-backed implementation ([`SnapshotCookieJar`]) for
//!   cookie files exported from the browser.
//! - [`PageSnapshot`]: a captured view of the loaded page (cookie header,
//!   inline scripts, meta tags, storage, probed globals).

pub mod page;

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub use page::{GlobalValue, MetaTag, PageSnapshot};

/// A single cookie as exported from the browser's cookie store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    /// Cookie domain as stored, possibly with a leading dot.
    pub domain: String,
}

impl Cookie {
    /// Cookie domain without the leading dot.
    pub fn host(&self) -> &str {
        self.domain.trim_start_matches('.')
    }
}

/// Read access to the browser's cookie store.
///
/// Mirrors the two lookups the privileged cookie API offers: a single
/// cookie applicable to a host, and every cookie under a root domain
/// including subdomains. Lookups are fallible; callers treat individual
/// failures as non-fatal.
pub trait CookieJar {
    /// The cookie named `name` that applies to `host`, if any.
    fn get(&self, host: &str, name: &str) -> Result<Option<Cookie>>;

    /// All cookies scoped to `domain` or any of its subdomains.
    fn all_for_domain(&self, domain: &str) -> Result<Vec<Cookie>>;
}

/// Cookie jar backed by a JSON export (an array of name/value/domain
/// objects). Order is preserved; domain-scan lookups return cookies in
/// file order.
#[derive(Debug, Clone, Default)]
pub struct SnapshotCookieJar {
    cookies: Vec<Cookie>,
}

impl SnapshotCookieJar {
    pub fn new(cookies: Vec<Cookie>) -> Self {
        Self { cookies }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let cookies: Vec<Cookie> =
            serde_json::from_str(json).context("Failed to parse cookie export")?;
        Ok(Self::new(cookies))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read cookie file {}", path.display()))?;
        Self::from_json(&contents)
    }
}

/// True when a cookie scoped to `cookie_domain` applies to `host`:
/// the domains match exactly or `host` is a subdomain.
fn domain_applies(host: &str, cookie_domain: &str) -> bool {
    let domain = cookie_domain.trim_start_matches('.');
    host == domain
        || (host.len() > domain.len()
            && host.ends_with(domain)
            && host.as_bytes()[host.len() - domain.len() - 1] == b'.')
}

impl CookieJar for SnapshotCookieJar {
    fn get(&self, host: &str, name: &str) -> Result<Option<Cookie>> {
        Ok(self
            .cookies
            .iter()
            .find(|c| c.name == name && domain_applies(host, &c.domain))
            .cloned())
    }

    fn all_for_domain(&self, domain: &str) -> Result<Vec<Cookie>> {
        Ok(self
            .cookies
            .iter()
            .filter(|c| domain_applies(c.host(), domain))
            .cloned()
            .collect())
    }
}
