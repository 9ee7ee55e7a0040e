//! Cookie-store session resolution.
//!
//! The most reliable resolution path: anchor on the `sid` cookie of the
//! page the user is viewing, then scan a fixed list of Salesforce root
//! domains for the org-scoped session cookie whose domain names the
//! API-capable host. The anchor cookie itself is the fallback when the
//! scan comes up empty.

use tracing::{debug, warn};

use crate::browser::CookieJar;
use crate::session::credential::{Credential, ResolutionMethod};
use crate::session::hosts::{normalize_api_host, HELP_DOMAIN, ORDERED_DOMAINS};

/// Name of the Salesforce session cookie.
const SESSION_COOKIE: &str = "sid";

/// Resolve a credential from the cookie store, or `None` when no usable
/// anchor cookie exists on the current host.
///
/// Individual jar failures while scanning are logged and skipped; only a
/// missing (or unreadable) anchor cookie fails the whole resolution.
pub fn resolve_from_cookies(jar: &dyn CookieJar, hostname: &str) -> Option<Credential> {
    let anchor = match jar.get(hostname, SESSION_COOKIE) {
        Ok(Some(cookie)) => cookie,
        Ok(None) => {
            debug!(hostname, "no sid cookie on current host");
            return None;
        }
        Err(e) => {
            warn!(hostname, error = %e, "cookie lookup failed on current host");
            return None;
        }
    };

    // Org id is the token prefix before the first '!'.
    let org_id = anchor.value.split('!').next().unwrap_or_default();
    let org_prefix = format!("{}!", org_id);

    for domain in ORDERED_DOMAINS {
        let cookies = match jar.all_for_domain(domain) {
            Ok(cookies) => cookies,
            Err(e) => {
                debug!(domain, error = %e, "skipping domain, cookie enumeration failed");
                continue;
            }
        };

        let matched = cookies.iter().find(|c| {
            c.name == SESSION_COOKIE && c.value.starts_with(&org_prefix) && c.host() != HELP_DOMAIN
        });

        if let Some(cookie) = matched {
            let api_host = normalize_api_host(cookie.host());
            debug!(domain = %cookie.domain, api_host = %api_host, "session cookie located by domain scan");
            return Credential::new(&cookie.value, api_host, ResolutionMethod::DomainScan);
        }
    }

    // No domain yielded the org session; fall back to the anchor cookie
    // and the (normalized) current hostname.
    let api_host = normalize_api_host(hostname);
    debug!(api_host = %api_host, "domain scan exhausted, using anchor cookie");
    Credential::new(&anchor.value, api_host, ResolutionMethod::CookieFallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{Cookie, SnapshotCookieJar};
    use anyhow::{anyhow, Result};

    fn cookie(name: &str, value: &str, domain: &str) -> Cookie {
        Cookie {
            name: name.to_string(),
            value: value.to_string(),
            domain: domain.to_string(),
        }
    }

    #[test]
    fn test_no_anchor_cookie_is_not_found() {
        let jar = SnapshotCookieJar::new(vec![cookie("other", "x", "acme.my.salesforce.com")]);
        assert!(resolve_from_cookies(&jar, "acme.my.salesforce.com").is_none());

        let empty = SnapshotCookieJar::default();
        assert!(resolve_from_cookies(&empty, "acme.my.salesforce.com").is_none());
    }

    #[test]
    fn test_domain_scan_wins_over_fallback() {
        // Anchor on the Lightning display host; org session on force.com.
        let jar = SnapshotCookieJar::new(vec![
            cookie("sid", "00Dabc!differenttoken456789", ".force.com"),
            cookie("sid", "00Dabc!xyz123456789012", "acme.lightning.force.com"),
        ]);
        let cred = resolve_from_cookies(&jar, "acme.lightning.force.com").unwrap();
        assert_eq!(cred.method, ResolutionMethod::DomainScan);
        assert_eq!(cred.token, "00Dabc!differenttoken456789");
        assert_eq!(cred.api_host, "force.com");
    }

    #[test]
    fn test_domain_list_order_is_total() {
        // Matching cookies on two scanned domains; salesforce.com precedes
        // force.com in the ordered list, so it must win regardless of the
        // jar's insertion order.
        let jar = SnapshotCookieJar::new(vec![
            cookie("sid", "00Dabc!xyz123456789012", "acme.my.salesforce.com"),
            cookie("sid", "00Dabc!fromforce6789012345", ".force.com"),
            cookie("sid", "00Dabc!fromsfdc6789012345", ".salesforce.com"),
        ]);
        let cred = resolve_from_cookies(&jar, "acme.my.salesforce.com").unwrap();
        assert_eq!(cred.method, ResolutionMethod::DomainScan);
        assert_eq!(cred.token, "00Dabc!xyz123456789012");
        assert_eq!(cred.api_host, "acme.my.salesforce.com");
    }

    #[test]
    fn test_help_subdomain_cookie_is_excluded() {
        let jar = SnapshotCookieJar::new(vec![
            cookie("sid", "00Dabc!helptoken5678901234", ".help.salesforce.com"),
            cookie("sid", "00Dabc!xyz123456789012", "acme.my.salesforce.com"),
        ]);
        let cred = resolve_from_cookies(&jar, "acme.my.salesforce.com").unwrap();
        assert_ne!(cred.token, "00Dabc!helptoken5678901234");
        assert_eq!(cred.api_host, "acme.my.salesforce.com");
    }

    #[test]
    fn test_other_org_cookie_is_ignored() {
        // The scanned cookie belongs to a different org. The anchor lives
        // on database.com, which the domain scan does not cover, so the
        // anchor cookie is the answer, tagged as the fallback.
        let jar = SnapshotCookieJar::new(vec![
            cookie("sid", "00Dzzz!othertoken78901234", ".salesforce.com"),
            cookie("sid", "00Dabc!xyz123456789012", "acme.database.com"),
        ]);
        let cred = resolve_from_cookies(&jar, "acme.database.com").unwrap();
        assert_eq!(cred.method, ResolutionMethod::CookieFallback);
        assert_eq!(cred.token, "00Dabc!xyz123456789012");
        assert_eq!(cred.api_host, "acme.database.com");
    }

    /// Jar whose domain enumeration always fails, to show scan failures
    /// are non-fatal.
    struct FailingScanJar {
        anchor: Cookie,
    }

    impl CookieJar for FailingScanJar {
        fn get(&self, _host: &str, name: &str) -> Result<Option<Cookie>> {
            Ok((name == self.anchor.name).then(|| self.anchor.clone()))
        }

        fn all_for_domain(&self, domain: &str) -> Result<Vec<Cookie>> {
            Err(anyhow!("enumeration denied for {domain}"))
        }
    }

    #[test]
    fn test_scan_failures_fall_back_to_anchor() {
        let jar = FailingScanJar {
            anchor: cookie("sid", "00Dabc!xyz123456789012", "acme.lightning.force.com"),
        };
        let cred = resolve_from_cookies(&jar, "acme.lightning.force.com").unwrap();
        assert_eq!(cred.method, ResolutionMethod::CookieFallback);
        assert_eq!(cred.api_host, "acme.my.salesforce.com");
    }
}
