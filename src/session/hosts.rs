//! Salesforce host recognition and API-host normalization.
//!
//! A Salesforce org serves its UI and its REST API from hosts that may
//! differ (custom domains, Lightning hosts, security proxies). This module
//! holds the recognized root-domain suffixes, the ordered domain list used
//! when scanning the cookie store for the org session, and the rewrite
//! rules that turn a display host into the API host.

/// Root domains scanned, in priority order, when locating the org session
/// cookie. `force.com` is last because it is the most generic.
pub const ORDERED_DOMAINS: &[&str] = &[
    "salesforce.com",
    "cloudforce.com",
    "salesforce.mil",
    "cloudforce.mil",
    "sfcrmproducts.cn",
    "force.com",
];

/// Root-domain suffixes that identify a Salesforce page.
const SALESFORCE_SUFFIXES: &[&str] = &[
    "salesforce.com",
    "force.com",
    "cloudforce.com",
    "database.com",
    "salesforce.mil",
    "cloudforce.mil",
    "sfcrmproducts.cn",
];

/// Help-portal domain whose `sid` cookies carry a differently-scoped
/// session that cannot be used against the REST API.
pub const HELP_DOMAIN: &str = "help.salesforce.com";

/// Suffix appended by the Microsoft Defender for Cloud Apps proxy.
const MCAS_SUFFIX: &str = ".mcas.ms";

/// True if `host` equals `suffix` or is a subdomain of it.
fn has_suffix(host: &str, suffix: &str) -> bool {
    host == suffix
        || (host.len() > suffix.len()
            && host.ends_with(suffix)
            && host.as_bytes()[host.len() - suffix.len() - 1] == b'.')
}

/// Check whether a hostname belongs to a recognized Salesforce root domain.
///
/// A trailing `.mcas.ms` proxy suffix is stripped before matching so that
/// proxied deployments are still recognized.
pub fn is_salesforce_host(hostname: &str) -> bool {
    let host = hostname.trim_start_matches('.');
    let host = host.strip_suffix(MCAS_SUFFIX).unwrap_or(host);
    SALESFORCE_SUFFIXES
        .iter()
        .any(|suffix| has_suffix(host, suffix))
}

/// Normalize a cookie or display host into the API host.
///
/// Rewrites the first `.lightning.force.` segment to `.my.salesforce.` and
/// strips a trailing `.mcas.ms` proxy suffix. Idempotent: applying the
/// rules to an already-normalized host is a no-op.
pub fn normalize_api_host(host: &str) -> String {
    let host = host.trim_start_matches('.');
    let host = host.strip_suffix(MCAS_SUFFIX).unwrap_or(host);
    host.replacen(".lightning.force.", ".my.salesforce.", 1)
}
