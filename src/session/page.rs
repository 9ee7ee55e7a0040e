//! Page-context session extraction.
//!
//! Used when privileged cookie access is unavailable or comes up empty.
//! Works entirely from a captured [`PageSnapshot`] and tries a fixed
//! strategy order, first success wins: global accessor probes, the page's
//! own cookie header, inline script patterns, meta tags, then storage.
//! Both the token and the instance host must resolve; partial results are
//! discarded.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;
use url::Url;

use crate::browser::{GlobalValue, PageSnapshot};
use crate::session::credential::{is_valid_token, Credential, ResolutionMethod, MIN_TOKEN_LENGTH};
use crate::session::hosts::is_salesforce_host;

/// Global accessor paths probed for a session token, in priority order.
/// Classic first, then the Lightning accessors, then the vendor global.
const GLOBAL_PROBES: &[(&str, ResolutionMethod)] = &[
    ("sforce.connection.sessionId", ResolutionMethod::SforceConnection),
    ("$Api.sessionId", ResolutionMethod::ApiGlobal),
    ("$A.context.accessToken", ResolutionMethod::LightningContext),
    ("__SALESFORCE_INSTANCE__.sessionId", ResolutionMethod::InstanceGlobal),
];

/// Inline-script patterns recognizing common session key shapes, evaluated
/// in order within each script. Kept as a data list so new Salesforce
/// markup variants are an entry here, not a control-flow change.
static SCRIPT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#"(?i)["']sessionId["']\s*:\s*["']([A-Za-z0-9!._-]{15,})["']"#,
        r#"(?i)["']sid["']\s*:\s*["']([A-Za-z0-9!._-]{15,})["']"#,
        r#"(?i)sessionId\s*[=:]\s*["']([A-Za-z0-9!._-]{15,})["']"#,
        r#"(?i)session_id["']\s*:\s*["']([A-Za-z0-9!._-]{15,})["']"#,
        r#"(?i)accessToken["']\s*:\s*["']([A-Za-z0-9!._-]{15,})["']"#,
        r#""session"\s*:\s*"([A-Za-z0-9!._-]{15,})""#,
        r#"window\.USER_CONTEXT\s*=\s*\{[^}]*sessionId["']\s*:\s*["']([A-Za-z0-9!._-]{15,})["']"#,
    ]
    .iter()
    .map(|p| Regex::new(p).expect("script pattern must compile"))
    .collect()
});

/// Extract a credential from captured page context, or `None`.
pub fn extract_from_page(page: &PageSnapshot) -> Option<Credential> {
    let (raw_token, method) = probe_globals(page)
        .or_else(|| scan_cookie_header(page))
        .or_else(|| scan_inline_scripts(page))
        .or_else(|| scan_meta_tags(page))
        .or_else(|| scan_storage(page))?;

    let token = clean_token(&raw_token)?;
    let api_host = instance_host(page)?;
    debug!(method = %method, api_host = %api_host, "session extracted from page context");
    Credential::new(token, api_host, method)
}

/// Strategy 1: well-known global accessors, probed defensively. An absent
/// or throwing accessor reads as "not present."
fn probe_globals(page: &PageSnapshot) -> Option<(String, ResolutionMethod)> {
    for (path, method) in GLOBAL_PROBES {
        match page.globals.get(*path) {
            Some(GlobalValue::Value(value)) if !value.is_empty() => {
                return Some((value.clone(), *method));
            }
            Some(GlobalValue::Throws) => {
                debug!(accessor = path, "global accessor threw, treating as absent");
            }
            _ => {}
        }
    }
    None
}

/// Strategy 2: the page's own cookie header. Accepts `sid` exactly or any
/// name containing "session", value length >= 15 before decoding.
fn scan_cookie_header(page: &PageSnapshot) -> Option<(String, ResolutionMethod)> {
    for pair in page.cookie_header.split(';') {
        let Some((name, value)) = pair.trim().split_once('=') else {
            continue;
        };
        let name_matches = name == "sid" || name.to_lowercase().contains("session");
        if !name_matches || value.len() < MIN_TOKEN_LENGTH {
            continue;
        }
        let decoded = percent_decode(value);
        if is_valid_token(&decoded) {
            return Some((decoded, ResolutionMethod::PageCookie));
        }
    }
    None
}

/// Strategy 3: inline scripts against the pattern cascade. Scripts are
/// visited in document order; within a script, patterns in list order.
fn scan_inline_scripts(page: &PageSnapshot) -> Option<(String, ResolutionMethod)> {
    for script in &page.inline_scripts {
        for pattern in SCRIPT_PATTERNS.iter() {
            if let Some(captures) = pattern.captures(script) {
                if let Some(token) = captures.get(1) {
                    return Some((token.as_str().to_string(), ResolutionMethod::ScriptPattern));
                }
            }
        }
    }
    None
}

/// Strategy 4: meta tags whose name mentions session/token and whose
/// content already looks like a token.
fn scan_meta_tags(page: &PageSnapshot) -> Option<(String, ResolutionMethod)> {
    for meta in &page.meta_tags {
        let name = meta.name.to_lowercase();
        if (name.contains("session") || name.contains("token")) && is_valid_token(&meta.content) {
            return Some((meta.content.clone(), ResolutionMethod::MetaTag));
        }
    }
    None
}

/// Strategy 5: local storage, then session storage.
fn scan_storage(page: &PageSnapshot) -> Option<(String, ResolutionMethod)> {
    for storage in [&page.local_storage, &page.session_storage] {
        for (key, value) in storage {
            let key = key.to_lowercase();
            if (key.contains("session") || key.contains("token")) && is_valid_token(value) {
                return Some((value.clone(), ResolutionMethod::PageStorage));
            }
        }
    }
    None
}

/// Derive the instance host: the page's own hostname when it belongs to a
/// Salesforce root domain, else the first Salesforce `<base href>` host.
fn instance_host(page: &PageSnapshot) -> Option<String> {
    if is_salesforce_host(&page.hostname) {
        return Some(page.hostname.clone());
    }
    for href in &page.base_hrefs {
        if let Ok(url) = Url::parse(href) {
            if let Some(host) = url.host_str() {
                if is_salesforce_host(host) {
                    return Some(host.to_string());
                }
            }
        }
    }
    None
}

/// Strip surrounding quotes and whitespace, then re-validate. Returns
/// `None` when the cleaned token still fails the format check.
fn clean_token(raw: &str) -> Option<String> {
    let cleaned = raw.trim().trim_matches(|c| c == '"' || c == '\'').trim();
    if is_valid_token(cleaned) {
        Some(cleaned.to_string())
    } else {
        debug!("discarding token with invalid format after cleaning");
        None
    }
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Decode %XX escapes in a cookie value. Malformed escapes pass through
/// unchanged rather than failing the strategy.
fn percent_decode(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(high), Some(low)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                out.push(high * 16 + low);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
