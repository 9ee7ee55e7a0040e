//! Captured page context for unprivileged session extraction.
//!
//! A [`PageSnapshot`] is the serialized view of a loaded page that the
//! in-page capture script ships across the message boundary: the location
//! hostname, the raw cookie header, inline script bodies, meta tags,
//! `<base href>` values, both storage areas, and the results of probing
//! well-known global accessors.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Result of probing one global accessor in page context.
///
/// Page globals are untrusted: an accessor may be absent, hold a value, or
/// throw when touched. A throwing accessor is recorded rather than dropped
/// so the extractor can treat it as "not present" instead of failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlobalValue {
    Value(String),
    Throws,
}

/// A `<meta>` tag's name (or property) and content attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaTag {
    pub name: String,
    pub content: String,
}

/// A captured view of the loaded page.
///
/// Every field defaults to empty so partial captures deserialize cleanly;
/// the extractor treats missing data as "strategy not applicable."
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSnapshot {
    /// `window.location.hostname`.
    pub hostname: String,
    /// Raw `document.cookie` text.
    pub cookie_header: String,
    /// Bodies of inline (non-`src`) scripts, in document order.
    pub inline_scripts: Vec<String>,
    /// `<meta>` tags carrying a name or property attribute.
    pub meta_tags: Vec<MetaTag>,
    /// `<base href>` attribute values, in document order.
    pub base_hrefs: Vec<String>,
    /// `localStorage` entries.
    pub local_storage: BTreeMap<String, String>,
    /// `sessionStorage` entries.
    pub session_storage: BTreeMap<String, String>,
    /// Probed global accessors, keyed by dotted path
    /// (e.g. `sforce.connection.sessionId`).
    pub globals: BTreeMap<String, GlobalValue>,
}

impl PageSnapshot {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse page snapshot")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read page snapshot {}", path.display()))?;
        Self::from_json(&contents)
    }
}
