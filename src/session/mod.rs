//! Session discovery and credential resolution.
//!
//! This module locates a live Salesforce session from an uncontrolled
//! web page and turns it into a canonical [`Credential`]:
//! - `cookies`: privileged cookie-store resolution (domain scan + fallback)
//! - `page`: unprivileged page-context extraction (globals, cookie header,
//!   scripts, meta tags, storage)
//! - `resolver`: orchestration, precedence, and the typed failure outcomes
//! - `store`: the process-wide single-slot credential holder
//! - `hosts`: Salesforce domain recognition and API-host normalization

pub mod cookies;
pub mod credential;
pub mod hosts;
pub mod page;
pub mod resolver;
pub mod store;

pub use credential::{is_valid_token, Credential, ResolutionMethod};
pub use resolver::{resolve, ResolveContext, ResolveError};
pub use store::CredentialStore;
