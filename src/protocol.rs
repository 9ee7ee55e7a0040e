//! Typed request/response pairs for the privileged/unprivileged boundary.
//!
//! Wire shape is `{"action": ..., "data": ...}`, matching what an in-page
//! capture script exchanges with the privileged side. Every request gets
//! exactly one response.

use serde::{Deserialize, Serialize};

use crate::session::resolver::{resolve, ResolveContext};
use crate::session::{is_valid_token, Credential, CredentialStore};

/// A request from the unprivileged side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "data", rename_all = "camelCase")]
pub enum Request {
    /// Resolve the current page's session and persist it.
    ResolveSession,
    /// Store a credential the page context already extracted.
    StoreCredential(Credential),
    /// Drop the stored credential.
    ClearSession,
}

/// The single response to a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Credential(Credential),
    Ack { success: bool },
    Error { error: String },
}

/// Service one request against the resolve context and the store.
pub fn handle_request(
    request: Request,
    ctx: &ResolveContext<'_>,
    store: &mut CredentialStore,
) -> Response {
    match request {
        Request::ResolveSession => match resolve(ctx, store) {
            Ok(credential) => Response::Credential(credential),
            Err(e) => Response::Error {
                error: e.to_string(),
            },
        },
        Request::StoreCredential(credential) => {
            // Re-check the invariant; the credential crossed a trust
            // boundary and may have been built by hand.
            if credential.api_host.is_empty() || !is_valid_token(&credential.token) {
                return Response::Error {
                    error: "invalid credential".to_string(),
                };
            }
            store.put(credential);
            Response::Ack { success: true }
        }
        Request::ClearSession => {
            store.clear();
            Response::Ack { success: true }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ResolutionMethod;

    fn credential() -> Credential {
        Credential::new(
            "00Dabc!xyz123456789012",
            "acme.my.salesforce.com",
            ResolutionMethod::MetaTag,
        )
        .expect("test credential")
    }

    #[test]
    fn test_request_wire_format() {
        let json = serde_json::to_value(Request::ResolveSession).unwrap();
        assert_eq!(json, serde_json::json!({"action": "resolveSession"}));

        let json = serde_json::to_value(Request::StoreCredential(credential())).unwrap();
        assert_eq!(json["action"], "storeCredential");
        assert_eq!(json["data"]["api_host"], "acme.my.salesforce.com");

        let parsed: Request = serde_json::from_str(r#"{"action":"clearSession"}"#).unwrap();
        assert_eq!(parsed, Request::ClearSession);
    }

    #[test]
    fn test_store_credential_round_trip() {
        let mut store = CredentialStore::new();
        let ctx = ResolveContext {
            hostname: "acme.my.salesforce.com",
            cookies: None,
            page: None,
        };

        let response = handle_request(Request::StoreCredential(credential()), &ctx, &mut store);
        assert_eq!(response, Response::Ack { success: true });
        assert_eq!(
            store.get().map(|c| c.token.as_str()),
            Some("00Dabc!xyz123456789012")
        );

        let response = handle_request(Request::ClearSession, &ctx, &mut store);
        assert_eq!(response, Response::Ack { success: true });
        assert!(store.get().is_none());
    }

    #[test]
    fn test_store_rejects_invalid_credential() {
        let mut store = CredentialStore::new();
        let ctx = ResolveContext {
            hostname: "acme.my.salesforce.com",
            cookies: None,
            page: None,
        };

        let mut bad = credential();
        bad.token = "short".to_string();
        let response = handle_request(Request::StoreCredential(bad), &ctx, &mut store);
        assert!(matches!(response, Response::Error { .. }));
        assert!(store.get().is_none());
    }

    #[test]
    fn test_resolve_without_surfaces_reports_no_session() {
        let mut store = CredentialStore::new();
        let ctx = ResolveContext {
            hostname: "acme.my.salesforce.com",
            cookies: None,
            page: None,
        };

        match handle_request(Request::ResolveSession, &ctx, &mut store) {
            Response::Error { error } => assert!(error.contains("no Salesforce session")),
            other => panic!("expected Error, got {:?}", other),
        }
    }
}
