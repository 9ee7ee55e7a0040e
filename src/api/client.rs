//! Authenticated client for the Salesforce REST API.
//!
//! Issues bearer-authenticated GET requests against the instance host of
//! a resolved [`Credential`] and classifies failures into the typed
//! [`ApiError`] taxonomy. Deliberately retry-free: retry policy, if any,
//! belongs to the caller.

use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::session::Credential;

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Default REST API version, matching the extension's shipped default.
pub const DEFAULT_API_VERSION: &str = "v58.0";

/// HTTP request timeout in seconds.
/// 30s allows for slow SOQL responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Result page of a SOQL query.
///
/// Each record is a JSON object; the `attributes` metadata key Salesforce
/// injects is kept here and excluded by tabular consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(rename = "totalSize", default)]
    pub total_size: i64,
    #[serde(default)]
    pub done: bool,
    #[serde(rename = "nextRecordsUrl", default)]
    pub next_records_url: Option<String>,
    #[serde(default)]
    pub records: Vec<serde_json::Map<String, Value>>,
}

/// Entry from the sobjects catalog, trimmed to what a query consumer needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SObjectSummary {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub queryable: bool,
}

#[derive(Debug, Deserialize)]
struct SObjectsResponse {
    #[serde(default)]
    sobjects: Vec<SObjectSummary>,
}

/// API client for a Salesforce org.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    api_version: String,
    scheme: &'static str,
}

impl ApiClient {
    /// Create a new API client for the given REST API version.
    pub fn new(api_version: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            api_version: api_version.into(),
            scheme: "https",
        })
    }

    /// Client speaking plain HTTP, for tests against a local mock server.
    #[cfg(test)]
    fn insecure(api_version: &str) -> Self {
        Self {
            client: Client::new(),
            api_version: api_version.to_string(),
            scheme: "http",
        }
    }

    fn endpoint(&self, credential: &Credential, path: &str) -> String {
        format!("{}://{}{}", self.scheme, credential.api_host, path)
    }

    /// GET a relative API path and deserialize the JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        credential: &Credential,
        path: &str,
    ) -> Result<T, ApiError> {
        self.get_json_with_query(credential, path, &[]).await
    }

    async fn get_json_with_query<T: DeserializeOwned>(
        &self,
        credential: &Credential,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let url = self.endpoint(credential, path);
        debug!(url = %url, "API request");

        let response = self
            .client
            .get(&url)
            .query(query)
            .bearer_auth(&credential.token)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &body));
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    /// Execute a read-only SOQL query.
    pub async fn query(
        &self,
        credential: &Credential,
        soql: &str,
    ) -> Result<QueryResponse, ApiError> {
        let path = format!("/services/data/{}/query", self.api_version);
        self.get_json_with_query(credential, &path, &[("q", soql)])
            .await
    }

    /// Fetch the next page of a query via its `nextRecordsUrl`.
    pub async fn query_more(
        &self,
        credential: &Credential,
        next_records_url: &str,
    ) -> Result<QueryResponse, ApiError> {
        self.get_json(credential, next_records_url).await
    }

    /// List the org's queryable objects.
    pub async fn list_objects(
        &self,
        credential: &Credential,
    ) -> Result<Vec<SObjectSummary>, ApiError> {
        let path = format!("/services/data/{}/sobjects", self.api_version);
        let response: SObjectsResponse = self.get_json(credential, &path).await?;
        Ok(response.sobjects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ResolutionMethod;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TOKEN: &str = "00Dabc!xyz123456789012";

    fn credential_for(server: &MockServer) -> Credential {
        // api_host carries the mock server's host:port; the insecure
        // client talks plain HTTP to it.
        let host = server.uri().trim_start_matches("http://").to_string();
        Credential::new(TOKEN, host, ResolutionMethod::DomainScan).expect("test credential")
    }

    #[tokio::test]
    async fn test_query_sends_bearer_and_parses_records() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/services/data/v58.0/query"))
            .and(query_param("q", "SELECT Id, Name FROM Account LIMIT 2"))
            .and(header("authorization", format!("Bearer {}", TOKEN).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "totalSize": 2,
                "done": true,
                "records": [
                    {"attributes": {"type": "Account"}, "Id": "001xx1", "Name": "Acme"},
                    {"attributes": {"type": "Account"}, "Id": "001xx2", "Name": "Globex"}
                ]
            })))
            .mount(&server)
            .await;

        let client = ApiClient::insecure("v58.0");
        let cred = credential_for(&server);
        let result = client
            .query(&cred, "SELECT Id, Name FROM Account LIMIT 2")
            .await
            .unwrap();

        assert_eq!(result.total_size, 2);
        assert!(result.done);
        assert_eq!(result.records.len(), 2);
        assert_eq!(
            result.records[0].get("Name").and_then(|v| v.as_str()),
            Some("Acme")
        );
    }

    #[tokio::test]
    async fn test_401_classified_as_session_expired() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!([
                {"message": "Session expired or invalid", "errorCode": "INVALID_SESSION_ID"}
            ])))
            .mount(&server)
            .await;

        let client = ApiClient::insecure("v58.0");
        let cred = credential_for(&server);
        let err = client.query(&cred, "SELECT Id FROM Account").await.unwrap_err();

        match err {
            ApiError::SessionExpired(detail) => {
                assert!(detail.contains("Session expired or invalid"));
            }
            other => panic!("expected SessionExpired, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_403_classified_as_access_denied() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!([
                {"message": "API access disabled", "errorCode": "API_DISABLED_FOR_ORG"}
            ])))
            .mount(&server)
            .await;

        let client = ApiClient::insecure("v58.0");
        let cred = credential_for(&server);
        let err = client.list_objects(&cred).await.unwrap_err();
        assert!(matches!(err, ApiError::AccessDenied(_)));
    }

    #[tokio::test]
    async fn test_list_objects_parses_catalog() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/services/data/v58.0/sobjects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "sobjects": [
                    {"name": "Account", "label": "Account", "queryable": true},
                    {"name": "AccountHistory", "label": "Account History", "queryable": false}
                ]
            })))
            .mount(&server)
            .await;

        let client = ApiClient::insecure("v58.0");
        let cred = credential_for(&server);
        let objects = client.list_objects(&cred).await.unwrap();
        assert_eq!(objects.len(), 2);
        assert!(objects[0].queryable);
        assert_eq!(objects[1].name, "AccountHistory");
    }
}
