use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("session expired: {0}")]
    SessionExpired(String),

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Shape of one entry in the Salesforce error-array response body.
#[derive(Debug, Deserialize)]
struct SalesforceError {
    #[serde(rename = "errorCode")]
    error_code: Option<String>,
    message: Option<String>,
}

impl ApiError {
    /// Classify a non-2xx response.
    ///
    /// 401 means the session is stale and the caller should re-resolve;
    /// 403 means the credential works but the org restricts API access,
    /// which must not trigger re-resolution. The detail string carries the
    /// body's first `{errorCode, message}` entry when present, else the
    /// HTTP status line.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let detail =
            Self::first_error_detail(body).unwrap_or_else(|| Self::status_detail(status, body));
        match status.as_u16() {
            401 => ApiError::SessionExpired(detail),
            403 => ApiError::AccessDenied(detail),
            _ => ApiError::Api(detail),
        }
    }

    /// First `errorCode: message` pair from a Salesforce error body.
    fn first_error_detail(body: &str) -> Option<String> {
        let errors: Vec<SalesforceError> = serde_json::from_str(body).ok()?;
        let first = errors.into_iter().next()?;
        match (first.error_code, first.message) {
            (Some(code), Some(message)) => Some(format!("{}: {}", code, message)),
            (None, Some(message)) => Some(message),
            (Some(code), None) => Some(code),
            (None, None) => None,
        }
    }

    fn status_detail(status: StatusCode, body: &str) -> String {
        let truncated = Self::truncate_body(body);
        if truncated.is_empty() {
            status.to_string()
        } else {
            format!("{}: {}", status, truncated)
        }
    }

    /// Truncate a response body to avoid carrying excessive data around
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            format!(
                "{}... (truncated, {} total bytes)",
                &body[..MAX_ERROR_BODY_LENGTH],
                body.len()
            )
        }
    }
}
