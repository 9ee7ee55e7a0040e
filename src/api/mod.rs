//! REST API client module for the Salesforce platform.
//!
//! This module provides the `ApiClient` for issuing read-only,
//! bearer-authenticated requests (SOQL queries, object catalog) against
//! the instance host of a resolved credential, and the `ApiError`
//! taxonomy that classifies failures for the caller.

pub mod client;
pub mod error;

pub use client::{ApiClient, QueryResponse, SObjectSummary, DEFAULT_API_VERSION};
pub use error::ApiError;
