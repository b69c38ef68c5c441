//! Client side of the search backend.
//!
//! Handlers only see the [`SearchBackend`] trait. Handles are obtained per operation
//! from a [`BackendFactory`] and released when dropped.

pub mod elasticsearch;
pub mod factory;

pub use factory::{BackendFactory, PerRequestFactory, PooledFactory};

use crate::document::{IndexSettings, StoredDocument};
use crate::validation::{DocumentId, IndexName};
use async_trait::async_trait;
use http::{HeaderValue, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// Credential taken verbatim from the inbound `Authorization` header.
///
/// It is relayed to the backend as-is and never inspected. The wrapped value is
/// marked sensitive and redacted from `Debug` output.
#[derive(Clone)]
pub struct AuthToken(HeaderValue);

impl AuthToken {
    pub fn new(mut value: HeaderValue) -> Self {
        value.set_sensitive(true);
        AuthToken(value)
    }

    pub fn header_value(&self) -> &HeaderValue {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(<redacted>)")
    }
}

#[derive(thiserror::Error, Debug)]
pub enum BackendError {
    #[error("could not build backend client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    #[error("backend request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend rejected request with status {status}")]
    Rejected { status: StatusCode, body: Value },
    #[error("invalid backend response: {0}")]
    InvalidResponse(String),
    #[error("invalid backend url: {0}")]
    InvalidUrl(String),
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] http::header::InvalidHeaderValue),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateIndexResponse {
    #[serde(default)]
    pub acknowledged: bool,
    #[serde(default)]
    pub shards_acknowledged: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    Created,
    Updated,
    Other(String),
}

impl From<&str> for WriteResult {
    fn from(result: &str) -> Self {
        match result {
            "created" => WriteResult::Created,
            "updated" => WriteResult::Updated,
            other => WriteResult::Other(other.to_owned()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexResponse {
    pub result: WriteResult,
    /// Full payload returned by the backend, echoed to the caller.
    pub raw: Value,
}

impl TryFrom<Value> for IndexResponse {
    type Error = BackendError;

    fn try_from(raw: Value) -> Result<Self, Self::Error> {
        let result = raw
            .get("result")
            .and_then(Value::as_str)
            .map(WriteResult::from)
            .ok_or_else(|| BackendError::InvalidResponse("missing `result` field".into()))?;

        Ok(IndexResponse { result, raw })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResponse {
    pub total_hits: u64,
    pub raw: Value,
}

// Newer backends report `{"value": n, "relation": "eq"}`, older ones a bare number.
#[derive(Deserialize)]
#[serde(untagged)]
enum TotalHits {
    Count(u64),
    Object { value: u64 },
}

#[derive(Deserialize)]
struct Hits {
    total: TotalHits,
}

#[derive(Deserialize)]
struct SearchBody {
    hits: Hits,
}

impl TryFrom<Value> for SearchResponse {
    type Error = BackendError;

    fn try_from(raw: Value) -> Result<Self, Self::Error> {
        let body = SearchBody::deserialize(&raw)
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;

        let total_hits = match body.hits.total {
            TotalHits::Count(n) => n,
            TotalHits::Object { value } => value,
        };

        Ok(SearchResponse { total_hits, raw })
    }
}

/// Operations the gateway issues against the search backend.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn create_index(
        &self,
        index: &IndexName,
        settings: &IndexSettings,
    ) -> Result<CreateIndexResponse, BackendError>;

    /// Creates or replaces the document stored under `id`.
    async fn index_document(
        &self,
        index: &IndexName,
        id: &DocumentId,
        document: &StoredDocument,
        timeout: Duration,
    ) -> Result<IndexResponse, BackendError>;

    /// Runs an ids query restricted to `id`.
    async fn search_by_id(
        &self,
        index: &IndexName,
        id: &DocumentId,
    ) -> Result<SearchResponse, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_auth_token_is_redacted() {
        let token = AuthToken::new(HeaderValue::from_static("Bearer hunter2"));
        assert_eq!(format!("{token:?}"), "AuthToken(<redacted>)");
        assert!(token.header_value().is_sensitive());
        assert_eq!(token.header_value(), "Bearer hunter2");
    }

    #[test]
    fn test_index_response() {
        let created = IndexResponse::try_from(json!({"_id": "42", "result": "created"})).unwrap();
        assert_eq!(created.result, WriteResult::Created);
        assert_eq!(created.raw["_id"], "42");

        let noop = IndexResponse::try_from(json!({"result": "noop"})).unwrap();
        assert_eq!(noop.result, WriteResult::Other("noop".into()));

        assert!(matches!(
            IndexResponse::try_from(json!({"_id": "42"})),
            Err(BackendError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_search_response_total_formats() {
        let object = json!({"hits": {"total": {"value": 1, "relation": "eq"}, "hits": []}});
        assert_eq!(SearchResponse::try_from(object).unwrap().total_hits, 1);

        let legacy = json!({"hits": {"total": 3, "hits": []}});
        assert_eq!(SearchResponse::try_from(legacy).unwrap().total_hits, 3);

        assert!(SearchResponse::try_from(json!({"took": 1})).is_err());
    }

    #[test]
    fn test_create_index_response_defaults() {
        let response: CreateIndexResponse =
            serde_json::from_value(json!({"acknowledged": true})).unwrap();
        assert!(response.acknowledged);
        assert!(!response.shards_acknowledged);
    }
}
