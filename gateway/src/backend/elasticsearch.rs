use super::{BackendError, CreateIndexResponse, IndexResponse, SearchBackend, SearchResponse};
use crate::document::{IndexSettings, StoredDocument};
use crate::validation::{DocumentId, IndexName};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Method, RequestBuilder};
use serde_json::{Value, json};
use std::time::Duration;
use url::Url;

/// Elasticsearch REST client for a single operation.
///
/// The underlying `reqwest::Client` either carries the relay headers as defaults
/// (one client per operation) or is shared, in which case the headers are added
/// to every request from `request_headers`.
pub struct ElasticsearchClient {
    client: reqwest::Client,
    base_url: Url,
    request_headers: HeaderMap,
}

impl ElasticsearchClient {
    pub fn new(client: reqwest::Client, base_url: Url, request_headers: HeaderMap) -> Self {
        ElasticsearchClient {
            client,
            base_url,
            request_headers,
        }
    }

    // Each segment is pushed as one percent-encoded path segment. Empty and dot segments
    // would be dropped or collapsed by URL normalization, so they are refused instead.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        if let Some(segment) = segments.iter().find(|s| matches!(**s, "" | "." | "..")) {
            return Err(BackendError::InvalidUrl(format!(
                "{segment:?} is not a usable path segment"
            )));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(
        &self,
        method: Method,
        url: Url,
        body: &Value,
    ) -> Result<RequestBuilder, BackendError> {
        // The body is sent as raw bytes so the versioned content type stays in charge.
        let bytes = serde_json::to_vec(body)
            .map_err(|e| BackendError::InvalidResponse(format!("could not encode request: {e}")))?;

        Ok(self
            .client
            .request(method, url)
            .headers(self.request_headers.clone())
            .body(bytes))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, BackendError> {
        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let body = serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
            return Err(BackendError::Rejected { status, body });
        }

        serde_json::from_slice(&bytes).map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }
}

// Backend time units: whole seconds where possible, milliseconds otherwise.
fn time_value(duration: Duration) -> String {
    if duration.subsec_millis() == 0 {
        format!("{}s", duration.as_secs())
    } else {
        format!("{}ms", duration.as_millis())
    }
}

#[async_trait]
impl SearchBackend for ElasticsearchClient {
    async fn create_index(
        &self,
        index: &IndexName,
        settings: &IndexSettings,
    ) -> Result<CreateIndexResponse, BackendError> {
        let url = self.endpoint(&[index.as_str()])?;
        let request = self.request(Method::PUT, url, &settings.request_body())?;
        let raw = self.send(request).await?;

        serde_json::from_value(raw).map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }

    async fn index_document(
        &self,
        index: &IndexName,
        id: &DocumentId,
        document: &StoredDocument,
        timeout: Duration,
    ) -> Result<IndexResponse, BackendError> {
        let mut url = self.endpoint(&[index.as_str(), "_doc", id.as_str()])?;
        url.query_pairs_mut()
            .append_pair("timeout", &time_value(timeout));

        let body = serde_json::to_value(document)
            .map_err(|e| BackendError::InvalidResponse(format!("could not encode document: {e}")))?;
        let request = self.request(Method::PUT, url, &body)?.timeout(timeout);

        IndexResponse::try_from(self.send(request).await?)
    }

    async fn search_by_id(
        &self,
        index: &IndexName,
        id: &DocumentId,
    ) -> Result<SearchResponse, BackendError> {
        let url = self.endpoint(&[index.as_str(), "_search"])?;
        let body = json!({ "query": { "ids": { "values": [id.as_str()] } } });
        let request = self.request(Method::POST, url, &body)?;

        SearchResponse::try_from(self.send(request).await?)
    }
}
