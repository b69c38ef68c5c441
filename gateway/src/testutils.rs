use crate::backend::{
    AuthToken, BackendError, BackendFactory, CreateIndexResponse, IndexResponse, SearchBackend,
    SearchResponse,
};
use crate::document::{IndexSettings, StoredDocument};
use crate::validation::{DocumentId, IndexName};
use async_trait::async_trait;
use http::{HeaderValue, StatusCode};
use serde_json::json;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A real `reqwest` error, produced without touching the network.
pub fn transport_error() -> BackendError {
    let error = reqwest::Client::new()
        .get("http://")
        .build()
        .expect_err("a url without a host is rejected");
    BackendError::Transport(error)
}

pub fn auth_token() -> AuthToken {
    AuthToken::new(HeaderValue::from_static("Bearer test-token"))
}

#[derive(Default)]
struct StubState {
    acquired: AtomicUsize,
    released: AtomicUsize,
    indices: Mutex<HashSet<String>>,
    documents: Mutex<HashSet<(String, String)>>,
}

/// In-memory stand-in for the search backend that counts handle acquisitions and
/// releases.
pub struct StubBackendFactory {
    state: Arc<StubState>,
    acknowledge: (bool, bool),
    fail_transport: bool,
}

impl StubBackendFactory {
    pub fn new() -> Self {
        StubBackendFactory {
            state: Arc::default(),
            acknowledge: (true, true),
            fail_transport: false,
        }
    }

    /// Flags returned for every create-index call.
    pub fn with_acknowledgement(mut self, acknowledged: bool, shards_acknowledged: bool) -> Self {
        self.acknowledge = (acknowledged, shards_acknowledged);
        self
    }

    /// Every backend call fails with a transport error.
    pub fn failing() -> Self {
        StubBackendFactory {
            fail_transport: true,
            ..Self::new()
        }
    }

    pub fn acquired(&self) -> usize {
        self.state.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.state.released.load(Ordering::SeqCst)
    }
}

impl BackendFactory for StubBackendFactory {
    fn acquire(&self, _auth: &AuthToken) -> Result<Box<dyn SearchBackend>, BackendError> {
        self.state.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StubBackend {
            state: self.state.clone(),
            acknowledge: self.acknowledge,
            fail_transport: self.fail_transport,
        }))
    }
}

struct StubBackend {
    state: Arc<StubState>,
    acknowledge: (bool, bool),
    fail_transport: bool,
}

impl Drop for StubBackend {
    fn drop(&mut self) {
        self.state.released.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl SearchBackend for StubBackend {
    async fn create_index(
        &self,
        index: &IndexName,
        _settings: &IndexSettings,
    ) -> Result<CreateIndexResponse, BackendError> {
        if self.fail_transport {
            return Err(transport_error());
        }

        if !self.state.indices.lock().unwrap().insert(index.to_string()) {
            return Err(BackendError::Rejected {
                status: StatusCode::BAD_REQUEST,
                body: json!({
                    "error": {"type": "resource_already_exists_exception"},
                    "status": 400
                }),
            });
        }

        Ok(CreateIndexResponse {
            acknowledged: self.acknowledge.0,
            shards_acknowledged: self.acknowledge.1,
        })
    }

    async fn index_document(
        &self,
        index: &IndexName,
        id: &DocumentId,
        document: &StoredDocument,
        _timeout: Duration,
    ) -> Result<IndexResponse, BackendError> {
        if self.fail_transport {
            return Err(transport_error());
        }

        self.state.indices.lock().unwrap().insert(index.to_string());
        let is_new = self
            .state
            .documents
            .lock()
            .unwrap()
            .insert((index.to_string(), id.to_string()));
        let result = if is_new { "created" } else { "updated" };

        IndexResponse::try_from(json!({
            "_index": index.as_str(),
            "_id": id.as_str(),
            "result": result,
            "_source": document,
        }))
    }

    async fn search_by_id(
        &self,
        index: &IndexName,
        id: &DocumentId,
    ) -> Result<SearchResponse, BackendError> {
        if self.fail_transport {
            return Err(transport_error());
        }

        if !self.state.indices.lock().unwrap().contains(index.as_str()) {
            return Err(BackendError::Rejected {
                status: StatusCode::NOT_FOUND,
                body: json!({"error": {"type": "index_not_found_exception"}, "status": 404}),
            });
        }

        let found = self
            .state
            .documents
            .lock()
            .unwrap()
            .contains(&(index.to_string(), id.to_string()));
        let hits = if found {
            vec![json!({"_index": index.as_str(), "_id": id.as_str()})]
        } else {
            vec![]
        };

        SearchResponse::try_from(json!({
            "hits": {"total": {"value": hits.len(), "relation": "eq"}, "hits": hits}
        }))
    }
}
