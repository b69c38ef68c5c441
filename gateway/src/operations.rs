//! The three operations exposed by the gateway.
//!
//! Each one validates its inputs before touching the backend, acquires a handle
//! for the duration of the call and hands the result to the classifier.

use crate::backend::{AuthToken, BackendError, BackendFactory};
use crate::document::{IndexSettings, StoredDocument};
use crate::metrics_defs::{OPERATION_DURATION, OPERATION_REQUESTS};
use crate::outcome::{
    Operation, OperationOutcome, classify_create_index, classify_get_document,
    classify_insert_document, invalid_input,
};
use crate::validation::{DocumentId, IndexName};
use shared::{counter, histogram};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Clone)]
pub struct Operations {
    factory: Arc<dyn BackendFactory>,
    settings: Arc<IndexSettings>,
    insert_timeout: Duration,
}

impl Operations {
    pub fn new(factory: Arc<dyn BackendFactory>, insert_timeout: Duration) -> Self {
        Operations {
            factory,
            settings: Arc::new(IndexSettings::default()),
            insert_timeout,
        }
    }

    pub async fn create_index(&self, index: &str, auth: &AuthToken) -> OperationOutcome {
        let start = Instant::now();
        let outcome = self.try_create_index(index, auth).await;
        record(&outcome, start);
        outcome
    }

    /// Writes the generated document under `id`, replacing any previous version.
    pub async fn insert_document(
        &self,
        index: &str,
        id: &str,
        auth: &AuthToken,
    ) -> OperationOutcome {
        let start = Instant::now();
        let outcome = self.try_insert_document(index, id, auth).await;
        record(&outcome, start);
        outcome
    }

    pub async fn get_document(&self, index: &str, id: &str, auth: &AuthToken) -> OperationOutcome {
        let start = Instant::now();
        let outcome = self.try_get_document(index, id, auth).await;
        record(&outcome, start);
        outcome
    }

    async fn try_create_index(&self, index: &str, auth: &AuthToken) -> OperationOutcome {
        let index = match IndexName::try_from(index) {
            Ok(index) => index,
            Err(e) => {
                tracing::debug!(index, error = %e, "Rejected index name");
                return invalid_input(Operation::CreateIndex);
            }
        };

        // The handle is dropped at the end of the arm, on success and failure alike.
        let result = match self.factory.acquire(auth) {
            Ok(backend) => backend.create_index(&index, &self.settings).await,
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            log_failure(Operation::CreateIndex, index.as_str(), None, e);
        }
        classify_create_index(&index, result)
    }

    async fn try_insert_document(
        &self,
        index: &str,
        id: &str,
        auth: &AuthToken,
    ) -> OperationOutcome {
        let Some((index, id)) = validate_document_target(index, id) else {
            return invalid_input(Operation::InsertDocument);
        };

        let document = StoredDocument::new(&id);
        let result = match self.factory.acquire(auth) {
            Ok(backend) => {
                backend
                    .index_document(&index, &id, &document, self.insert_timeout)
                    .await
            }
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            log_failure(Operation::InsertDocument, index.as_str(), Some(&id), e);
        }
        classify_insert_document(result)
    }

    async fn try_get_document(&self, index: &str, id: &str, auth: &AuthToken) -> OperationOutcome {
        let Some((index, id)) = validate_document_target(index, id) else {
            return invalid_input(Operation::GetDocument);
        };

        let result = match self.factory.acquire(auth) {
            Ok(backend) => backend.search_by_id(&index, &id).await,
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            log_failure(Operation::GetDocument, index.as_str(), Some(&id), e);
        }
        classify_get_document(&id, result)
    }
}

fn validate_document_target(index: &str, id: &str) -> Option<(IndexName, DocumentId)> {
    let target = IndexName::try_from(index)
        .and_then(|index| Ok((index, DocumentId::try_from(id)?)));

    match target {
        Ok(target) => Some(target),
        Err(e) => {
            tracing::debug!(index, id, error = %e, "Rejected document target");
            None
        }
    }
}

fn log_failure(operation: Operation, index: &str, id: Option<&DocumentId>, error: &BackendError) {
    let id = id.map(DocumentId::as_str);

    match error {
        BackendError::Rejected { status, body } => tracing::warn!(
            operation = operation.as_str(),
            index,
            id,
            status = status.as_u16(),
            body = %body,
            "Backend rejected request"
        ),
        e => tracing::error!(
            operation = operation.as_str(),
            index,
            id,
            error = ?e,
            "Backend request failed"
        ),
    }
}

fn record(outcome: &OperationOutcome, start: Instant) {
    let operation = outcome.operation.as_str();
    let elapsed = start.elapsed();

    counter!(OPERATION_REQUESTS, "operation" => operation, "outcome" => outcome.kind.as_str())
        .increment(1);
    histogram!(OPERATION_DURATION, "operation" => operation).record(elapsed.as_secs_f64());

    tracing::info!(
        operation,
        outcome = outcome.kind.as_str(),
        status = outcome.status().as_u16(),
        elapsed_ms = elapsed_millis(elapsed),
        "Handled operation"
    );
}

fn elapsed_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
