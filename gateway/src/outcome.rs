//! Maps backend results to what the caller sees.
//!
//! Every function here is pure: the outcome depends only on the operation and the
//! backend result handed in.

use crate::backend::{BackendError, CreateIndexResponse, IndexResponse, SearchResponse, WriteResult};
use crate::validation::{DocumentId, IndexName};
use http::StatusCode;

/// Body returned for any transport failure. Details stay in the server log.
pub const TRANSPORT_ERROR_MESSAGE: &str =
    "An unexpected error occurred while contacting the search backend";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateIndex,
    InsertDocument,
    GetDocument,
}

impl Operation {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Operation::CreateIndex => "create_index",
            Operation::InsertDocument => "insert_document",
            Operation::GetDocument => "get_document",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Success,
    /// The backend processed the request but did not apply it.
    NotAcknowledged,
    NotFound,
    ValidationError,
    TransportError,
}

impl OutcomeKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Success => "success",
            OutcomeKind::NotAcknowledged => "not_acknowledged",
            OutcomeKind::NotFound => "not_found",
            OutcomeKind::ValidationError => "validation_error",
            OutcomeKind::TransportError => "transport_error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationOutcome {
    pub operation: Operation,
    pub kind: OutcomeKind,
    pub body: String,
}

impl OperationOutcome {
    fn new(operation: Operation, kind: OutcomeKind, body: impl Into<String>) -> Self {
        OperationOutcome {
            operation,
            kind,
            body: body.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.kind {
            OutcomeKind::Success => StatusCode::OK,
            OutcomeKind::NotAcknowledged => StatusCode::INTERNAL_SERVER_ERROR,
            OutcomeKind::NotFound => StatusCode::NOT_FOUND,
            OutcomeKind::ValidationError => StatusCode::BAD_REQUEST,
            // Failed reads are reported as a client error, failed writes as a server error.
            OutcomeKind::TransportError => match self.operation {
                Operation::GetDocument => StatusCode::BAD_REQUEST,
                Operation::CreateIndex | Operation::InsertDocument => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    /// A successful read echoes the backend's search result as JSON; everything else is text.
    pub fn is_json(&self) -> bool {
        self.operation == Operation::GetDocument && self.kind == OutcomeKind::Success
    }
}

pub fn invalid_input(operation: Operation) -> OperationOutcome {
    let message = match operation {
        Operation::CreateIndex => "Illegal characters in index name",
        Operation::InsertDocument | Operation::GetDocument => {
            "Illegal characters in index name or non-numeric document id"
        }
    };

    OperationOutcome::new(operation, OutcomeKind::ValidationError, message)
}

fn transport_error(operation: Operation) -> OperationOutcome {
    OperationOutcome::new(operation, OutcomeKind::TransportError, TRANSPORT_ERROR_MESSAGE)
}

pub fn classify_create_index(
    index: &IndexName,
    result: Result<CreateIndexResponse, BackendError>,
) -> OperationOutcome {
    let operation = Operation::CreateIndex;

    match result {
        Ok(response) if response.acknowledged && response.shards_acknowledged => {
            OperationOutcome::new(
                operation,
                OutcomeKind::Success,
                format!("Index {index} was created!"),
            )
        }
        Ok(_) | Err(BackendError::Rejected { .. }) => OperationOutcome::new(
            operation,
            OutcomeKind::NotAcknowledged,
            format!("There was a problem creating the index {index}"),
        ),
        Err(_) => transport_error(operation),
    }
}

pub fn classify_insert_document(result: Result<IndexResponse, BackendError>) -> OperationOutcome {
    let operation = Operation::InsertDocument;

    match result {
        Ok(IndexResponse {
            result: WriteResult::Created,
            raw,
        }) => OperationOutcome::new(
            operation,
            OutcomeKind::Success,
            format!("Document was successfully created\n{raw}"),
        ),
        Ok(IndexResponse {
            result: WriteResult::Updated,
            raw,
        }) => OperationOutcome::new(
            operation,
            OutcomeKind::Success,
            format!("Document was successfully updated\n{raw}"),
        ),
        Ok(IndexResponse { raw, .. }) | Err(BackendError::Rejected { body: raw, .. }) => {
            OperationOutcome::new(
                operation,
                OutcomeKind::NotAcknowledged,
                format!("There was a problem inserting the document\n{raw}"),
            )
        }
        Err(_) => transport_error(operation),
    }
}

pub fn classify_get_document(
    id: &DocumentId,
    result: Result<SearchResponse, BackendError>,
) -> OperationOutcome {
    let operation = Operation::GetDocument;

    match result {
        Ok(response) if response.total_hits > 0 => {
            OperationOutcome::new(operation, OutcomeKind::Success, response.raw.to_string())
        }
        Ok(_) => not_found(id),
        // The index itself does not exist.
        Err(BackendError::Rejected { status, .. }) if status == StatusCode::NOT_FOUND => {
            not_found(id)
        }
        Err(_) => transport_error(operation),
    }
}

fn not_found(id: &DocumentId) -> OperationOutcome {
    OperationOutcome::new(
        Operation::GetDocument,
        OutcomeKind::NotFound,
        format!("No document found for id {id}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::transport_error as backend_transport_error;
    use serde_json::json;

    fn index() -> IndexName {
        IndexName::try_from("books").unwrap()
    }

    fn id() -> DocumentId {
        DocumentId::try_from("42").unwrap()
    }

    fn rejected(status: StatusCode) -> BackendError {
        BackendError::Rejected {
            status,
            body: json!({"error": {"type": "some_exception"}, "status": status.as_u16()}),
        }
    }

    #[test]
    fn test_create_index() {
        let ack = |acknowledged, shards_acknowledged| {
            Ok(CreateIndexResponse {
                acknowledged,
                shards_acknowledged,
            })
        };

        let outcome = classify_create_index(&index(), ack(true, true));
        assert_eq!(outcome.kind, OutcomeKind::Success);
        assert_eq!(outcome.status(), StatusCode::OK);
        assert_eq!(outcome.body, "Index books was created!");

        for (acknowledged, shards) in [(false, true), (true, false), (false, false)] {
            let outcome = classify_create_index(&index(), ack(acknowledged, shards));
            assert_eq!(outcome.kind, OutcomeKind::NotAcknowledged);
            assert_eq!(outcome.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(outcome.body, "There was a problem creating the index books");
        }

        let outcome = classify_create_index(&index(), Err(rejected(StatusCode::BAD_REQUEST)));
        assert_eq!(outcome.kind, OutcomeKind::NotAcknowledged);

        let outcome = classify_create_index(&index(), Err(backend_transport_error()));
        assert_eq!(outcome.kind, OutcomeKind::TransportError);
        assert_eq!(outcome.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_insert_document() {
        let write = |result: &str| {
            let raw = json!({"_index": "books", "_id": "42", "result": result});
            Ok(IndexResponse {
                result: WriteResult::from(result),
                raw,
            })
        };

        let outcome = classify_insert_document(write("created"));
        assert_eq!(outcome.kind, OutcomeKind::Success);
        assert!(outcome.body.starts_with("Document was successfully created\n"));
        assert!(outcome.body.contains(r#""result":"created""#));

        let outcome = classify_insert_document(write("updated"));
        assert_eq!(outcome.kind, OutcomeKind::Success);
        assert!(outcome.body.starts_with("Document was successfully updated\n"));

        let outcome = classify_insert_document(write("noop"));
        assert_eq!(outcome.kind, OutcomeKind::NotAcknowledged);
        assert_eq!(outcome.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(outcome.body.contains(r#""result":"noop""#));

        let outcome = classify_insert_document(Err(rejected(StatusCode::CONFLICT)));
        assert_eq!(outcome.kind, OutcomeKind::NotAcknowledged);
        assert!(outcome.body.contains("some_exception"));
    }

    #[test]
    fn test_insert_document_transport_error_is_redacted() {
        let error = backend_transport_error();
        let detail = error.to_string();

        let outcome = classify_insert_document(Err(error));
        assert_eq!(outcome.kind, OutcomeKind::TransportError);
        assert_eq!(outcome.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(outcome.body, TRANSPORT_ERROR_MESSAGE);
        assert!(!outcome.body.contains(&detail));
    }

    #[test]
    fn test_get_document() {
        let search = |total_hits| {
            Ok(SearchResponse {
                total_hits,
                raw: json!({"hits": {"total": {"value": total_hits}, "hits": []}}),
            })
        };

        let outcome = classify_get_document(&id(), search(1));
        assert_eq!(outcome.kind, OutcomeKind::Success);
        assert!(outcome.is_json());
        let echoed: serde_json::Value = serde_json::from_str(&outcome.body).unwrap();
        assert_eq!(echoed["hits"]["total"]["value"], 1);

        let outcome = classify_get_document(&id(), search(0));
        assert_eq!(outcome.kind, OutcomeKind::NotFound);
        assert_eq!(outcome.status(), StatusCode::NOT_FOUND);
        assert_eq!(outcome.body, "No document found for id 42");

        let outcome = classify_get_document(&id(), Err(rejected(StatusCode::NOT_FOUND)));
        assert_eq!(outcome.kind, OutcomeKind::NotFound);

        // Backend failures on reads surface as client errors.
        let outcome = classify_get_document(&id(), Err(backend_transport_error()));
        assert_eq!(outcome.kind, OutcomeKind::TransportError);
        assert_eq!(outcome.status(), StatusCode::BAD_REQUEST);
        assert!(!outcome.is_json());

        let outcome = classify_get_document(&id(), Err(rejected(StatusCode::SERVICE_UNAVAILABLE)));
        assert_eq!(outcome.kind, OutcomeKind::TransportError);
        assert_eq!(outcome.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_invalid_input() {
        for operation in [
            Operation::CreateIndex,
            Operation::InsertDocument,
            Operation::GetDocument,
        ] {
            let outcome = invalid_input(operation);
            assert_eq!(outcome.kind, OutcomeKind::ValidationError);
            assert_eq!(outcome.status(), StatusCode::BAD_REQUEST);
        }
    }
}
