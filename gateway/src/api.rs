use crate::GatewayError;
use crate::backend::AuthToken;
use crate::config::Listener as ListenerConfig;
use crate::operations::Operations;
use crate::outcome::OperationOutcome;
use axum::{
    Router,
    extract::{FromRequestParts, Query, State},
    http::{HeaderValue, StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::net::TcpListener;

pub fn router(operations: Operations) -> Router {
    Router::new()
        .route("/createindex", post(create_index))
        .route("/insertdoc", post(insert_document))
        .route("/getdoc", get(get_document))
        .with_state(operations)
}

/// Binds the API listener, flips `ready` once bound, then serves until the
/// listener fails.
pub async fn serve(
    listener: &ListenerConfig,
    operations: Operations,
    ready: Arc<AtomicBool>,
) -> Result<(), GatewayError> {
    let addr = format!("{}:{}", listener.host, listener.port);
    let tcp_listener = TcpListener::bind(&addr).await?;

    ready.store(true, Ordering::Release);
    tracing::info!(%addr, "Serving document API");

    axum::serve(tcp_listener, router(operations)).await?;
    Ok(())
}

#[derive(Deserialize, Debug)]
struct IndexParams {
    index: String,
}

#[derive(Deserialize, Debug)]
struct DocumentParams {
    index: String,
    id: String,
}

async fn create_index(
    State(operations): State<Operations>,
    auth: AuthToken,
    Query(params): Query<IndexParams>,
) -> OperationOutcome {
    operations.create_index(&params.index, &auth).await
}

async fn insert_document(
    State(operations): State<Operations>,
    auth: AuthToken,
    Query(params): Query<DocumentParams>,
) -> OperationOutcome {
    operations
        .insert_document(&params.index, &params.id, &auth)
        .await
}

async fn get_document(
    State(operations): State<Operations>,
    auth: AuthToken,
    Query(params): Query<DocumentParams>,
) -> OperationOutcome {
    operations
        .get_document(&params.index, &params.id, &auth)
        .await
}

#[derive(Debug)]
pub struct MissingAuthorization;

impl IntoResponse for MissingAuthorization {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, "Missing Authorization header").into_response()
    }
}

impl<S> FromRequestParts<S> for AuthToken
where
    S: Send + Sync,
{
    type Rejection = MissingAuthorization;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(header::AUTHORIZATION)
            .cloned()
            .map(AuthToken::new)
            .ok_or(MissingAuthorization)
    }
}

impl IntoResponse for OperationOutcome {
    fn into_response(self) -> Response {
        let status = self.status();
        let is_json = self.is_json();
        let mut response = (status, self.body).into_response();

        if is_json {
            response.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
        }

        response
    }
}
