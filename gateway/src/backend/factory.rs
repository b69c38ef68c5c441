use super::elasticsearch::ElasticsearchClient;
use super::{AuthToken, BackendError, SearchBackend};
use crate::config::{BackendConfig, ClientStrategy};
use crate::metrics_defs::BACKEND_CLIENTS_ACQUIRED;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use shared::counter;
use std::sync::Arc;
use url::Url;

/// Hands out a backend handle for one operation.
///
/// The handle is released when dropped, so callers keep it scoped to the operation.
pub trait BackendFactory: Send + Sync {
    fn acquire(&self, auth: &AuthToken) -> Result<Box<dyn SearchBackend>, BackendError>;
}

pub fn from_config(config: &BackendConfig) -> Result<Arc<dyn BackendFactory>, BackendError> {
    let media_type = compatibility_media_type(config.compatible_with)?;

    let factory: Arc<dyn BackendFactory> = match config.strategy {
        ClientStrategy::PerRequest => {
            Arc::new(PerRequestFactory::new(config.url.clone(), media_type))
        }
        ClientStrategy::Pooled => Arc::new(PooledFactory::new(config.url.clone(), media_type)?),
    };

    Ok(factory)
}

/// Versioned JSON media type that lets a newer backend speak an older major's API.
pub fn compatibility_media_type(major_version: u8) -> Result<HeaderValue, BackendError> {
    Ok(HeaderValue::try_from(format!(
        "application/vnd.elasticsearch+json;compatible-with={major_version}"
    ))?)
}

fn relay_headers(auth: &AuthToken, media_type: &HeaderValue) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(3);
    headers.insert(AUTHORIZATION, auth.header_value().clone());
    headers.insert(ACCEPT, media_type.clone());
    headers.insert(CONTENT_TYPE, media_type.clone());
    headers
}

/// Builds a fresh client for every operation. Its connections close when the
/// handle is dropped; nothing survives between requests.
pub struct PerRequestFactory {
    base_url: Url,
    media_type: HeaderValue,
}

impl PerRequestFactory {
    pub fn new(base_url: Url, media_type: HeaderValue) -> Self {
        PerRequestFactory {
            base_url,
            media_type,
        }
    }
}

impl BackendFactory for PerRequestFactory {
    fn acquire(&self, auth: &AuthToken) -> Result<Box<dyn SearchBackend>, BackendError> {
        let client = reqwest::Client::builder()
            .default_headers(relay_headers(auth, &self.media_type))
            .build()
            .map_err(BackendError::ClientBuild)?;

        counter!(BACKEND_CLIENTS_ACQUIRED, "strategy" => "per_request").increment(1);

        Ok(Box::new(ElasticsearchClient::new(
            client,
            self.base_url.clone(),
            HeaderMap::new(),
        )))
    }
}

/// Shares one connection pool across operations and attaches the caller's
/// headers to each request instead of to the client.
pub struct PooledFactory {
    client: reqwest::Client,
    base_url: Url,
    media_type: HeaderValue,
}

impl PooledFactory {
    pub fn new(base_url: Url, media_type: HeaderValue) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(BackendError::ClientBuild)?;

        Ok(PooledFactory {
            client,
            base_url,
            media_type,
        })
    }
}

impl BackendFactory for PooledFactory {
    fn acquire(&self, auth: &AuthToken) -> Result<Box<dyn SearchBackend>, BackendError> {
        counter!(BACKEND_CLIENTS_ACQUIRED, "strategy" => "pooled").increment(1);

        Ok(Box::new(ElasticsearchClient::new(
            self.client.clone(),
            self.base_url.clone(),
            relay_headers(auth, &self.media_type),
        )))
    }
}
