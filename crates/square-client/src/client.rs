use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::types::{
    BatchRetrieveRequest, BatchRetrieveResponse, CatalogObject, Order, RetrieveOrderResponse,
};
use crate::{Result, SquareError};

pub const PRODUCTION_BASE_URL: &str = "https://connect.squareup.com";
pub const SANDBOX_BASE_URL: &str = "https://connect.squareupsandbox.com";
/// API version the response models were written against.
pub const DEFAULT_VERSION: &str = "2025-07-16";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// SquareConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SquareConfig {
    pub access_token: String,
    pub base_url: String,
    pub version: String,
    /// Applied to every request, connect through body.
    pub timeout: Duration,
}

impl SquareConfig {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            base_url: PRODUCTION_BASE_URL.to_string(),
            version: DEFAULT_VERSION.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn sandbox(mut self) -> Self {
        self.base_url = SANDBOX_BASE_URL.to_string();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// ---------------------------------------------------------------------------
// SquareClient
// ---------------------------------------------------------------------------

/// Read-only Square client. Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct SquareClient {
    http: reqwest::Client,
    base_url: Url,
    access_token: String,
    version: String,
}

impl SquareClient {
    pub fn new(config: SquareConfig) -> Result<Self> {
        if config.access_token.trim().is_empty() {
            return Err(SquareError::MissingToken);
        }
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| SquareError::InvalidBaseUrl(format!("{}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(SquareError::InvalidBaseUrl(config.base_url));
        }
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            base_url,
            access_token: config.access_token,
            version: config.version,
        })
    }

    /// `GET /v2/orders/{order_id}`. A 404 yields `Ok(None)`.
    pub async fn get_order(&self, order_id: &str) -> Result<Option<Order>> {
        let url = self.url(&["v2", "orders", order_id])?;
        let resp = self.request(Method::GET, url).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body: RetrieveOrderResponse = read_json(resp).await?;
        Ok(body.order)
    }

    /// `POST /v2/catalog/batch-retrieve`. Ids Square does not know are simply
    /// absent from the result.
    pub async fn batch_get_catalog_objects(
        &self,
        object_ids: &[&str],
    ) -> Result<Vec<CatalogObject>> {
        let url = self.url(&["v2", "catalog", "batch-retrieve"])?;
        let request = BatchRetrieveRequest {
            object_ids: object_ids.iter().map(|id| id.to_string()).collect(),
            include_related_objects: false,
        };
        let resp = self
            .request(Method::POST, url)
            .json(&request)
            .send()
            .await?;
        let body: BatchRetrieveResponse = read_json(resp).await?;
        for err in &body.errors {
            tracing::debug!(
                code = %err.code,
                detail = ?err.detail,
                "batch-retrieve reported an error"
            );
        }
        Ok(body.objects)
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SquareError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .bearer_auth(&self.access_token)
            .header("Square-Version", &self.version)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
    }
}

async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(SquareError::Status {
            status: status.as_u16(),
            body,
        });
    }
    let bytes = resp.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
