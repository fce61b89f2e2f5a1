//! Catalog API client.
//!
//! # Architecture
//!
//! - Plain JSON over HTTP via `reqwest`; the backend is source of truth -
//!   no local sync, direct API calls
//! - In-memory caching via `moka` for product reads (5 minute TTL);
//!   auth, cart and order calls are never cached
//! - The session and checkout components consume this client through the
//!   narrow [`AuthGateway`] and [`OrderGateway`] traits, which tests
//!   implement with in-process fakes
//!
//! # Errors
//!
//! Responses are mapped onto [`ApiError`] so callers can distinguish the
//! cases that matter: an authorization rejection (forces logout), a
//! business rejection (surfaced verbatim, state preserved), and transient
//! transport failures (recoverable notice, state preserved).

pub mod types;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, instrument};

use aura_core::{OrderId, ProductId};

use crate::config::ClientConfig;
use types::{
    DevLoginRequest, DevModeStatus, NewOrder, Order, Product, ProductQuery, ProviderLoginRequest,
    SessionGrant, UserProfile,
};

const PRODUCT_CACHE_TTL: Duration = Duration::from_secs(300); // 5 minutes
const PRODUCT_CACHE_CAPACITY: u64 = 1000;

/// Errors that can occur when calling the catalog API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure: connection refused, timeout, DNS. The request may
    /// never have reached the backend; nothing authoritative was decided.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The backend rejected the bearer token (HTTP 401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found (HTTP 404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Business rejection (other 4xx). Carries the backend's `detail`
    /// message verbatim, e.g. "Insufficient stock for product 'Classic Tee'".
    #[error("{0}")]
    Rejected(String),

    /// Backend failure (5xx). Nothing authoritative was decided.
    #[error("server error: HTTP {0}")]
    Server(u16),
}

impl ApiError {
    /// Whether this error is an authoritative authorization rejection that
    /// must trigger the forced logout path.
    #[must_use]
    pub const fn is_auth_rejection(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// Whether this error is transient: the request failed without the
    /// backend authoritatively rejecting it. Transient failures must never
    /// purge session or cart state.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Server(_))
    }
}

/// FastAPI-style error body: `{"detail": ...}`.
#[derive(Debug, serde::Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// Extract the human-readable detail from an error response body.
fn error_detail(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Map a non-success response onto an [`ApiError`].
fn error_for(status: StatusCode, body: &str) -> ApiError {
    let detail =
        error_detail(body).unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

    match status.as_u16() {
        401 => ApiError::Unauthorized(detail),
        404 => ApiError::NotFound(detail),
        _ if status.is_client_error() => ApiError::Rejected(detail),
        code => ApiError::Server(code),
    }
}

// =============================================================================
// Gateway traits
// =============================================================================

/// Authentication operations the session manager needs from the backend.
#[allow(async_fn_in_trait)]
pub trait AuthGateway {
    /// Check whether the backend advertises developer-mode login.
    async fn dev_mode(&self) -> Result<bool, ApiError>;

    /// Exchange an identity provider's token for a backend session.
    async fn login_with_provider(
        &self,
        request: &ProviderLoginRequest,
    ) -> Result<SessionGrant, ApiError>;

    /// Mint a session for a synthetic profile. Only honored by the backend
    /// when developer mode is on.
    async fn login_as_developer(
        &self,
        request: &DevLoginRequest,
    ) -> Result<SessionGrant, ApiError>;

    /// Fetch the profile the given token belongs to.
    async fn current_user(&self, token: &str) -> Result<UserProfile, ApiError>;
}

/// Order operations the checkout coordinator needs from the backend.
#[allow(async_fn_in_trait)]
pub trait OrderGateway {
    /// Submit an order.
    async fn create_order(&self, token: &str, order: &NewOrder) -> Result<Order, ApiError>;
}

// =============================================================================
// ApiClient
// =============================================================================

/// Cached API response values.
#[derive(Clone)]
enum CacheValue {
    Product(Box<Product>),
    Products(Arc<Vec<Product>>),
}

/// Client for the catalog API.
///
/// Cheaply cloneable via `Arc`. Product reads are cached for 5 minutes.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    /// Base URL without a trailing slash, e.g. `http://localhost:8000`.
    base_url: String,
    cache: Cache<String, CacheValue>,
}

impl ApiClient {
    /// Create a new catalog API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(PRODUCT_CACHE_CAPACITY)
            .time_to_live(PRODUCT_CACHE_TTL)
            .build();

        let base_url = config.api_url.as_str().trim_end_matches('/').to_string();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url,
                cache,
            }),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// Send a GET request and decode the JSON response.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: Option<&ProductQuery>,
        token: Option<&str>,
    ) -> Result<T, ApiError> {
        let mut request = self.inner.http.get(self.url(path));
        if let Some(query) = query {
            request = request.query(query);
        }
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        Self::read_json(response).await
    }

    /// Send a POST request with a JSON body and decode the JSON response.
    async fn post_json<B, T>(
        &self,
        path: &str,
        body: &B,
        token: Option<&str>,
    ) -> Result<T, ApiError>
    where
        B: serde::Serialize + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        let mut request = self.inner.http.post(self.url(path)).json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        Self::read_json(response).await
    }

    /// Decode a response, mapping non-success statuses onto [`ApiError`].
    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();

        // Read the body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            return Err(error_for(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse API response"
            );
            ApiError::Parse(e)
        })
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get the product listing.
    ///
    /// The unfiltered default listing is cached; filtered queries go to the
    /// backend every time.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, query))]
    pub async fn list_products(&self, query: &ProductQuery) -> Result<Arc<Vec<Product>>, ApiError> {
        let cache_key = "products".to_string();

        if query.is_default()
            && let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await
        {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let products: Vec<Product> = self.get_json("/products", Some(query), None).await?;
        let products = Arc::new(products);

        if query.is_default() {
            self.inner
                .cache
                .insert(cache_key, CacheValue::Products(Arc::clone(&products)))
                .await;
        }

        Ok(products)
    }

    /// Get a product by its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, ApiError> {
        let cache_key = format!("product:{id}");

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let product: Product = self
            .get_json(&format!("/products/{id}"), None, None)
            .await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Invalidate all cached product data.
    pub async fn invalidate_products(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }

    // =========================================================================
    // Order Methods (not cached - authenticated, mutable state)
    // =========================================================================

    /// Get the current user's order history, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the token is rejected.
    #[instrument(skip(self, token))]
    pub async fn my_orders(&self, token: &str) -> Result<Vec<Order>, ApiError> {
        self.get_json("/orders/my", None, Some(token)).await
    }

    /// Get a specific order by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the order is not found, belongs to another user,
    /// or the API request fails.
    #[instrument(skip(self, token), fields(order_id = %id))]
    pub async fn get_order(&self, token: &str, id: OrderId) -> Result<Order, ApiError> {
        self.get_json(&format!("/orders/{id}"), None, Some(token))
            .await
    }
}

impl AuthGateway for ApiClient {
    #[instrument(skip(self))]
    async fn dev_mode(&self) -> Result<bool, ApiError> {
        let status: DevModeStatus = self.get_json("/auth/dev-mode", None, None).await?;
        Ok(status.dev_mode)
    }

    #[instrument(skip(self, request))]
    async fn login_with_provider(
        &self,
        request: &ProviderLoginRequest,
    ) -> Result<SessionGrant, ApiError> {
        self.post_json("/auth/google", request, None).await
    }

    #[instrument(skip(self, request))]
    async fn login_as_developer(
        &self,
        request: &DevLoginRequest,
    ) -> Result<SessionGrant, ApiError> {
        self.post_json("/auth/dev-login", request, None).await
    }

    #[instrument(skip(self, token))]
    async fn current_user(&self, token: &str) -> Result<UserProfile, ApiError> {
        self.get_json("/auth/me", None, Some(token)).await
    }
}

impl OrderGateway for ApiClient {
    #[instrument(skip(self, token, order))]
    async fn create_order(&self, token: &str, order: &NewOrder) -> Result<Order, ApiError> {
        self.post_json("/orders", order, Some(token)).await
    }
}
