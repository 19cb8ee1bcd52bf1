//! # API Client
//!
//! One `reqwest::Client`, one base URL, one bearer token shared by every
//! clone of the handle.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  api.orders().create(&order)                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiClient::call(POST, "/api/orders", Auth::Required, body)            │
//! │       │                                                                 │
//! │       ├── Auth::Required and no token? → ApiError::MissingToken        │
//! │       ├── token stored? → Authorization: Bearer <token>                │
//! │       ▼                                                                 │
//! │  send → status check → body text                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  wire::decode_entity / decode_list → core type                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::endpoints::{
    AddressesApi, AuthApi, CategoriesApi, OrdersApi, PaymentsApi, ProductsApi, ReviewsApi,
};
use crate::error::{map_reqwest_error, ApiError, ApiResult};
use crate::wire;

/// Whether a call sends the bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Auth {
    /// Fail with `MissingToken` before sending if none is stored.
    Required,
    /// Send the token when there is one.
    IfAvailable,
    /// Never send it (login, refresh).
    Anonymous,
}

/// Client for the rental REST backend.
///
/// ## Usage
/// ```rust,ignore
/// let api = ApiClient::new("http://localhost:4000", ApiClient::DEFAULT_TIMEOUT)?;
/// let session = api.auth().login("kim@gearent.kr", "secret123").await?;
/// let orders = api.orders().list().await?;
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ApiResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("gearent-storefront/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self::with_http_client(base_url, http))
    }

    /// Wraps an already configured `reqwest::Client`.
    pub fn with_http_client(base_url: impl Into<String>, http: Client) -> Self {
        ApiClient {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: Arc::new(RwLock::new(None)),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Replaces the stored bearer token (`None` signs out).
    pub async fn set_token(&self, token: Option<String>) {
        *self.token.write().await = token;
    }

    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }

    // =========================================================================
    // Endpoint Groups
    // =========================================================================

    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(self)
    }

    pub fn products(&self) -> ProductsApi<'_> {
        ProductsApi::new(self)
    }

    pub fn categories(&self) -> CategoriesApi<'_> {
        CategoriesApi::new(self)
    }

    pub fn orders(&self) -> OrdersApi<'_> {
        OrdersApi::new(self)
    }

    pub fn addresses(&self) -> AddressesApi<'_> {
        AddressesApi::new(self)
    }

    pub fn reviews(&self) -> ReviewsApi<'_> {
        ReviewsApi::new(self)
    }

    pub fn payments(&self) -> PaymentsApi<'_> {
        PaymentsApi::new(self)
    }

    // =========================================================================
    // Transport
    // =========================================================================

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Sends one request and returns the success body as text.
    ///
    /// `build` adds the query, JSON or multipart body.
    pub(crate) async fn call(
        &self,
        method: Method,
        path: &str,
        auth: Auth,
        build: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> ApiResult<String> {
        let token = match auth {
            Auth::Anonymous => None,
            Auth::IfAvailable => self.token().await,
            Auth::Required => Some(self.token().await.ok_or(ApiError::MissingToken)?),
        };

        debug!(method = %method, path, authenticated = token.is_some(), "API request");

        let mut request = self.http.request(method.clone(), self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = build(request).send().await.map_err(|e| {
            warn!(method = %method, path, error = %e, "API request failed");
            map_reqwest_error(e)
        })?;

        let status = response.status();
        let body = response.text().await.map_err(map_reqwest_error)?;

        if status.is_success() {
            return Ok(body);
        }

        let message = wire::error_message(&body);
        warn!(method = %method, path, status = status.as_u16(), message = %message, "API error");

        if status == StatusCode::UNAUTHORIZED {
            Err(ApiError::Unauthorized(message))
        } else {
            Err(ApiError::Http {
                status: status.as_u16(),
                message,
            })
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
