//! Main client implementation.

use std::sync::Arc;
use std::time::Duration;

use fintrust_oauth::SharedTokenManager;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::StatusCode;
use url::Url;

use crate::api::{AccountsApi, AuditApi, HealthApi, LoanApi, TransactionsApi};
use crate::error::{GatewayError, Result, error_message};

pub use reqwest::Method;

/// Default timeout for requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Audit path used when no explicit audit URL is configured.
const DEFAULT_AUDIT_PATH: &str = "api/audit";

/// Authenticated request gateway.
///
/// Cheap to clone; clones share the HTTP connection pool and token manager.
#[derive(Clone)]
pub struct GatewayClient {
    inner: Arc<ClientInner>,
}

/// Inner client state (shared across clones).
struct ClientInner {
    http: reqwest::Client,
    base_url: Url,
    audit_url: Url,
    timeout: Duration,
    tokens: SharedTokenManager,
}

impl std::fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("audit_url", &self.inner.audit_url.as_str())
            .finish()
    }
}

impl GatewayClient {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Get the audit endpoint.
    pub fn audit_url(&self) -> &Url {
        &self.inner.audit_url
    }

    /// The token manager whose session this gateway attaches.
    pub fn token_manager(&self) -> &SharedTokenManager {
        &self.inner.tokens
    }

    // ─────────────────────────────────────────────────────────────────────────
    // API accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Access the accounts API.
    pub fn accounts(&self) -> AccountsApi {
        AccountsApi::new(self.clone())
    }

    /// Access the transactions API.
    pub fn transactions(&self) -> TransactionsApi {
        TransactionsApi::new(self.clone())
    }

    /// Access the loan evaluation API.
    pub fn loan(&self) -> LoanApi {
        LoanApi::new(self.clone())
    }

    /// Access the audit API.
    pub fn audit(&self) -> AuditApi {
        AuditApi::new(self.clone())
    }

    /// Access the health API.
    pub fn health(&self) -> HealthApi {
        HealthApi::new(self.clone())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Request dispatch
    // ─────────────────────────────────────────────────────────────────────────

    /// Resolve an endpoint: absolute URLs pass through, paths join the base URL.
    pub(crate) fn url(&self, endpoint: &str) -> Result<Url> {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            return Url::parse(endpoint).map_err(GatewayError::from);
        }
        let path = endpoint.trim_start_matches('/');
        self.inner.base_url.join(path).map_err(GatewayError::from)
    }

    /// Send a request and return the decoded JSON body.
    ///
    /// Attaches `Authorization: Bearer <access token>` when a session exists;
    /// otherwise the request goes out unauthenticated and the backend decides.
    /// An empty success body decodes to `Value::Null`.
    pub async fn send(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<serde_json::Value> {
        let url = self.url(endpoint)?;
        self.send_to(method, url, body).await
    }

    pub(crate) async fn send_to(
        &self,
        method: Method,
        url: Url,
        body: Option<&serde_json::Value>,
    ) -> Result<serde_json::Value> {
        let mut request = self
            .inner
            .http
            .request(method.clone(), url.clone())
            .timeout(self.inner.timeout);

        match self.inner.tokens.current_session().await {
            Some(session) => request = request.bearer_auth(&session.access_token),
            None => tracing::debug!(%url, "No session; sending unauthenticated request"),
        }

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!(%method, %url, status = status.as_u16(), "Gateway response");

        // Checked before touching the body: a 401 may carry nothing at all.
        if status == StatusCode::UNAUTHORIZED {
            return Err(GatewayError::Unauthorized);
        }

        let bytes = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<serde_json::Value>(&bytes)
                .ok()
                .as_ref()
                .and_then(error_message)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Make a GET request and decode into `T`.
    pub(crate) async fn get<T: serde::de::DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let value = self.send(Method::GET, endpoint, None).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Make a POST request and decode into `T`.
    pub(crate) async fn post<T, B>(&self, endpoint: &str, body: &B) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
        B: serde::Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)?;
        let value = self.send(Method::POST, endpoint, Some(&body)).await?;
        Ok(serde_json::from_value(value)?)
    }
}

/// Builder for creating a [`GatewayClient`].
#[derive(Debug)]
pub struct ClientBuilder {
    base_url: Option<String>,
    audit_url: Option<String>,
    tokens: Option<SharedTokenManager>,
    timeout: Duration,
    user_agent: Option<String>,
}

impl ClientBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            base_url: None,
            audit_url: None,
            tokens: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
        }
    }

    /// Set the backend base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set an absolute audit endpoint (defaults to `<base>/api/audit`).
    pub fn audit_url(mut self, url: impl Into<String>) -> Self {
        self.audit_url = Some(url.into());
        self
    }

    /// Set the token manager that supplies the bearer token.
    pub fn token_manager(mut self, tokens: SharedTokenManager) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<GatewayClient> {
        let base_url = self
            .base_url
            .ok_or_else(|| GatewayError::Config("base_url is required".to_string()))?;
        let tokens = self
            .tokens
            .ok_or_else(|| GatewayError::Config("token_manager is required".to_string()))?;

        // Parse and normalize base URL
        let mut base_url = Url::parse(&base_url)?;
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        let audit_url = match self.audit_url {
            Some(url) => Url::parse(&url)?,
            None => base_url.join(DEFAULT_AUDIT_PATH)?,
        };

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("fintrust-client/{}", env!("CARGO_PKG_VERSION")));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(user_agent)
            .build()?;

        Ok(GatewayClient {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                audit_url,
                timeout: self.timeout,
                tokens,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
