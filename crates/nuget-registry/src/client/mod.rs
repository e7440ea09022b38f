//! HTTP client implementation with connection pooling and retry logic

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, ClientBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use nuget_core::error::NugetError;

use crate::api::ServiceIndex;
use crate::cache::SourceCacheContext;
use crate::resource::{
    HttpFindPackageByIdResource, HttpMetadataResource, HttpSearchResource, SourceRepository,
};
use crate::RegistryResult;

/// Service index of the public nuget.org feed
pub const NUGET_ORG_V3: &str = "https://api.nuget.org/v3/index.json";

/// Registration resource types, most capable first
pub(crate) const REGISTRATION_TYPES: &[&str] = &[
    "RegistrationsBaseUrl/3.6.0",
    "RegistrationsBaseUrl/3.4.0",
    "RegistrationsBaseUrl",
];

/// Flat container resource types
pub(crate) const PACKAGE_BASE_ADDRESS_TYPES: &[&str] = &["PackageBaseAddress/3.0.0"];

/// Search resource types, most capable first
pub(crate) const SEARCH_TYPES: &[&str] = &[
    "SearchQueryService/3.5.0",
    "SearchQueryService/3.0.0-rc",
    "SearchQueryService",
];

/// Configuration for exponential backoff retry logic
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial delay before first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

/// Authentication configuration for private feeds
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    /// Bearer token for authentication
    pub token: Option<String>,
    /// Basic auth username
    pub username: Option<String>,
    /// Basic auth password
    pub password: Option<String>,
}

/// Settings applied when building the HTTP client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub retry: RetryConfig,
    pub auth: Option<AuthConfig>,
    /// Per-request timeout
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            auth: None,
            timeout: Duration::from_secs(30),
            user_agent: format!("nuget-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// HTTP connection to one NuGet V3 source.
///
/// Cloning is cheap: clones share the connection pool and the memoised
/// service index.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    /// Underlying HTTP client with connection pooling
    client: Client,
    /// Retry configuration
    retry_config: RetryConfig,
    /// Service index URL
    source: Url,
    /// Service index, fetched on first use
    service_index: Arc<OnceCell<ServiceIndex>>,
}

impl RegistryClient {
    /// Client for the public nuget.org feed
    pub fn new() -> RegistryResult<Self> {
        Self::with_source(NUGET_ORG_V3)
    }

    /// Client for another V3 service index
    pub fn with_source(source: &str) -> RegistryResult<Self> {
        Self::with_options(source, ClientOptions::default())
    }

    /// Client for a feed that requires authentication
    pub fn with_auth(source: &str, auth: AuthConfig) -> RegistryResult<Self> {
        Self::with_options(
            source,
            ClientOptions {
                auth: Some(auth),
                ..ClientOptions::default()
            },
        )
    }

    /// Create registry client with custom configuration
    pub fn with_options(source: &str, options: ClientOptions) -> RegistryResult<Self> {
        let source = Url::parse(source).map_err(|e| NugetError::Config {
            message: format!("Invalid source URL '{}': {}", source, e),
        })?;

        let mut builder = ClientBuilder::new()
            // Connection pooling configuration
            .pool_max_idle_per_host(16)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(options.timeout)
            .gzip(true)
            .user_agent(options.user_agent.as_str());

        // Configure authentication if provided
        if let Some(auth_config) = options.auth {
            if let Some(token) = auth_config.token {
                builder = builder.default_headers(auth_headers(format!("Bearer {}", token))?);
            } else if let (Some(username), Some(password)) =
                (auth_config.username, auth_config.password)
            {
                use base64::{engine::general_purpose, Engine as _};
                let encoded = general_purpose::STANDARD.encode(format!("{}:{}", username, password));
                builder = builder.default_headers(auth_headers(format!("Basic {}", encoded))?);
            }
        }

        let client = builder.build().map_err(|e| {
            NugetError::network(format!("Failed to create HTTP client: {}", e), e)
        })?;

        Ok(Self {
            client,
            retry_config: options.retry,
            source,
            service_index: Arc::new(OnceCell::new()),
        })
    }

    /// Service index URL this client is bound to
    pub fn source(&self) -> &Url {
        &self.source
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry_config
    }

    /// Execute HTTP request with exponential backoff retry logic
    async fn with_retry<F, Fut, T>(&self, operation: F) -> RegistryResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = RegistryResult<T>>,
    {
        let mut delay = self.retry_config.initial_delay;
        let mut last_error = None;

        for attempt in 0..=self.retry_config.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(error) => {
                    // Only transport failures are worth another attempt
                    let retryable = matches!(error, NugetError::Network { .. });
                    last_error = Some(error);

                    if !retryable || attempt == self.retry_config.max_retries {
                        break;
                    }

                    warn!(attempt = attempt + 1, "Registry request failed, retrying in {:?}", delay);
                    tokio::time::sleep(delay).await;

                    delay = std::cmp::min(
                        Duration::from_millis(
                            (delay.as_millis() as f64 * self.retry_config.multiplier) as u64,
                        ),
                        self.retry_config.max_delay,
                    );
                },
            }
        }

        Err(last_error.unwrap_or_else(|| NugetError::Network {
            message: "Retry operation failed without error".to_string(),
            source: None,
        }))
    }

    /// One GET attempt; `None` on 404
    async fn send(
        &self,
        url: &Url,
        cache: Option<&SourceCacheContext>,
    ) -> RegistryResult<Option<Response>> {
        debug!("GET {}", url);
        let mut request = self.client.get(url.clone());
        if let Some(cache) = cache {
            request = cache.apply(request);
        }

        let response = request
            .send()
            .await
            .map_err(|e| NugetError::network(format!("Failed to fetch {}: {}", url, e), e))?;

        match response.status() {
            status if status.is_success() => Ok(Some(response)),
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS => {
                Err(NugetError::Network {
                    message: format!("Registry returned status {}: {}", status, url),
                    source: None,
                })
            },
            status => Err(NugetError::protocol(format!(
                "Registry returned status {}: {}",
                status, url
            ))),
        }
    }

    /// GET with retries; `None` on 404
    pub(crate) async fn get(
        &self,
        url: &Url,
        cache: Option<&SourceCacheContext>,
        cancel: &CancellationToken,
    ) -> RegistryResult<Option<Response>> {
        cancellable(cancel, self.with_retry(|| self.send(url, cache))).await
    }

    /// GET and deserialize a JSON document; `None` on 404
    pub(crate) async fn get_json<T>(
        &self,
        url: &Url,
        cache: Option<&SourceCacheContext>,
        cancel: &CancellationToken,
    ) -> RegistryResult<Option<T>>
    where
        T: DeserializeOwned + Send,
    {
        let fetch = self.with_retry(|| async {
            let Some(response) = self.send(url, cache).await? else {
                return Ok(None);
            };
            let body = response.bytes().await.map_err(|e| {
                NugetError::network(format!("Failed to read response from {}: {}", url, e), e)
            })?;
            serde_json::from_slice::<T>(&body).map(Some).map_err(|e| {
                NugetError::protocol(format!("Failed to parse response from {}: {}", url, e))
            })
        });

        cancellable(cancel, fetch).await
    }

    /// Service index of the source, fetched once per client
    pub async fn service_index(&self, cancel: &CancellationToken) -> RegistryResult<&ServiceIndex> {
        self.service_index
            .get_or_try_init(|| async {
                debug!("Loading service index {}", self.source);
                let index = self
                    .get_json::<ServiceIndex>(&self.source, None, cancel)
                    .await?
                    .ok_or_else(|| {
                        NugetError::protocol(format!("Service index not found: {}", self.source))
                    })?;

                if !index.version.starts_with("3.") {
                    return Err(NugetError::protocol(format!(
                        "Unsupported service index version {} at {}",
                        index.version, self.source
                    )));
                }
                Ok(index)
            })
            .await
    }

    /// Base URL of the first advertised resource among `types`
    pub(crate) async fn resource_url(
        &self,
        types: &[&str],
        cancel: &CancellationToken,
    ) -> RegistryResult<String> {
        let index = self.service_index(cancel).await?;
        index
            .find(types)
            .map(|url| url.trim_end_matches('/').to_string())
            .ok_or_else(|| {
                NugetError::protocol(format!(
                    "Source {} does not provide a {} resource",
                    self.source, types[0]
                ))
            })
    }
}

impl SourceRepository for RegistryClient {
    type Metadata = HttpMetadataResource;
    type FindById = HttpFindPackageByIdResource;
    type Search = HttpSearchResource;

    async fn metadata_resource(
        &self,
        cancel: &CancellationToken,
    ) -> RegistryResult<HttpMetadataResource> {
        let base_url = self.resource_url(REGISTRATION_TYPES, cancel).await?;
        Ok(HttpMetadataResource::new(self.clone(), base_url))
    }

    async fn find_by_id_resource(
        &self,
        cancel: &CancellationToken,
    ) -> RegistryResult<HttpFindPackageByIdResource> {
        let base_url = self.resource_url(PACKAGE_BASE_ADDRESS_TYPES, cancel).await?;
        Ok(HttpFindPackageByIdResource::new(self.clone(), base_url))
    }

    async fn search_resource(&self, cancel: &CancellationToken) -> RegistryResult<HttpSearchResource> {
        let base_url = self.resource_url(SEARCH_TYPES, cancel).await?;
        Ok(HttpSearchResource::new(self.clone(), base_url))
    }
}

fn auth_headers(value: String) -> RegistryResult<reqwest::header::HeaderMap> {
    let mut headers = reqwest::header::HeaderMap::new();
    let mut value: reqwest::header::HeaderValue = value.parse().map_err(|e| NugetError::Config {
        message: format!("Invalid auth header: {}", e),
    })?;
    value.set_sensitive(true);
    headers.insert(reqwest::header::AUTHORIZATION, value);
    Ok(headers)
}

/// Parse a URL assembled from registry data
pub(crate) fn parse_url(text: &str) -> RegistryResult<Url> {
    Url::parse(text).map_err(|e| NugetError::protocol(format!("Invalid URL '{}': {}", text, e)))
}

/// Race `operation` against the cancellation token
pub(crate) async fn cancellable<T, F>(cancel: &CancellationToken, operation: F) -> RegistryResult<T>
where
    F: Future<Output = RegistryResult<T>>,
{
    if cancel.is_cancelled() {
        return Err(NugetError::Cancelled);
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(NugetError::Cancelled),
        result = operation => result,
    }
}

#[cfg(test)]
mod tests;
