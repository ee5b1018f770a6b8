//! `AlacartaClient` - TV3 web service client implementation.

use reqwest::Client;
use tracing::instrument;
use url::Url;

use super::api::LocalAlacartaApi;
use super::cache::{CacheConfig, ResponseCache};
use super::error::{AlacartaError, Result};
use super::params::WebServiceRequest;
use super::xml::XmlDocument;

/// Web service host, also used to absolutize relative image paths.
pub const WS_BASE_URL: &str = "http://tv3.cat";

/// Body the service returns instead of XML when a listing is empty.
pub const NO_RESULTS_SENTINEL: &str = "no hi han resultats";

/// User-Agent sent unless overridden; the service expects a browser.
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:31.0) Gecko/20100101 Firefox/31.0";

/// TV3 web service client.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct AlacartaClient {
    /// HTTP client (reqwest, gzip enabled).
    http_client: Client,
    /// Base URL that method paths are joined onto.
    base_url: Url,
    /// Disk cache, present only when caching is enabled.
    cache: Option<ResponseCache>,
}

/// Builder for `AlacartaClient`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct AlacartaClientBuilder {
    base_url: Option<Url>,
    user_agent: Option<String>,
    cache: CacheConfig,
}

impl AlacartaClientBuilder {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            base_url: None,
            user_agent: None,
            cache: CacheConfig::disabled(),
        }
    }

    /// Overrides the base URL (for wiremock in tests).
    #[must_use]
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Overrides the User-Agent.
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Sets the cache configuration (default: disabled).
    #[must_use]
    pub fn cache(mut self, config: CacheConfig) -> Self {
        self.cache = config;
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns `Service` if the default base URL is invalid, the
    /// `reqwest::Client` build fails or the cache directory cannot be created.
    pub fn build(self) -> Result<AlacartaClient> {
        let base_url = match self.base_url {
            Some(url) => url,
            None => Url::parse(WS_BASE_URL)
                .map_err(|e| AlacartaError::Service(format!("invalid default base URL: {e}")))?,
        };

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| String::from(DEFAULT_USER_AGENT));

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .gzip(true)
            .build()
            .map_err(|e| AlacartaError::Service(format!("failed to build HTTP client: {e}")))?;

        let cache = if self.cache.enabled {
            Some(ResponseCache::open(self.cache.dir.as_deref())?)
        } else {
            None
        };

        Ok(AlacartaClient {
            http_client,
            base_url,
            cache,
        })
    }
}

impl AlacartaClient {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> AlacartaClientBuilder {
        AlacartaClientBuilder::new()
    }

    /// The disk cache, if caching is enabled.
    #[must_use]
    pub const fn cache(&self) -> Option<&ResponseCache> {
        self.cache.as_ref()
    }

    /// Whether cacheable calls are served from disk.
    #[must_use]
    pub const fn is_caching_enabled(&self) -> bool {
        self.cache.is_some()
    }

    /// Builds the live URL: method joined onto the base URL, parameters
    /// in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `Service` if the method path cannot be joined.
    pub fn request_url(&self, request: &WebServiceRequest) -> Result<Url> {
        let path = request.method.trim_start_matches('/');
        let mut url = self.base_url.join(path).map_err(|e| {
            AlacartaError::Service(format!("invalid method path {:?}: {e}", request.method))
        })?;
        if request.params.is_empty() {
            url.set_query(None);
        } else {
            url.set_query(Some(&request.params.to_query_string()));
        }
        Ok(url)
    }

    /// Performs the live HTTP GET and returns the raw body.
    async fn download(&self, request: &WebServiceRequest) -> Result<Vec<u8>> {
        let url = self.request_url(request)?;
        tracing::debug!(%url, "TV3 request");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| AlacartaError::Connection(format!("{} request failed: {e}", request.method)))?;

        let status = response.status();
        tracing::trace!(method = %request.method, %status, headers = ?response.headers(), "Response headers");
        if !status.is_success() {
            return Err(AlacartaError::Connection(format!(
                "{} returned HTTP {status}",
                request.method
            )));
        }

        let body = response.bytes().await.map_err(|e| {
            AlacartaError::Connection(format!("failed to read {} response: {e}", request.method))
        })?;
        tracing::debug!(method = %request.method, body_len = body.len(), "Response body received");
        Ok(body.to_vec())
    }

    /// Turns a raw body into a document, recognising the "no results" sentinel.
    pub(crate) fn parse_body(body: &[u8]) -> Result<XmlDocument> {
        let text = String::from_utf8_lossy(body);
        if text.trim().eq_ignore_ascii_case(NO_RESULTS_SENTINEL) {
            return Err(AlacartaError::NoResultsFound);
        }
        let preview: String = text.chars().take(500).collect();
        tracing::trace!(body_preview = %preview, "Response body preview");
        XmlDocument::parse_bytes(body)
    }
}

impl LocalAlacartaApi for AlacartaClient {
    #[instrument(skip_all, fields(method = %request.method))]
    async fn execute(&self, request: &WebServiceRequest, cacheable: bool) -> Result<XmlDocument> {
        let body = match self.cache.as_ref().filter(|_| cacheable) {
            Some(cache) => {
                cache
                    .get_or_fetch(&request.method, &request.params, || self.download(request))
                    .await?
            }
            None => self.download(request).await?,
        };
        Self::parse_body(&body)
    }
}
