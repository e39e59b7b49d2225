//! Getting tile images: from the cache, from the network, or made up when offline.

use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::USER_AGENT;

use crate::cache::{StorageError, TileCache};
use crate::io::{HeaderMap, HeaderValue, HttpTransport, Throttle, Transport, TransportError};
use crate::placeholder::placeholder_tile;
use crate::{InvalidArgument, TileAddress};

/// Placeholder substituted with the API token.
const TOKEN: &str = "token";

const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Provider settings are wrong, or incomplete for the request. Never worth retrying.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("'{provider}' requires an API token, but none was given")]
    MissingToken { provider: String },

    #[error("URL template references '{{{0}}}', but no such parameter was given")]
    MissingParameter(String),

    #[error("'{0}' is not a valid user agent")]
    InvalidUserAgent(String),
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    InvalidArgument(#[from] InvalidArgument),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("could not fetch tile {address} after {attempts} attempt(s): {source}")]
    FetchFailed {
        address: TileAddress,
        attempts: u32,
        #[source]
        source: TransportError,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("could not render the placeholder: {0}")]
    Placeholder(#[from] image::ImageError),
}

/// How to talk to a tile server. One configuration may back many fetches.
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub struct ProviderConfig {
    /// Identifies the provider, also used as the cache namespace.
    pub name: String,

    /// URL with `{z}`, `{x}`, `{y}`, `{token}` and other named placeholders. Substitution is
    /// textual, values are not URL-encoded.
    pub url_template: String,

    /// Minimum gap between consecutive requests, failed ones included.
    pub throttle_interval: Duration,

    /// How many times a failed request is retried before giving up.
    pub max_retries: u32,

    /// Delay after the first failure. Doubles with every next one.
    pub backoff_base: Duration,

    pub user_agent: String,

    /// Used for `{token}` unless a token is given explicitly for the fetch.
    pub api_token: Option<String>,

    /// Never touch the network, serve placeholders instead.
    pub offline: bool,

    /// Bounds each single request.
    pub timeout: Duration,
}

impl ProviderConfig {
    pub fn new(name: impl Into<String>, url_template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url_template: url_template.into(),
            throttle_interval: Duration::ZERO,
            max_retries: 3,
            backoff_base: Duration::from_millis(500),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            api_token: None,
            offline: false,
            timeout: Duration::from_secs(15),
        }
    }

    pub fn with_throttle_interval(mut self, throttle_interval: Duration) -> Self {
        self.throttle_interval = throttle_interval;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_backoff_base(mut self, backoff_base: Duration) -> Self {
        self.backoff_base = backoff_base;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_api_token(mut self, api_token: impl Into<String>) -> Self {
        self.api_token = Some(api_token.into());
        self
    }

    pub fn with_offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Take the offline flag from [`crate::config::OFFLINE_ENV`]. The variable is read once,
    /// right here.
    pub fn offline_from_env(self) -> Self {
        self.with_offline(crate::config::offline_from_env())
    }

    /// Substitute the placeholders of the URL template.
    pub fn tile_url(
        &self,
        address: TileAddress,
        options: &FetchOptions,
    ) -> Result<String, ConfigurationError> {
        let mut url = String::with_capacity(self.url_template.len());
        let mut rest = self.url_template.as_str();

        while let Some(start) = rest.find('{') {
            let Some(length) = rest[start..].find('}') else {
                // Unterminated, so it is not a placeholder.
                break;
            };

            url.push_str(&rest[..start]);
            url.push_str(&self.substitute(&rest[start + 1..start + length], address, options)?);
            rest = &rest[start + length + 1..];
        }

        url.push_str(rest);
        Ok(url)
    }

    fn substitute(
        &self,
        placeholder: &str,
        address: TileAddress,
        options: &FetchOptions,
    ) -> Result<String, ConfigurationError> {
        match placeholder {
            "z" => Ok(address.zoom.to_string()),
            "x" => Ok(address.x.to_string()),
            "y" => Ok(address.y.to_string()),
            TOKEN => options
                .token
                .as_ref()
                .or(self.api_token.as_ref())
                .cloned()
                .ok_or_else(|| ConfigurationError::MissingToken {
                    provider: self.name.clone(),
                }),
            name => options
                .params
                .get(name)
                .cloned()
                .ok_or_else(|| ConfigurationError::MissingParameter(name.to_owned())),
        }
    }

    /// User agent first, so that the caller can override it.
    fn headers(&self, options: &FetchOptions) -> Result<HeaderMap, ConfigurationError> {
        let user_agent = HeaderValue::from_str(&self.user_agent)
            .map_err(|_| ConfigurationError::InvalidUserAgent(self.user_agent.clone()))?;

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, user_agent);
        headers.extend(options.headers.clone());
        Ok(headers)
    }
}

impl Debug for ProviderConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("name", &self.name)
            .field("url_template", &self.url_template)
            .field("throttle_interval", &self.throttle_interval)
            .field("max_retries", &self.max_retries)
            .field("backoff_base", &self.backoff_base)
            .field("user_agent", &self.user_agent)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("offline", &self.offline)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Per-fetch additions to the [`ProviderConfig`].
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Wins over [`ProviderConfig::api_token`].
    pub token: Option<String>,

    /// Values for named placeholders of the URL template.
    pub params: HashMap<String, String>,

    /// Sent along with the user agent. Replace it on conflict.
    pub headers: HeaderMap,
}

impl FetchOptions {
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_header(
        mut self,
        name: reqwest::header::HeaderName,
        value: HeaderValue,
    ) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Delay before retrying after the `attempt`-th failure, counting from zero.
fn backoff(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
}

/// Produces tile images for a single provider. Share it (e.g. in an [`Arc`]) between tasks which
/// fetch from the same server, so they all obey the same pacing.
pub struct TileProvider<T = HttpTransport> {
    config: ProviderConfig,
    transport: T,
    cache: Option<Arc<dyn TileCache>>,
    throttle: Throttle,
}

impl TileProvider<HttpTransport> {
    /// Provider fetching over HTTP.
    pub fn new(config: ProviderConfig) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(config.timeout)?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> TileProvider<T> {
    pub fn with_transport(config: ProviderConfig, transport: T) -> Self {
        let throttle = Throttle::new(config.throttle_interval);
        Self {
            config,
            transport,
            cache: None,
            throttle,
        }
    }

    /// Look tiles up in the `cache` first, and store everything fetched there.
    pub fn with_cache(mut self, cache: Arc<dyn TileCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn tile_url(
        &self,
        address: TileAddress,
        options: &FetchOptions,
    ) -> Result<String, ConfigurationError> {
        self.config.tile_url(address, options)
    }

    pub async fn fetch_tile(&self, address: TileAddress) -> Result<Bytes, FetchError> {
        self.fetch_tile_with(address, &FetchOptions::default()).await
    }

    /// Get the image of the tile: cached, made up when offline, or downloaded. Failed downloads
    /// are retried with an exponential backoff, up to [`ProviderConfig::max_retries`] times.
    pub async fn fetch_tile_with(
        &self,
        address: TileAddress,
        options: &FetchOptions,
    ) -> Result<Bytes, FetchError> {
        if !address.is_valid() {
            return Err(InvalidArgument::TileAddress(address).into());
        }

        if let Some(cached) = self.cached(address)? {
            log::trace!("{address} of '{}' found in cache.", self.config.name);
            return Ok(cached);
        }

        if self.config.offline {
            log::debug!("Offline, using a placeholder for {address}.");
            let placeholder = Bytes::from(placeholder_tile(address)?);
            self.store(address, &placeholder)?;
            return Ok(placeholder);
        }

        let url = self.tile_url(address, options)?;
        let headers = self.config.headers(options)?;

        let mut attempt = 0;
        loop {
            self.throttle.wait().await;

            // Not logging the URL, as it might carry the token.
            log::debug!(
                "Getting {address} from '{}', attempt {}.",
                self.config.name,
                attempt + 1
            );

            match self.transport.get(&url, headers.clone()).await {
                Ok(bytes) => {
                    self.store(address, &bytes)?;
                    return Ok(bytes);
                }
                Err(source) if attempt < self.config.max_retries => {
                    let delay = backoff(self.config.backoff_base, attempt);
                    log::warn!(
                        "Could not download {address} from '{}': {source}. Retrying in {delay:?}.",
                        self.config.name
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(source) => {
                    return Err(FetchError::FetchFailed {
                        address,
                        attempts: attempt + 1,
                        source,
                    });
                }
            }
        }
    }

    /// Fetch all `addresses` concurrently. Results come in the same order as addresses.
    pub async fn fetch_tiles(&self, addresses: &[TileAddress]) -> Vec<Result<Bytes, FetchError>> {
        futures::future::join_all(addresses.iter().map(|address| self.fetch_tile(*address))).await
    }

    fn cached(&self, address: TileAddress) -> Result<Option<Bytes>, StorageError> {
        match &self.cache {
            Some(cache) => cache.get(&self.config.name, address),
            None => Ok(None),
        }
    }

    fn store(&self, address: TileAddress, data: &[u8]) -> Result<(), StorageError> {
        match &self.cache {
            Some(cache) => cache.put(&self.config.name, address, data),
            None => Ok(()),
        }
    }
}
