use std::fmt;

use reqwest::header::HeaderValue;
use url::Url;

use crate::consts::env_var::{
    SEARCH_API_VERSION,
    SEARCH_SERVICE_KEY,
    SEARCH_SERVICE_URL,
};
use crate::consts::{
    DEFAULT_API_VERSION,
    HTTPS_PORT,
};
use crate::error::ConfigError;

/// Connection settings shared by every call issued through one [`SearchClient`].
///
/// Immutable once built.
///
/// [`SearchClient`]: crate::SearchClient
#[derive(Clone)]
pub struct ServiceConfig {
    base_url: Url,
    api_key: HeaderValue,
    api_version: String,
    origin: Url,
}

impl ServiceConfig {
    /// Validates the service url and key.
    ///
    /// Requests always go to `https://<host>:443`, whatever scheme, port or path the url has.
    pub fn new(base_url: impl AsRef<str>, api_key: impl AsRef<str>) -> Result<Self, ConfigError> {
        let base_url = base_url.as_ref().trim();
        let api_key = api_key.as_ref();
        if base_url.is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }
        if api_key.is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }

        let base_url = Url::parse(base_url)?;
        let host = base_url.host_str().ok_or(ConfigError::MissingHost)?;
        let mut origin = Url::parse(&format!("https://{host}/"))?;
        #[allow(clippy::map_err_ignore)]
        origin.set_port(Some(HTTPS_PORT)).map_err(|_| ConfigError::MissingHost)?;

        #[allow(clippy::map_err_ignore)]
        let mut api_key = HeaderValue::from_str(api_key).map_err(|_| ConfigError::InvalidApiKey)?;
        api_key.set_sensitive(true);

        Ok(Self {
            base_url,
            api_key,
            api_version: DEFAULT_API_VERSION.to_owned(),
            origin,
        })
    }

    /// Reads [`SEARCH_SERVICE_URL`], [`SEARCH_SERVICE_KEY`] and the optional
    /// [`SEARCH_API_VERSION`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = std::env::var(SEARCH_SERVICE_URL).map_err(|_err| ConfigError::MissingEnv(SEARCH_SERVICE_URL))?;
        let key = std::env::var(SEARCH_SERVICE_KEY).map_err(|_err| ConfigError::MissingEnv(SEARCH_SERVICE_KEY))?;
        let config = Self::new(url, key)?;
        Ok(match std::env::var(SEARCH_API_VERSION) {
            Ok(version) if !version.is_empty() => config.with_api_version(version),
            _ => config,
        })
    }

    /// Overrides the default `api-version`. An empty version keeps the current one.
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        let api_version = api_version.into();
        if !api_version.is_empty() {
            self.api_version = api_version;
        }
        self
    }

    /// Sends requests to `origin` instead of the service host, e.g. a local emulator.
    pub fn with_origin(mut self, origin: Url) -> Self {
        self.origin = origin;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn api_key(&self) -> &HeaderValue {
        &self.api_key
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Scheme, host and port every request is sent to.
    pub fn origin(&self) -> &Url {
        &self.origin
    }
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"<redacted>")
            .field("api_version", &self.api_version)
            .field("origin", &self.origin.as_str())
            .finish()
    }
}
