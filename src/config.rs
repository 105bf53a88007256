//! The configuration surface: everything that varies between invocations
//! without changing the schema itself — where to fetch `$ref` targets from,
//! which formats are known, whether coercion is enabled, and where to cache
//! downloaded documents on disk.
use crate::format::FormatTable;
use std::{collections::HashMap, env, path::PathBuf, sync::Arc};
use url::Url;

/// Fetches the body of an absolute `http(s)://` URL. Injected so that tests
/// and embedders never need the real network; the default implementation
/// (behind the `resolve-http` feature) is a blocking `reqwest` client.
pub trait HttpClient: Send + Sync {
    fn fetch(&self, url: &Url) -> Result<String, anyhow::Error>;
}

#[cfg(feature = "resolve-http")]
pub(crate) struct ReqwestClient {
    inner: reqwest::blocking::Client,
}

#[cfg(feature = "resolve-http")]
impl ReqwestClient {
    pub(crate) fn new() -> Self {
        ReqwestClient {
            inner: reqwest::blocking::Client::new(),
        }
    }
}

#[cfg(feature = "resolve-http")]
impl HttpClient for ReqwestClient {
    fn fetch(&self, url: &Url) -> Result<String, anyhow::Error> {
        Ok(self.inner.get(url.clone()).send()?.error_for_status()?.text()?)
    }
}

/// A registry of schema documents bundled into the binary and addressed
/// through the `data://Module/Name` scheme, so a schema can `$ref` a document
/// that ships with the validator rather than one fetched over the network.
#[derive(Clone, Default)]
pub struct EmbeddedResources {
    entries: HashMap<(String, String), String>,
}

impl EmbeddedResources {
    #[must_use]
    pub fn new() -> Self {
        EmbeddedResources::default()
    }

    /// Register `content` (a JSON or, with the `yaml` feature, YAML document)
    /// under `data://module/name`.
    pub fn register(&mut self, module: impl Into<String>, name: impl Into<String>, content: impl Into<String>) {
        self.entries.insert((module.into(), name.into()), content.into());
    }

    #[must_use]
    pub(crate) fn get(&self, module: &str, name: &str) -> Option<&str> {
        self.entries.get(&(module.to_string(), name.to_string())).map(String::as_str)
    }
}

/// Everything the loader and validator need beyond the schema document
/// itself. Construct with [`Configuration::new`] and adjust with the builder
/// methods, or read the process environment with [`Configuration::from_env`].
pub struct Configuration {
    pub(crate) coerce: bool,
    pub(crate) warn_on_missing_format: bool,
    pub(crate) formats: FormatTable,
    pub(crate) cache_dir: Option<PathBuf>,
    pub(crate) http_client: Option<Arc<dyn HttpClient>>,
    pub(crate) embedded: EmbeddedResources,
    pub(crate) debug: bool,
}

impl Configuration {
    #[must_use]
    pub fn new() -> Self {
        Configuration {
            coerce: false,
            warn_on_missing_format: true,
            formats: FormatTable::with_builtins(),
            cache_dir: None,
            #[cfg(feature = "resolve-http")]
            http_client: Some(Arc::new(ReqwestClient::new())),
            #[cfg(not(feature = "resolve-http"))]
            http_client: None,
            embedded: EmbeddedResources::new(),
            debug: false,
        }
    }

    /// Build a configuration from the process environment:
    /// `CACHE_DIR` sets the on-disk document cache directory,
    /// `COERCE_VALUES=1` enables `validate_mut` coercions by default,
    /// `DEBUG=1` enables verbose tracing in the CLI,
    /// `WARN_ON_MISSING_FORMAT=0` silences the missing-format warning.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::new();
        if let Ok(dir) = env::var("CACHE_DIR") {
            config.cache_dir = Some(PathBuf::from(dir));
        }
        if let Ok(value) = env::var("COERCE_VALUES") {
            config.coerce = is_truthy(&value);
        }
        if let Ok(value) = env::var("DEBUG") {
            config.debug = is_truthy(&value);
        }
        if let Ok(value) = env::var("WARN_ON_MISSING_FORMAT") {
            config.warn_on_missing_format = is_truthy(&value);
        }
        config
    }

    #[must_use]
    pub fn with_coerce(mut self, coerce: bool) -> Self {
        self.coerce = coerce;
        self
    }

    #[must_use]
    pub fn with_warn_on_missing_format(mut self, warn: bool) -> Self {
        self.warn_on_missing_format = warn;
        self
    }

    #[must_use]
    pub fn with_formats(mut self, formats: FormatTable) -> Self {
        self.formats = formats;
        self
    }

    #[must_use]
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    #[must_use]
    pub fn with_embedded_resources(mut self, embedded: EmbeddedResources) -> Self {
        self.embedded = embedded;
        self
    }

    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value, "1" | "true" | "TRUE" | "yes" | "on")
}
