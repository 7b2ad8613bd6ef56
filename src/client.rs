//! The entry point seeding request contexts with defaults.
//!
//! Use [`ClientBuilder`] to configure the base URL, default headers and
//! timeout, the execution engine, and an optional auth resolver.

use crate::auth::AuthResolver;
use crate::context::RequestContext;
use crate::engine::{ExecutionEngine, ReqwestEngine};
use crate::spec::RequestSpec;
use crate::{Error, Result};
use http::{HeaderMap, HeaderName, HeaderValue};
use std::sync::Arc;
use std::time::Duration;

/// Seeds [`RequestContext`]s with shared defaults.
///
/// The client is cheap to clone and safe to share across concurrent
/// requests; it holds no mutable state.
///
/// # Examples
///
/// ```no_run
/// use apiprobe::{Client, Expectation};
/// use http::StatusCode;
/// use serde::Deserialize;
/// use std::time::Duration;
///
/// #[derive(Deserialize)]
/// struct User {
///     id: u64,
///     name: String,
/// }
///
/// # async fn example() -> Result<(), apiprobe::Error> {
/// let client = Client::builder()
///     .base_url("https://api.example.com")?
///     .default_header("accept", "application/json")?
///     .timeout(Duration::from_secs(30))?
///     .build()?;
///
/// client
///     .request("/users/{id}")
///     .with_path_param("id", 42)?
///     .with_query_param("expand", "profile")
///     .get()
///     .await?
///     .should_return(
///         Expectation::<User>::new()
///             .status(StatusCode::OK)
///             .body(|user| user.id == 42),
///     )?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    pub(crate) engine: Arc<dyn ExecutionEngine>,
    pub(crate) resolver: Option<Arc<dyn AuthResolver>>,
    pub(crate) default_headers: HeaderMap,
    pub(crate) default_timeout: Option<Duration>,
}

impl Client {
    /// Creates a new `ClientBuilder`.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Starts a request for the given endpoint.
    ///
    /// The endpoint may be absolute or relative to the configured base URL
    /// and may contain `{name}` placeholders resolved from path parameters.
    pub fn request(&self, endpoint: impl Into<String>) -> RequestContext {
        RequestContext::seeded(Arc::clone(&self.inner), RequestSpec::new(endpoint))
    }
}

/// Builder for configuring and creating a [`Client`].
pub struct ClientBuilder {
    base_url: Option<url::Url>,
    default_headers: HeaderMap,
    default_timeout: Option<Duration>,
    engine: Option<Arc<dyn ExecutionEngine>>,
    resolver: Option<Arc<dyn AuthResolver>>,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings.
    pub fn new() -> Self {
        Self {
            base_url: None,
            default_headers: HeaderMap::new(),
            default_timeout: None,
            engine: None,
            resolver: None,
        }
    }

    /// Sets the base URL relative endpoints are joined against.
    ///
    /// Applies to the default engine; a custom engine passed via
    /// [`engine`](Self::engine) handles its own base.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn base_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        let url = url::Url::parse(url.as_ref())
            .map_err(|e| Error::Configuration(format!("invalid base URL: {e}")))?;
        self.base_url = Some(url);
        Ok(self)
    }

    /// Adds a default header included in every request unless the request
    /// sets the same header itself.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::Configuration(format!("invalid header name: {e}")))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::Configuration(format!("invalid header value: {e}")))?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Sets the default per-request timeout, used when a request does not
    /// configure its own. Must be greater than zero.
    pub fn timeout(mut self, timeout: Duration) -> Result<Self> {
        if timeout.is_zero() {
            return Err(Error::Configuration(
                "timeout must be greater than zero".to_string(),
            ));
        }
        self.default_timeout = Some(timeout);
        Ok(self)
    }

    /// Sets the execution engine. Defaults to [`ReqwestEngine`].
    pub fn engine(mut self, engine: Arc<dyn ExecutionEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Sets the auth resolver consulted for requests whose directive is not
    /// suppressed or explicit.
    pub fn auth_resolver(mut self, resolver: Arc<dyn AuthResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Builds the configured `Client`.
    pub fn build(self) -> Result<Client> {
        let engine = match self.engine {
            Some(engine) => engine,
            None => Arc::new(ReqwestEngine::new(self.base_url)?),
        };

        Ok(Client {
            inner: Arc::new(ClientInner {
                engine,
                resolver: self.resolver,
                default_headers: self.default_headers,
                default_timeout: self.default_timeout,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
