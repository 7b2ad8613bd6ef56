//! The captured HTTP response.
//!
//! A [`ResultContext`] is created once by the execution engine and read-only
//! thereafter. It preserves the raw body text for diagnostics and exposes
//! typed access through a per-type cache, so repeated `body_as::<T>()` calls
//! for the same `T` never re-parse.

use crate::error::{body_snippet, AssertionFailure, FailedCheck};
use crate::Result;
use http::{HeaderMap, Method, StatusCode};
use serde::de::DeserializeOwned;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// An immutable wrapper around a captured HTTP response.
///
/// Alongside the status, headers, and raw body text it carries the method and
/// endpoint of the originating request, so assertion failures can name what
/// was called without the caller threading that context through.
///
/// # Examples
///
/// ```no_run
/// use apiprobe::Client;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct User {
///     name: String,
/// }
///
/// # async fn example() -> Result<(), apiprobe::Error> {
/// let client = Client::builder()
///     .base_url("https://api.example.com")?
///     .build()?;
///
/// let result = client.request("/users/123").get().await?;
/// println!("status: {}", result.status());
/// println!("name: {}", result.body_as::<User>()?.name);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ResultContext {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
    method: Method,
    endpoint: String,
    latency: Duration,
    parsed: Mutex<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl ResultContext {
    /// Wraps a captured response. Called by execution engines.
    pub fn new(
        status: StatusCode,
        headers: HeaderMap,
        body: String,
        method: Method,
        endpoint: impl Into<String>,
        latency: Duration,
    ) -> Self {
        Self {
            status,
            headers,
            body,
            method,
            endpoint: endpoint.into(),
            latency,
            parsed: Mutex::new(HashMap::new()),
        }
    }

    /// The response status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The response headers, flattened last-value-wins.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A single header value by name, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// The raw response body text.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// The HTTP method of the originating request.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The endpoint of the originating request, as configured.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Time from dispatch until the body was fully read.
    pub fn latency(&self) -> Duration {
        self.latency
    }

    /// Deserializes the body as `T`, caching the result per type.
    ///
    /// The first call parses; subsequent calls for the same `T` return the
    /// cached value. An unparseable body is an assertion failure (the system
    /// under test returned something other than what the test asked for),
    /// distinguishable from a predicate failure.
    pub fn body_as<T>(&self) -> Result<Arc<T>>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let mut cache = self.cache();
        if let Some(hit) = cache.get(&TypeId::of::<T>()) {
            if let Ok(value) = Arc::clone(hit).downcast::<T>() {
                return Ok(value);
            }
        }

        match serde_json::from_str::<T>(&self.body) {
            Ok(value) => {
                let value = Arc::new(value);
                cache.insert(TypeId::of::<T>(), value.clone());
                Ok(value)
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    method = %self.method,
                    endpoint = %self.endpoint,
                    "failed to deserialize response body"
                );
                Err(self
                    .assertion(FailedCheck::BodyDeserialization {
                        type_name: std::any::type_name::<T>(),
                        serde_error: e.to_string(),
                    })
                    .into())
            }
        }
    }

    /// Builds an assertion failure carrying this response's diagnostics.
    pub(crate) fn assertion(&self, check: FailedCheck) -> AssertionFailure {
        AssertionFailure {
            check,
            status: self.status,
            method: self.method.clone(),
            endpoint: self.endpoint.clone(),
            headers: self.headers.clone(),
            body_snippet: body_snippet(&self.body),
        }
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<TypeId, Arc<dyn Any + Send + Sync>>> {
        // Poisoning is ignored; the map stays coherent across a panicked parse.
        match self.parsed.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct User {
        id: u64,
        name: String,
    }

    fn context(body: &str) -> ResultContext {
        ResultContext::new(
            StatusCode::OK,
            HeaderMap::new(),
            body.to_string(),
            Method::GET,
            "/users/{id}",
            Duration::from_millis(5),
        )
    }

    #[test]
    fn body_as_parses_once_and_returns_the_same_value() {
        let ctx = context(r#"{"id": 42, "name": "Alice"}"#);

        let first = ctx.body_as::<User>().unwrap();
        let second = ctx.body_as::<User>().unwrap();

        assert_eq!(*first, *second);
        // Cache hit: both calls observe the same allocation.
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn distinct_types_are_cached_independently() {
        let ctx = context(r#"{"id": 42, "name": "Alice"}"#);

        let typed = ctx.body_as::<User>().unwrap();
        let dynamic = ctx.body_as::<serde_json::Value>().unwrap();

        assert_eq!(typed.name, "Alice");
        assert_eq!(dynamic["id"], 42);
    }

    #[test]
    fn unparseable_body_is_an_assertion_failure() {
        let ctx = context("not json at all");

        let err = ctx.body_as::<User>().unwrap_err();
        assert!(err.is_assertion());
        let message = err.to_string();
        assert!(message.contains("could not be deserialized"));
        assert!(message.contains("/users/{id}"));
        assert!(message.contains("not json at all"));
        assert_eq!(err.status(), Some(StatusCode::OK));
        let Error::Assertion(failure) = err else {
            panic!("expected assertion failure");
        };
        assert!(matches!(
            failure.check,
            FailedCheck::BodyDeserialization { .. }
        ));
    }
}
