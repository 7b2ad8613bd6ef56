//! The fluent, side-effect-free request builder.
//!
//! Every `with_*` method takes `&self` and returns a new context wrapping a
//! new [`RequestSpec`]; the receiver is never altered. A base context is
//! therefore a safe template for any number of independent, concurrent
//! requests. The verb methods are the only point at which network I/O occurs.

use crate::auth::{scheme_or_token, AuthDirective, Credentials};
use crate::client::ClientInner;
use crate::param::{project_bag, ParamValue};
use crate::spec::RequestSpec;
use crate::{Error, Result, ResultContext};
use http::{HeaderName, HeaderValue, Method};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// A request in progress.
///
/// Obtained from [`Client::request`](crate::Client::request), configured
/// through chained calls, and consumed by a verb method.
///
/// # Examples
///
/// ```no_run
/// use apiprobe::Client;
/// use http::StatusCode;
///
/// # async fn example() -> Result<(), apiprobe::Error> {
/// let client = Client::builder()
///     .base_url("https://api.example.com")?
///     .build()?;
///
/// // The base context can be reused; deriving from it never mutates it.
/// let users = client.request("/users/{id}").with_header("accept", "application/json")?;
///
/// let alice = users.with_path_param("id", 1)?.get().await?;
/// let bob = users.with_path_param("id", 2)?.get().await?;
///
/// alice.expect_status(StatusCode::OK)?;
/// bob.expect_status(StatusCode::OK)?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RequestContext {
    client: Arc<ClientInner>,
    spec: RequestSpec,
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

impl RequestContext {
    pub(crate) fn seeded(client: Arc<ClientInner>, spec: RequestSpec) -> Self {
        Self { client, spec }
    }

    fn derive(&self, spec: RequestSpec) -> Self {
        Self {
            client: Arc::clone(&self.client),
            spec,
        }
    }

    /// The spec as configured so far.
    pub fn spec(&self) -> &RequestSpec {
        &self.spec
    }

    /// Returns a new context with the header set, last write winning.
    pub fn with_header(&self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let (name, value) = valid_header(name.as_ref(), value.as_ref())?;
        Ok(self.derive(self.spec.clone().set_header(name, value)))
    }

    /// Returns a new context with all given headers merged in; the bulk
    /// values win over existing ones on conflict.
    pub fn with_headers<I, K, V>(&self, headers: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut spec = self.spec.clone();
        for (name, value) in headers {
            let (name, value) = valid_header(name.as_ref(), value.as_ref())?;
            spec = spec.set_header(name, value);
        }
        Ok(self.derive(spec))
    }

    /// Returns a new context with the query parameter set.
    pub fn with_query_param(&self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.derive(self.spec.clone().set_query_param(key.into(), value.into()))
    }

    /// Returns a new context with every field of `bag` as a query parameter.
    ///
    /// `bag` must serialize to an object; null fields are dropped, and
    /// nested shapes are rejected here rather than at dispatch.
    pub fn with_query_params<B: Serialize>(&self, bag: &B) -> Result<Self> {
        let mut spec = self.spec.clone();
        for (key, value) in project_bag(bag)? {
            spec = spec.set_query_param(key, value);
        }
        Ok(self.derive(spec))
    }

    /// Returns a new context with the path parameter set.
    ///
    /// Path parameters substitute `{key}` placeholders and must be scalar.
    pub fn with_path_param(
        &self,
        key: impl Into<String>,
        value: impl Into<ParamValue>,
    ) -> Result<Self> {
        let key = key.into();
        let value = value.into();
        if value.is_list() {
            return Err(Error::Configuration(format!(
                "path parameter \"{key}\" must be a scalar, not an array"
            )));
        }
        Ok(self.derive(self.spec.clone().set_path_param(key, value)))
    }

    /// Returns a new context with every field of `bag` as a path parameter.
    pub fn with_path_params<B: Serialize>(&self, bag: &B) -> Result<Self> {
        let mut spec = self.spec.clone();
        for (key, value) in project_bag(bag)? {
            if value.is_list() {
                return Err(Error::Configuration(format!(
                    "path parameter \"{key}\" must be a scalar, not an array"
                )));
            }
            spec = spec.set_path_param(key, value);
        }
        Ok(self.derive(spec))
    }

    /// Returns a new context with the cookie set.
    pub fn with_cookie(&self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.derive(self.spec.clone().set_cookie(name.into(), value.into()))
    }

    /// Returns a new context with all given cookies merged in.
    pub fn with_cookies<I, K, V>(&self, cookies: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut spec = self.spec.clone();
        for (name, value) in cookies {
            spec = spec.set_cookie(name.into(), value.into());
        }
        self.derive(spec)
    }

    /// Returns a new context with no cookies; no `Cookie` header is sent.
    pub fn without_cookies(&self) -> Self {
        self.derive(self.spec.clone().clear_cookies())
    }

    /// Returns a new context using the given scheme-or-token as the
    /// `Authorization` value.
    ///
    /// A value containing a space is used verbatim; a bare token is prefixed
    /// with `Bearer `. An empty value is a configuration error. The explicit
    /// value always wins over any configured resolver.
    pub fn using_auth(&self, value: impl AsRef<str>) -> Result<Self> {
        let header = scheme_or_token(value.as_ref())?;
        Ok(self.derive(self.spec.clone().set_auth(AuthDirective::Explicit(header))))
    }

    /// Returns a new context using `Bearer {token}` as the `Authorization`
    /// value. Sugar over [`using_auth`](Self::using_auth); the token must not
    /// be empty.
    pub fn using_token(&self, token: impl AsRef<str>) -> Result<Self> {
        let token = token.as_ref().trim();
        if token.is_empty() {
            return Err(Error::Configuration(
                "bearer token must not be empty".to_string(),
            ));
        }
        self.using_auth(format!("Bearer {token}"))
    }

    /// Returns a new context that sends no `Authorization` header, overriding
    /// any configured resolver for this request only.
    pub fn without_auth(&self) -> Self {
        self.derive(self.spec.clone().set_auth(AuthDirective::Suppressed))
    }

    /// Returns a new context whose token is resolved for the given user.
    pub fn as_user(&self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.derive(
            self.spec
                .clone()
                .set_auth(AuthDirective::Credentials(Credentials::new(
                    username, password,
                ))),
        )
    }

    /// Returns a new context with the per-request timeout set.
    ///
    /// A zero duration is rejected at this call, before any dispatch.
    pub fn with_timeout(&self, timeout: Duration) -> Result<Self> {
        if timeout.is_zero() {
            return Err(Error::Configuration(
                "timeout must be greater than zero".to_string(),
            ));
        }
        Ok(self.derive(self.spec.clone().set_timeout(timeout)))
    }

    /// Dispatches a GET request.
    pub async fn get(&self) -> Result<ResultContext> {
        self.dispatch(Method::GET, None).await
    }

    /// Dispatches a DELETE request.
    pub async fn delete(&self) -> Result<ResultContext> {
        self.dispatch(Method::DELETE, None).await
    }

    /// Dispatches a POST request with a JSON body.
    pub async fn post<B: Serialize>(&self, body: &B) -> Result<ResultContext> {
        self.dispatch(Method::POST, Some(to_body(body)?)).await
    }

    /// Dispatches a PUT request with a JSON body.
    pub async fn put<B: Serialize>(&self, body: &B) -> Result<ResultContext> {
        self.dispatch(Method::PUT, Some(to_body(body)?)).await
    }

    /// Dispatches a PATCH request with a JSON body.
    pub async fn patch<B: Serialize>(&self, body: &B) -> Result<ResultContext> {
        self.dispatch(Method::PATCH, Some(to_body(body)?)).await
    }

    /// Finalizes the spec, resolves auth, and hands off to the engine.
    async fn dispatch(
        &self,
        method: Method,
        body: Option<serde_json::Value>,
    ) -> Result<ResultContext> {
        let mut spec = self.spec.clone().set_method(method);
        if let Some(body) = body {
            spec = spec.set_body(body);
        }
        spec = spec.apply_defaults(&self.client.default_headers, self.client.default_timeout);

        self.client
            .engine
            .execute_authenticated(&spec, self.client.resolver.as_deref())
            .await
    }
}

fn valid_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let name = HeaderName::try_from(name)
        .map_err(|e| Error::Configuration(format!("invalid header name: {e}")))?;
    let value = HeaderValue::try_from(value)
        .map_err(|e| Error::Configuration(format!("invalid header value: {e}")))?;
    Ok((name, value))
}

fn to_body<B: Serialize>(body: &B) -> Result<serde_json::Value> {
    serde_json::to_value(body)
        .map_err(|e| Error::Configuration(format!("failed to serialize request body: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Client;
    use serde::Serialize;

    fn context() -> RequestContext {
        let client = Client::builder().build().unwrap();
        client.request("/users/{id}")
    }

    #[test]
    fn deriving_a_child_leaves_the_parent_spec_unchanged() {
        let parent = context()
            .with_query_param("page", 1)
            .with_header("x-trace", "abc")
            .unwrap();

        let before: Vec<_> = parent.spec().query_params().to_vec();
        let _child = parent
            .with_query_param("limit", 10)
            .with_header("x-trace", "overwritten")
            .unwrap()
            .with_cookie("session", "s1");

        assert_eq!(parent.spec().query_params(), before.as_slice());
        assert_eq!(parent.spec().headers().get("x-trace").unwrap(), "abc");
        assert!(parent.spec().cookies().is_empty());
    }

    #[test]
    fn bulk_headers_win_over_existing_ones() {
        let ctx = context()
            .with_header("accept", "text/plain")
            .unwrap()
            .with_headers([("accept", "application/json"), ("x-env", "test")])
            .unwrap();

        assert_eq!(
            ctx.spec().headers().get("accept").unwrap(),
            "application/json"
        );
        assert_eq!(ctx.spec().headers().get("x-env").unwrap(), "test");
    }

    #[test]
    fn array_path_params_are_rejected_at_the_call_site() {
        let err = context().with_path_param("id", vec![1, 2]).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));

        #[derive(Serialize)]
        struct Bag {
            id: Vec<u32>,
        }
        let err = context().with_path_params(&Bag { id: vec![1] }).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = context().with_timeout(Duration::ZERO).unwrap_err();
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn auth_calls_set_the_expected_directive() {
        let bare = context().using_auth("abc123").unwrap();
        assert_eq!(
            bare.spec().auth(),
            &AuthDirective::Explicit(HeaderValue::from_static("Bearer abc123"))
        );

        let verbatim = context().using_auth("Custom abc123").unwrap();
        assert_eq!(
            verbatim.spec().auth(),
            &AuthDirective::Explicit(HeaderValue::from_static("Custom abc123"))
        );

        let token = context().using_token("abc123").unwrap();
        assert_eq!(token.spec().auth(), bare.spec().auth());

        assert_eq!(
            context().without_auth().spec().auth(),
            &AuthDirective::Suppressed
        );
        assert_eq!(
            context().as_user("alice", "secret").spec().auth(),
            &AuthDirective::Credentials(Credentials::new("alice", "secret"))
        );
    }

    #[test]
    fn empty_auth_values_are_rejected_at_the_builder_call() {
        assert!(matches!(
            context().using_auth("").unwrap_err(),
            Error::Configuration(_)
        ));
        assert!(matches!(
            context().using_auth("   ").unwrap_err(),
            Error::Configuration(_)
        ));
        assert!(matches!(
            context().using_token("").unwrap_err(),
            Error::Configuration(_)
        ));
    }

    #[test]
    fn invalid_header_names_fail_at_the_builder_call() {
        let err = context().with_header("bad header", "x").unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
