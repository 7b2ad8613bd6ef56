//! The pluggable execution boundary and the default reqwest transport.
//!
//! An [`ExecutionEngine`] turns a finalized [`RequestSpec`] into an actual
//! HTTP exchange and a [`ResultContext`]. Transports are explicit
//! implementations passed to the client builder; there is no global registry.
//! Note that a non-2xx status is not an engine error: judging the status is
//! the validation layer's job, so the engine reports an execution failure
//! only when the exchange itself could not complete.

use crate::auth::{resolve_authorization, AuthResolver};
use crate::error::ExecutionFailure;
use crate::param::ParamValue;
use crate::spec::RequestSpec;
use crate::{Error, Result, ResultContext};
use async_trait::async_trait;
use http::{header, HeaderMap, HeaderValue};
use std::time::Instant;
use url::Url;

/// Boundary to HTTP transports.
///
/// Implementations must extract status, headers, and body faithfully, fold
/// the spec's cookies into the request, enforce the per-request timeout, and
/// surface a timeout as a distinguishable failure rather than a generic
/// transport error.
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    /// Executes a finalized spec and captures the response.
    async fn execute(&self, spec: &RequestSpec) -> Result<ResultContext>;

    /// Resolves the spec's auth directive through `resolver`, then executes.
    ///
    /// The default implementation injects the resolved `Authorization`
    /// header into a derived spec and delegates to
    /// [`execute`](Self::execute); engines with transport-native
    /// authentication may override it.
    async fn execute_authenticated(
        &self,
        spec: &RequestSpec,
        resolver: Option<&dyn AuthResolver>,
    ) -> Result<ResultContext> {
        let explicit = spec.headers().contains_key(header::AUTHORIZATION);
        let spec = match resolve_authorization(spec.auth(), explicit, resolver).await? {
            Some(value) => spec.clone().set_header(header::AUTHORIZATION, value),
            None => spec.clone(),
        };
        self.execute(&spec).await
    }
}

/// The default [`ExecutionEngine`], backed by a pooled `reqwest` client.
///
/// Relative endpoints are joined against the engine's base URL; absolute
/// endpoints are used as-is.
pub struct ReqwestEngine {
    http: reqwest::Client,
    base_url: Option<Url>,
}

impl ReqwestEngine {
    /// Creates an engine, optionally anchored at a base URL.
    pub fn new(base_url: Option<Url>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, base_url })
    }

    /// Creates an engine around an existing `reqwest` client.
    pub fn with_client(http: reqwest::Client, base_url: Option<Url>) -> Self {
        Self { http, base_url }
    }

    fn assemble_url(&self, spec: &RequestSpec) -> Result<Url> {
        assemble_url(self.base_url.as_ref(), spec)
    }
}

#[async_trait]
impl ExecutionEngine for ReqwestEngine {
    async fn execute(&self, spec: &RequestSpec) -> Result<ResultContext> {
        let url = self.assemble_url(spec)?;

        tracing::debug!(
            method = %spec.method(),
            url = %url,
            "executing HTTP request"
        );

        let mut request = self.http.request(spec.method().clone(), url.clone());

        for (name, value) in spec.headers() {
            request = request.header(name, value);
        }

        if let Some(cookie) = cookie_header(spec.cookies())? {
            request = request.header(header::COOKIE, cookie);
        }

        if let Some(body) = spec.body() {
            if !spec.headers().contains_key(header::CONTENT_TYPE) {
                request = request.header(header::CONTENT_TYPE, "application/json");
            }
            let text = serde_json::to_string(body).map_err(|e| {
                Error::Configuration(format!("failed to serialize request body: {e}"))
            })?;
            request = request.body(text);
        }

        if let Some(timeout) = spec.timeout() {
            request = request.timeout(timeout);
        }

        let started = Instant::now();
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ExecutionFailure::Timeout {
                    method: spec.method().clone(),
                    url: url.to_string(),
                    timeout: spec.timeout(),
                }
            } else {
                ExecutionFailure::Network {
                    method: spec.method().clone(),
                    url: url.to_string(),
                    source: e,
                }
            }
        })?;

        let status = response.status();
        // Flatten repeated response headers, last value winning.
        let mut headers = HeaderMap::new();
        for (name, value) in response.headers() {
            headers.insert(name.clone(), value.clone());
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                Error::from(ExecutionFailure::Timeout {
                    method: spec.method().clone(),
                    url: url.to_string(),
                    timeout: spec.timeout(),
                })
            } else {
                Error::from(ExecutionFailure::BodyRead {
                    method: spec.method().clone(),
                    url: url.to_string(),
                    status,
                    source: e,
                })
            }
        })?;
        let latency = started.elapsed();

        tracing::info!(
            status = status.as_u16(),
            latency_ms = latency.as_millis() as u64,
            method = %spec.method(),
            url = %url,
            "received HTTP response"
        );

        Ok(ResultContext::new(
            status,
            headers,
            body,
            spec.method().clone(),
            spec.endpoint(),
            latency,
        ))
    }
}

/// Assembles the final URL for a spec.
///
/// Path placeholders are substituted before the query string is appended;
/// an unresolved `{name}` is a configuration error, never a silent
/// pass-through. Query values are percent-encoded, arrays expanding to
/// repeated `key=value` pairs in insertion order. Exposed for custom engine
/// implementations.
pub fn assemble_url(base: Option<&Url>, spec: &RequestSpec) -> Result<Url> {
    let path = substitute_placeholders(spec.endpoint(), spec.path_params())?;

    let mut url = match Url::parse(&path) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let base = base.ok_or_else(|| {
                Error::Configuration(format!(
                    "endpoint \"{path}\" is relative but no base URL is configured"
                ))
            })?;
            base.join(&path)
                .map_err(|e| Error::Configuration(format!("invalid endpoint \"{path}\": {e}")))?
        }
        Err(e) => {
            return Err(Error::Configuration(format!(
                "invalid endpoint \"{path}\": {e}"
            )))
        }
    };

    if !spec.query_params().is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in spec.query_params() {
            match value {
                ParamValue::List(items) => {
                    for item in items {
                        pairs.append_pair(key, &item.render());
                    }
                }
                scalar => {
                    pairs.append_pair(key, &scalar.render());
                }
            }
        }
    }

    Ok(url)
}

/// Substitutes every `{key}` in the endpoint from the path parameters.
fn substitute_placeholders(endpoint: &str, params: &[(String, ParamValue)]) -> Result<String> {
    let mut out = String::with_capacity(endpoint.len());
    let mut rest = endpoint;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            return Err(Error::Configuration(format!(
                "unterminated placeholder in endpoint \"{endpoint}\""
            )));
        };
        let name = &after[..end];
        let Some((_, value)) = params.iter().find(|(key, _)| key == name) else {
            return Err(Error::Configuration(format!(
                "unresolved path placeholder {{{name}}} in endpoint \"{endpoint}\""
            )));
        };
        // Array path params are rejected at the builder; guard anyway.
        if value.is_list() {
            return Err(Error::Configuration(format!(
                "path parameter \"{name}\" must be a scalar"
            )));
        }
        out.push_str(&value.render());
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

/// Folds the cookie map into a single `Cookie` header value.
///
/// An empty map yields `None`: no header is sent at all, never an empty one.
fn cookie_header(cookies: &[(String, String)]) -> Result<Option<HeaderValue>> {
    if cookies.is_empty() {
        return Ok(None);
    }
    let value = cookies
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("; ");
    HeaderValue::from_str(&value)
        .map(Some)
        .map_err(|e| Error::Configuration(format!("invalid cookie value: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::RequestSpec;

    fn base() -> Url {
        Url::parse("https://api.example.com").unwrap()
    }

    #[test]
    fn path_substitution_happens_before_query_assembly() {
        let spec = RequestSpec::new("/users/{id}")
            .set_path_param("id".to_string(), ParamValue::Int(42))
            .set_query_param("page".to_string(), ParamValue::Int(1))
            .set_query_param("limit".to_string(), ParamValue::Int(10));

        let url = assemble_url(Some(&base()), &spec).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/users/42?page=1&limit=10"
        );
    }

    #[test]
    fn unresolved_placeholder_is_a_configuration_error() {
        let spec = RequestSpec::new("/users/{id}/posts/{post}")
            .set_path_param("id".to_string(), ParamValue::Int(42));

        let err = assemble_url(Some(&base()), &spec).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains("{post}"));
    }

    #[test]
    fn array_query_params_expand_to_repeated_pairs() {
        let spec = RequestSpec::new("/search").set_query_param(
            "tag".to_string(),
            ParamValue::List(vec![
                ParamValue::Str("a".to_string()),
                ParamValue::Str("b".to_string()),
            ]),
        );

        let url = assemble_url(Some(&base()), &spec).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/search?tag=a&tag=b");
    }

    #[test]
    fn query_values_are_percent_encoded() {
        let spec = RequestSpec::new("/search")
            .set_query_param("q".to_string(), ParamValue::Str("a b&c".to_string()));

        let url = assemble_url(Some(&base()), &spec).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/search?q=a+b%26c");
    }

    #[test]
    fn absolute_endpoints_skip_the_base() {
        let spec = RequestSpec::new("https://other.example.com/health");
        let url = assemble_url(Some(&base()), &spec).unwrap();
        assert_eq!(url.as_str(), "https://other.example.com/health");
    }

    #[test]
    fn relative_endpoint_without_base_is_a_configuration_error() {
        let spec = RequestSpec::new("/users");
        let err = assemble_url(None, &spec).unwrap_err();
        assert!(err.to_string().contains("no base URL"));
    }

    #[test]
    fn cookies_fold_into_one_header() {
        let header = cookie_header(&[
            ("session".to_string(), "abc".to_string()),
            ("theme".to_string(), "dark".to_string()),
        ])
        .unwrap()
        .unwrap();
        assert_eq!(header, "session=abc; theme=dark");
    }

    #[test]
    fn empty_cookie_map_sends_no_header() {
        assert!(cookie_header(&[]).unwrap().is_none());
    }
}
