//! The immutable description of one pending HTTP request.

use crate::auth::AuthDirective;
use crate::param::ParamValue;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde_json::Value;
use std::time::Duration;

/// Everything needed to dispatch one HTTP request.
///
/// A `RequestSpec` is never mutated after construction: every update
/// operation consumes a copy and returns a new spec that is structurally
/// identical to its parent except for the one changed field. The fluent
/// [`RequestContext`](crate::RequestContext) drives these updates; custom
/// [`ExecutionEngine`](crate::ExecutionEngine) implementations only read
/// through the accessors.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    endpoint: String,
    method: Method,
    headers: HeaderMap,
    query_params: Vec<(String, ParamValue)>,
    path_params: Vec<(String, ParamValue)>,
    body: Option<Value>,
    cookies: Vec<(String, String)>,
    timeout: Option<Duration>,
    auth: AuthDirective,
}

impl RequestSpec {
    /// Creates a spec for the given endpoint with no other state.
    ///
    /// The endpoint may be absolute or base-relative and may contain `{name}`
    /// placeholders, resolved from path parameters at dispatch time.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method: Method::GET,
            headers: HeaderMap::new(),
            query_params: Vec::new(),
            path_params: Vec::new(),
            body: None,
            cookies: Vec::new(),
            timeout: None,
            auth: AuthDirective::Inherit,
        }
    }

    /// The configured endpoint, placeholders unexpanded.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The HTTP method, finalized by the verb call.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The per-request headers, last write winning per name.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Query parameters in insertion order.
    pub fn query_params(&self) -> &[(String, ParamValue)] {
        &self.query_params
    }

    /// Path parameters in insertion order. Always scalar.
    pub fn path_params(&self) -> &[(String, ParamValue)] {
        &self.path_params
    }

    /// The JSON body, if one was attached by the verb call.
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Cookies in insertion order.
    pub fn cookies(&self) -> &[(String, String)] {
        &self.cookies
    }

    /// The per-request timeout, if one was configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// How the `Authorization` header should be derived.
    pub fn auth(&self) -> &AuthDirective {
        &self.auth
    }

    pub(crate) fn set_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub(crate) fn set_query_param(mut self, key: String, value: ParamValue) -> Self {
        upsert(&mut self.query_params, key, value);
        self
    }

    pub(crate) fn set_path_param(mut self, key: String, value: ParamValue) -> Self {
        upsert(&mut self.path_params, key, value);
        self
    }

    pub(crate) fn set_cookie(mut self, name: String, value: String) -> Self {
        if let Some(slot) = self.cookies.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.cookies.push((name, value));
        }
        self
    }

    pub(crate) fn clear_cookies(mut self) -> Self {
        self.cookies.clear();
        self
    }

    pub(crate) fn set_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub(crate) fn set_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub(crate) fn set_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub(crate) fn set_auth(mut self, auth: AuthDirective) -> Self {
        self.auth = auth;
        self
    }

    /// Folds client-level defaults into the spec at finalization.
    ///
    /// Per-request headers win over defaults; the default timeout applies
    /// only when the request did not set its own.
    pub(crate) fn apply_defaults(
        mut self,
        default_headers: &HeaderMap,
        default_timeout: Option<Duration>,
    ) -> Self {
        for (name, value) in default_headers {
            if !self.headers.contains_key(name) {
                self.headers.insert(name.clone(), value.clone());
            }
        }
        if self.timeout.is_none() {
            self.timeout = default_timeout;
        }
        self
    }
}

/// Replaces in place on a duplicate key so insertion order is stable.
fn upsert(params: &mut Vec<(String, ParamValue)>, key: String, value: ParamValue) {
    if let Some(slot) = params.iter_mut().find(|(k, _)| *k == key) {
        slot.1 = value;
    } else {
        params.push((key, value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn updates_leave_the_parent_untouched() {
        let parent = RequestSpec::new("/users/{id}");
        let child = parent
            .clone()
            .set_query_param("page".to_string(), ParamValue::Int(1))
            .set_header(
                HeaderName::from_static("x-trace"),
                HeaderValue::from_static("abc"),
            );

        assert!(parent.query_params().is_empty());
        assert!(parent.headers().is_empty());
        assert_eq!(child.query_params().len(), 1);
        assert_eq!(child.headers().len(), 1);
    }

    #[test]
    fn duplicate_param_keys_keep_insertion_position() {
        let spec = RequestSpec::new("/things")
            .set_query_param("a".to_string(), ParamValue::Int(1))
            .set_query_param("b".to_string(), ParamValue::Int(2))
            .set_query_param("a".to_string(), ParamValue::Int(3));

        assert_eq!(
            spec.query_params(),
            &[
                ("a".to_string(), ParamValue::Int(3)),
                ("b".to_string(), ParamValue::Int(2)),
            ]
        );
    }

    #[test]
    fn defaults_never_override_request_state() {
        let mut defaults = HeaderMap::new();
        defaults.insert(
            HeaderName::from_static("x-env"),
            HeaderValue::from_static("default"),
        );
        defaults.insert(
            HeaderName::from_static("user-agent"),
            HeaderValue::from_static("apiprobe"),
        );

        let spec = RequestSpec::new("/things")
            .set_header(
                HeaderName::from_static("x-env"),
                HeaderValue::from_static("override"),
            )
            .set_timeout(Duration::from_secs(5))
            .apply_defaults(&defaults, Some(Duration::from_secs(30)));

        assert_eq!(spec.headers().get("x-env").unwrap(), "override");
        assert_eq!(spec.headers().get("user-agent").unwrap(), "apiprobe");
        assert_eq!(spec.timeout(), Some(Duration::from_secs(5)));
    }
}
