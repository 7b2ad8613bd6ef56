//! Authentication directives and the credential-source boundary.
//!
//! The core never fetches, caches, or refreshes tokens itself. It asks an
//! injected [`AuthResolver`] for a bearer token once per request, honoring
//! the request's [`AuthDirective`]: suppression skips the resolver entirely,
//! and an explicit `Authorization` value always wins over resolver output.

use crate::{Error, Result};
use async_trait::async_trait;
use http::HeaderValue;

/// A username/password pair routed to the resolver for per-user tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// The username the token should be issued for.
    pub username: String,
    /// The password backing the token request.
    pub password: String,
}

impl Credentials {
    /// Creates a credentials pair.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// How a request's `Authorization` header should be derived.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthDirective {
    /// Ask the configured resolver (if any) for a token with no credentials.
    #[default]
    Inherit,
    /// Never invoke the resolver and inject no `Authorization` header,
    /// overriding any configured resolver for this request only.
    Suppressed,
    /// Use this exact `Authorization` value; the resolver is never invoked.
    Explicit(HeaderValue),
    /// Ask the resolver for a token issued for these credentials.
    Credentials(Credentials),
}

/// Boundary to external credential sources.
///
/// Given optional credentials, return an optional bearer token. `None` (or an
/// empty token) means no `Authorization` header should be added. The resolver
/// is invoked at most once per request and must be safe to call concurrently
/// when shared across requests; any caching or refresh logic belongs here,
/// never in the core.
///
/// # Examples
///
/// ```
/// use apiprobe::{AuthResolver, Credentials};
/// use async_trait::async_trait;
///
/// struct StaticToken(String);
///
/// #[async_trait]
/// impl AuthResolver for StaticToken {
///     async fn bearer_token(&self, _credentials: Option<&Credentials>) -> Option<String> {
///         Some(self.0.clone())
///     }
/// }
/// ```
#[async_trait]
pub trait AuthResolver: Send + Sync {
    /// Returns a bearer token for the given credentials, or `None` when no
    /// `Authorization` header should be added.
    async fn bearer_token(&self, credentials: Option<&Credentials>) -> Option<String>;
}

/// Derives an `Authorization` value from a caller-supplied scheme or token.
///
/// A value containing a space is used verbatim (it already carries a scheme);
/// a bare value is prefixed with `Bearer `. An empty or whitespace-only value
/// is a configuration error, never an empty token on the wire.
pub(crate) fn scheme_or_token(value: &str) -> Result<HeaderValue> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::Configuration(
            "Authorization value must not be empty".to_string(),
        ));
    }
    let header = if value.contains(' ') {
        value.to_string()
    } else {
        format!("Bearer {value}")
    };
    HeaderValue::from_str(&header)
        .map_err(|e| Error::Configuration(format!("invalid Authorization value: {e}")))
}

/// Resolves the `Authorization` header for one request, per its directive.
///
/// `explicit_header_set` reports whether the caller already placed an
/// `Authorization` header on the request; per the documented tie-break,
/// an explicit header wins and the resolver is not invoked at all.
pub(crate) async fn resolve_authorization(
    directive: &AuthDirective,
    explicit_header_set: bool,
    resolver: Option<&dyn AuthResolver>,
) -> Result<Option<HeaderValue>> {
    match directive {
        AuthDirective::Explicit(value) => Ok(Some(value.clone())),
        AuthDirective::Suppressed => Ok(None),
        _ if explicit_header_set => Ok(None),
        AuthDirective::Credentials(credentials) => {
            resolved_bearer(resolver, Some(credentials)).await
        }
        AuthDirective::Inherit => resolved_bearer(resolver, None).await,
    }
}

async fn resolved_bearer(
    resolver: Option<&dyn AuthResolver>,
    credentials: Option<&Credentials>,
) -> Result<Option<HeaderValue>> {
    let Some(resolver) = resolver else {
        return Ok(None);
    };
    match resolver.bearer_token(credentials).await {
        Some(token) if !token.is_empty() => {
            let value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
                Error::Configuration(format!("resolver produced an invalid token: {e}"))
            })?;
            Ok(Some(value))
        }
        _ => Ok(None),
    }
}
