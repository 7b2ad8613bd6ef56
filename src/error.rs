//! Error types for request composition, execution, and validation.
//!
//! Failures fall into three disjoint groups: assertion failures (the system
//! under test behaved unexpectedly), execution failures (the request could
//! not be completed), and configuration errors (a malformed chain that is
//! rejected before any network I/O).

use http::{HeaderMap, Method, StatusCode};
use std::fmt;
use std::time::Duration;

/// Maximum number of bytes of response body included in failure messages.
const BODY_SNIPPET_MAX: usize = 1024;

/// The main error type for request composition, execution, and validation.
///
/// # Examples
///
/// ```no_run
/// use apiprobe::{Client, Error};
/// use http::StatusCode;
///
/// # async fn example() -> Result<(), Error> {
/// let client = Client::builder()
///     .base_url("https://api.example.com")?
///     .build()?;
///
/// match client.request("/users/123").get().await {
///     Ok(result) => println!("status: {}", result.status()),
///     Err(Error::Execution(failure)) => eprintln!("request failed: {failure}"),
///     Err(e) => eprintln!("other error: {e}"),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// An expectation set via `should_return` was not met.
    ///
    /// This always means the system under test behaved unexpectedly, never
    /// that the framework itself failed.
    #[error(transparent)]
    Assertion(#[from] AssertionFailure),

    /// The request could not be completed as specified.
    ///
    /// Covers network errors, timeouts, and transport-level failures while
    /// reading the response.
    #[error(transparent)]
    Execution(#[from] ExecutionFailure),

    /// The request chain was malformed.
    ///
    /// Raised at the builder call site (or at finalization, before dispatch)
    /// for things like invalid header values, zero timeouts, array-valued
    /// path parameters, or unresolved `{name}` placeholders. A configuration
    /// error never reaches the wire.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Returns the HTTP status code if this error captured one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Assertion(failure) => Some(failure.status),
            Error::Execution(failure) => failure.status(),
            Error::Configuration(_) => None,
        }
    }

    /// Returns `true` for validation-time mismatches.
    pub fn is_assertion(&self) -> bool {
        matches!(self, Error::Assertion(_))
    }

    /// Returns `true` for transport-time failures.
    pub fn is_execution(&self) -> bool {
        matches!(self, Error::Execution(_))
    }
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The specific check that failed inside an [`AssertionFailure`].
///
/// Body-undeserializable and body-predicate-false are distinct kinds so a
/// test failure message never conflates "the body was not even valid for the
/// requested type" with "the body parsed but did not satisfy the predicate".
#[derive(Debug, Clone)]
pub enum FailedCheck {
    /// The response status did not match the expected one.
    Status {
        /// The status the expectation asked for.
        expected: StatusCode,
    },
    /// A header was missing or its predicate returned false.
    Header {
        /// The header name the predicate was registered for.
        name: String,
        /// The actual header value, if the header was present at all.
        actual: Option<String>,
    },
    /// The body deserialized but the predicate returned false.
    BodyPredicate {
        /// The type the body was deserialized as.
        type_name: &'static str,
    },
    /// The body could not be deserialized as the requested type.
    BodyDeserialization {
        /// The type the body was requested as.
        type_name: &'static str,
        /// The underlying serde error message.
        serde_error: String,
    },
}

/// Raised when a declarative expectation is not met.
///
/// Carries everything needed to diagnose the mismatch without re-running the
/// request: the failed check, the actual status, the originating method and
/// endpoint, the response headers, and a bounded body snippet.
#[derive(Debug)]
pub struct AssertionFailure {
    /// Which check failed.
    pub check: FailedCheck,
    /// The actual response status.
    pub status: StatusCode,
    /// The HTTP method of the originating request.
    pub method: Method,
    /// The endpoint of the originating request, as configured (placeholders
    /// unexpanded).
    pub endpoint: String,
    /// The response headers.
    pub headers: HeaderMap,
    /// The response body, truncated to a bounded length.
    pub body_snippet: String,
}

impl fmt::Display for AssertionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.check {
            FailedCheck::Status { expected } => write!(
                f,
                "expected status {expected} but got {actual} for {method} {endpoint}",
                actual = self.status,
                method = self.method,
                endpoint = self.endpoint,
            ),
            FailedCheck::Header { name, actual } => {
                write!(
                    f,
                    "header \"{name}\" failed its predicate for {method} {endpoint} (status {status}): ",
                    method = self.method,
                    endpoint = self.endpoint,
                    status = self.status,
                )?;
                match actual {
                    Some(value) => write!(f, "actual value was \"{value}\""),
                    None => write!(f, "header was absent"),
                }
            }
            FailedCheck::BodyPredicate { type_name } => write!(
                f,
                "body predicate on {type_name} returned false for {method} {endpoint} (status {status}); body: {body}",
                method = self.method,
                endpoint = self.endpoint,
                status = self.status,
                body = self.body_snippet,
            ),
            FailedCheck::BodyDeserialization {
                type_name,
                serde_error,
            } => write!(
                f,
                "body could not be deserialized as {type_name} for {method} {endpoint} (status {status}): {serde_error}; body: {body}",
                method = self.method,
                endpoint = self.endpoint,
                status = self.status,
                body = self.body_snippet,
            ),
        }
    }
}

impl std::error::Error for AssertionFailure {}

/// Raised when the request could not be completed as specified.
///
/// Carries the status code if one was obtained before the failure and the
/// underlying transport error as a nested source.
#[derive(thiserror::Error, Debug)]
pub enum ExecutionFailure {
    /// A network-level error occurred (connection failed, DNS lookup failed,
    /// TLS handshake failed, etc.).
    #[error("network error for {method} {url}: {source}")]
    Network {
        /// The HTTP method of the attempted request.
        method: Method,
        /// The fully assembled URL.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The request exceeded its per-request timeout.
    #[error("request timed out{} for {method} {url}", .timeout.map(|t| format!(" after {t:?}")).unwrap_or_default())]
    Timeout {
        /// The HTTP method of the attempted request.
        method: Method,
        /// The fully assembled URL.
        url: String,
        /// The configured per-request timeout, if one was set.
        timeout: Option<Duration>,
    },

    /// The response arrived but its body could not be read.
    #[error("failed to read response body (status {status}) for {method} {url}: {source}")]
    BodyRead {
        /// The HTTP method of the attempted request.
        method: Method,
        /// The fully assembled URL.
        url: String,
        /// The status code captured before the body read failed.
        status: StatusCode,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },
}

impl ExecutionFailure {
    /// Returns the HTTP status code if one was obtained before the failure.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ExecutionFailure::BodyRead { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Truncates a response body to a bounded snippet safe for error messages.
pub(crate) fn body_snippet(body: &str) -> String {
    if body.len() <= BODY_SNIPPET_MAX {
        return body.to_string();
    }
    let mut end = BODY_SNIPPET_MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
