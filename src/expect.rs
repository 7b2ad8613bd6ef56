//! Declarative response validation.
//!
//! An [`Expectation`] bundles the checks a response must satisfy; the
//! [`should_return`](crate::ResultContext::should_return) entry point
//! evaluates them in a fixed order with short-circuiting: status first
//! (cheapest, most common failure), then header predicates, then body
//! deserialization and predicate (most expensive). Each failing check raises
//! immediately as an [`AssertionFailure`](crate::AssertionFailure).

use crate::error::FailedCheck;
use crate::{Result, ResultContext};
use http::StatusCode;
use serde::de::DeserializeOwned;

type HeaderPredicate = Box<dyn Fn(&str) -> bool + Send + Sync>;

struct HeaderCheck {
    name: String,
    predicate: HeaderPredicate,
}

enum BodyCheck<T> {
    /// Deserialization alone must succeed.
    TypeOnly,
    /// Deserialization must succeed and the predicate must hold.
    Predicate(Box<dyn Fn(&T) -> bool + Send + Sync>),
}

/// The declarative checks a response must satisfy.
///
/// Build one fluently and hand it to
/// [`ResultContext::should_return`]. The type parameter is the type the body
/// is deserialized as; it is only consulted when a body check is registered
/// via [`body`](Self::body) or [`body_type`](Self::body_type), so a pure
/// status expectation never touches the body.
///
/// # Examples
///
/// ```no_run
/// use apiprobe::{Client, Expectation};
/// use http::StatusCode;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct User {
///     id: u64,
///     name: String,
/// }
///
/// # async fn example() -> Result<(), apiprobe::Error> {
/// # let client = Client::builder().base_url("https://api.example.com")?.build()?;
/// client
///     .request("/users/{id}")
///     .with_path_param("id", 42)?
///     .get()
///     .await?
///     .should_return(
///         Expectation::<User>::new()
///             .status(StatusCode::OK)
///             .header("content-type", |v| v.starts_with("application/json"))
///             .body(|user| user.id == 42),
///     )?;
/// # Ok(())
/// # }
/// ```
pub struct Expectation<T = serde_json::Value> {
    status: Option<StatusCode>,
    headers: Vec<HeaderCheck>,
    body: Option<BodyCheck<T>>,
}

impl<T> Expectation<T> {
    /// Creates an empty expectation. With no checks registered,
    /// `should_return` is a no-op that returns the context unchanged.
    pub fn new() -> Self {
        Self {
            status: None,
            headers: Vec::new(),
            body: None,
        }
    }

    /// Requires the response status to equal `status`.
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// Requires the named header to be present and satisfy `predicate`.
    ///
    /// May be registered for several headers; checks run in registration
    /// order.
    pub fn header(
        mut self,
        name: impl Into<String>,
        predicate: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.headers.push(HeaderCheck {
            name: name.into(),
            predicate: Box::new(predicate),
        });
        self
    }

    /// Requires the named header to equal `value` exactly.
    pub fn header_equals(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let expected = value.into();
        self.header(name, move |actual| actual == expected)
    }

    /// Requires the body to deserialize as `T`, with no further predicate.
    pub fn body_type(mut self) -> Self {
        self.body = Some(BodyCheck::TypeOnly);
        self
    }

    /// Requires the body to deserialize as `T` and satisfy `predicate`.
    pub fn body(mut self, predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.body = Some(BodyCheck::Predicate(Box::new(predicate)));
        self
    }
}

impl<T> Default for Expectation<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultContext {
    /// Evaluates an expectation against this response.
    ///
    /// Checks run status first, then headers, then body, short-circuiting on
    /// the first failure with an [`Error::Assertion`](crate::Error::Assertion)
    /// whose message names the expected and actual state plus the method and
    /// endpoint. On success the same context is returned for chaining.
    pub fn should_return<T>(&self, expectation: Expectation<T>) -> Result<&Self>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        if let Some(expected) = expectation.status {
            if self.status() != expected {
                tracing::warn!(
                    expected = expected.as_u16(),
                    actual = self.status().as_u16(),
                    method = %self.method(),
                    endpoint = %self.endpoint(),
                    "status expectation failed"
                );
                return Err(self.assertion(FailedCheck::Status { expected }).into());
            }
        }

        for check in &expectation.headers {
            let actual = self.header(&check.name);
            if !actual.is_some_and(|value| (check.predicate)(value)) {
                return Err(self
                    .assertion(FailedCheck::Header {
                        name: check.name.clone(),
                        actual: actual.map(str::to_string),
                    })
                    .into());
            }
        }

        match &expectation.body {
            None => {}
            Some(BodyCheck::TypeOnly) => {
                self.body_as::<T>()?;
            }
            Some(BodyCheck::Predicate(predicate)) => {
                let value = self.body_as::<T>()?;
                if !predicate(&value) {
                    return Err(self
                        .assertion(FailedCheck::BodyPredicate {
                            type_name: std::any::type_name::<T>(),
                        })
                        .into());
                }
            }
        }

        Ok(self)
    }

    /// Shorthand for a status-only expectation.
    pub fn expect_status(&self, expected: StatusCode) -> Result<&Self> {
        self.should_return::<serde_json::Value>(Expectation::new().status(expected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use http::{HeaderMap, HeaderValue, Method};
    use serde::Deserialize;
    use std::time::Duration;

    #[derive(Debug, Deserialize)]
    struct User {
        id: u64,
    }

    fn response(status: StatusCode, body: &str) -> ResultContext {
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        ResultContext::new(
            status,
            headers,
            body.to_string(),
            Method::GET,
            "/users/42",
            Duration::from_millis(1),
        )
    }

    #[test]
    fn passing_expectation_returns_the_same_context_for_chaining() {
        let ctx = response(StatusCode::OK, r#"{"id": 42}"#);

        let chained = ctx
            .should_return(
                Expectation::<User>::new()
                    .status(StatusCode::OK)
                    .header("content-type", |v| v.contains("json"))
                    .body(|user| user.id == 42),
            )
            .unwrap();

        assert!(std::ptr::eq(chained, &ctx));
    }

    #[test]
    fn status_is_checked_before_the_body_is_touched() {
        // Body is not valid JSON; a status failure must win regardless.
        let ctx = response(StatusCode::NOT_FOUND, "<html>nope</html>");

        let err = ctx
            .should_return(
                Expectation::<User>::new()
                    .status(StatusCode::OK)
                    .body(|user| user.id == 42),
            )
            .unwrap_err();

        let Error::Assertion(failure) = err else {
            panic!("expected assertion failure");
        };
        assert!(matches!(failure.check, FailedCheck::Status { .. }));
        let message = failure.to_string();
        assert!(message.contains("200"));
        assert!(message.contains("404"));
        assert!(message.contains("/users/42"));
    }

    #[test]
    fn missing_header_fails_with_the_header_check() {
        let ctx = response(StatusCode::OK, r#"{"id": 42}"#);

        let err = ctx
            .should_return(Expectation::<User>::new().header("x-request-id", |_| true))
            .unwrap_err();

        let Error::Assertion(failure) = err else {
            panic!("expected assertion failure");
        };
        assert!(matches!(
            failure.check,
            FailedCheck::Header { ref name, actual: None } if name == "x-request-id"
        ));
    }

    #[test]
    fn header_equals_reports_the_actual_value() {
        let ctx = response(StatusCode::OK, r#"{"id": 42}"#);

        let err = ctx
            .should_return(Expectation::<User>::new().header_equals("content-type", "text/plain"))
            .unwrap_err();

        assert!(err.to_string().contains("application/json"));
    }

    #[test]
    fn predicate_false_is_not_a_deserialization_failure() {
        let ctx = response(StatusCode::OK, r#"{"id": 42}"#);

        let err = ctx
            .should_return(Expectation::<User>::new().body(|user| user.id == 7))
            .unwrap_err();

        let Error::Assertion(failure) = err else {
            panic!("expected assertion failure");
        };
        assert!(matches!(failure.check, FailedCheck::BodyPredicate { .. }));
        assert!(failure.to_string().contains("returned false"));
    }

    #[test]
    fn type_only_expectation_still_requires_a_parseable_body() {
        let ctx = response(StatusCode::OK, "not json");

        let err = ctx
            .should_return(Expectation::<User>::new().status(StatusCode::OK).body_type())
            .unwrap_err();

        let Error::Assertion(failure) = err else {
            panic!("expected assertion failure");
        };
        assert!(matches!(
            failure.check,
            FailedCheck::BodyDeserialization { .. }
        ));
    }

    #[test]
    fn expect_status_shorthand() {
        let ctx = response(StatusCode::CREATED, "ignored");
        assert!(ctx.expect_status(StatusCode::CREATED).is_ok());
        assert!(ctx.expect_status(StatusCode::OK).is_err());
    }
}
