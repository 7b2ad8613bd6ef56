//! # apiprobe - fluent HTTP request composition for API tests
//!
//! Apiprobe is a small DSL for composing HTTP requests, executing them
//! through a pluggable engine, and declaratively validating the responses.
//! Contexts are immutable: every configuration call returns a new context,
//! so a base context can be shared as a template across parallel tests
//! without cross-contamination.
//!
//! ## Quick Start
//!
//! ```no_run
//! use apiprobe::{Client, Expectation};
//! use http::StatusCode;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize)]
//! struct CreateUser {
//!     name: String,
//! }
//!
//! #[derive(Deserialize)]
//! struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), apiprobe::Error> {
//!     let client = Client::builder()
//!         .base_url("https://api.example.com")?
//!         .default_header("accept", "application/json")?
//!         .build()?;
//!
//!     // GET with path and query parameters, then validate declaratively.
//!     client
//!         .request("/users/{id}")
//!         .with_path_param("id", 42)?
//!         .with_query_param("expand", "profile")
//!         .get()
//!         .await?
//!         .should_return(
//!             Expectation::<User>::new()
//!                 .status(StatusCode::OK)
//!                 .body(|user| user.id == 42),
//!         )?;
//!
//!     // POST a JSON body and read the typed response.
//!     let created = client
//!         .request("/users")
//!         .post(&CreateUser {
//!             name: "Alice".to_string(),
//!         })
//!         .await?;
//!     created.expect_status(StatusCode::CREATED)?;
//!     println!("created user {}", created.body_as::<User>()?.id);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Immutable fluent contexts** - every `with_*` call returns a new
//!   context; bases are safe templates for concurrent requests
//! - **Declarative validation** - status, header predicates, and typed body
//!   predicates evaluated in a fixed cheap-to-expensive order with readable
//!   failure messages
//! - **Pluggable execution** - any transport behind the [`ExecutionEngine`]
//!   trait; a pooled `reqwest` engine ships as the default
//! - **Injected authentication** - bearer tokens from an external
//!   [`AuthResolver`], with per-request suppression, per-user credentials,
//!   and explicit-header-wins semantics
//! - **Cached typed bodies** - `body_as::<T>()` parses once per type per
//!   response
//! - **Structured logging** - request/response `tracing` events with
//!   method, URL, status, and latency fields
//!
//! ## Failure kinds
//!
//! Assertion failures (the system under test misbehaved) and execution
//! failures (the request never completed) are disjoint, and configuration
//! errors are rejected at the builder call before any I/O:
//!
//! ```no_run
//! use apiprobe::{Client, Error};
//!
//! # async fn example() -> Result<(), Error> {
//! # let client = Client::builder().base_url("https://api.example.com")?.build()?;
//! match client.request("/health").get().await {
//!     Ok(result) => println!("status {}", result.status()),
//!     Err(Error::Execution(failure)) => eprintln!("transport failed: {failure}"),
//!     Err(Error::Configuration(message)) => eprintln!("bad request chain: {message}"),
//!     Err(e) => eprintln!("{e}"),
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod context;
mod error;
mod expect;
mod param;
mod result;
mod spec;

pub mod auth;
pub mod engine;

pub use auth::{AuthDirective, AuthResolver, Credentials};
pub use client::{Client, ClientBuilder};
pub use context::RequestContext;
pub use engine::{ExecutionEngine, ReqwestEngine};
pub use error::{AssertionFailure, Error, ExecutionFailure, FailedCheck, Result};
pub use expect::Expectation;
pub use param::ParamValue;
pub use result::ResultContext;
pub use spec::RequestSpec;
