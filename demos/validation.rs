//! Example demonstrating declarative response validation.
//!
//! This example shows how to:
//! - Bundle status, header, and typed body checks into an expectation
//! - Chain further assertions on the same response
//! - Tell an assertion failure apart from an execution failure
//!
//! Run with: `cargo run --example validation`

use apiprobe::{Client, Error, Expectation};
use http::StatusCode;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Post {
    #[serde(rename = "userId")]
    user_id: u32,
    id: u32,
    title: String,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter("apiprobe=debug,validation=info")
        .init();

    let client = Client::builder()
        .base_url("https://jsonplaceholder.typicode.com")?
        .build()?;

    println!("=== Passing Expectation ===");
    let response = client
        .request("/posts/{id}")
        .with_path_param("id", 1)?
        .get()
        .await?;

    // Status is checked first, then headers, then the typed body.
    response.should_return(
        Expectation::<Post>::new()
            .status(StatusCode::OK)
            .header("content-type", |v| v.starts_with("application/json"))
            .body(|post| post.id == 1),
    )?;
    println!("All checks held for post 1");

    // The same response can carry further assertions.
    response.expect_status(StatusCode::OK)?;
    println!("Title: {}", response.body_as::<Post>()?.title);
    println!();

    println!("=== Failing Expectation ===");
    // A deliberate mismatch: the message names both codes and the endpoint.
    match response.expect_status(StatusCode::CREATED) {
        Ok(_) => println!("unexpectedly passed"),
        Err(Error::Assertion(failure)) => println!("assertion failed: {failure}"),
        Err(e) => println!("unexpected error kind: {e}"),
    }

    Ok(())
}
