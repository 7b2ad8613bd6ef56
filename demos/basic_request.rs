//! Basic example demonstrating simple GET and POST requests.
//!
//! This example shows how to:
//! - Create a client with basic configuration
//! - Make GET requests with path parameters
//! - Make POST requests with a JSON body
//! - Access response data and metadata
//!
//! Run with: `cargo run --example basic_request`

use apiprobe::{Client, Error};
use http::StatusCode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Post {
    #[serde(rename = "userId")]
    user_id: u32,
    id: u32,
    title: String,
    body: String,
}

#[derive(Debug, Serialize)]
struct NewPost {
    title: String,
    body: String,
    #[serde(rename = "userId")]
    user_id: u32,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter("apiprobe=debug,basic_request=info")
        .init();

    // Create a client for the JSONPlaceholder API
    let client = Client::builder()
        .base_url("https://jsonplaceholder.typicode.com")?
        .default_header("accept", "application/json")?
        .build()?;

    println!("=== GET Request Example ===");
    // Fetch a post by path parameter
    let response = client
        .request("/posts/{id}")
        .with_path_param("id", 1)?
        .get()
        .await?;

    println!("Status code: {}", response.status());
    println!("Request latency: {:?}", response.latency());

    let post = response.body_as::<Post>()?;
    println!("Post ID: {}", post.id);
    println!("Title: {}", post.title);
    println!();

    println!("=== POST Request Example ===");
    // Create a new post
    let new_post = NewPost {
        title: "My New Post".to_string(),
        body: "This is the content of my new post!".to_string(),
        user_id: 1,
    };

    let created = client.request("/posts").post(&new_post).await?;
    created.expect_status(StatusCode::CREATED)?;

    println!("Created post ID: {}", created.body_as::<Post>()?.id);
    println!("Request latency: {:?}", created.latency());
    println!();

    println!("=== Accessing Response Metadata ===");
    println!("Raw response length: {} bytes", created.body().len());
    println!("Content-Type: {:?}", created.header("content-type"));

    Ok(())
}
