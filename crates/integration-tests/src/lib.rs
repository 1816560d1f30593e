//! End-to-end tests for the loyalty API.
//!
//! # Running Tests
//!
//! ```bash
//! loyalty-cli migrate && loyalty-cli seed
//! cargo run -p loyalty-api &
//! LOYALTY_TEST_BASE_URL=http://localhost:3000 cargo test -p loyalty-integration-tests -- --ignored
//! ```
//!
//! Every test is `#[ignore]` so a plain `cargo test` never needs a server.

use reqwest::{Client, Method, Response};
use serde_json::{Value, json};
use uuid::Uuid;

/// Base URL of the server under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("LOYALTY_TEST_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Client that keeps the `auth-token` cookie between requests.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
#[allow(clippy::expect_used)]
pub fn cookie_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// A unique address so tests never collide on the email constraint.
#[must_use]
pub fn unique_email() -> String {
    format!("member-{}@example.com", Uuid::new_v4().simple())
}

/// A private address unique to the caller, so login lockouts never leak
/// between tests or runs.
#[must_use]
pub fn unique_ip() -> String {
    let [a, b, c, ..] = Uuid::new_v4().into_bytes();
    format!("10.{a}.{b}.{}", c.max(1))
}

/// Register a fresh member; the client is signed in afterwards.
///
/// # Errors
///
/// Returns the transport error if the request cannot be sent.
pub async fn register(client: &Client, email: &str, password: &str) -> reqwest::Result<Response> {
    client
        .post(format!("{}/api/auth/register", base_url()))
        .json(&json!({
            "email": email,
            "password": password,
            "confirmPassword": password,
            "firstName": "Test",
            "lastName": "Member",
        }))
        .send()
        .await
}

/// A new client signed in as a freshly registered member.
///
/// # Errors
///
/// Returns the transport error if registration cannot be sent.
pub async fn member(password: &str) -> reqwest::Result<Client> {
    let client = cookie_client();
    register(&client, &unique_email(), password)
        .await?
        .error_for_status()?;
    Ok(client)
}

/// Sign in with email and password from the given client address.
///
/// # Errors
///
/// Returns the transport error if the request cannot be sent.
pub async fn login(
    client: &Client,
    email: &str,
    password: &str,
    ip: &str,
) -> reqwest::Result<Response> {
    client
        .post(format!("{}/api/auth/login", base_url()))
        .header("x-forwarded-for", ip)
        .json(&json!({"email": email, "password": password}))
        .send()
        .await
}

/// GET a path and decode the JSON body.
///
/// # Errors
///
/// Returns the transport or decode error.
pub async fn get_json(client: &Client, path: &str) -> reqwest::Result<(u16, Value)> {
    let response = client.get(format!("{}{path}", base_url())).send().await?;
    let status = response.status().as_u16();
    Ok((status, response.json().await?))
}

/// Send a JSON body and decode the JSON reply.
///
/// # Errors
///
/// Returns the transport or decode error.
pub async fn send_json(
    client: &Client,
    method: Method,
    path: &str,
    body: &Value,
) -> reqwest::Result<(u16, Value)> {
    let response = client
        .request(method, format!("{}{path}", base_url()))
        .json(body)
        .send()
        .await?;
    let status = response.status().as_u16();
    Ok((status, response.json().await?))
}
