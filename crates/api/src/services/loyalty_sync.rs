//! Fire-and-forget sync with the external loyalty platform.
//!
//! Registration pushes the new member; dashboard loads ask the platform to
//! refresh the member. Calls run on spawned tasks and failures are only
//! logged, so a slow or broken integration never affects the caller.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument, warn};
use url::Url;

use loyalty_core::{CustomerId, UserId};

/// Per-request timeout for integration calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur when calling the integration endpoint.
#[derive(Debug, Error)]
pub enum SyncError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Endpoint URL could not be joined with the call path.
    #[error("invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Member fields sent when an account is created.
///
/// The platform's `member/create` contract uses snake_case keys.
#[derive(Debug, Clone, Serialize)]
pub struct MemberPayload {
    pub user_id: UserId,
    pub customer_id: CustomerId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub enrollment_date: chrono::NaiveDate,
}

#[derive(Debug, Serialize)]
struct PullRequest<'a> {
    email: &'a str,
}

/// HTTP client for the loyalty integration.
#[derive(Clone)]
pub struct LoyaltySync {
    client: reqwest::Client,
    configured: Option<Url>,
}

impl LoyaltySync {
    /// Create a client; `configured` takes precedence over the
    /// `integration_endpoint` setting.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(configured: Option<Url>) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client, configured })
    }

    /// The endpoint to call: the configured URL, else a valid `setting` value.
    #[must_use]
    pub fn endpoint(&self, setting: Option<&str>) -> Option<Url> {
        self.configured
            .clone()
            .or_else(|| setting.and_then(|raw| Url::parse(raw.trim()).ok()))
            .map(with_trailing_slash)
    }

    /// Push a new member in the background.
    pub fn spawn_member_create(&self, endpoint: Url, payload: MemberPayload) {
        let this = self.clone();
        tokio::spawn(async move {
            match this.member_create(&endpoint, &payload).await {
                Ok(()) => info!(user_id = %payload.user_id, "Member synced to loyalty platform"),
                Err(e) => warn!(user_id = %payload.user_id, error = %e, "Member sync failed"),
            }
        });
    }

    /// Ask the platform to refresh a member in the background.
    pub fn spawn_member_pull(&self, endpoint: Url, email: String) {
        let this = self.clone();
        tokio::spawn(async move {
            if let Err(e) = this.member_pull(&endpoint, &email).await {
                warn!(error = %e, "Member pull failed");
            }
        });
    }

    #[instrument(skip(self, payload), fields(endpoint = %endpoint))]
    async fn member_create(&self, endpoint: &Url, payload: &MemberPayload) -> Result<(), SyncError> {
        let url = endpoint.join("member/create")?;
        let response = self.client.post(url).json(payload).send().await?;
        check_status(response).await
    }

    #[instrument(skip(self, email), fields(endpoint = %endpoint))]
    async fn member_pull(&self, endpoint: &Url, email: &str) -> Result<(), SyncError> {
        let url = endpoint.join("members/sync")?;
        let response = self
            .client
            .post(url)
            .json(&PullRequest { email })
            .send()
            .await?;
        check_status(response).await
    }
}

async fn check_status(response: reqwest::Response) -> Result<(), SyncError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let message = response.text().await.unwrap_or_default();
    Err(SyncError::Api {
        status: status.as_u16(),
        message,
    })
}

/// `Url::join` replaces the last path segment unless the base ends in `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_endpoint_wins() {
        let sync = LoyaltySync::new(Some(Url::parse("https://sync.example.com/api").unwrap())).unwrap();
        let endpoint = sync.endpoint(Some("https://other.example.com")).unwrap();
        assert_eq!(endpoint.as_str(), "https://sync.example.com/api/");
        assert_eq!(
            endpoint.join("member/create").unwrap().as_str(),
            "https://sync.example.com/api/member/create"
        );
    }

    #[test]
    fn test_member_payload_keys_are_snake_case() {
        let payload = MemberPayload {
            user_id: UserId::new(3),
            customer_id: CustomerId::new(8),
            email: "ada@example.com".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            phone: None,
            enrollment_date: chrono::NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["first_name"], "Ada");
        assert_eq!(json["enrollment_date"], "2024-05-01");
        assert_eq!(json["customer_id"], 8);
        assert!(json.get("firstName").is_none());
    }

    #[test]
    fn test_setting_endpoint_fallback() {
        let sync = LoyaltySync::new(None).unwrap();
        assert_eq!(
            sync.endpoint(Some(" https://loyalty.example.com ")).unwrap().as_str(),
            "https://loyalty.example.com/"
        );
        assert!(sync.endpoint(Some("")).is_none());
        assert!(sync.endpoint(Some("not a url")).is_none());
        assert!(sync.endpoint(None).is_none());
    }
}
