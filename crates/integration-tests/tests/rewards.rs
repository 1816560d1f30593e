//! Promotions, vouchers and settings access for a signed-in member.
//!
//! Relies on `loyalty-cli seed`: the promotions `double-points-weekend`
//! (enrollment required) and `welcome-bonus` (automatic), and the voucher
//! `DEMO-VALUE-10` owned by the seeded demo customer.

#![allow(clippy::unwrap_used)]

use loyalty_integration_tests::{base_url, get_json, member, send_json};
use reqwest::{Client, Method};
use serde_json::json;

const PASSWORD: &str = "Amber-Signal-58";

async fn promotion_id(client: &Client, name: &str) -> i64 {
    let (status, body) = get_json(client, "/api/promotions").await.unwrap();
    assert_eq!(status, 200);
    body["promotions"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["name"] == name)
        .and_then(|p| p["id"].as_i64())
        .unwrap()
}

#[tokio::test]
#[ignore = "requires a running loyalty-api"]
async fn test_enroll_once() {
    let client = member(PASSWORD).await.unwrap();
    let id = promotion_id(&client, "double-points-weekend").await;
    let path = format!("/api/promotions/{id}/enroll");

    let (status, body) = send_json(&client, Method::POST, &path, &json!({})).await.unwrap();
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);

    let (status, body) = send_json(&client, Method::POST, &path, &json!({})).await.unwrap();
    assert_eq!(status, 409);
    assert_eq!(body["error"], "Already enrolled in this promotion");

    let (_, body) = get_json(&client, "/api/promotions").await.unwrap();
    let enrolled = body["promotions"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["id"] == id)
        .unwrap();
    assert_eq!(enrolled["enrollmentStatus"], "Enrolled");
}

#[tokio::test]
#[ignore = "requires a running loyalty-api"]
async fn test_enroll_rejects_automatic_and_unknown() {
    let client = member(PASSWORD).await.unwrap();
    let id = promotion_id(&client, "welcome-bonus").await;

    let (status, body) = send_json(&client, Method::POST, &format!("/api/promotions/{id}/enroll"), &json!({}))
        .await
        .unwrap();
    assert_eq!(status, 400);
    assert_eq!(body["error"], "This promotion does not require enrollment");

    let (status, _) = send_json(&client, Method::POST, "/api/promotions/999999/enroll", &json!({}))
        .await
        .unwrap();
    assert_eq!(status, 404);
}

#[tokio::test]
#[ignore = "requires a running loyalty-api"]
async fn test_validate_someone_elses_voucher() {
    let client = member(PASSWORD).await.unwrap();

    let (status, body) = send_json(
        &client,
        Method::POST,
        "/api/vouchers/validate",
        &json!({"code": "DEMO-VALUE-10"}),
    )
    .await
    .unwrap();
    assert_eq!(status, 200);
    assert_eq!(body, json!({"valid": false, "reason": "Voucher not found"}));

    let (status, body) = send_json(&client, Method::POST, "/api/vouchers/validate", &json!({"code": "  "}))
        .await
        .unwrap();
    assert_eq!(status, 400);
    assert_eq!(body["details"][0]["field"], "code");

    let (status, body) = get_json(&client, "/api/vouchers?status=active").await.unwrap();
    assert_eq!(status, 200);
    assert_eq!(body["vouchers"], json!([]));
}

#[tokio::test]
#[ignore = "requires a running loyalty-api"]
async fn test_members_cannot_write_settings() {
    let client = member(PASSWORD).await.unwrap();

    let (status, body) = get_json(&client, "/api/system-settings").await.unwrap();
    assert_eq!(status, 200);
    assert!(body.is_object());

    let (status, body) = send_json(
        &client,
        Method::POST,
        "/api/system-settings",
        &json!({"key": "points_per_dollar", "value": "100"}),
    )
    .await
    .unwrap();
    assert_eq!(status, 403);
    assert_eq!(body["error"], "Insufficient permissions");

    let (status, _) = send_json(
        &client,
        Method::PUT,
        "/api/system-settings",
        &json!({"settings": [{"key": "points_per_dollar", "value": "100"}]}),
    )
    .await
    .unwrap();
    assert_eq!(status, 403);

    for (method, path) in [
        (Method::DELETE, "/api/system-settings/points_per_dollar"),
        (Method::POST, "/api/system-settings/refresh"),
    ] {
        let response = client
            .request(method, format!("{}{path}", base_url()))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::FORBIDDEN, "{path}");
    }

    let (status, _) = get_json(&client, "/api/admin/stats").await.unwrap();
    assert_eq!(status, 403);
}
