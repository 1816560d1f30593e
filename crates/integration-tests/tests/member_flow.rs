//! Member account flow against a running server.
//!
//! Requires a migrated and seeded database and `loyalty-api` listening on
//! `LOYALTY_TEST_BASE_URL`.

#![allow(clippy::unwrap_used)]

use loyalty_integration_tests::{
    base_url, cookie_client, get_json, login, register, unique_email, unique_ip,
};
use reqwest::StatusCode;
use serde_json::json;

const PASSWORD: &str = "Sunny-Harbor-42";

#[tokio::test]
#[ignore = "requires a running loyalty-api"]
async fn test_register_sets_cookie_and_me_works() {
    let client = cookie_client();
    let email = unique_email();

    let response = register(&client, &email, PASSWORD).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let cookie = response
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("auth-token="));
    assert!(cookie.contains("HttpOnly"));

    let (status, body) = get_json(&client, "/api/auth/me").await.unwrap();
    assert_eq!(status, 200);
    assert_eq!(body["user"]["email"], email.as_str());
    assert_eq!(body["user"]["tier"], "Bronze");
}

#[tokio::test]
#[ignore = "requires a running loyalty-api"]
async fn test_duplicate_registration_conflicts() {
    let email = unique_email();
    register(&cookie_client(), &email, PASSWORD).await.unwrap();

    let response = register(&cookie_client(), &email, PASSWORD).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "requires a running loyalty-api"]
async fn test_logout_clears_session() {
    let client = cookie_client();
    register(&client, &unique_email(), PASSWORD).await.unwrap();

    let response = client
        .post(format!("{}/api/auth/logout", base_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, _) = get_json(&client, "/api/auth/me").await.unwrap();
    assert_eq!(status, 401);
}

#[tokio::test]
#[ignore = "requires a running loyalty-api"]
async fn test_login_locks_out_after_five_failures() {
    let client = cookie_client();
    let email = unique_email();
    let ip = unique_ip();
    register(&client, &email, PASSWORD).await.unwrap();

    for _ in 0..5 {
        let response = login(&client, &email, "wrong-password", &ip).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let response = login(&client, &email, PASSWORD, &ip).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({"error": "Too many login attempts. Please try again in 15 minutes."})
    );
}

#[tokio::test]
#[ignore = "requires a running loyalty-api"]
async fn test_successful_login_resets_failure_count() {
    let client = cookie_client();
    let email = unique_email();
    let ip = unique_ip();
    register(&client, &email, PASSWORD).await.unwrap();

    for _ in 0..4 {
        let response = login(&client, &email, "wrong-password", &ip).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
    let response = login(&client, &email, PASSWORD, &ip).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Four more misses would make nine without the reset.
    for _ in 0..4 {
        let response = login(&client, &email, "wrong-password", &ip).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
    let response = login(&client, &email, PASSWORD, &ip).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "requires a running loyalty-api"]
async fn test_activity_log_lists_sign_in() {
    let client = cookie_client();
    let email = unique_email();
    register(&client, &email, PASSWORD).await.unwrap();
    login(&client, &email, PASSWORD, &unique_ip()).await.unwrap();

    let (status, body) = get_json(&client, "/api/profile/activity?limit=5").await.unwrap();
    assert_eq!(status, 200);
    assert_eq!(body["limit"], 5);
    let kinds: Vec<_> = body["logs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|log| log["activityType"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, ["login", "register"]);
}

#[tokio::test]
#[ignore = "requires a running loyalty-api"]
async fn test_history_for_new_member_is_empty() {
    let client = cookie_client();
    register(&client, &unique_email(), PASSWORD).await.unwrap();

    let (status, body) = get_json(&client, "/api/transactions").await.unwrap();
    assert_eq!(status, 200);
    assert_eq!(body["total"], 0);
    assert_eq!(body["totalPages"], 0);

    let (status, body) = get_json(&client, "/api/transactions/analytics").await.unwrap();
    assert_eq!(status, 200);
    assert_eq!(body["totalTransactions"], 0);
    assert_eq!(body["yearOverYearChange"], 0.0);

    let (status, body) = get_json(&client, "/api/loyalty/points").await.unwrap();
    assert_eq!(status, 200);
    assert_eq!(body["currentBalance"], 0);
    assert_eq!(body["pagination"]["total"], 0);

    let (status, body) = get_json(&client, "/api/transactions?minAmount=9&maxAmount=1")
        .await
        .unwrap();
    assert_eq!(status, 400);
    assert_eq!(body["details"][0]["field"], "minAmount");
}

#[tokio::test]
#[ignore = "requires a running loyalty-api"]
async fn test_dashboard_for_new_member() {
    let client = cookie_client();
    register(&client, &unique_email(), PASSWORD).await.unwrap();

    let (status, body) = get_json(&client, "/api/dashboard/stats").await.unwrap();
    assert_eq!(status, 200);
    assert_eq!(body["spendingTrend"], 0.0);
    assert_eq!(body["points"], 0);
}
