//! Public catalog and store locator against a seeded server.

#![allow(clippy::unwrap_used)]

use loyalty_integration_tests::{base_url, cookie_client, get_json};

#[tokio::test]
#[ignore = "requires a running loyalty-api"]
async fn test_readiness() {
    let response = cookie_client()
        .get(format!("{}/health/ready", base_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
#[ignore = "requires a running loyalty-api"]
async fn test_product_listing_paginates() {
    let (status, body) = get_json(
        &cookie_client(),
        "/api/products?limit=2&sortField=price&sortDirection=desc",
    )
    .await
    .unwrap();
    assert_eq!(status, 200);
    assert_eq!(body["limit"], 2);
    assert!(body["products"].as_array().unwrap().len() <= 2);
    assert!(body["total"].as_i64().unwrap() >= 0);
}

#[tokio::test]
#[ignore = "requires a running loyalty-api"]
async fn test_missing_product_is_404() {
    let (status, body) = get_json(&cookie_client(), "/api/products/999999").await.unwrap();
    assert_eq!(status, 404);
    assert_eq!(body["error"], "Product not found");
}

#[tokio::test]
#[ignore = "requires a running loyalty-api"]
async fn test_nearby_stores_sorted_by_distance() {
    let (status, body) = get_json(
        &cookie_client(),
        "/api/stores?lat=37.7749&lng=-122.4194&maxDistance=50",
    )
    .await
    .unwrap();
    assert_eq!(status, 200);

    let distances: Vec<f64> = body["stores"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["distance"].as_f64().unwrap())
        .collect();
    assert!(distances.is_sorted());
    assert!(distances.iter().all(|d| *d <= 50.0));
}

#[tokio::test]
#[ignore = "requires a running loyalty-api"]
async fn test_tiers_are_public() {
    let (status, body) = get_json(&cookie_client(), "/api/tiers").await.unwrap();
    assert_eq!(status, 200);
    assert_eq!(body["tiers"].as_array().unwrap().len(), 4);
    assert!(body.get("progress").is_none());
}
