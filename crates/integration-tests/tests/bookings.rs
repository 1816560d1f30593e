//! Appointment and work-order booking against a seeded server.

#![allow(clippy::unwrap_used)]

use loyalty_integration_tests::{get_json, member, send_json};
use reqwest::{Client, Method};
use serde_json::{Value, json};
use uuid::Uuid;

const PASSWORD: &str = "Quiet-Lantern-73";

/// First seeded store and one of its services.
async fn store_and_service(client: &Client) -> (i64, i64) {
    let (_, body) = get_json(client, "/api/stores").await.unwrap();
    let store_id = body["stores"][0]["id"].as_i64().unwrap();
    let (_, body) = get_json(client, &format!("/api/stores/{store_id}/services"))
        .await
        .unwrap();
    (store_id, body["services"][0]["id"].as_i64().unwrap())
}

/// A far-future slot that parallel tests are unlikely to share.
fn random_slot() -> (String, String) {
    let [m, d, h, q, ..] = Uuid::new_v4().into_bytes();
    let date = format!("2031-{:02}-{:02}", m % 12 + 1, d % 28 + 1);
    let time = format!("{:02}:{:02}", h % 10 + 8, (q % 4) * 15);
    (date, time)
}

async fn book(client: &Client, store_id: i64, service_id: i64, slot: &(String, String)) -> (u16, Value) {
    send_json(
        client,
        Method::POST,
        "/api/appointments",
        &json!({
            "storeId": store_id,
            "serviceId": service_id,
            "appointmentDate": slot.0,
            "appointmentTime": slot.1,
        }),
    )
    .await
    .unwrap()
}

#[tokio::test]
#[ignore = "requires a running loyalty-api"]
async fn test_double_booking_conflicts() {
    let first = member(PASSWORD).await.unwrap();
    let second = member(PASSWORD).await.unwrap();
    let (store_id, service_id) = store_and_service(&first).await;
    let slot = random_slot();

    let (status, body) = book(&first, store_id, service_id, &slot).await;
    assert_eq!(status, 201);
    assert_eq!(body["appointment"]["status"], "scheduled");

    let (status, body) = book(&second, store_id, service_id, &slot).await;
    assert_eq!(status, 409);
    assert_eq!(body["error"], "Time slot not available");
}

#[tokio::test]
#[ignore = "requires a running loyalty-api"]
async fn test_appointment_update_ownership() {
    let owner = member(PASSWORD).await.unwrap();
    let stranger = member(PASSWORD).await.unwrap();
    let (store_id, service_id) = store_and_service(&owner).await;

    let (status, body) = book(&owner, store_id, service_id, &random_slot()).await;
    assert_eq!(status, 201);
    let id = body["appointment"]["id"].as_i64().unwrap();
    let path = format!("/api/appointments/{id}");

    let (status, body) = send_json(&owner, Method::PATCH, "/api/appointments/999999", &json!({"notes": "x"}))
        .await
        .unwrap();
    assert_eq!(status, 404);
    assert_eq!(body["error"], "Appointment not found");

    let (status, body) = send_json(&stranger, Method::PATCH, &path, &json!({"notes": "mine now"}))
        .await
        .unwrap();
    assert_eq!(status, 403);
    assert_eq!(body["error"], "Access denied");

    let (status, body) = send_json(&owner, Method::PATCH, &path, &json!({})).await.unwrap();
    assert_eq!(status, 400);
    assert_eq!(body["error"], "No fields to update");

    let (status, body) = send_json(&owner, Method::PATCH, &path, &json!({"status": "cancelled"}))
        .await
        .unwrap();
    assert_eq!(status, 200);
    assert_eq!(body["appointment"]["status"], "cancelled");
}

#[tokio::test]
#[ignore = "requires a running loyalty-api"]
async fn test_work_order_update_ownership() {
    let owner = member(PASSWORD).await.unwrap();
    let stranger = member(PASSWORD).await.unwrap();
    let (store_id, _) = store_and_service(&owner).await;

    let (status, body) = send_json(
        &owner,
        Method::POST,
        "/api/work-orders",
        &json!({
            "storeId": store_id,
            "type": "repair",
            "title": "Cracked screen",
            "description": "Front glass cracked in the lower corner",
        }),
    )
    .await
    .unwrap();
    assert_eq!(status, 201);
    assert_eq!(body["workOrder"]["status"], "submitted");
    let path = format!("/api/work-orders/{}", body["workOrder"]["id"].as_i64().unwrap());

    let (status, _) = send_json(&owner, Method::PATCH, "/api/work-orders/999999", &json!({"customerNotes": "x"}))
        .await
        .unwrap();
    assert_eq!(status, 404);

    let (status, _) = send_json(&stranger, Method::PATCH, &path, &json!({"customerNotes": "x"}))
        .await
        .unwrap();
    assert_eq!(status, 403);

    let (status, body) = send_json(&owner, Method::PATCH, &path, &json!({})).await.unwrap();
    assert_eq!(status, 400);
    assert_eq!(body["error"], "No fields to update");
}
