//! Integration tests for mutating calls and cache invalidation.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{client_with_clock, request_count, test_config, wait_for_requests, wait_until_idle};
use courtside_core::cache::ManualClock;
use courtside_core::models::{Document, EventResult, NewRegistration};
use courtside_core::{FetchClient, FetchError, MutationBody};
use reqwest::Method;
use serde_json::{json, Value};
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_mutate_then_get_reads_from_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/completed-events/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/completed-events/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}, {"id": 2}])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/completed-events/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 2})))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _clock) = client_with_clock(&server);
    client.get_json("/completed-events/").await.unwrap();
    assert_eq!(client.cache_len(), 1);

    let created: Value = client
        .post("/completed-events/", json!({"event_name": "Club Cup"}))
        .await
        .unwrap();
    assert_eq!(created, json!({"id": 2}));
    assert_eq!(client.cache_len(), 0);

    let value = client.get_json("/completed-events/").await.unwrap();
    assert_eq!(*value, json!([{"id": 1}, {"id": 2}]));
    assert_eq!(request_count(&server).await, 3);
}

#[tokio::test]
async fn test_mutation_invalidates_query_variants_of_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/events/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/event-results/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/events/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let (client, _clock) = client_with_clock(&server);
    client.get_json("/events/").await.unwrap();
    client.get_json("/events/?upcoming=true").await.unwrap();
    client.get_json("/event-results/").await.unwrap();
    assert_eq!(client.cache_len(), 3);

    let _: Value = client.put("/events/", json!({"id": 1})).await.unwrap();

    assert_eq!(client.cache_len(), 1, "Only /event-results/ survives");
}

#[tokio::test]
async fn test_failed_mutation_still_invalidates_and_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/registrations/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/registrations/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _clock) = client_with_clock(&server);
    client.get_json("/registrations/").await.unwrap();

    let err = client.delete::<Value>("/registrations/").await.unwrap_err();

    assert_eq!(err.status(), Some(503));
    assert_eq!(client.cache_len(), 0);
    server.verify().await;
}

#[tokio::test]
async fn test_delete_with_empty_body_returns_null() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/registrations/7/delete-image-file/"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let (client, _clock) = client_with_clock(&server);
    let value: Value = client
        .delete("/registrations/7/delete-image-file/")
        .await
        .unwrap();

    assert_eq!(value, Value::Null);
}

#[tokio::test]
async fn test_mutation_during_in_flight_read_prevents_stale_cache_write() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/event-results/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"id": 1}]))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/event-results/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 2})))
        .mount(&server)
        .await;

    let (client, _clock) = client_with_clock(&server);
    let read = {
        let client = client.clone();
        tokio::spawn(async move { client.get_json("/event-results/").await })
    };
    wait_for_requests(&server, 1).await;

    let _: Value = client
        .mutate("/event-results/", Method::POST, MutationBody::Json(json!({})))
        .await
        .unwrap();

    // The in-flight reader still gets its answer...
    let value = read.await.unwrap().unwrap();
    assert_eq!(*value, json!([{"id": 1}]));
    wait_until_idle(&client).await;
    // ...but it was not cached, since it may predate the mutation.
    assert_eq!(client.cache_len(), 0);
}

#[tokio::test]
async fn test_read_after_mutation_does_not_join_earlier_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/event-results/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!(["old"]))
                .set_delay(Duration::from_millis(400)),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/event-results/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["new"])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/event-results/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 2})))
        .mount(&server)
        .await;

    let (client, _clock) = client_with_clock(&server);
    let earlier = {
        let client = client.clone();
        tokio::spawn(async move { client.get_json("/event-results/").await })
    };
    wait_for_requests(&server, 1).await;

    let _: Value = client.post("/event-results/", json!({})).await.unwrap();
    assert_eq!(client.in_flight_len(), 0);

    let value = client.get_json("/event-results/").await.unwrap();
    assert_eq!(*value, json!(["new"]));

    assert_eq!(*earlier.await.unwrap().unwrap(), json!(["old"]));
    wait_until_idle(&client).await;

    // Only the post-mutation payload is cached.
    let cached = client.get_json("/event-results/").await.unwrap();
    assert_eq!(*cached, json!(["new"]));
    assert_eq!(request_count(&server).await, 3);
}

#[tokio::test]
async fn test_invalidate_all_detaches_in_flight_reads() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/events/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let (client, _clock) = client_with_clock(&server);
    let earlier = {
        let client = client.clone();
        tokio::spawn(async move { client.get_json("/events/").await })
    };
    wait_for_requests(&server, 1).await;

    client.invalidate(None);
    assert_eq!(client.in_flight_len(), 0);

    client.get_json("/events/").await.unwrap();
    earlier.await.unwrap().unwrap();
    server.verify().await;
}

#[tokio::test]
async fn test_invalidate_all_forces_network_reads() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/events/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/completed-events/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&server)
        .await;

    let (client, _clock) = client_with_clock(&server);
    client.get_json("/events/").await.unwrap();
    client.get_json("/completed-events/").await.unwrap();

    client.invalidate(None);
    assert_eq!(client.cache_len(), 0);

    client.get_json("/events/").await.unwrap();
    client.get_json("/completed-events/").await.unwrap();
    server.verify().await;
}

#[tokio::test]
async fn test_invalidate_endpoint_uses_substring_match() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let (client, _clock) = client_with_clock(&server);
    client.get_json("/completed-events/").await.unwrap();
    client.get_json("/completed-events/3/").await.unwrap();
    client.get_json("/event-results/").await.unwrap();

    client.invalidate(Some("/completed-events/"));

    assert_eq!(client.cache_len(), 1);
}

#[tokio::test]
async fn test_mutations_send_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/events/"))
        .and(header("authorization", "Bearer admin-token"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 9})))
        .expect(1)
        .mount(&server)
        .await;

    let config = courtside_core::Config {
        auth_token: Some("admin-token".to_string()),
        ..test_config(&server)
    };
    let client = FetchClient::with_clock(config, Arc::new(ManualClock::new())).unwrap();

    let created: Value = client.post("/events/", json!({"event_name": "Open"})).await.unwrap();

    assert_eq!(created["id"], 9);
    server.verify().await;
}

#[tokio::test]
async fn test_create_registration_posts_multipart_form() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/registrations/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/registrations/"))
        .and(header_exists("content-type"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 12})))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _clock) = client_with_clock(&server);
    client.fetch_registrations(None).await.unwrap();
    client.fetch_registrations(Some(4)).await.unwrap();
    assert_eq!(client.cache_len(), 2);

    let registration = NewRegistration {
        name: "Priya Nair".to_string(),
        age: "16".to_string(),
        dob: "2009-04-12".to_string(),
        gender: "Female".to_string(),
        state: "Kerala".to_string(),
        level: "State".to_string(),
        email: "priya@example.com".to_string(),
        phone_no: "9876543210".to_string(),
        document: Some(Document {
            file_name: "id.jpg".to_string(),
            bytes: vec![0xFF, 0xD8, 0xFF],
        }),
        ..NewRegistration::default()
    };
    let form = registration.into_form().unwrap();

    let created = client.create_registration(form).await.unwrap();

    assert_eq!(created["id"], 12);
    assert_eq!(client.cache_len(), 0, "Filtered and unfiltered listings are dropped");
    server.verify().await;

    let received = server.received_requests().await.unwrap();
    let post = received
        .iter()
        .find(|r| r.method.as_str() == "POST")
        .expect("POST should have been recorded");
    let content_type = post.headers.get("content-type").unwrap().to_str().unwrap();
    assert!(content_type.starts_with("multipart/form-data"));
}

#[tokio::test]
async fn test_create_event_result_decodes_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/event-results/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 5,
            "event_name": "Club Cup",
            "event_date": "2026-03-01",
            "winner": "K. Menon",
            "images": [{"id": 1, "image": "/media/1.jpg", "image_order": 0}],
            "created_at": "2026-03-02T10:00:00Z"
        })))
        .mount(&server)
        .await;

    let (client, _clock) = client_with_clock(&server);
    let form = reqwest::multipart::Form::new()
        .text("event_name", "Club Cup")
        .text("event_date", "2026-03-01")
        .text("winner", "K. Menon");

    let result: EventResult = client.create_event_result(form).await.unwrap();

    assert_eq!(result.winner, "K. Menon");
    assert_eq!(result.ordered_images().len(), 1);
}

#[tokio::test]
async fn test_mutation_client_error_surfaces_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/registrations/"))
        .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"email": ["Enter a valid email address."]}"#))
        .mount(&server)
        .await;

    let (client, _clock) = client_with_clock(&server);
    let err = client
        .post::<Value>("/registrations/", json!({"email": "nope"}))
        .await
        .unwrap_err();

    match err {
        FetchError::Client { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("valid email"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
