//! Shared helpers for the fetch client integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use courtside_core::cache::ManualClock;
use courtside_core::{Config, FetchClient};
use wiremock::MockServer;

pub const TTL: Duration = Duration::from_secs(5 * 60);

/// Config pointed at the mock server with a short backoff so retries are quick.
pub fn test_config(server: &MockServer) -> Config {
    Config {
        base_url: format!("{}/api", server.uri()),
        cache_ttl_secs: TTL.as_secs(),
        max_retries: 2,
        retry_backoff_ms: 20,
        request_timeout_secs: 5,
        ..Config::default()
    }
}

pub fn client_with_clock(server: &MockServer) -> (FetchClient, ManualClock) {
    let clock = ManualClock::new();
    let client = FetchClient::with_clock(test_config(server), Arc::new(clock.clone()))
        .expect("Failed to build client");
    (client, clock)
}

pub async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .expect("Request recording should be enabled")
        .len()
}

/// Wait for the server to see at least `n` requests.
pub async fn wait_for_requests(server: &MockServer, n: usize) {
    for _ in 0..300 {
        if request_count(server).await >= n {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("Timed out waiting for {} requests", n);
}

/// Wait until no request is in flight (cache writes happen before this).
pub async fn wait_until_idle(client: &FetchClient) {
    for _ in 0..300 {
        if client.in_flight_len() == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("Timed out waiting for in-flight requests to settle");
}
