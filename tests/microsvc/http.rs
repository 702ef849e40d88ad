//! HTTP transport integration tests.
//!
//! Starts an axum server and exercises it with reqwest.

use std::sync::Arc;

use pledge_ledger::microsvc::{self, Service, USER_ID};
use pledge_ledger::InMemoryModelStore;
use serde_json::json;

use crate::support::{seeded_service, CAMPAIGN, INVESTOR};

/// Bind to port 0 and return the base URL.
async fn start_server(service: Arc<Service<InMemoryModelStore>>) -> String {
    let app = microsvc::router(service);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn health_lists_commands() {
    let base = start_server(Arc::new(seeded_service())).await;

    let resp = reqwest::get(format!("{base}/health")).await.unwrap();
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["ok"], true);
    assert_eq!(
        body["commands"],
        json!(["pledge.submit", "wallet.get", "wallet.provision"])
    );
}

#[tokio::test]
async fn pledge_over_http() {
    let base = start_server(Arc::new(seeded_service())).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/pledge.submit"))
        .header(USER_ID, INVESTOR)
        .json(&json!({ "campaignId": CAMPAIGN, "amount": 300 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["pledgeId"].is_string());

    let resp = client
        .post(format!("{base}/wallet.get"))
        .header(USER_ID, INVESTOR)
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    let wallet: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(wallet["liveBalance"], "200");
}

#[tokio::test]
async fn errors_carry_status_and_code() {
    let base = start_server(Arc::new(seeded_service())).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/pledge.submit"))
        .json(&json!({ "campaignId": CAMPAIGN, "amount": 300 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "unauthenticated");

    let resp = client
        .post(format!("{base}/pledge.submit"))
        .header(USER_ID, INVESTOR)
        .json(&json!({ "campaignId": CAMPAIGN, "amount": 5000 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "failed-precondition");
    assert_eq!(body["error"]["message"], "insufficient balance");

    let resp = client
        .post(format!("{base}/ledger.unknown"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
