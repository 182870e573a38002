mod common;

use std::sync::Arc;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{CannedBackend, FailingBackend, TestServer, CANNED_REPLY};

#[tokio::test]
async fn chat_requires_a_credential() -> Result<()> {
    let server = TestServer::with_chat(Arc::new(CannedBackend)).await?;

    let resp = server.client.post(server.api("/chat")).json(&json!({ "message": "hi" })).send().await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn conversation_is_kept_per_user() -> Result<()> {
    let server = TestServer::with_chat(Arc::new(CannedBackend)).await?;
    let farmer = server.signup("farmer@example.com", "farmer").await?;
    let buyer = server.signup("buyer@example.com", "buyer").await?;

    let resp = server
        .client
        .post(server.api("/chat"))
        .bearer_auth(&farmer)
        .json(&json!({ "message": "When should I sow wheat?", "language": "Hindi", "region": "Malwa" }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await?;
    assert_eq!(body["reply"], json!({ "role": "assistant", "content": CANNED_REPLY }));
    assert_eq!(body["history"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["history"][0]["role"], "user");

    let resp = server.client.get(server.api("/chat")).bearer_auth(&buyer).send().await?;
    let body: Value = resp.json().await?;
    assert_eq!(body["results"], 0);

    let resp = server.client.delete(server.api("/chat")).bearer_auth(&farmer).send().await?;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = server.client.get(server.api("/chat")).bearer_auth(&farmer).send().await?;
    let body: Value = resp.json().await?;
    assert_eq!(body["results"], 0);
    Ok(())
}

#[tokio::test]
async fn blank_message_is_400() -> Result<()> {
    let server = TestServer::with_chat(Arc::new(CannedBackend)).await?;
    let token = server.signup("farmer@example.com", "farmer").await?;

    let resp = server
        .client
        .post(server.api("/chat"))
        .bearer_auth(&token)
        .json(&json!({ "message": "   " }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn unconfigured_assistant_is_503() -> Result<()> {
    let server = TestServer::start().await?;
    let token = server.signup("farmer@example.com", "farmer").await?;

    let resp = server
        .client
        .post(server.api("/chat"))
        .bearer_auth(&token)
        .json(&json!({ "message": "hello" }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = resp.json().await?;
    assert_eq!(body["status"], "error");
    Ok(())
}

#[tokio::test]
async fn upstream_failure_is_502_and_not_recorded() -> Result<()> {
    let server = TestServer::with_chat(Arc::new(FailingBackend)).await?;
    let token = server.signup("farmer@example.com", "farmer").await?;

    let resp = server
        .client
        .post(server.api("/chat"))
        .bearer_auth(&token)
        .json(&json!({ "message": "hello" }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body: Value = resp.json().await?;
    assert!(!body["message"].as_str().unwrap_or_default().contains("connection refused"));

    let resp = server.client.get(server.api("/chat")).bearer_auth(&token).send().await?;
    let body: Value = resp.json().await?;
    assert_eq!(body["results"], 0);
    Ok(())
}
