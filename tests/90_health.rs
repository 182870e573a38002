mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

use common::TestServer;

#[tokio::test]
async fn health_reports_database_ok() -> Result<()> {
    let server = TestServer::start().await?;

    let resp = server.client.get(server.url("/health")).send().await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await?;
    assert_eq!(body["data"]["database"], "ok");
    assert_eq!(body["data"]["assistant"], false);
    Ok(())
}

#[tokio::test]
async fn root_describes_the_service() -> Result<()> {
    let server = TestServer::start().await?;

    let resp = server.client.get(server.url("/")).send().await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await?;
    assert_eq!(body["data"]["name"], "FarmBazaar API");
    Ok(())
}

#[tokio::test]
async fn unknown_routes_are_json_404() -> Result<()> {
    let server = TestServer::start().await?;

    let resp = server.client.get(server.url("/api/v1/nothing-here")).send().await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await?;
    assert_eq!(body["status"], "fail");
    assert_eq!(body["code"], "NOT_FOUND");
    Ok(())
}
