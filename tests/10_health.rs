mod common;

use anyhow::Result;
use reqwest::StatusCode;

use common::TestServer;

#[tokio::test]
async fn root_lists_endpoints() -> Result<()> {
    let server = TestServer::open().await?;
    let data = server.data("/").await?;

    assert_eq!(data["name"], "Research Portal API");
    assert!(data["endpoints"]["analytics"].as_str().unwrap().contains("/api/analytics/dashboard"));
    Ok(())
}

#[tokio::test]
async fn health_reports_ok_for_fixture_store() -> Result<()> {
    let server = TestServer::open().await?;
    let (status, body) = server.get("/health").await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn health_is_public_when_auth_is_required() -> Result<()> {
    let server = TestServer::secured().await?;
    let (status, _) = server.get("/health").await?;

    assert_eq!(status, StatusCode::OK);
    Ok(())
}
