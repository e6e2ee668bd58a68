mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

use common::TestServer;

#[tokio::test]
async fn funding_summary() -> Result<()> {
    let server = TestServer::open().await?;
    let data = server.data("/api/funding-sources/summary").await?;

    assert_eq!(data["total_funding"].as_f64(), Some(1_400_000.0));
    assert_eq!(data["funding_by_type"]["Government"].as_f64(), Some(550_000.0));
    assert_eq!(data["funding_by_type"]["Private"].as_f64(), Some(500_000.0));
    assert_eq!(data["funding_by_type"]["University"].as_f64(), Some(150_000.0));
    assert_eq!(data["funding_by_type"]["International"].as_f64(), Some(200_000.0));
    assert_eq!(data["funding_by_year"]["2023"].as_f64(), Some(600_000.0));
    assert!(data["funding_by_year"].get("null").is_none());

    let top: Vec<i64> = data["top_funding_sources"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["funding_id"].as_i64().unwrap())
        .collect();
    assert_eq!(top, vec![2, 1, 5, 4, 3]);
    Ok(())
}

#[tokio::test]
async fn funding_source_report() -> Result<()> {
    let server = TestServer::open().await?;
    let data = server.data("/api/funding-sources/3").await?;

    assert_eq!(data["source_name"], "University Research Fund");
    assert_eq!(data["source_type"], "University");
    assert_eq!(data["total_funding"].as_f64(), Some(150_000.0));

    let projects: Vec<i64> = data["funded_projects"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["project_id"].as_i64().unwrap())
        .collect();
    assert_eq!(projects, vec![102, 105]);
    assert_eq!(data["funded_projects"][0]["grant_number"], json!("URF-20-12"));
    Ok(())
}

#[tokio::test]
async fn unknown_funding_source_is_404() -> Result<()> {
    let server = TestServer::open().await?;
    let (status, body) = server.get("/api/funding-sources/42").await?;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Funding source with id 42 not found");
    Ok(())
}
