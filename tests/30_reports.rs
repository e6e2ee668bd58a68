mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

use common::TestServer;

#[tokio::test]
async fn publication_report_unfiltered() -> Result<()> {
    let server = TestServer::open().await?;
    let data = server.data("/api/reports/publications").await?;

    assert_eq!(data["total_publications"], 6);
    assert_eq!(data["total_citations"], 145);
    assert_eq!(
        data["by_type"],
        json!({"Book": 1, "Conference Paper": 2, "Journal Article": 3})
    );
    assert_eq!(
        data["by_year"],
        json!({"2019": 1, "2021": 1, "2022": 1, "2023": 2})
    );

    let ranked: Vec<i64> = data["top_authors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["faculty_id"].as_i64().unwrap())
        .collect();
    assert_eq!(ranked, vec![2, 1, 3, 4, 5, 6]);

    let departments: Vec<&str> = data["by_department"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["department"].as_str().unwrap())
        .collect();
    assert_eq!(departments, vec!["Computer Science", "Biology", "General", "Physics"]);
    assert_eq!(data["by_department"][0]["citation_sum"], 77);
    Ok(())
}

#[tokio::test]
async fn publication_report_for_one_department() -> Result<()> {
    let server = TestServer::open().await?;
    let data = server.data("/api/reports/publications?dept_id=1").await?;

    assert_eq!(data["filters"]["dept_id"], 1);
    assert_eq!(data["total_publications"], 3);
    assert_eq!(data["total_citations"], 77);
    assert!(data.get("by_department").is_none());

    let first = &data["publications"][0];
    assert_eq!(first["publication_id"], 1002);
    assert_eq!(first["authors"], json!(["Bob Martinez", "Alice Chen", "Carol Nguyen"]));

    assert_eq!(data["top_authors"][0]["name"], "Bob Martinez");
    assert_eq!(data["top_authors"][0]["publication_count"], 3);
    Ok(())
}

#[tokio::test]
async fn publication_filters_combine() -> Result<()> {
    let server = TestServer::open().await?;

    let data = server.data("/api/reports/publications?year=2023").await?;
    assert_eq!(data["total_publications"], 2);

    let data = server.data("/api/reports/publications?year=2023&type=Journal%20Article").await?;
    assert_eq!(data["total_publications"], 1);
    assert_eq!(data["publications"][0]["title"], "Reef Microbiome Atlas");

    let data = server.data("/api/reports/publications?type=").await?;
    assert_eq!(data["total_publications"], 6);
    Ok(())
}

#[tokio::test]
async fn malformed_year_is_400() -> Result<()> {
    let server = TestServer::open().await?;
    let (status, body) = server.get("/api/reports/publications?year=last").await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], true);
    Ok(())
}

#[tokio::test]
async fn faculty_report() -> Result<()> {
    let server = TestServer::open().await?;
    let data = server.data("/api/reports/faculty?dept_id=1").await?;

    assert_eq!(data["summary"]["total_faculty"], 3);
    assert_eq!(data["faculty"][0]["name"], "Alice Chen");
    assert_eq!(data["faculty"][0]["advisee_count"], 2);
    assert_eq!(data["faculty"][0]["department"], "Computer Science");

    let data = server.data("/api/reports/faculty?position=Professor").await?;
    assert_eq!(data["summary"]["position_distribution"], json!({"Professor": 3}));
    Ok(())
}

#[tokio::test]
async fn project_report() -> Result<()> {
    let server = TestServer::open().await?;
    let data = server.data("/api/reports/projects").await?;

    let summary = &data["summary"];
    assert_eq!(summary["total_projects"], 5);
    assert_eq!(summary["active_projects"], 3);
    assert_eq!(summary["completed_projects"], 2);
    assert_eq!(summary["total_budget"].as_f64(), Some(1_450_000.0));
    assert_eq!(summary["avg_budget"].as_f64(), Some(290_000.0));

    let data = server.data("/api/reports/projects?status=Active&dept_id=2").await?;
    assert_eq!(data["summary"]["total_projects"], 1);
    assert_eq!(data["projects"][0]["project_title"], "Coral Reef Genomics");
    Ok(())
}
