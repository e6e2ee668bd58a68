mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

use common::TestServer;

#[tokio::test]
async fn dashboard_summary() -> Result<()> {
    let server = TestServer::open().await?;
    let data = server.data("/api/analytics/dashboard").await?;

    assert_eq!(data["departments_count"], 3);
    assert_eq!(data["faculty_count"], 6);
    assert_eq!(data["student_count"], 5);
    assert_eq!(data["students_by_program"], json!({"Masters": 2, "PhD": 3}));
    assert_eq!(data["active_projects"], 3);
    assert_eq!(data["publications_count"], 6);

    // Both totals are reported; the larger one is authoritative
    assert_eq!(data["project_budget_total"].as_f64(), Some(1_450_000.0));
    assert_eq!(data["funding_allocation_total"].as_f64(), Some(1_400_000.0));
    assert_eq!(data["total_budget"].as_f64(), Some(1_450_000.0));

    assert_eq!(
        data["department_with_most_faculty"],
        json!({"dept_id": 1, "name": "Computer Science", "faculty_count": 3})
    );
    Ok(())
}

#[tokio::test]
async fn department_analytics() -> Result<()> {
    let server = TestServer::open().await?;
    let data = server.data("/api/analytics/department/1").await?;

    assert_eq!(data["department_name"], "Computer Science");
    assert_eq!(data["established_year"], 1965);
    assert_eq!(data["faculty_count"], 3);
    assert_eq!(
        data["faculty_positions_distribution"],
        json!({"Associate Professor": 1, "Lecturer": 1, "Professor": 1})
    );
    assert_eq!(data["student_program_distribution"], json!({"Masters": 1, "PhD": 1}));
    assert_eq!(data["project_count"], 2);
    assert_eq!(data["active_projects"], 1);
    // Raw project budgets only, allocations are not merged in
    assert_eq!(data["total_project_budget"].as_f64(), Some(750_000.0));
    Ok(())
}

#[tokio::test]
async fn unknown_department_is_404_naming_the_id() -> Result<()> {
    let server = TestServer::open().await?;
    let (status, body) = server.get("/api/analytics/department/999").await?;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], true);
    assert_eq!(body["code"], "NOT_FOUND");
    assert!(body["message"].as_str().unwrap().contains("999"));
    Ok(())
}

#[tokio::test]
async fn non_numeric_department_id_is_400() -> Result<()> {
    let server = TestServer::open().await?;
    let (status, body) = server.get("/api/analytics/department/physics").await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
    Ok(())
}

#[tokio::test]
async fn publications_by_department_buckets_unlinked_under_general() -> Result<()> {
    let server = TestServer::open().await?;
    let data = server.data("/api/analytics/publications-by-department").await?;

    assert_eq!(
        data,
        json!({"Biology": 1, "Computer Science": 3, "General": 1, "Physics": 1})
    );
    Ok(())
}

#[tokio::test]
async fn funding_trends_add_both_series_and_skip_undated() -> Result<()> {
    let server = TestServer::open().await?;
    let data = server.data("/api/analytics/funding-trends").await?;

    let years = data.as_object().unwrap();
    assert_eq!(years.keys().cloned().collect::<Vec<_>>(), vec!["2020", "2022", "2023"]);
    assert_eq!(data["2020"].as_f64(), Some(350_000.0));
    assert_eq!(data["2022"].as_f64(), Some(950_000.0));
    assert_eq!(data["2023"].as_f64(), Some(1_000_000.0));
    Ok(())
}
