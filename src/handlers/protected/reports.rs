use axum::extract::{rejection::QueryRejection, Query, State};

use crate::analytics::{FacultyReport, ProjectReport, PublicationReport};
use crate::filter::{FacultyFilter, ProjectFilter, PublicationFilter};
use crate::middleware::{ApiResponse, ApiResult};
use crate::routes::AppState;

/// GET /api/reports/publications?dept_id=&year=&type=
pub async fn publications(
    State(state): State<AppState>,
    filter: Result<Query<PublicationFilter>, QueryRejection>,
) -> ApiResult<PublicationReport> {
    let Query(filter) = filter?;
    let report = state.aggregator.publication_report(filter).await?;
    Ok(ApiResponse::success(report))
}

/// GET /api/reports/faculty?dept_id=&position=
pub async fn faculty(
    State(state): State<AppState>,
    filter: Result<Query<FacultyFilter>, QueryRejection>,
) -> ApiResult<FacultyReport> {
    let Query(filter) = filter?;
    let report = state.aggregator.faculty_report(filter).await?;
    Ok(ApiResponse::success(report))
}

/// GET /api/reports/projects?dept_id=&status=
pub async fn projects(
    State(state): State<AppState>,
    filter: Result<Query<ProjectFilter>, QueryRejection>,
) -> ApiResult<ProjectReport> {
    let Query(filter) = filter?;
    let report = state.aggregator.project_report(filter).await?;
    Ok(ApiResponse::success(report))
}
