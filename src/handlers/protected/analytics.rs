use axum::extract::{rejection::PathRejection, Path, State};
use std::collections::BTreeMap;

use crate::analytics::{DashboardSummary, DepartmentAnalytics};
use crate::middleware::{ApiResponse, ApiResult};
use crate::routes::AppState;

/// GET /api/analytics/dashboard
pub async fn dashboard(State(state): State<AppState>) -> ApiResult<DashboardSummary> {
    let summary = state.aggregator.dashboard_summary().await?;
    Ok(ApiResponse::success(summary))
}

/// GET /api/analytics/department/:dept_id
pub async fn department(
    State(state): State<AppState>,
    dept_id: Result<Path<i32>, PathRejection>,
) -> ApiResult<DepartmentAnalytics> {
    let Path(dept_id) = dept_id?;
    let analytics = state.aggregator.department_analytics(dept_id).await?;
    Ok(ApiResponse::success(analytics))
}

/// GET /api/analytics/publications-by-department
pub async fn publications_by_department(State(state): State<AppState>) -> ApiResult<BTreeMap<String, i64>> {
    let counts = state.aggregator.publications_by_department().await?;
    Ok(ApiResponse::success(counts))
}

/// GET /api/analytics/funding-trends
///
/// Keys are years; both project budgets and allocations contribute.
pub async fn funding_trends(State(state): State<AppState>) -> ApiResult<BTreeMap<i32, f64>> {
    let trends = state.aggregator.funding_trends().await?;
    Ok(ApiResponse::success(trends))
}
