use axum::extract::{rejection::PathRejection, Path, State};

use crate::analytics::{FundingSourceReport, FundingSummary};
use crate::middleware::{ApiResponse, ApiResult};
use crate::routes::AppState;

/// GET /api/funding-sources/summary
pub async fn summary(State(state): State<AppState>) -> ApiResult<FundingSummary> {
    let summary = state.aggregator.funding_summary().await?;
    Ok(ApiResponse::success(summary))
}

/// GET /api/funding-sources/:funding_id
pub async fn source(
    State(state): State<AppState>,
    funding_id: Result<Path<i32>, PathRejection>,
) -> ApiResult<FundingSourceReport> {
    let Path(funding_id) = funding_id?;
    let report = state.aggregator.funding_source_report(funding_id).await?;
    Ok(ApiResponse::success(report))
}
