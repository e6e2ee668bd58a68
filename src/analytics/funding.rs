use serde::Serialize;
use std::collections::BTreeMap;

use super::merge::{additive_by_year, desc_f64, top_n, year_map};
use super::{AnalyticsError, Aggregator};
use crate::store::{KeyAmount, SourceTotal};

const TOP_FUNDING_SOURCES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundingSummary {
    pub total_funding: f64,
    pub funding_by_type: BTreeMap<String, f64>,
    pub funding_by_year: BTreeMap<i32, f64>,
    pub top_funding_sources: Vec<SourceTotal>,
}

impl Aggregator {
    /// Per-year project budgets plus per-year allocations, summed. A project
    /// that also has allocations is counted twice on purpose.
    #[tracing::instrument(skip(self))]
    pub async fn funding_trends(&self) -> Result<BTreeMap<i32, f64>, AnalyticsError> {
        let mut reader = self.open().await?;
        let budgets = reader.project_budget_by_year().await?;
        let allocations = reader.funding_by_year().await?;
        reader.finish().await?;

        Ok(additive_by_year(&budgets, &allocations))
    }

    #[tracing::instrument(skip(self))]
    pub async fn funding_summary(&self) -> Result<FundingSummary, AnalyticsError> {
        let mut reader = self.open().await?;
        let total_funding = reader.sum_funding_amount().await?;
        let by_type = reader.funding_by_source_type().await?;
        let by_year = reader.funding_by_year().await?;
        let by_source = reader.funding_by_source().await?;
        reader.finish().await?;

        Ok(FundingSummary {
            total_funding,
            funding_by_type: by_type.into_iter().map(|KeyAmount { key, amount }| (key, amount)).collect(),
            funding_by_year: year_map(&by_year),
            top_funding_sources: top_n(by_source, TOP_FUNDING_SOURCES, |a, b| {
                desc_f64(a.total_amount, b.total_amount).then(a.funding_id.cmp(&b.funding_id))
            }),
        })
    }
}
