//! Derived read-only views over the research store.
//!
//! Every operation opens one [`StoreReader`], issues its queries through it,
//! closes it and returns a plain serializable struct. Nothing here writes.

pub mod active;
mod dashboard;
mod department;
mod funding;
pub mod merge;
mod publications;
mod reports;

use std::sync::Arc;
use thiserror::Error;

use crate::store::{ResearchStore, StoreError, StoreReader};

pub use active::ActiveRule;
pub use dashboard::{DashboardSummary, DepartmentLeader};
pub use department::DepartmentAnalytics;
pub use funding::FundingSummary;
pub use publications::{DepartmentBreakdown, PublicationEntry, PublicationReport};
pub use reports::{FacultyReport, FacultySummary, FundingSourceReport, ProjectReport, ProjectSummary};

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: i32 },

    /// Filters only ever AND together, so nothing raises this today.
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AnalyticsError {
    pub fn not_found(entity: &'static str, id: i32) -> Self {
        AnalyticsError::NotFound { entity, id }
    }
}

/// Entry point for all aggregate views.
#[derive(Clone)]
pub struct Aggregator {
    store: Arc<dyn ResearchStore>,
    active: ActiveRule,
}

impl Aggregator {
    pub fn new(store: Arc<dyn ResearchStore>, active: ActiveRule) -> Self {
        Self { store, active }
    }

    pub fn active_rule(&self) -> &ActiveRule {
        &self.active
    }

    async fn open(&self) -> Result<Box<dyn StoreReader>, AnalyticsError> {
        Ok(self.store.reader().await?)
    }
}
