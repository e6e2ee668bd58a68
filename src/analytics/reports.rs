//! Listing reports: faculty, projects and a single funding source.

use serde::Serialize;
use std::collections::BTreeMap;

use super::{AnalyticsError, Aggregator};
use crate::database::models::{FundingSource, Project};
use crate::filter::{FacultyFilter, ProjectFilter};
use crate::store::{FacultyRow, FundedProject};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacultyReport {
    pub filters: FacultyFilter,
    pub summary: FacultySummary,
    pub faculty: Vec<FacultyRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacultySummary {
    pub total_faculty: i64,
    pub position_distribution: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectReport {
    pub filters: ProjectFilter,
    pub summary: ProjectSummary,
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectSummary {
    pub total_projects: i64,
    pub active_projects: i64,
    /// Everything not active, whatever its status.
    pub completed_projects: i64,
    pub total_budget: f64,
    pub avg_budget: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundingSourceReport {
    #[serde(flatten)]
    pub source: FundingSource,
    pub funded_projects: Vec<FundedProject>,
    pub total_funding: f64,
}

impl Aggregator {
    #[tracing::instrument(skip(self))]
    pub async fn faculty_report(&self, filter: FacultyFilter) -> Result<FacultyReport, AnalyticsError> {
        let filter = filter.normalized();

        let mut reader = self.open().await?;
        let faculty = reader.faculty_listing(&filter).await?;
        reader.finish().await?;

        let mut position_distribution = BTreeMap::new();
        for member in &faculty {
            if let Some(position) = &member.position {
                *position_distribution.entry(position.clone()).or_insert(0) += 1;
            }
        }

        Ok(FacultyReport {
            filters: filter,
            summary: FacultySummary {
                total_faculty: faculty.len() as i64,
                position_distribution,
            },
            faculty,
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn project_report(&self, filter: ProjectFilter) -> Result<ProjectReport, AnalyticsError> {
        let filter = filter.normalized();

        let mut reader = self.open().await?;
        let projects = reader.project_listing(&filter).await?;
        reader.finish().await?;

        let total_projects = projects.len() as i64;
        let active_projects = projects.iter().filter(|p| self.active.matches(p)).count() as i64;
        let total_budget: f64 = projects.iter().filter_map(|p| p.budget).sum();
        let avg_budget = if total_projects > 0 {
            total_budget / total_projects as f64
        } else {
            0.0
        };

        Ok(ProjectReport {
            filters: filter,
            summary: ProjectSummary {
                total_projects,
                active_projects,
                completed_projects: total_projects - active_projects,
                total_budget,
                avg_budget,
            },
            projects,
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn funding_source_report(&self, funding_id: i32) -> Result<FundingSourceReport, AnalyticsError> {
        let mut reader = self.open().await?;

        let Some(source) = reader.funding_source(funding_id).await? else {
            reader.finish().await?;
            return Err(AnalyticsError::not_found("Funding source", funding_id));
        };
        let funded_projects = reader.funded_projects(funding_id).await?;
        reader.finish().await?;

        let total_funding = funded_projects.iter().map(|p| p.amount).sum();
        Ok(FundingSourceReport {
            source,
            funded_projects,
            total_funding,
        })
    }
}
