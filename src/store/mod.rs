//! Read-only data store behind the analytics layer.
//!
//! A [`ResearchStore`] hands out one [`StoreReader`] per aggregation call. The
//! reader is a consistent read scope (a read-only transaction for Postgres, a
//! frozen snapshot for the in-memory store); every query of one aggregation
//! goes through the same reader, which is closed with [`StoreReader::finish`].

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;
use thiserror::Error;

use crate::analytics::ActiveRule;
use crate::database::models::{Department, FundingSource, Project};
use crate::filter::{FacultyFilter, ProjectFilter, PublicationFilter};

pub use memory::{Dataset, MemoryStore, QueryProbe};
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Fixture error: {0}")]
    Fixture(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Configuration(_) => StoreError::Unavailable(err.to_string()),
            other => StoreError::Query(other.to_string()),
        }
    }
}

#[async_trait]
pub trait ResearchStore: Send + Sync {
    /// Open a read scope for one aggregation call.
    async fn reader(&self) -> Result<Box<dyn StoreReader>, StoreError>;

    /// Connectivity probe for `/health`.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Queries available inside one read scope. Sums are null-coalesced to zero;
/// grouped queries only return groups that have at least one row.
#[async_trait]
pub trait StoreReader: Send {
    // Point lookups
    async fn department(&mut self, dept_id: i32) -> Result<Option<Department>, StoreError>;
    async fn funding_source(&mut self, funding_id: i32) -> Result<Option<FundingSource>, StoreError>;

    // Counts and sums
    async fn count_departments(&mut self) -> Result<i64, StoreError>;
    async fn count_faculty(&mut self, dept_id: Option<i32>) -> Result<i64, StoreError>;
    async fn count_students(&mut self, dept_id: Option<i32>) -> Result<i64, StoreError>;
    async fn count_projects(&mut self, scope: &ProjectScope) -> Result<i64, StoreError>;
    async fn count_publications(&mut self) -> Result<i64, StoreError>;
    async fn sum_project_budget(&mut self, dept_id: Option<i32>) -> Result<f64, StoreError>;
    async fn sum_funding_amount(&mut self) -> Result<f64, StoreError>;

    // Group-bys
    async fn faculty_positions(&mut self, dept_id: Option<i32>) -> Result<Vec<Tally>, StoreError>;
    async fn student_programs(&mut self, dept_id: Option<i32>) -> Result<Vec<Tally>, StoreError>;
    async fn faculty_per_department(&mut self) -> Result<Vec<DepartmentTally>, StoreError>;
    async fn publications_per_department(&mut self) -> Result<Vec<AttributedTally>, StoreError>;
    async fn project_budget_by_year(&mut self) -> Result<Vec<YearAmount>, StoreError>;
    async fn funding_by_year(&mut self) -> Result<Vec<YearAmount>, StoreError>;
    async fn funding_by_source_type(&mut self) -> Result<Vec<KeyAmount>, StoreError>;
    async fn funding_by_source(&mut self) -> Result<Vec<SourceTotal>, StoreError>;
    async fn author_tallies(&mut self, filter: &PublicationFilter) -> Result<Vec<AuthorTally>, StoreError>;

    // Listings
    async fn publications(&mut self, filter: &PublicationFilter) -> Result<Vec<PublicationRow>, StoreError>;
    async fn publication_credits(&mut self, filter: &PublicationFilter) -> Result<Vec<AuthorCredit>, StoreError>;
    async fn faculty_listing(&mut self, filter: &FacultyFilter) -> Result<Vec<FacultyRow>, StoreError>;
    async fn project_listing(&mut self, filter: &ProjectFilter) -> Result<Vec<Project>, StoreError>;
    async fn funded_projects(&mut self, funding_id: i32) -> Result<Vec<FundedProject>, StoreError>;

    /// Release the read scope. Nothing is ever written, so this only rolls back.
    async fn finish(&mut self) -> Result<(), StoreError>;
}

/// Which projects a project count covers.
#[derive(Debug, Clone, Default)]
pub struct ProjectScope {
    pub dept_id: Option<i32>,
    pub active: Option<ActiveRule>,
}

impl ProjectScope {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn department(dept_id: i32) -> Self {
        Self { dept_id: Some(dept_id), active: None }
    }

    pub fn active_only(mut self, rule: &ActiveRule) -> Self {
        self.active = Some(rule.clone());
        self
    }
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Tally {
    pub key: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct KeyAmount {
    pub key: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct YearAmount {
    pub year: i32,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct DepartmentTally {
    pub dept_id: i32,
    pub dept_name: String,
    pub count: i64,
}

/// Count keyed by department name; `None` when no department is reachable.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct AttributedTally {
    pub department: Option<String>,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct SourceTotal {
    pub funding_id: i32,
    pub source_name: String,
    pub total_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct AuthorTally {
    pub faculty_id: i32,
    pub name: String,
    pub publication_count: i64,
    pub citation_sum: i64,
}

/// A publication joined with its project's department (if any).
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct PublicationRow {
    pub publication_id: i32,
    pub title: String,
    pub publication_type: String,
    pub journal_name: Option<String>,
    pub publication_date: Option<NaiveDate>,
    pub citation_count: i32,
    pub project_id: Option<i32>,
    pub dept_id: Option<i32>,
    pub dept_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct AuthorCredit {
    pub publication_id: i32,
    pub faculty_id: i32,
    pub name: String,
    pub author_order: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct FacultyRow {
    pub faculty_id: i32,
    pub name: String,
    pub email: String,
    pub position: Option<String>,
    pub department: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub research_interests: Option<String>,
    pub advisee_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct FundedProject {
    pub project_id: i32,
    pub project_title: String,
    pub amount: f64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub grant_number: Option<String>,
}
