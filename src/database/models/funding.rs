use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct FundingSource {
    pub funding_id: i32,
    pub source_name: String,
    /// Government, Private, University or International
    pub source_type: String,
    #[serde(default)]
    pub contact_info: Option<String>,
}

/// One row of `project_funding`: an amount from a source to a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct FundingAllocation {
    pub project_id: i32,
    pub funding_id: i32,
    pub amount: f64,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub grant_number: Option<String>,
}
