use serde::{Deserialize, Serialize};

use crate::database::models::Project;
use crate::filter::FilterWhere;

/// The "is this project active" predicate.
///
/// Older revisions of `research_projects` carry a boolean `is_active` column,
/// newer ones a `status` string. The aggregator never assumes either; it is
/// handed one of these at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActiveRule {
    /// `status = value`
    Status { value: String },
    /// `is_active = TRUE`
    Flag,
}

impl ActiveRule {
    pub const DEFAULT_STATUS: &'static str = "Active";

    pub fn status(value: impl Into<String>) -> Self {
        ActiveRule::Status { value: value.into() }
    }

    pub fn matches(&self, project: &Project) -> bool {
        match self {
            ActiveRule::Status { value } => project.status.as_deref() == Some(value.as_str()),
            ActiveRule::Flag => project.is_active == Some(true),
        }
    }

    /// Append the SQL form of this predicate for the projects table aliased `alias`.
    pub fn push_condition(&self, filter: &mut FilterWhere, alias: &str) {
        match self {
            ActiveRule::Status { value } => {
                filter.eq(&format!("{}.status", alias), value.as_str());
            }
            ActiveRule::Flag => {
                filter.raw(format!("{}.is_active = TRUE", alias));
            }
        }
    }
}

impl Default for ActiveRule {
    fn default() -> Self {
        ActiveRule::status(Self::DEFAULT_STATUS)
    }
}
