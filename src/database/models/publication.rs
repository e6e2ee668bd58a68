use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Publication {
    pub publication_id: i32,
    pub title: String,
    pub publication_type: String,
    #[serde(default)]
    pub journal_name: Option<String>,
    #[serde(default)]
    pub publication_date: Option<NaiveDate>,
    #[serde(default)]
    pub citation_count: Option<i32>,
    #[serde(default)]
    pub project_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PublicationAuthor {
    pub publication_id: i32,
    pub faculty_id: i32,
    pub author_order: i32,
    /// 'Y' or 'N'
    #[serde(default)]
    pub is_corresponding: Option<String>,
}
