use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Student {
    pub student_id: i32,
    pub first_name: String,
    pub last_name: String,
    /// "Masters" or "PhD"
    #[serde(default)]
    pub program_type: Option<String>,
    #[serde(default)]
    pub dept_id: Option<i32>,
    #[serde(default)]
    pub advisor_id: Option<i32>,
}
