use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Department {
    pub dept_id: i32,
    pub dept_name: String,
    #[serde(default)]
    pub dept_head: Option<String>,
    #[serde(default)]
    pub research_focus: Option<String>,
    #[serde(default)]
    pub established_year: Option<i32>,
    #[serde(default)]
    pub budget: Option<f64>,
}

impl Department {
    pub fn new(dept_id: i32, dept_name: impl Into<String>) -> Self {
        Self {
            dept_id,
            dept_name: dept_name.into(),
            dept_head: None,
            research_focus: None,
            established_year: None,
            budget: None,
        }
    }
}
