use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Filters for the publication report. Every present field narrows the set
/// (AND); absent fields are no-ops.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublicationFilter {
    /// Department of the publication's linked project.
    pub dept_id: Option<i32>,
    /// Calendar year of `publication_date`.
    pub year: Option<i32>,
    #[serde(rename = "type", alias = "publication_type")]
    pub publication_type: Option<String>,
}

impl PublicationFilter {
    /// Blank strings from query parameters (`?type=`) mean "no filter".
    pub fn normalized(mut self) -> Self {
        self.publication_type = non_blank(self.publication_type);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacultyFilter {
    pub dept_id: Option<i32>,
    pub position: Option<String>,
}

impl FacultyFilter {
    pub fn normalized(mut self) -> Self {
        self.position = non_blank(self.position);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectFilter {
    pub dept_id: Option<i32>,
    pub status: Option<String>,
}

impl ProjectFilter {
    pub fn normalized(mut self) -> Self {
        self.status = non_blank(self.status);
        self
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Generated SQL plus its positional parameters.
#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<Value>,
}
