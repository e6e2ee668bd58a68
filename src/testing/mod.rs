use chrono::NaiveDate;
use std::sync::Arc;

use crate::analytics::{ActiveRule, Aggregator};
use crate::database::models::{
    Department, Faculty, FundingAllocation, FundingSource, Project, Publication, PublicationAuthor, Student,
};
use crate::store::{Dataset, MemoryStore, QueryProbe};

/// Parse a `YYYY-MM-DD` literal.
pub fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("test date literal")
}

/// Builder for small in-memory datasets used by unit tests.
#[derive(Default)]
pub struct Fixture {
    data: Dataset,
}

impl Fixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn department(mut self, dept_id: i32, name: &str) -> Self {
        self.data.departments.push(Department::new(dept_id, name));
        self
    }

    pub fn faculty(mut self, faculty_id: i32, dept_id: Option<i32>, position: Option<&str>) -> Self {
        self.data.faculty.push(Faculty {
            faculty_id,
            first_name: "Member".to_string(),
            last_name: faculty_id.to_string(),
            email: format!("f{}@uni.edu", faculty_id),
            position: position.map(str::to_string),
            dept_id,
            hire_date: None,
            research_interests: None,
        });
        self
    }

    pub fn student(mut self, student_id: i32, dept_id: Option<i32>, program: &str, advisor_id: Option<i32>) -> Self {
        self.data.students.push(Student {
            student_id,
            first_name: "Student".to_string(),
            last_name: student_id.to_string(),
            program_type: Some(program.to_string()),
            dept_id,
            advisor_id,
        });
        self
    }

    pub fn project(
        mut self,
        project_id: i32,
        dept_id: Option<i32>,
        status: &str,
        budget: Option<f64>,
        start: Option<&str>,
    ) -> Self {
        self.data.projects.push(Project {
            project_id,
            project_title: format!("Project {}", project_id),
            description: None,
            status: Some(status.to_string()),
            is_active: Some(status == "Active"),
            budget,
            start_date: start.map(date),
            end_date: None,
            dept_id,
        });
        self
    }

    pub fn publication(
        mut self,
        publication_id: i32,
        project_id: Option<i32>,
        kind: &str,
        published: Option<&str>,
        citations: i32,
    ) -> Self {
        self.data.publications.push(Publication {
            publication_id,
            title: format!("Paper {}", publication_id),
            publication_type: kind.to_string(),
            journal_name: None,
            publication_date: published.map(date),
            citation_count: Some(citations),
            project_id,
        });
        self
    }

    pub fn author(mut self, publication_id: i32, faculty_id: i32, author_order: i32) -> Self {
        self.data.publication_authors.push(PublicationAuthor {
            publication_id,
            faculty_id,
            author_order,
            is_corresponding: None,
        });
        self
    }

    pub fn funding_source(mut self, funding_id: i32, name: &str, source_type: &str) -> Self {
        self.data.funding_sources.push(FundingSource {
            funding_id,
            source_name: name.to_string(),
            source_type: source_type.to_string(),
            contact_info: None,
        });
        self
    }

    pub fn allocation(mut self, project_id: i32, funding_id: i32, amount: f64, start: Option<&str>) -> Self {
        self.data.project_funding.push(FundingAllocation {
            project_id,
            funding_id,
            amount,
            start_date: start.map(date),
            end_date: None,
            grant_number: None,
        });
        self
    }

    pub fn build(self) -> Dataset {
        self.data
    }

    /// Aggregator over this dataset with the default status rule.
    pub fn aggregator(self) -> (Aggregator, Arc<QueryProbe>) {
        self.aggregator_with(ActiveRule::default())
    }

    pub fn aggregator_with(self, rule: ActiveRule) -> (Aggregator, Arc<QueryProbe>) {
        let store = MemoryStore::new(self.data);
        let probe = store.probe();
        (Aggregator::new(Arc::new(store), rule), probe)
    }
}
