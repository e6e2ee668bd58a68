use serde::Serialize;
use std::collections::BTreeMap;

use super::merge::{max_merge, tally_map};
use super::{AnalyticsError, Aggregator};
use crate::store::{DepartmentTally, ProjectScope};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub departments_count: i64,
    pub faculty_count: i64,
    pub student_count: i64,
    pub students_by_program: BTreeMap<String, i64>,
    pub active_projects: i64,
    /// Sum of `Project.budget`.
    pub project_budget_total: f64,
    /// Sum of `FundingAllocation.amount`.
    pub funding_allocation_total: f64,
    /// The larger of the two totals above.
    pub total_budget: f64,
    pub publications_count: i64,
    pub department_with_most_faculty: Option<DepartmentLeader>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentLeader {
    pub dept_id: i32,
    pub name: String,
    pub faculty_count: i64,
}

impl Aggregator {
    #[tracing::instrument(skip(self))]
    pub async fn dashboard_summary(&self) -> Result<DashboardSummary, AnalyticsError> {
        let mut reader = self.open().await?;

        let departments_count = reader.count_departments().await?;
        let faculty_count = reader.count_faculty(None).await?;
        let student_count = reader.count_students(None).await?;
        let students_by_program = tally_map(reader.student_programs(None).await?);
        let active_projects = reader
            .count_projects(&ProjectScope::all().active_only(&self.active))
            .await?;
        let project_budget_total = reader.sum_project_budget(None).await?;
        let funding_allocation_total = reader.sum_funding_amount().await?;
        let publications_count = reader.count_publications().await?;
        let department_with_most_faculty = leading_department(reader.faculty_per_department().await?);

        reader.finish().await?;

        Ok(DashboardSummary {
            departments_count,
            faculty_count,
            student_count,
            students_by_program,
            active_projects,
            project_budget_total,
            funding_allocation_total,
            total_budget: max_merge(project_budget_total, funding_allocation_total),
            publications_count,
            department_with_most_faculty,
        })
    }
}

/// Highest faculty count wins; ties go to the lowest `dept_id`.
fn leading_department(rows: Vec<DepartmentTally>) -> Option<DepartmentLeader> {
    rows.into_iter()
        .filter(|row| row.count > 0)
        .min_by(|a, b| b.count.cmp(&a.count).then(a.dept_id.cmp(&b.dept_id)))
        .map(|row| DepartmentLeader {
            dept_id: row.dept_id,
            name: row.dept_name,
            faculty_count: row.count,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;

    #[tokio::test]
    async fn empty_store_yields_zeros() {
        let (aggregator, _) = Fixture::new().aggregator();
        let summary = aggregator.dashboard_summary().await.unwrap();

        assert_eq!(summary.departments_count, 0);
        assert_eq!(summary.faculty_count, 0);
        assert_eq!(summary.student_count, 0);
        assert!(summary.students_by_program.is_empty());
        assert_eq!(summary.active_projects, 0);
        assert_eq!(summary.total_budget, 0.0);
        assert_eq!(summary.publications_count, 0);
        assert_eq!(summary.department_with_most_faculty, None);
    }

    #[tokio::test]
    async fn total_budget_is_the_larger_of_both_totals() {
        let (aggregator, _) = Fixture::new()
            .department(1, "Physics")
            .project(10, Some(1), "Active", Some(1000.0), Some("2021-01-01"))
            .project(11, Some(1), "Completed", None, None)
            .funding_source(1, "NSF", "Government")
            .allocation(10, 1, 900.0, Some("2021-02-01"))
            .allocation(11, 1, 600.0, None)
            .aggregator();

        let summary = aggregator.dashboard_summary().await.unwrap();
        assert_eq!(summary.project_budget_total, 1000.0);
        assert_eq!(summary.funding_allocation_total, 1500.0);
        assert_eq!(summary.total_budget, 1500.0);
        assert_eq!(summary.active_projects, 1);
    }

    #[tokio::test]
    async fn most_faculty_ties_go_to_lowest_id() {
        let (aggregator, _) = Fixture::new()
            .department(3, "Chemistry")
            .department(2, "Biology")
            .department(9, "Empty")
            .faculty(1, Some(3), Some("Professor"))
            .faculty(2, Some(2), Some("Lecturer"))
            .faculty(3, None, Some("Lecturer"))
            .aggregator();

        let summary = aggregator.dashboard_summary().await.unwrap();
        assert_eq!(
            summary.department_with_most_faculty,
            Some(DepartmentLeader { dept_id: 2, name: "Biology".into(), faculty_count: 1 })
        );
        assert_eq!(summary.faculty_count, 3);
    }

    #[tokio::test]
    async fn students_grouped_by_program() {
        let (aggregator, _) = Fixture::new()
            .department(1, "Physics")
            .student(1, Some(1), "PhD", None)
            .student(2, Some(1), "PhD", None)
            .student(3, None, "Masters", None)
            .aggregator();

        let summary = aggregator.dashboard_summary().await.unwrap();
        assert_eq!(summary.student_count, 3);
        assert_eq!(summary.students_by_program.get("PhD"), Some(&2));
        assert_eq!(summary.students_by_program.get("Masters"), Some(&1));
    }

    #[tokio::test]
    async fn flag_rule_counts_boolean_projects() {
        let (aggregator, _) = Fixture::new()
            .project(1, None, "Active", None, None)
            .project(2, None, "Completed", None, None)
            .aggregator_with(crate::analytics::ActiveRule::Flag);

        assert_eq!(aggregator.dashboard_summary().await.unwrap().active_projects, 1);
    }
}
