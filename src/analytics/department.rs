use serde::Serialize;
use std::collections::BTreeMap;

use super::merge::tally_map;
use super::{AnalyticsError, Aggregator};
use crate::store::ProjectScope;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentAnalytics {
    pub dept_id: i32,
    pub department_name: String,
    pub research_focus: Option<String>,
    pub established_year: Option<i32>,
    pub budget: Option<f64>,
    pub faculty_count: i64,
    /// Only positions that occur; faculty without a position are left out.
    pub faculty_positions_distribution: BTreeMap<String, i64>,
    pub student_count: i64,
    pub student_program_distribution: BTreeMap<String, i64>,
    pub project_count: i64,
    pub active_projects: i64,
    /// Raw sum of `Project.budget` for the department. Not max-merged.
    pub total_project_budget: f64,
}

impl Aggregator {
    #[tracing::instrument(skip(self))]
    pub async fn department_analytics(&self, dept_id: i32) -> Result<DepartmentAnalytics, AnalyticsError> {
        let mut reader = self.open().await?;

        let Some(department) = reader.department(dept_id).await? else {
            reader.finish().await?;
            return Err(AnalyticsError::not_found("Department", dept_id));
        };

        let scope = ProjectScope::department(dept_id);
        let faculty_count = reader.count_faculty(Some(dept_id)).await?;
        let faculty_positions_distribution = tally_map(reader.faculty_positions(Some(dept_id)).await?);
        let student_count = reader.count_students(Some(dept_id)).await?;
        let student_program_distribution = tally_map(reader.student_programs(Some(dept_id)).await?);
        let project_count = reader.count_projects(&scope).await?;
        let active_projects = reader.count_projects(&scope.active_only(&self.active)).await?;
        let total_project_budget = reader.sum_project_budget(Some(dept_id)).await?;

        reader.finish().await?;

        Ok(DepartmentAnalytics {
            dept_id,
            department_name: department.dept_name,
            research_focus: department.research_focus,
            established_year: department.established_year,
            budget: department.budget,
            faculty_count,
            faculty_positions_distribution,
            student_count,
            student_program_distribution,
            project_count,
            active_projects,
            total_project_budget,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;

    #[tokio::test]
    async fn missing_department_runs_no_aggregates() {
        let (aggregator, probe) = Fixture::new()
            .department(1, "Physics")
            .faculty(1, Some(1), Some("Professor"))
            .aggregator();

        let err = aggregator.department_analytics(404).await.unwrap_err();
        assert!(matches!(err, AnalyticsError::NotFound { entity: "Department", id: 404 }));
        assert_eq!(err.to_string(), "Department with id 404 not found");
        assert_eq!(probe.lookups(), 1);
        assert_eq!(probe.aggregates(), 0);
    }

    #[tokio::test]
    async fn position_distribution_round_trip() {
        let (aggregator, _) = Fixture::new()
            .department(7, "Mathematics")
            .faculty(1, Some(7), Some("Professor"))
            .faculty(2, Some(7), Some("Professor"))
            .faculty(3, Some(7), Some("Lecturer"))
            .faculty(4, Some(8), Some("Lecturer"))
            .aggregator();

        let analytics = aggregator.department_analytics(7).await.unwrap();
        assert_eq!(analytics.faculty_count, 3);
        assert_eq!(
            analytics.faculty_positions_distribution,
            BTreeMap::from([("Lecturer".to_string(), 1), ("Professor".to_string(), 2)])
        );
    }

    #[tokio::test]
    async fn faculty_without_position_count_but_are_not_distributed() {
        let (aggregator, _) = Fixture::new()
            .department(1, "Physics")
            .faculty(1, Some(1), Some("Professor"))
            .faculty(2, Some(1), None)
            .aggregator();

        let analytics = aggregator.department_analytics(1).await.unwrap();
        assert_eq!(analytics.faculty_count, 2);
        assert_eq!(analytics.faculty_positions_distribution.values().sum::<i64>(), 1);
    }

    #[tokio::test]
    async fn budget_is_raw_project_sum() {
        let (aggregator, _) = Fixture::new()
            .department(1, "Physics")
            .project(1, Some(1), "Active", Some(1000.0), Some("2020-01-01"))
            .project(2, Some(1), "Completed", Some(250.0), None)
            .project(3, Some(1), "On Hold", None, None)
            .project(4, Some(2), "Active", Some(9999.0), None)
            .funding_source(1, "NSF", "Government")
            .allocation(1, 1, 50_000.0, Some("2020-01-01"))
            .aggregator();

        let analytics = aggregator.department_analytics(1).await.unwrap();
        assert_eq!(analytics.total_project_budget, 1250.0);
        assert_eq!(analytics.project_count, 3);
        assert_eq!(analytics.active_projects, 1);
    }

    #[tokio::test]
    async fn empty_department_reports_zeros() {
        let (aggregator, _) = Fixture::new().department(5, "New").aggregator();

        let analytics = aggregator.department_analytics(5).await.unwrap();
        assert_eq!(analytics.department_name, "New");
        assert_eq!(analytics.faculty_count, 0);
        assert!(analytics.faculty_positions_distribution.is_empty());
        assert!(analytics.student_program_distribution.is_empty());
        assert_eq!(analytics.total_project_budget, 0.0);
    }
}
