//! In-process store over a frozen [`Dataset`].
//!
//! Backs `serve --fixture` and the test suites. Query semantics mirror the
//! Postgres store: inner joins drop rows whose parent is missing, outer joins
//! keep them with `None`, grouped results only contain non-empty groups.

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;

use super::{
    AttributedTally, AuthorCredit, AuthorTally, DepartmentTally, FacultyRow, FundedProject, KeyAmount,
    ProjectScope, PublicationRow, ResearchStore, SourceTotal, StoreError, StoreReader, Tally, YearAmount,
};
use crate::database::models::{
    Department, Faculty, FundingAllocation, FundingSource, Project, Publication, PublicationAuthor, Student,
};
use crate::filter::{FacultyFilter, ProjectFilter, PublicationFilter};

/// Every table the analytics layer reads, as plain rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Dataset {
    pub departments: Vec<Department>,
    pub faculty: Vec<Faculty>,
    pub students: Vec<Student>,
    pub projects: Vec<Project>,
    pub publications: Vec<Publication>,
    pub publication_authors: Vec<PublicationAuthor>,
    pub funding_sources: Vec<FundingSource>,
    pub project_funding: Vec<FundingAllocation>,
}

impl Dataset {
    pub fn from_json_str(raw: &str) -> Result<Self, StoreError> {
        serde_json::from_str(raw).map_err(|e| StoreError::Fixture(e.to_string()))
    }

    pub async fn load(path: &Path) -> Result<Self, StoreError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| StoreError::Fixture(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&raw)
    }

    fn department(&self, dept_id: i32) -> Option<&Department> {
        self.departments.iter().find(|d| d.dept_id == dept_id)
    }

    fn project(&self, project_id: i32) -> Option<&Project> {
        self.projects.iter().find(|p| p.project_id == project_id)
    }

    fn faculty_member(&self, faculty_id: i32) -> Option<&Faculty> {
        self.faculty.iter().find(|f| f.faculty_id == faculty_id)
    }

    fn publication(&self, publication_id: i32) -> Option<&Publication> {
        self.publications.iter().find(|p| p.publication_id == publication_id)
    }

    /// publications → research_projects, LEFT JOIN
    fn publication_project(&self, publication: &Publication) -> Option<&Project> {
        publication.project_id.and_then(|id| self.project(id))
    }

    /// … → departments, LEFT JOIN
    fn publication_department(&self, publication: &Publication) -> Option<&Department> {
        self.publication_project(publication)
            .and_then(|p| p.dept_id)
            .and_then(|id| self.department(id))
    }

    fn publication_matches(&self, publication: &Publication, filter: &PublicationFilter) -> bool {
        if let Some(dept_id) = filter.dept_id {
            let project_dept = self.publication_project(publication).and_then(|p| p.dept_id);
            if project_dept != Some(dept_id) {
                return false;
            }
        }
        if let Some(year) = filter.year {
            if publication.publication_date.map(|d| d.year()) != Some(year) {
                return false;
            }
        }
        if let Some(kind) = filter.publication_type.as_deref() {
            if publication.publication_type != kind {
                return false;
            }
        }
        true
    }
}

/// Counts the queries issued against a [`MemoryStore`].
#[derive(Debug, Default)]
pub struct QueryProbe {
    lookups: AtomicUsize,
    aggregates: AtomicUsize,
}

impl QueryProbe {
    /// Point lookups by primary key.
    pub fn lookups(&self) -> usize {
        self.lookups.load(AtomicOrdering::SeqCst)
    }

    /// Everything else: counts, sums, group-bys and listings.
    pub fn aggregates(&self) -> usize {
        self.aggregates.load(AtomicOrdering::SeqCst)
    }

    pub fn reset(&self) {
        self.lookups.store(0, AtomicOrdering::SeqCst);
        self.aggregates.store(0, AtomicOrdering::SeqCst);
    }

    fn lookup(&self) {
        self.lookups.fetch_add(1, AtomicOrdering::SeqCst);
    }

    fn aggregate(&self) {
        self.aggregates.fetch_add(1, AtomicOrdering::SeqCst);
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    data: Arc<Dataset>,
    probe: Arc<QueryProbe>,
}

impl MemoryStore {
    pub fn new(data: Dataset) -> Self {
        Self {
            data: Arc::new(data),
            probe: Arc::new(QueryProbe::default()),
        }
    }

    pub fn empty() -> Self {
        Self::new(Dataset::default())
    }

    pub async fn load(path: &Path) -> Result<Self, StoreError> {
        let data = Dataset::load(path).await?;
        tracing::info!(
            departments = data.departments.len(),
            faculty = data.faculty.len(),
            projects = data.projects.len(),
            publications = data.publications.len(),
            "Loaded fixture dataset from {}",
            path.display()
        );
        Ok(Self::new(data))
    }

    pub fn probe(&self) -> Arc<QueryProbe> {
        Arc::clone(&self.probe)
    }

    pub fn dataset(&self) -> &Dataset {
        &self.data
    }
}

#[async_trait]
impl ResearchStore for MemoryStore {
    async fn reader(&self) -> Result<Box<dyn StoreReader>, StoreError> {
        Ok(Box::new(MemoryReader {
            data: Arc::clone(&self.data),
            probe: Arc::clone(&self.probe),
            finished: false,
        }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

pub struct MemoryReader {
    data: Arc<Dataset>,
    probe: Arc<QueryProbe>,
    finished: bool,
}

impl MemoryReader {
    fn data(&self) -> Result<&Dataset, StoreError> {
        if self.finished {
            return Err(StoreError::Query("read scope already finished".to_string()));
        }
        Ok(&self.data)
    }

    fn aggregate(&self) -> Result<&Dataset, StoreError> {
        let data = self.data()?;
        self.probe.aggregate();
        Ok(data)
    }

    fn lookup(&self) -> Result<&Dataset, StoreError> {
        let data = self.data()?;
        self.probe.lookup();
        Ok(data)
    }
}

#[async_trait]
impl StoreReader for MemoryReader {
    async fn department(&mut self, dept_id: i32) -> Result<Option<Department>, StoreError> {
        Ok(self.lookup()?.department(dept_id).cloned())
    }

    async fn funding_source(&mut self, funding_id: i32) -> Result<Option<FundingSource>, StoreError> {
        Ok(self
            .lookup()?
            .funding_sources
            .iter()
            .find(|s| s.funding_id == funding_id)
            .cloned())
    }

    async fn count_departments(&mut self) -> Result<i64, StoreError> {
        Ok(self.aggregate()?.departments.len() as i64)
    }

    async fn count_faculty(&mut self, dept_id: Option<i32>) -> Result<i64, StoreError> {
        let data = self.aggregate()?;
        Ok(data.faculty.iter().filter(|f| in_dept(f.dept_id, dept_id)).count() as i64)
    }

    async fn count_students(&mut self, dept_id: Option<i32>) -> Result<i64, StoreError> {
        let data = self.aggregate()?;
        Ok(data.students.iter().filter(|s| in_dept(s.dept_id, dept_id)).count() as i64)
    }

    async fn count_projects(&mut self, scope: &ProjectScope) -> Result<i64, StoreError> {
        let data = self.aggregate()?;
        Ok(data
            .projects
            .iter()
            .filter(|p| in_dept(p.dept_id, scope.dept_id))
            .filter(|p| scope.active.as_ref().map_or(true, |rule| rule.matches(p)))
            .count() as i64)
    }

    async fn count_publications(&mut self) -> Result<i64, StoreError> {
        Ok(self.aggregate()?.publications.len() as i64)
    }

    async fn sum_project_budget(&mut self, dept_id: Option<i32>) -> Result<f64, StoreError> {
        let data = self.aggregate()?;
        Ok(data
            .projects
            .iter()
            .filter(|p| in_dept(p.dept_id, dept_id))
            .filter_map(|p| p.budget)
            .sum())
    }

    async fn sum_funding_amount(&mut self) -> Result<f64, StoreError> {
        Ok(self.aggregate()?.project_funding.iter().map(|a| a.amount).sum())
    }

    async fn faculty_positions(&mut self, dept_id: Option<i32>) -> Result<Vec<Tally>, StoreError> {
        let data = self.aggregate()?;
        Ok(tallies(
            data.faculty
                .iter()
                .filter(|f| in_dept(f.dept_id, dept_id))
                .filter_map(|f| f.position.clone()),
        ))
    }

    async fn student_programs(&mut self, dept_id: Option<i32>) -> Result<Vec<Tally>, StoreError> {
        let data = self.aggregate()?;
        Ok(tallies(
            data.students
                .iter()
                .filter(|s| in_dept(s.dept_id, dept_id))
                .filter_map(|s| s.program_type.clone()),
        ))
    }

    async fn faculty_per_department(&mut self) -> Result<Vec<DepartmentTally>, StoreError> {
        let data = self.aggregate()?;
        let mut grouped: BTreeMap<i32, DepartmentTally> = BTreeMap::new();
        for member in &data.faculty {
            let Some(dept) = member.dept_id.and_then(|id| data.department(id)) else {
                continue;
            };
            grouped
                .entry(dept.dept_id)
                .or_insert_with(|| DepartmentTally {
                    dept_id: dept.dept_id,
                    dept_name: dept.dept_name.clone(),
                    count: 0,
                })
                .count += 1;
        }
        Ok(grouped.into_values().collect())
    }

    async fn publications_per_department(&mut self) -> Result<Vec<AttributedTally>, StoreError> {
        let data = self.aggregate()?;
        let mut named: BTreeMap<String, i64> = BTreeMap::new();
        let mut unattributed = 0i64;
        for publication in &data.publications {
            match data.publication_department(publication) {
                Some(dept) => *named.entry(dept.dept_name.clone()).or_insert(0) += 1,
                None => unattributed += 1,
            }
        }
        let mut rows: Vec<AttributedTally> = named
            .into_iter()
            .map(|(name, count)| AttributedTally { department: Some(name), count })
            .collect();
        if unattributed > 0 {
            rows.push(AttributedTally { department: None, count: unattributed });
        }
        Ok(rows)
    }

    async fn project_budget_by_year(&mut self) -> Result<Vec<YearAmount>, StoreError> {
        let data = self.aggregate()?;
        Ok(year_amounts(
            data.projects
                .iter()
                .map(|p| (p.start_date, p.budget.unwrap_or(0.0))),
        ))
    }

    async fn funding_by_year(&mut self) -> Result<Vec<YearAmount>, StoreError> {
        let data = self.aggregate()?;
        Ok(year_amounts(data.project_funding.iter().map(|a| (a.start_date, a.amount))))
    }

    async fn funding_by_source_type(&mut self) -> Result<Vec<KeyAmount>, StoreError> {
        let data = self.aggregate()?;
        let mut grouped: BTreeMap<String, f64> = BTreeMap::new();
        for allocation in &data.project_funding {
            if let Some(source) = data.funding_sources.iter().find(|s| s.funding_id == allocation.funding_id) {
                *grouped.entry(source.source_type.clone()).or_insert(0.0) += allocation.amount;
            }
        }
        Ok(grouped
            .into_iter()
            .map(|(key, amount)| KeyAmount { key, amount })
            .collect())
    }

    async fn funding_by_source(&mut self) -> Result<Vec<SourceTotal>, StoreError> {
        let data = self.aggregate()?;
        let mut grouped: BTreeMap<i32, SourceTotal> = BTreeMap::new();
        for allocation in &data.project_funding {
            let Some(source) = data.funding_sources.iter().find(|s| s.funding_id == allocation.funding_id) else {
                continue;
            };
            grouped
                .entry(source.funding_id)
                .or_insert_with(|| SourceTotal {
                    funding_id: source.funding_id,
                    source_name: source.source_name.clone(),
                    total_amount: 0.0,
                })
                .total_amount += allocation.amount;
        }
        Ok(grouped.into_values().collect())
    }

    async fn author_tallies(&mut self, filter: &PublicationFilter) -> Result<Vec<AuthorTally>, StoreError> {
        let data = self.aggregate()?;
        let mut grouped: BTreeMap<i32, AuthorTally> = BTreeMap::new();
        for credit in &data.publication_authors {
            let (Some(member), Some(publication)) =
                (data.faculty_member(credit.faculty_id), data.publication(credit.publication_id))
            else {
                continue;
            };
            if !data.publication_matches(publication, filter) {
                continue;
            }
            let tally = grouped.entry(member.faculty_id).or_insert_with(|| AuthorTally {
                faculty_id: member.faculty_id,
                name: member.full_name(),
                publication_count: 0,
                citation_sum: 0,
            });
            tally.publication_count += 1;
            tally.citation_sum += i64::from(publication.citation_count.unwrap_or(0));
        }
        Ok(grouped.into_values().collect())
    }

    async fn publications(&mut self, filter: &PublicationFilter) -> Result<Vec<PublicationRow>, StoreError> {
        let data = self.aggregate()?;
        let mut rows: Vec<PublicationRow> = data
            .publications
            .iter()
            .filter(|p| data.publication_matches(p, filter))
            .map(|p| {
                let dept = data.publication_department(p);
                PublicationRow {
                    publication_id: p.publication_id,
                    title: p.title.clone(),
                    publication_type: p.publication_type.clone(),
                    journal_name: p.journal_name.clone(),
                    publication_date: p.publication_date,
                    citation_count: p.citation_count.unwrap_or(0),
                    project_id: p.project_id,
                    dept_id: data.publication_project(p).and_then(|pr| pr.dept_id),
                    dept_name: dept.map(|d| d.dept_name.clone()),
                }
            })
            .collect();
        rows.sort_by(|a, b| {
            newest_first(a.publication_date, b.publication_date).then(a.publication_id.cmp(&b.publication_id))
        });
        Ok(rows)
    }

    async fn publication_credits(&mut self, filter: &PublicationFilter) -> Result<Vec<AuthorCredit>, StoreError> {
        let data = self.aggregate()?;
        let mut credits: Vec<AuthorCredit> = data
            .publication_authors
            .iter()
            .filter_map(|credit| {
                let member = data.faculty_member(credit.faculty_id)?;
                let publication = data.publication(credit.publication_id)?;
                data.publication_matches(publication, filter).then(|| AuthorCredit {
                    publication_id: credit.publication_id,
                    faculty_id: credit.faculty_id,
                    name: member.full_name(),
                    author_order: credit.author_order,
                })
            })
            .collect();
        credits.sort_by_key(|c| (c.publication_id, c.author_order));
        Ok(credits)
    }

    async fn faculty_listing(&mut self, filter: &FacultyFilter) -> Result<Vec<FacultyRow>, StoreError> {
        let data = self.aggregate()?;
        let mut rows: Vec<FacultyRow> = data
            .faculty
            .iter()
            .filter(|f| in_dept(f.dept_id, filter.dept_id))
            .filter(|f| filter.position.is_none() || f.position == filter.position)
            .map(|f| FacultyRow {
                faculty_id: f.faculty_id,
                name: f.full_name(),
                email: f.email.clone(),
                position: f.position.clone(),
                department: f.dept_id.and_then(|id| data.department(id)).map(|d| d.dept_name.clone()),
                hire_date: f.hire_date,
                research_interests: f.research_interests.clone(),
                advisee_count: data
                    .students
                    .iter()
                    .filter(|s| s.advisor_id == Some(f.faculty_id))
                    .count() as i64,
            })
            .collect();
        rows.sort_by_key(|r| r.faculty_id);
        Ok(rows)
    }

    async fn project_listing(&mut self, filter: &ProjectFilter) -> Result<Vec<Project>, StoreError> {
        let data = self.aggregate()?;
        let mut rows: Vec<Project> = data
            .projects
            .iter()
            .filter(|p| in_dept(p.dept_id, filter.dept_id))
            .filter(|p| filter.status.is_none() || p.status == filter.status)
            .cloned()
            .collect();
        rows.sort_by_key(|p| p.project_id);
        Ok(rows)
    }

    async fn funded_projects(&mut self, funding_id: i32) -> Result<Vec<FundedProject>, StoreError> {
        let data = self.aggregate()?;
        let mut rows: Vec<FundedProject> = data
            .project_funding
            .iter()
            .filter(|a| a.funding_id == funding_id)
            .filter_map(|a| {
                let project = data.project(a.project_id)?;
                Some(FundedProject {
                    project_id: project.project_id,
                    project_title: project.project_title.clone(),
                    amount: a.amount,
                    start_date: a.start_date,
                    end_date: a.end_date,
                    grant_number: a.grant_number.clone(),
                })
            })
            .collect();
        rows.sort_by(|a, b| oldest_first(a.start_date, b.start_date).then(a.project_id.cmp(&b.project_id)));
        Ok(rows)
    }

    async fn finish(&mut self) -> Result<(), StoreError> {
        self.finished = true;
        Ok(())
    }
}

/// `dept_id = $n` when a department filter is present.
fn in_dept(row_dept: Option<i32>, filter: Option<i32>) -> bool {
    filter.map_or(true, |wanted| row_dept == Some(wanted))
}

fn tallies(keys: impl Iterator<Item = String>) -> Vec<Tally> {
    let mut grouped: BTreeMap<String, i64> = BTreeMap::new();
    for key in keys {
        *grouped.entry(key).or_insert(0) += 1;
    }
    grouped.into_iter().map(|(key, count)| Tally { key, count }).collect()
}

/// Rows without a date are dropped, not bucketed.
fn year_amounts(rows: impl Iterator<Item = (Option<NaiveDate>, f64)>) -> Vec<YearAmount> {
    let mut grouped: BTreeMap<i32, f64> = BTreeMap::new();
    for (date, amount) in rows {
        if let Some(date) = date {
            *grouped.entry(date.year()).or_insert(0.0) += amount;
        }
    }
    grouped
        .into_iter()
        .map(|(year, amount)| YearAmount { year, amount })
        .collect()
}

/// `ORDER BY date DESC NULLS LAST`
fn newest_first(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// `ORDER BY date NULLS LAST`
fn oldest_first(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "departments": [{"dept_id": 1, "dept_name": "Physics"}],
        "faculty": [
            {"faculty_id": 10, "first_name": "Ada", "last_name": "Byron", "email": "ada@uni.edu", "position": "Professor", "dept_id": 1}
        ],
        "projects": [
            {"project_id": 100, "project_title": "Lattice", "status": "Active", "budget": 1000.0, "start_date": "2021-03-01", "dept_id": 1},
            {"project_id": 101, "project_title": "Orphan", "budget": 50.0}
        ],
        "publications": [
            {"publication_id": 1, "title": "A", "publication_type": "Book", "publication_date": "2021-05-01", "citation_count": 3, "project_id": 100},
            {"publication_id": 2, "title": "B", "publication_type": "Book", "publication_date": "2022-05-01", "project_id": 101},
            {"publication_id": 3, "title": "C", "publication_type": "Patent"}
        ],
        "publication_authors": [
            {"publication_id": 1, "faculty_id": 10, "author_order": 1},
            {"publication_id": 3, "faculty_id": 99, "author_order": 1}
        ]
    }"#;

    fn store() -> MemoryStore {
        MemoryStore::new(Dataset::from_json_str(FIXTURE).unwrap())
    }

    #[tokio::test]
    async fn fixture_fields_default_when_absent() {
        let store = store();
        let data = store.dataset();
        assert_eq!(data.departments[0].budget, None);
        assert!(data.students.is_empty());
        assert!(data.funding_sources.is_empty());
    }

    #[tokio::test]
    async fn publications_without_department_are_unattributed() {
        let store = store();
        let mut reader = store.reader().await.unwrap();
        let rows = reader.publications_per_department().await.unwrap();
        assert_eq!(
            rows,
            vec![
                AttributedTally { department: Some("Physics".to_string()), count: 1 },
                AttributedTally { department: None, count: 2 },
            ]
        );
    }

    #[tokio::test]
    async fn author_join_drops_unknown_faculty() {
        let store = store();
        let mut reader = store.reader().await.unwrap();
        let tallies = reader.author_tallies(&PublicationFilter::default()).await.unwrap();
        assert_eq!(tallies.len(), 1);
        assert_eq!(tallies[0].name, "Ada Byron");
        assert_eq!(tallies[0].citation_sum, 3);
    }

    #[tokio::test]
    async fn listing_is_newest_first_with_undated_last() {
        let store = store();
        let mut reader = store.reader().await.unwrap();
        let ids: Vec<i32> = reader
            .publications(&PublicationFilter::default())
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.publication_id)
            .collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[tokio::test]
    async fn probe_counts_by_kind_and_finish_closes_scope() {
        let store = store();
        let probe = store.probe();
        let mut reader = store.reader().await.unwrap();
        reader.department(1).await.unwrap();
        reader.count_faculty(None).await.unwrap();
        reader.sum_project_budget(Some(1)).await.unwrap();
        assert_eq!(probe.lookups(), 1);
        assert_eq!(probe.aggregates(), 2);

        reader.finish().await.unwrap();
        assert!(reader.count_departments().await.is_err());
    }

    #[test]
    fn malformed_fixture_is_reported() {
        let err = Dataset::from_json_str("{\"departments\": 3}").unwrap_err();
        assert!(matches!(err, StoreError::Fixture(_)));
    }
}
