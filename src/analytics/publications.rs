use chrono::{Datelike, NaiveDate, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use super::merge::{attribute, top_n, GENERAL_BUCKET};
use super::{AnalyticsError, Aggregator};
use crate::filter::PublicationFilter;
use crate::store::{AuthorCredit, AuthorTally, PublicationRow};

const TOP_AUTHORS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicationReport {
    pub filters: PublicationFilter,
    pub total_publications: i64,
    pub total_citations: i64,
    pub publications_this_year: i64,
    pub by_type: BTreeMap<String, i64>,
    pub by_year: BTreeMap<i32, i64>,
    pub top_authors: Vec<AuthorTally>,
    /// Only when the report is not already narrowed to one department.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by_department: Option<Vec<DepartmentBreakdown>>,
    pub publications: Vec<PublicationEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentBreakdown {
    pub department: String,
    pub publication_count: i64,
    pub citation_sum: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicationEntry {
    pub publication_id: i32,
    pub title: String,
    pub publication_type: String,
    pub journal_name: Option<String>,
    pub publication_date: Option<NaiveDate>,
    pub citation_count: i32,
    pub department: Option<String>,
    /// Author names in `author_order`.
    pub authors: Vec<String>,
}

impl Aggregator {
    /// Publication counts per department name, unattributed ones under "General".
    #[tracing::instrument(skip(self))]
    pub async fn publications_by_department(&self) -> Result<BTreeMap<String, i64>, AnalyticsError> {
        let mut reader = self.open().await?;
        let rows = reader.publications_per_department().await?;
        reader.finish().await?;

        Ok(attribute(rows))
    }

    #[tracing::instrument(skip(self))]
    pub async fn publication_report(&self, filter: PublicationFilter) -> Result<PublicationReport, AnalyticsError> {
        let filter = filter.normalized();

        let mut reader = self.open().await?;
        let rows = reader.publications(&filter).await?;
        let credits = reader.publication_credits(&filter).await?;
        let authors = reader.author_tallies(&filter).await?;
        reader.finish().await?;

        Ok(build_report(filter, rows, credits, authors, Utc::now().year()))
    }
}

fn build_report(
    filter: PublicationFilter,
    rows: Vec<PublicationRow>,
    credits: Vec<AuthorCredit>,
    authors: Vec<AuthorTally>,
    current_year: i32,
) -> PublicationReport {
    let mut by_type: BTreeMap<String, i64> = BTreeMap::new();
    let mut by_year: BTreeMap<i32, i64> = BTreeMap::new();
    let mut departments: HashMap<String, DepartmentBreakdown> = HashMap::new();
    let mut total_citations = 0i64;
    let mut publications_this_year = 0i64;

    for row in &rows {
        let citations = i64::from(row.citation_count);
        total_citations += citations;
        *by_type.entry(row.publication_type.clone()).or_insert(0) += 1;
        if let Some(year) = row.publication_date.map(|d| d.year()) {
            *by_year.entry(year).or_insert(0) += 1;
            if year == current_year {
                publications_this_year += 1;
            }
        }

        let name = row.dept_name.clone().unwrap_or_else(|| GENERAL_BUCKET.to_string());
        let entry = departments.entry(name.clone()).or_insert_with(|| DepartmentBreakdown {
            department: name,
            publication_count: 0,
            citation_sum: 0,
        });
        entry.publication_count += 1;
        entry.citation_sum += citations;
    }

    let by_department = filter.dept_id.is_none().then(|| {
        let mut breakdown: Vec<DepartmentBreakdown> = departments.into_values().collect();
        breakdown.sort_by(|a, b| {
            b.publication_count
                .cmp(&a.publication_count)
                .then_with(|| a.department.cmp(&b.department))
        });
        breakdown
    });

    let top_authors = top_n(authors, TOP_AUTHORS, |a, b| {
        b.publication_count
            .cmp(&a.publication_count)
            .then(b.citation_sum.cmp(&a.citation_sum))
    });

    let mut names: HashMap<i32, Vec<String>> = HashMap::new();
    for credit in credits {
        names.entry(credit.publication_id).or_default().push(credit.name);
    }

    let publications = rows
        .into_iter()
        .map(|row| PublicationEntry {
            authors: names.remove(&row.publication_id).unwrap_or_default(),
            publication_id: row.publication_id,
            title: row.title,
            publication_type: row.publication_type,
            journal_name: row.journal_name,
            publication_date: row.publication_date,
            citation_count: row.citation_count,
            department: row.dept_name,
        })
        .collect::<Vec<_>>();

    PublicationReport {
        filters: filter,
        total_publications: publications.len() as i64,
        total_citations,
        publications_this_year,
        by_type,
        by_year,
        top_authors,
        by_department,
        publications,
    }
}
