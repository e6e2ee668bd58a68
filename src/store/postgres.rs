use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{FromRow, PgConnection, PgPool, Postgres, Transaction};
use std::time::{Duration, Instant};

use super::{
    AttributedTally, AuthorCredit, AuthorTally, DepartmentTally, FacultyRow, FundedProject, KeyAmount,
    ProjectScope, PublicationRow, ResearchStore, SourceTotal, StoreError, StoreReader, Tally, YearAmount,
};
use crate::analytics::ActiveRule;
use crate::config::DatabaseConfig;
use crate::database::manager::DatabaseManager;
use crate::database::models::{Department, FundingSource, Project};
use crate::filter::{FacultyFilter, FilterWhere, ProjectFilter, PublicationFilter, SqlResult};

const PUBLICATION_JOINS: &str = "FROM publications p \
     LEFT JOIN research_projects pr ON pr.project_id = p.project_id \
     LEFT JOIN departments d ON d.dept_id = pr.dept_id";

const AUTHOR_JOINS: &str = "FROM publication_authors pa \
     JOIN faculty f ON f.faculty_id = pa.faculty_id \
     JOIN publications p ON p.publication_id = pa.publication_id \
     LEFT JOIN research_projects pr ON pr.project_id = p.project_id";

/// Postgres-backed store. Each reader is one read-only transaction.
pub struct PgStore {
    pool: PgPool,
    logging: QueryLogging,
    schema: ProjectSchema,
}

impl PgStore {
    /// `active` tells which revision of `research_projects` is deployed, so
    /// listings only select the columns that exist.
    pub fn new(pool: PgPool, config: &DatabaseConfig, active: &ActiveRule) -> Self {
        Self {
            pool,
            logging: QueryLogging::from_config(config),
            schema: ProjectSchema::for_rule(active),
        }
    }

    pub async fn connect(config: &DatabaseConfig, active: &ActiveRule) -> Result<Self, StoreError> {
        let pool = DatabaseManager::connect(config).await?;
        Ok(Self::new(pool, config, active))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ResearchStore for PgStore {
    async fn reader(&self) -> Result<Box<dyn StoreReader>, StoreError> {
        let mut tx = self.pool.begin().await?;
        // Nothing on this path writes; rollback on finish.
        sqlx::query("SET TRANSACTION ISOLATION LEVEL READ COMMITTED READ ONLY")
            .execute(&mut *tx)
            .await?;
        Ok(Box::new(PgReader {
            tx: Some(tx),
            logging: self.logging,
            schema: self.schema,
        }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

pub struct PgReader {
    tx: Option<Transaction<'static, Postgres>>,
    logging: QueryLogging,
    schema: ProjectSchema,
}

impl PgReader {
    fn conn(&mut self) -> Result<&mut PgConnection, StoreError> {
        self.tx
            .as_deref_mut()
            .ok_or_else(|| StoreError::Query("read scope already finished".to_string()))
    }

    async fn fetch_all<T>(&mut self, sql: &SqlResult) -> Result<Vec<T>, StoreError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let logging = self.logging;
        let conn = self.conn()?;
        let mut q = sqlx::query_as::<_, T>(&sql.query);
        for p in sql.params.iter() {
            q = bind_param_query_as(q, p);
        }
        let started = Instant::now();
        let rows = q.fetch_all(&mut *conn).await?;
        logging.observe(&sql.query, started.elapsed());
        Ok(rows)
    }

    async fn fetch_optional<T>(&mut self, sql: &SqlResult) -> Result<Option<T>, StoreError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        Ok(self.fetch_all::<T>(sql).await?.into_iter().next())
    }

    async fn fetch_count(&mut self, sql: &SqlResult) -> Result<i64, StoreError> {
        self.fetch_optional::<(i64,)>(sql)
            .await?
            .map(|row| row.0)
            .ok_or_else(|| StoreError::Query("count returned no row".to_string()))
    }

    async fn fetch_sum(&mut self, sql: &SqlResult) -> Result<f64, StoreError> {
        self.fetch_optional::<(f64,)>(sql)
            .await?
            .map(|row| row.0)
            .ok_or_else(|| StoreError::Query("sum returned no row".to_string()))
    }
}

#[async_trait]
impl StoreReader for PgReader {
    async fn department(&mut self, dept_id: i32) -> Result<Option<Department>, StoreError> {
        let mut w = FilterWhere::new();
        w.eq("d.dept_id", dept_id);
        let sql = with_where(
            "SELECT d.dept_id, d.dept_name, d.dept_head, d.research_focus, d.established_year, d.budget \
             FROM departments d",
            w,
            "",
        );
        self.fetch_optional(&sql).await
    }

    async fn funding_source(&mut self, funding_id: i32) -> Result<Option<FundingSource>, StoreError> {
        let mut w = FilterWhere::new();
        w.eq("fs.funding_id", funding_id);
        let sql = with_where(
            "SELECT fs.funding_id, fs.source_name, fs.source_type, fs.contact_info FROM funding_sources fs",
            w,
            "",
        );
        self.fetch_optional(&sql).await
    }

    async fn count_departments(&mut self) -> Result<i64, StoreError> {
        let sql = with_where("SELECT COUNT(*) FROM departments d", FilterWhere::new(), "");
        self.fetch_count(&sql).await
    }

    async fn count_faculty(&mut self, dept_id: Option<i32>) -> Result<i64, StoreError> {
        let mut w = FilterWhere::new();
        w.eq_opt("f.dept_id", dept_id);
        let sql = with_where("SELECT COUNT(*) FROM faculty f", w, "");
        self.fetch_count(&sql).await
    }

    async fn count_students(&mut self, dept_id: Option<i32>) -> Result<i64, StoreError> {
        let mut w = FilterWhere::new();
        w.eq_opt("s.dept_id", dept_id);
        let sql = with_where("SELECT COUNT(*) FROM students s", w, "");
        self.fetch_count(&sql).await
    }

    async fn count_projects(&mut self, scope: &ProjectScope) -> Result<i64, StoreError> {
        let sql = with_where("SELECT COUNT(*) FROM research_projects pr", project_scope_where(scope), "");
        self.fetch_count(&sql).await
    }

    async fn count_publications(&mut self) -> Result<i64, StoreError> {
        let sql = with_where("SELECT COUNT(*) FROM publications p", FilterWhere::new(), "");
        self.fetch_count(&sql).await
    }

    async fn sum_project_budget(&mut self, dept_id: Option<i32>) -> Result<f64, StoreError> {
        let mut w = FilterWhere::new();
        w.eq_opt("pr.dept_id", dept_id);
        let sql = with_where(
            "SELECT CAST(COALESCE(SUM(pr.budget), 0) AS DOUBLE PRECISION) FROM research_projects pr",
            w,
            "",
        );
        self.fetch_sum(&sql).await
    }

    async fn sum_funding_amount(&mut self) -> Result<f64, StoreError> {
        let sql = with_where(
            "SELECT CAST(COALESCE(SUM(pf.amount), 0) AS DOUBLE PRECISION) FROM project_funding pf",
            FilterWhere::new(),
            "",
        );
        self.fetch_sum(&sql).await
    }

    async fn faculty_positions(&mut self, dept_id: Option<i32>) -> Result<Vec<Tally>, StoreError> {
        let mut w = FilterWhere::new();
        w.is_not_null("f.position").eq_opt("f.dept_id", dept_id);
        let sql = with_where(
            "SELECT f.position AS key, COUNT(*) AS count FROM faculty f",
            w,
            "GROUP BY f.position ORDER BY f.position",
        );
        self.fetch_all(&sql).await
    }

    async fn student_programs(&mut self, dept_id: Option<i32>) -> Result<Vec<Tally>, StoreError> {
        let mut w = FilterWhere::new();
        w.is_not_null("s.program_type").eq_opt("s.dept_id", dept_id);
        let sql = with_where(
            "SELECT s.program_type AS key, COUNT(*) AS count FROM students s",
            w,
            "GROUP BY s.program_type ORDER BY s.program_type",
        );
        self.fetch_all(&sql).await
    }

    async fn faculty_per_department(&mut self) -> Result<Vec<DepartmentTally>, StoreError> {
        let sql = with_where(
            "SELECT d.dept_id, d.dept_name, COUNT(f.faculty_id) AS count \
             FROM departments d JOIN faculty f ON f.dept_id = d.dept_id",
            FilterWhere::new(),
            "GROUP BY d.dept_id, d.dept_name ORDER BY d.dept_id",
        );
        self.fetch_all(&sql).await
    }

    async fn publications_per_department(&mut self) -> Result<Vec<AttributedTally>, StoreError> {
        let sql = with_where(
            &format!("SELECT d.dept_name AS department, COUNT(p.publication_id) AS count {}", PUBLICATION_JOINS),
            FilterWhere::new(),
            "GROUP BY d.dept_name ORDER BY d.dept_name NULLS LAST",
        );
        self.fetch_all(&sql).await
    }

    async fn project_budget_by_year(&mut self) -> Result<Vec<YearAmount>, StoreError> {
        let mut w = FilterWhere::new();
        w.is_not_null("pr.start_date");
        let sql = with_where(
            "SELECT CAST(EXTRACT(YEAR FROM pr.start_date) AS INTEGER) AS year, \
             CAST(COALESCE(SUM(pr.budget), 0) AS DOUBLE PRECISION) AS amount \
             FROM research_projects pr",
            w,
            "GROUP BY 1 ORDER BY 1",
        );
        self.fetch_all(&sql).await
    }

    async fn funding_by_year(&mut self) -> Result<Vec<YearAmount>, StoreError> {
        let mut w = FilterWhere::new();
        w.is_not_null("pf.start_date");
        let sql = with_where(
            "SELECT CAST(EXTRACT(YEAR FROM pf.start_date) AS INTEGER) AS year, \
             CAST(COALESCE(SUM(pf.amount), 0) AS DOUBLE PRECISION) AS amount \
             FROM project_funding pf",
            w,
            "GROUP BY 1 ORDER BY 1",
        );
        self.fetch_all(&sql).await
    }

    async fn funding_by_source_type(&mut self) -> Result<Vec<KeyAmount>, StoreError> {
        let sql = with_where(
            "SELECT fs.source_type AS key, CAST(COALESCE(SUM(pf.amount), 0) AS DOUBLE PRECISION) AS amount \
             FROM funding_sources fs JOIN project_funding pf ON pf.funding_id = fs.funding_id",
            FilterWhere::new(),
            "GROUP BY fs.source_type ORDER BY fs.source_type",
        );
        self.fetch_all(&sql).await
    }

    async fn funding_by_source(&mut self) -> Result<Vec<SourceTotal>, StoreError> {
        let sql = with_where(
            "SELECT fs.funding_id, fs.source_name, \
             CAST(COALESCE(SUM(pf.amount), 0) AS DOUBLE PRECISION) AS total_amount \
             FROM funding_sources fs JOIN project_funding pf ON pf.funding_id = fs.funding_id",
            FilterWhere::new(),
            "GROUP BY fs.funding_id, fs.source_name ORDER BY fs.funding_id",
        );
        self.fetch_all(&sql).await
    }

    async fn author_tallies(&mut self, filter: &PublicationFilter) -> Result<Vec<AuthorTally>, StoreError> {
        let sql = with_where(
            &format!(
                "SELECT f.faculty_id, f.first_name || ' ' || f.last_name AS name, \
                 COUNT(DISTINCT p.publication_id) AS publication_count, \
                 CAST(COALESCE(SUM(COALESCE(p.citation_count, 0)), 0) AS BIGINT) AS citation_sum {}",
                AUTHOR_JOINS
            ),
            publication_where(filter),
            "GROUP BY f.faculty_id, f.first_name, f.last_name ORDER BY f.faculty_id",
        );
        self.fetch_all(&sql).await
    }

    async fn publications(&mut self, filter: &PublicationFilter) -> Result<Vec<PublicationRow>, StoreError> {
        let sql = with_where(
            &format!(
                "SELECT p.publication_id, p.title, p.publication_type, p.journal_name, p.publication_date, \
                 COALESCE(p.citation_count, 0) AS citation_count, p.project_id, pr.dept_id, d.dept_name {}",
                PUBLICATION_JOINS
            ),
            publication_where(filter),
            "ORDER BY p.publication_date DESC NULLS LAST, p.publication_id",
        );
        self.fetch_all(&sql).await
    }

    async fn publication_credits(&mut self, filter: &PublicationFilter) -> Result<Vec<AuthorCredit>, StoreError> {
        let sql = with_where(
            &format!(
                "SELECT pa.publication_id, pa.faculty_id, f.first_name || ' ' || f.last_name AS name, \
                 pa.author_order {}",
                AUTHOR_JOINS
            ),
            publication_where(filter),
            "ORDER BY pa.publication_id, pa.author_order",
        );
        self.fetch_all(&sql).await
    }

    async fn faculty_listing(&mut self, filter: &FacultyFilter) -> Result<Vec<FacultyRow>, StoreError> {
        let mut w = FilterWhere::new();
        w.eq_opt("f.dept_id", filter.dept_id)
            .eq_opt("f.position", filter.position.as_deref());
        let sql = with_where(
            "SELECT f.faculty_id, f.first_name || ' ' || f.last_name AS name, f.email, f.position, \
             d.dept_name AS department, f.hire_date, f.research_interests, \
             (SELECT COUNT(*) FROM students s WHERE s.advisor_id = f.faculty_id) AS advisee_count \
             FROM faculty f LEFT JOIN departments d ON d.dept_id = f.dept_id",
            w,
            "ORDER BY f.faculty_id",
        );
        self.fetch_all(&sql).await
    }

    async fn project_listing(&mut self, filter: &ProjectFilter) -> Result<Vec<Project>, StoreError> {
        let mut w = FilterWhere::new();
        w.eq_opt("pr.dept_id", filter.dept_id);
        if let Some(status) = filter.status.as_deref() {
            let placeholder = w.param(status);
            w.raw(format!("{} = {}", self.schema.status_expr(), placeholder));
        }
        let sql = with_where(
            &format!("SELECT {} FROM research_projects pr", self.schema.columns()),
            w,
            "ORDER BY pr.project_id",
        );
        self.fetch_all(&sql).await
    }

    async fn funded_projects(&mut self, funding_id: i32) -> Result<Vec<FundedProject>, StoreError> {
        let mut w = FilterWhere::new();
        w.eq("pf.funding_id", funding_id);
        let sql = with_where(
            "SELECT pr.project_id, pr.project_title, pf.amount, pf.start_date, pf.end_date, pf.grant_number \
             FROM project_funding pf JOIN research_projects pr ON pr.project_id = pf.project_id",
            w,
            "ORDER BY pf.start_date NULLS LAST, pr.project_id",
        );
        self.fetch_all(&sql).await
    }

    async fn finish(&mut self) -> Result<(), StoreError> {
        if let Some(tx) = self.tx.take() {
            tx.rollback().await?;
        }
        Ok(())
    }
}

fn with_where(select: &str, filter: FilterWhere, tail: &str) -> SqlResult {
    let mut query = format!("{} WHERE {}", select, filter.to_sql());
    if !tail.is_empty() {
        query.push(' ');
        query.push_str(tail);
    }
    SqlResult { query, params: filter.into_params() }
}

fn publication_where(filter: &PublicationFilter) -> FilterWhere {
    let mut w = FilterWhere::new();
    w.eq_opt("pr.dept_id", filter.dept_id);
    if let Some(year) = filter.year {
        w.year_eq("p.publication_date", year);
    }
    w.eq_opt("p.publication_type", filter.publication_type.as_deref());
    w
}

fn project_scope_where(scope: &ProjectScope) -> FilterWhere {
    let mut w = FilterWhere::new();
    w.eq_opt("pr.dept_id", scope.dept_id);
    if let Some(rule) = &scope.active {
        rule.push_condition(&mut w, "pr");
    }
    w
}

const STATUS_PROJECT_COLUMNS: &str = "pr.project_id, pr.project_title, pr.description, pr.status, \
     CAST(NULL AS BOOLEAN) AS is_active, pr.budget, pr.start_date, pr.end_date, pr.dept_id";

const FLAG_PROJECT_COLUMNS: &str = "pr.project_id, pr.project_title, pr.description, \
     CAST(NULL AS TEXT) AS status, pr.is_active, pr.budget, pr.start_date, pr.end_date, pr.dept_id";

/// Which revision of `research_projects` is deployed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProjectSchema {
    StatusColumn,
    ActiveFlag,
}

impl ProjectSchema {
    fn for_rule(active: &ActiveRule) -> Self {
        match active {
            ActiveRule::Status { .. } => ProjectSchema::StatusColumn,
            ActiveRule::Flag => ProjectSchema::ActiveFlag,
        }
    }

    fn columns(self) -> &'static str {
        match self {
            ProjectSchema::StatusColumn => STATUS_PROJECT_COLUMNS,
            ProjectSchema::ActiveFlag => FLAG_PROJECT_COLUMNS,
        }
    }

    /// The flag revision has no status column; status filters match nothing there.
    fn status_expr(self) -> &'static str {
        match self {
            ProjectSchema::StatusColumn => "pr.status",
            ProjectSchema::ActiveFlag => "CAST(NULL AS TEXT)",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct QueryLogging {
    enabled: bool,
    slow_warning: bool,
    slow_threshold: Duration,
}

impl QueryLogging {
    fn from_config(config: &DatabaseConfig) -> Self {
        Self {
            enabled: config.enable_query_logging,
            slow_warning: config.enable_slow_query_warning,
            slow_threshold: Duration::from_millis(config.slow_query_threshold_ms),
        }
    }

    fn observe(&self, sql: &str, elapsed: Duration) {
        if self.enabled {
            tracing::debug!(elapsed_ms = elapsed.as_millis() as u64, sql = %sql, "query executed");
        }
        if self.slow_warning && elapsed >= self.slow_threshold {
            tracing::warn!(elapsed_ms = elapsed.as_millis() as u64, sql = %sql, "slow query");
        }
    }
}

fn bind_param_query_as<'q, O>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    v: &'q Value,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s.as_str()),
        Value::Array(_) | Value::Object(_) => q.bind(v.to_string()),
    }
}
