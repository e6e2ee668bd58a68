use serde_json::Value;

/// Accumulates AND-ed WHERE conditions with `$n` placeholders.
///
/// Expressions passed in are trusted SQL fragments (column references written
/// in this crate); only values travel as bound parameters.
#[derive(Debug, Clone, Default)]
pub struct FilterWhere {
    param_values: Vec<Value>,
    conditions: Vec<String>,
}

impl FilterWhere {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a parameter and return its placeholder.
    pub fn param(&mut self, value: impl Into<Value>) -> String {
        self.param_values.push(value.into());
        format!("${}", self.param_values.len())
    }

    pub fn eq(&mut self, expr: &str, value: impl Into<Value>) -> &mut Self {
        let value = value.into();
        let condition = if value.is_null() {
            format!("{} IS NULL", expr)
        } else {
            format!("{} = {}", expr, self.param(value))
        };
        self.conditions.push(condition);
        self
    }

    pub fn eq_opt<V: Into<Value>>(&mut self, expr: &str, value: Option<V>) -> &mut Self {
        if let Some(v) = value {
            self.eq(expr, v);
        }
        self
    }

    /// `EXTRACT(YEAR FROM expr) = year`
    pub fn year_eq(&mut self, expr: &str, year: i32) -> &mut Self {
        let placeholder = self.param(year);
        self.conditions
            .push(format!("CAST(EXTRACT(YEAR FROM {}) AS INTEGER) = {}", expr, placeholder));
        self
    }

    pub fn is_not_null(&mut self, expr: &str) -> &mut Self {
        self.conditions.push(format!("{} IS NOT NULL", expr));
        self
    }

    pub fn raw(&mut self, sql: impl Into<String>) -> &mut Self {
        self.conditions.push(sql.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// The WHERE body (without the keyword); "1=1" when nothing was added.
    pub fn to_sql(&self) -> String {
        if self.conditions.is_empty() {
            "1=1".to_string()
        } else {
            self.conditions.join(" AND ")
        }
    }

    pub fn params(&self) -> &[Value] {
        &self.param_values
    }

    pub fn into_params(self) -> Vec<Value> {
        self.param_values
    }
}
