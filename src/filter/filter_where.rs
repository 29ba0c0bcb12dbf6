use chrono::{DateTime, Utc};

use super::types::FilterParam;
use crate::auth::policy::Scope;

/// Accumulates `WHERE` conditions with positional (`$n`) parameters
pub struct FilterWhere {
    alias: String,
    param_values: Vec<FilterParam>,
    conditions: Vec<String>,
}

impl FilterWhere {
    pub fn new(table_alias: impl Into<String>) -> Self {
        Self {
            alias: table_alias.into(),
            param_values: vec![],
            conditions: vec![],
        }
    }

    /// Visibility scope; `All` adds nothing
    pub fn scope(&mut self, scope: &Scope) -> &mut Self {
        if let Scope::OwnedBy(actor_id) = scope {
            let p = self.push_param(FilterParam::Uuid(*actor_id));
            self.conditions.push(format!("{}.\"created_by\" = {}", self.alias, p));
        }
        self
    }

    /// Case-insensitive substring match on name OR email
    pub fn search(&mut self, term: Option<&str>) -> &mut Self {
        if let Some(term) = non_blank(term) {
            let pattern = format!("%{}%", escape_like(term));
            let p = self.push_param(FilterParam::Text(pattern));
            self.conditions.push(format!(
                "({alias}.\"name\" ILIKE {p} OR {alias}.\"email\" ILIKE {p})",
                alias = self.alias,
                p = p
            ));
        }
        self
    }

    pub fn company(&mut self, company: Option<&str>) -> &mut Self {
        if let Some(company) = non_blank(company) {
            let p = self.push_param(FilterParam::Text(company.to_string()));
            self.conditions.push(format!("{}.\"company_name\" = {}", self.alias, p));
        }
        self
    }

    pub fn created_since(&mut self, since: DateTime<Utc>) -> &mut Self {
        let p = self.push_param(FilterParam::Timestamp(since));
        self.conditions.push(format!("{}.\"created_at\" >= {}", self.alias, p));
        self
    }

    /// `(clause, params)`; the clause is empty when there are no conditions
    pub fn finish(self) -> (String, Vec<FilterParam>) {
        let clause = if self.conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.conditions.join(" AND "))
        };
        (clause, self.param_values)
    }

    fn push_param(&mut self, value: FilterParam) -> String {
        self.param_values.push(value);
        format!("${}", self.param_values.len())
    }
}

/// Treats `None`, empty and whitespace-only input as absent
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Escapes `LIKE` metacharacters so user input matches literally
pub fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
