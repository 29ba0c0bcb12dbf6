use super::filter_order::FilterOrder;
use super::filter_where::{non_blank, FilterWhere};
use super::types::{FilterParam, ListParams, Page, SortOrder, SqlResult};
use crate::auth::policy::Scope;
use crate::config::PaginationConfig;

pub(crate) const TABLE_ALIAS: &str = "c";

pub(crate) const SELECT_COLUMNS: &str = "c.\"id\", c.\"name\", c.\"email\", c.\"phone\", c.\"company_name\", \
     c.\"created_by\", a.\"name\" AS \"creator_name\", c.\"created_at\", c.\"updated_at\"";

pub(crate) const FROM_CLAUSE: &str = "FROM \"customers\" c LEFT JOIN \"actors\" a ON a.\"id\" = c.\"created_by\"";

/// Validated customer list query. Built from raw request parameters; only
/// allow-listed identifiers are ever written into the SQL text.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerFilter {
    pub scope: Scope,
    pub search: Option<String>,
    pub company: Option<String>,
    pub order: SortOrder,
    pub page: Option<Page>,
}

impl CustomerFilter {
    /// Whole visible collection in default order, unpaginated
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            search: None,
            company: None,
            order: SortOrder::default(),
            page: None,
        }
    }

    pub fn from_params(params: &ListParams, scope: Scope, pagination: &PaginationConfig) -> Self {
        let order = FilterOrder::parse(params.sort_by.as_deref(), params.sort_order.as_deref());
        let page = Page {
            number: parse_positive(params.page.as_deref()).unwrap_or(1),
            size: parse_positive(params.per_page.as_deref())
                .unwrap_or(pagination.default_per_page)
                .min(pagination.max_per_page.max(1)),
        };

        Self {
            scope,
            search: non_blank(params.search.as_deref()).map(str::to_string),
            company: non_blank(params.company.as_deref()).map(str::to_string),
            order,
            page: Some(page),
        }
    }

    pub fn to_sql(&self) -> SqlResult {
        let (where_clause, mut params) = self.where_builder().finish();
        let order_clause = FilterOrder::generate(&self.order, TABLE_ALIAS);

        let limit_clause = match self.page {
            Some(page) => {
                let limit = params.len() + 1;
                params.push(FilterParam::Int(i64::from(page.size)));
                params.push(FilterParam::Int(page.offset()));
                format!("LIMIT ${} OFFSET ${}", limit, limit + 1)
            }
            None => String::new(),
        };

        let query = [
            format!("SELECT {}", SELECT_COLUMNS),
            FROM_CLAUSE.to_string(),
            where_clause,
            order_clause,
            limit_clause,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        SqlResult { query, params }
    }

    pub fn to_count_sql(&self) -> SqlResult {
        let (where_clause, params) = self.where_builder().finish();
        let query = if where_clause.is_empty() {
            "SELECT COUNT(*) AS count FROM \"customers\" c".to_string()
        } else {
            format!("SELECT COUNT(*) AS count FROM \"customers\" c {}", where_clause)
        };
        SqlResult { query, params }
    }

    fn where_builder(&self) -> FilterWhere {
        let mut w = FilterWhere::new(TABLE_ALIAS);
        w.scope(&self.scope)
            .search(self.search.as_deref())
            .company(self.company.as_deref());
        w
    }
}

fn parse_positive(value: Option<&str>) -> Option<u32> {
    value
        .and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|v| *v >= 1)
}
