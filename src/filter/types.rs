use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Raw list query parameters. Every field is a string so that malformed
/// values fall back to defaults instead of rejecting the request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    pub company: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
}

/// Columns a caller may sort by. Nothing outside this set reaches SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    Name,
    Email,
    CompanyName,
    #[default]
    CreatedAt,
}

impl SortField {
    pub const ALLOWED: [SortField; 4] = [
        SortField::Name,
        SortField::Email,
        SortField::CompanyName,
        SortField::CreatedAt,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::Email => "email",
            SortField::CompanyName => "company_name",
            SortField::CreatedAt => "created_at",
        }
    }

    /// Exact match against the allow-list; `None` for anything else
    pub fn from_param(value: &str) -> Option<Self> {
        Self::ALLOWED.into_iter().find(|field| field.column() == value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    pub fn from_param(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortOrder {
    pub field: SortField,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u32,
    pub size: u32,
}

impl Page {
    pub fn offset(&self) -> i64 {
        (i64::from(self.number.max(1)) - 1) * i64::from(self.size)
    }
}

/// Bind value for a generated statement
#[derive(Debug, Clone, PartialEq)]
pub enum FilterParam {
    Text(String),
    Uuid(Uuid),
    Int(i64),
    Timestamp(DateTime<Utc>),
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<FilterParam>,
}
