use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company_name: String,
    pub created_by: Option<Uuid>,
    /// Display name of the creating actor, joined in on reads
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company_name: String,
    pub created_by: Uuid,
}

/// Partial replacement; `None` leaves the column untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company_name: Option<String>,
}

impl CustomerChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.phone.is_none() && self.company_name.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct CompanyCount {
    pub company_name: String,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomerSummary {
    pub total_customers: i64,
    pub customers_today: i64,
    pub top_companies: Vec<CompanyCount>,
}

/// One page of customers plus pagination metadata
#[derive(Debug, Clone, Serialize)]
pub struct CustomerPage {
    pub data: Vec<Customer>,
    pub current_page: u32,
    pub last_page: u32,
    pub per_page: u32,
    pub total: i64,
    pub from: Option<i64>,
    pub to: Option<i64>,
}

impl CustomerPage {
    pub fn new(data: Vec<Customer>, total: i64, current_page: u32, per_page: u32) -> Self {
        let per_page_i = i64::from(per_page.max(1));
        let last_page = ((total + per_page_i - 1) / per_page_i).max(1);
        let (from, to) = if data.is_empty() {
            (None, None)
        } else {
            let first = (i64::from(current_page) - 1) * per_page_i + 1;
            (Some(first), Some(first + data.len() as i64 - 1))
        };

        Self {
            data,
            current_page,
            last_page: u32::try_from(last_page).unwrap_or(u32::MAX),
            per_page,
            total,
            from,
            to,
        }
    }
}
