use serde::Serialize;
use uuid::Uuid;

use crate::database::models::{Customer, NewCustomer};
use crate::validation::STRING_MAX_LENGTH;

/// Accepted header spellings per customer field, in priority order
const NAME: &[&str] = &["name", "full_name"];
const EMAIL: &[&str] = &["email", "email_address"];
const PHONE: &[&str] = &["phone", "phone_number"];
const COMPANY_NAME: &[&str] = &["company_name", "company"];

/// `" Email-Address "` -> `email_address`
pub fn normalize_header(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_sep = false;

    for c in raw.trim().chars() {
        if c.is_whitespace() || c == '-' || c == '.' || c == '_' {
            pending_sep = true;
            continue;
        }
        if pending_sep && !out.is_empty() {
            out.push('_');
        }
        pending_sep = false;
        out.extend(c.to_lowercase());
    }

    out
}

/// Column positions for each field, resolved once per sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMap {
    name: Vec<usize>,
    email: Vec<usize>,
    phone: Vec<usize>,
    company_name: Vec<usize>,
}

impl HeaderMap {
    pub fn new(headers: &[String]) -> Self {
        let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();
        let columns = |synonyms: &[&str]| -> Vec<usize> {
            synonyms
                .iter()
                .flat_map(|syn| {
                    normalized
                        .iter()
                        .enumerate()
                        .filter(move |(_, h)| h.as_str() == *syn)
                        .map(|(i, _)| i)
                })
                .collect()
        };

        Self {
            name: columns(NAME),
            email: columns(EMAIL),
            phone: columns(PHONE),
            company_name: columns(COMPANY_NAME),
        }
    }

    pub fn map_row(&self, row: &[Option<String>]) -> RowOutcome {
        if row.iter().all(Option::is_none) {
            return RowOutcome::Blank;
        }

        let pick = |cols: &[usize]| -> Option<String> {
            cols.iter()
                .filter_map(|&i| row.get(i).cloned().flatten())
                .map(|v| v.trim().to_string())
                .find(|v| storable(v))
        };

        match (pick(&self.name), pick(&self.email), pick(&self.phone), pick(&self.company_name)) {
            (Some(name), Some(email), Some(phone), Some(company_name)) => RowOutcome::Mapped(MappedRow {
                name,
                email,
                phone,
                company_name,
            }),
            _ => RowOutcome::Incomplete,
        }
    }
}

/// Non-empty, within the column width, and free of NUL (Postgres text rejects it)
fn storable(value: &str) -> bool {
    !value.is_empty() && !value.contains('\0') && value.chars().count() <= STRING_MAX_LENGTH
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedRow {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company_name: String,
}

impl MappedRow {
    pub fn into_new_customer(self, created_by: Uuid) -> NewCustomer {
        NewCustomer {
            name: self.name,
            email: self.email,
            phone: self.phone,
            company_name: self.company_name,
            created_by,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    /// Every cell empty; not counted
    Blank,
    /// A required field is missing or unusable
    Incomplete,
    Mapped(MappedRow),
}

/// Result of one import run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
    pub skipped_incomplete: usize,
    pub skipped_duplicate: usize,
    pub customers: Vec<Customer>,
}

impl ImportReport {
    pub fn record_inserted(&mut self, customer: Customer) {
        self.imported += 1;
        self.customers.push(customer);
    }

    pub fn record_incomplete(&mut self) {
        self.skipped += 1;
        self.skipped_incomplete += 1;
    }

    pub fn record_duplicate(&mut self) {
        self.skipped += 1;
        self.skipped_duplicate += 1;
    }

    pub fn message(&self) -> String {
        format!(
            "Imported {} customers, skipped {} rows",
            self.imported, self.skipped
        )
    }
}
