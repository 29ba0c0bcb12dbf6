use chrono::{DateTime, NaiveTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::policy::{authorize, Scope};
use crate::config::PaginationConfig;
use crate::database::models::{Actor, Customer, CustomerChanges, CustomerPage, CustomerSummary, NewCustomer};
use crate::database::store::{Store, StoreError, UniqueField};
use crate::error::ApiError;
use crate::export::{write_export, ExportFormat};
use crate::filter::{CustomerFilter, ListParams, Page};
use crate::import::{read_sheet, HeaderMap, ImportReport, RowOutcome, SheetFormat};
use crate::validation::{Validator, STRING_MAX_LENGTH};

pub const NOT_FOUND: &str = "Customer not found";

/// Body of create and update requests. On update an absent (or null)
/// field is left unchanged. Values stay raw JSON so a wrongly typed field
/// becomes a field error rather than a rejected body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerRequest {
    pub name: Option<Value>,
    pub email: Option<Value>,
    pub phone: Option<Value>,
    pub company_name: Option<Value>,
}

/// Text content of each field, in `name, email, phone, company_name` order
struct RequestText {
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    company_name: Option<String>,
}

impl CustomerRequest {
    fn text(&self, v: &mut Validator) -> RequestText {
        RequestText {
            name: v.string("name", self.name.as_ref()),
            email: v.string("email", self.email.as_ref()),
            phone: v.string_or_number("phone", self.phone.as_ref()),
            company_name: v.string("company_name", self.company_name.as_ref()),
        }
    }
}

pub struct CustomerService<'a> {
    store: &'a dyn Store,
    pagination: &'a PaginationConfig,
}

impl<'a> CustomerService<'a> {
    pub fn new(store: &'a dyn Store, pagination: &'a PaginationConfig) -> Self {
        Self { store, pagination }
    }

    pub async fn list(&self, actor: &Actor, params: &ListParams) -> Result<CustomerPage, ApiError> {
        let filter = CustomerFilter::from_params(params, Scope::for_actor(actor), self.pagination);
        let page = filter.page.unwrap_or(Page {
            number: 1,
            size: self.pagination.default_per_page,
        });

        let rows = self.store.select_customers(&filter).await?;
        let total = self.store.count_customers(&filter).await?;

        Ok(CustomerPage::new(rows, total, page.number, page.size))
    }

    pub async fn show(&self, actor: &Actor, id: &str) -> Result<Customer, ApiError> {
        self.find_authorized(actor, id).await
    }

    pub async fn create(&self, actor: &Actor, request: CustomerRequest) -> Result<Customer, ApiError> {
        let mut v = Validator::new();
        let text = request.text(&mut v);
        let name = v.required("name", text.name.as_deref());
        let email = v.required("email", text.email.as_deref());
        let phone = v.required("phone", text.phone.as_deref());
        let company_name = v.required("company_name", text.company_name.as_deref());
        self.check_fields(&mut v, name, email, phone, company_name, None).await?;
        v.finish()?;

        let (Some(name), Some(email), Some(phone), Some(company_name)) = (name, email, phone, company_name) else {
            return Err(ApiError::internal("create customer: validated field missing"));
        };

        let customer = self
            .store
            .insert_customer(NewCustomer {
                name: name.to_string(),
                email: email.to_string(),
                phone: phone.to_string(),
                company_name: company_name.to_string(),
                created_by: actor.id,
            })
            .await?;

        info!("Actor {} created customer {}", actor.id, customer.id);
        Ok(customer)
    }

    pub async fn update(&self, actor: &Actor, id: &str, request: CustomerRequest) -> Result<Customer, ApiError> {
        let existing = self.find_authorized(actor, id).await?;

        let mut v = Validator::new();
        let text = request.text(&mut v);
        let name = v.present("name", text.name.as_deref());
        let email = v.present("email", text.email.as_deref());
        let phone = v.present("phone", text.phone.as_deref());
        let company_name = v.present("company_name", text.company_name.as_deref());
        self.check_fields(&mut v, name, email, phone, company_name, Some(existing.id))
            .await?;
        v.finish()?;

        let changes = CustomerChanges {
            name: name.map(str::to_string),
            email: email.map(str::to_string),
            phone: phone.map(str::to_string),
            company_name: company_name.map(str::to_string),
        };
        if changes.is_empty() {
            return Ok(existing);
        }

        let customer = self.store.update_customer(existing.id, changes).await.map_err(|e| match e {
            StoreError::NotFound => ApiError::not_found(NOT_FOUND),
            other => other.into(),
        })?;

        info!("Actor {} updated customer {}", actor.id, customer.id);
        Ok(customer)
    }

    pub async fn delete(&self, actor: &Actor, id: &str) -> Result<(), ApiError> {
        let existing = self.find_authorized(actor, id).await?;

        if !self.store.delete_customer(existing.id).await? {
            return Err(ApiError::not_found(NOT_FOUND));
        }

        info!("Actor {} deleted customer {}", actor.id, existing.id);
        Ok(())
    }

    /// Blank rows are ignored, incomplete rows and rows whose email or phone
    /// already exist are skipped and counted. The remaining rows are written
    /// in one transaction, so a store failure leaves nothing behind.
    pub async fn import(&self, actor: &Actor, file_name: &str, bytes: &[u8]) -> Result<ImportReport, ApiError> {
        let format = SheetFormat::from_file_name(file_name).map_err(|_| {
            ApiError::field(
                "file",
                format!("The file field must be a file of type: {}.", SheetFormat::ACCEPTED),
            )
        })?;

        let sheet = read_sheet(bytes, format).map_err(|e| {
            warn!("Unreadable import upload {}: {}", file_name, e);
            ApiError::field("file", "The file could not be read.")
        })?;

        let headers = HeaderMap::new(&sheet.headers);
        let mut report = ImportReport::default();
        let mut batch = Vec::new();

        for row in &sheet.rows {
            match headers.map_row(row) {
                RowOutcome::Blank => {}
                RowOutcome::Incomplete => report.record_incomplete(),
                RowOutcome::Mapped(mapped) => batch.push(mapped.into_new_customer(actor.id)),
            }
        }

        for inserted in self.store.insert_customers_if_absent(batch).await? {
            match inserted {
                Some(customer) => report.record_inserted(customer),
                None => report.record_duplicate(),
            }
        }

        info!(
            "Actor {} imported {}: {} inserted, {} incomplete, {} duplicate",
            actor.id, file_name, report.imported, report.skipped_incomplete, report.skipped_duplicate
        );
        Ok(report)
    }

    /// Visible customers rendered as a download body
    pub async fn export(&self, actor: &Actor, format: ExportFormat) -> Result<Vec<u8>, ApiError> {
        let filter = CustomerFilter::new(Scope::for_actor(actor));
        let customers = self.store.select_customers(&filter).await?;
        let bytes = write_export(&customers, format).map_err(ApiError::internal)?;

        info!("Actor {} exported {} customers as {:?}", actor.id, customers.len(), format);
        Ok(bytes)
    }

    pub async fn summary(&self, actor: &Actor, now: DateTime<Utc>) -> Result<CustomerSummary, ApiError> {
        let start_of_day = now.date_naive().and_time(NaiveTime::MIN).and_utc();
        Ok(self
            .store
            .summarize_customers(&Scope::for_actor(actor), start_of_day)
            .await?)
    }

    async fn find_authorized(&self, actor: &Actor, id: &str) -> Result<Customer, ApiError> {
        let id = Uuid::parse_str(id.trim()).map_err(|_| ApiError::not_found(NOT_FOUND))?;
        let customer = self
            .store
            .find_customer(id)
            .await?
            .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
        authorize(actor, &customer)?;
        Ok(customer)
    }

    /// Shape rules for whichever fields are present, then one uniqueness
    /// lookup covering both email and phone
    async fn check_fields(
        &self,
        v: &mut Validator,
        name: Option<&str>,
        email: Option<&str>,
        phone: Option<&str>,
        company_name: Option<&str>,
        except: Option<Uuid>,
    ) -> Result<(), ApiError> {
        for (field, value) in [("name", name), ("email", email), ("phone", phone), ("company_name", company_name)] {
            if let Some(value) = value {
                v.max_len(field, value, STRING_MAX_LENGTH);
            }
        }
        if let Some(email) = email {
            v.email("email", email);
        }

        let email = email.filter(|_| !v.has("email"));
        let phone = phone.filter(|_| !v.has("phone"));
        if email.is_none() && phone.is_none() {
            return Ok(());
        }

        let conflicts = self.store.unique_conflicts(email, phone, except).await?;
        if conflicts.email {
            v.add("email", UniqueField::Email.taken_message());
        }
        if conflicts.phone {
            v.add("phone", UniqueField::Phone.taken_message());
        }
        Ok(())
    }
}
