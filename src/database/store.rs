use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::policy::Scope;
use crate::database::models::{
    AccessToken, Actor, Customer, CustomerChanges, CustomerSummary, NewActor, NewCustomer,
};
use crate::filter::CustomerFilter;

/// Columns guarded by a unique constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Email,
    Phone,
}

impl UniqueField {
    pub fn as_str(&self) -> &'static str {
        match self {
            UniqueField::Email => "email",
            UniqueField::Phone => "phone",
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,

    #[error("unique constraint violated on {}", .0.as_str())]
    Conflict(UniqueField),

    #[error("data corruption: {0}")]
    DataCorruption(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Which unique values are already held by some other customer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UniqueConflicts {
    pub email: bool,
    pub phone: bool,
}

#[async_trait]
pub trait ActorStore: Send + Sync {
    /// Fails with `Conflict(Email)` when the email is registered already
    async fn insert_actor(&self, actor: NewActor) -> Result<Actor, StoreError>;

    async fn find_actor(&self, id: Uuid) -> Result<Option<Actor>, StoreError>;

    async fn find_actor_by_email(&self, email: &str) -> Result<Option<Actor>, StoreError>;
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn insert_token(&self, actor_id: Uuid, name: &str) -> Result<AccessToken, StoreError>;

    /// Looks up a live token and stamps `last_used_at`
    async fn use_token(&self, id: Uuid) -> Result<Option<AccessToken>, StoreError>;

    /// Returns whether a row was removed
    async fn delete_token(&self, id: Uuid) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait CustomerStore: Send + Sync {
    /// Matching rows for the filter (paged when the filter carries a page)
    async fn select_customers(&self, filter: &CustomerFilter) -> Result<Vec<Customer>, StoreError>;

    /// Total rows matching the filter, ignoring paging
    async fn count_customers(&self, filter: &CustomerFilter) -> Result<i64, StoreError>;

    async fn find_customer(&self, id: Uuid) -> Result<Option<Customer>, StoreError>;

    async fn unique_conflicts(
        &self,
        email: Option<&str>,
        phone: Option<&str>,
        except: Option<Uuid>,
    ) -> Result<UniqueConflicts, StoreError>;

    /// Constraint-backed insert; `Conflict` on duplicate email or phone
    async fn insert_customer(&self, customer: NewCustomer) -> Result<Customer, StoreError>;

    /// Inserts each row unless its email or phone exists (`None` when
    /// skipped), all in one transaction: on error nothing is kept
    async fn insert_customers_if_absent(
        &self,
        customers: Vec<NewCustomer>,
    ) -> Result<Vec<Option<Customer>>, StoreError>;

    async fn update_customer(&self, id: Uuid, changes: CustomerChanges) -> Result<Customer, StoreError>;

    /// Returns whether a row was removed
    async fn delete_customer(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn summarize_customers(&self, scope: &Scope, today: DateTime<Utc>) -> Result<CustomerSummary, StoreError>;
}

#[async_trait]
pub trait StoreHealth: Send + Sync {
    /// Round-trip to the backing database
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Everything the HTTP layer needs from persistence
pub trait Store: ActorStore + TokenStore + CustomerStore + StoreHealth {}

impl<T: ActorStore + TokenStore + CustomerStore + StoreHealth> Store for T {}
