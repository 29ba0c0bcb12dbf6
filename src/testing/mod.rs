//! In-memory store and fixtures for unit and router tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::auth::policy::Scope;
use crate::database::models::{
    AccessToken, Actor, CompanyCount, Customer, CustomerChanges, CustomerSummary, NewActor, NewCustomer,
};
use crate::database::store::{
    ActorStore, CustomerStore, StoreError, StoreHealth, TokenStore, UniqueConflicts, UniqueField,
};
use crate::filter::types::{SortDirection, SortField};
use crate::filter::CustomerFilter;

#[derive(Default)]
struct Tables {
    actors: Vec<Actor>,
    tokens: Vec<AccessToken>,
    customers: Vec<Customer>,
}

/// Mirrors the Postgres constraints: unique actor email, unique customer
/// email and phone, `created_by` set to NULL when the actor goes away
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    offline: AtomicBool,
    failing_email: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().expect("memory store poisoned")
    }

    /// Deletes an actor the way the foreign keys would
    pub fn remove_actor(&self, id: Uuid) {
        let mut t = self.lock();
        t.actors.retain(|a| a.id != id);
        t.tokens.retain(|tok| tok.actor_id != id);
        for c in t.customers.iter_mut().filter(|c| c.created_by == Some(id)) {
            c.created_by = None;
        }
    }

    /// Makes `ping` fail, as if the database went away
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, AtomicOrdering::SeqCst);
    }

    /// Makes batch inserts error out when they reach a row with this email
    pub fn fail_inserts_for(&self, email: &str) {
        *self.failing_email.lock().expect("memory store poisoned") = Some(email.to_string());
    }

    pub fn customer_count(&self) -> usize {
        self.lock().customers.len()
    }
}

impl Tables {
    fn with_creator(&self, customer: &Customer) -> Customer {
        let mut c = customer.clone();
        c.creator_name = c
            .created_by
            .and_then(|id| self.actors.iter().find(|a| a.id == id))
            .map(|a| a.name.clone());
        c
    }

    fn matching(&self, filter: &CustomerFilter) -> Vec<Customer> {
        let search = filter.search.as_deref().map(str::to_lowercase);
        self.customers
            .iter()
            .filter(|c| filter.scope.includes(c))
            .filter(|c| match &search {
                Some(term) => c.name.to_lowercase().contains(term) || c.email.to_lowercase().contains(term),
                None => true,
            })
            .filter(|c| filter.company.as_deref().map_or(true, |company| c.company_name == company))
            .map(|c| self.with_creator(c))
            .collect()
    }

    fn conflict(&self, email: &str, phone: &str, except: Option<Uuid>) -> Option<UniqueField> {
        let others = || self.customers.iter().filter(move |c| Some(c.id) != except);
        if others().any(|c| c.email == email) {
            Some(UniqueField::Email)
        } else if others().any(|c| c.phone == phone) {
            Some(UniqueField::Phone)
        } else {
            None
        }
    }

    fn insert(&mut self, customer: NewCustomer) -> Customer {
        let now = Utc::now();
        let row = Customer {
            id: Uuid::new_v4(),
            name: customer.name,
            email: customer.email,
            phone: customer.phone,
            company_name: customer.company_name,
            created_by: Some(customer.created_by),
            creator_name: None,
            created_at: now,
            updated_at: now,
        };
        self.customers.push(row.clone());
        self.with_creator(&row)
    }
}

fn compare(a: &Customer, b: &Customer, field: SortField) -> Ordering {
    match field {
        SortField::Name => a.name.cmp(&b.name),
        SortField::Email => a.email.cmp(&b.email),
        SortField::CompanyName => a.company_name.cmp(&b.company_name),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
    }
    .then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
impl ActorStore for MemoryStore {
    async fn insert_actor(&self, actor: NewActor) -> Result<Actor, StoreError> {
        let mut t = self.lock();
        if t.actors.iter().any(|a| a.email == actor.email) {
            return Err(StoreError::Conflict(UniqueField::Email));
        }
        let now = Utc::now();
        let row = Actor {
            id: Uuid::new_v4(),
            name: actor.name,
            email: actor.email,
            password_hash: actor.password_hash,
            role: actor.role,
            created_at: now,
            updated_at: now,
        };
        t.actors.push(row.clone());
        Ok(row)
    }

    async fn find_actor(&self, id: Uuid) -> Result<Option<Actor>, StoreError> {
        Ok(self.lock().actors.iter().find(|a| a.id == id).cloned())
    }

    async fn find_actor_by_email(&self, email: &str) -> Result<Option<Actor>, StoreError> {
        Ok(self.lock().actors.iter().find(|a| a.email == email).cloned())
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn insert_token(&self, actor_id: Uuid, name: &str) -> Result<AccessToken, StoreError> {
        let token = AccessToken {
            id: Uuid::new_v4(),
            actor_id,
            name: name.to_string(),
            created_at: Utc::now(),
            last_used_at: None,
        };
        self.lock().tokens.push(token.clone());
        Ok(token)
    }

    async fn use_token(&self, id: Uuid) -> Result<Option<AccessToken>, StoreError> {
        let mut t = self.lock();
        Ok(t.tokens.iter_mut().find(|tok| tok.id == id).map(|tok| {
            tok.last_used_at = Some(Utc::now());
            tok.clone()
        }))
    }

    async fn delete_token(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut t = self.lock();
        let before = t.tokens.len();
        t.tokens.retain(|tok| tok.id != id);
        Ok(t.tokens.len() < before)
    }
}

#[async_trait]
impl CustomerStore for MemoryStore {
    async fn select_customers(&self, filter: &CustomerFilter) -> Result<Vec<Customer>, StoreError> {
        let mut rows = self.lock().matching(filter);
        rows.sort_by(|a, b| {
            let ord = compare(a, b, filter.order.field);
            match filter.order.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });

        Ok(match filter.page {
            Some(page) => rows
                .into_iter()
                .skip(page.offset() as usize)
                .take(page.size as usize)
                .collect(),
            None => rows,
        })
    }

    async fn count_customers(&self, filter: &CustomerFilter) -> Result<i64, StoreError> {
        Ok(self.lock().matching(filter).len() as i64)
    }

    async fn find_customer(&self, id: Uuid) -> Result<Option<Customer>, StoreError> {
        let t = self.lock();
        Ok(t.customers.iter().find(|c| c.id == id).map(|c| t.with_creator(c)))
    }

    async fn unique_conflicts(
        &self,
        email: Option<&str>,
        phone: Option<&str>,
        except: Option<Uuid>,
    ) -> Result<UniqueConflicts, StoreError> {
        let t = self.lock();
        let others = || t.customers.iter().filter(move |c| Some(c.id) != except);
        Ok(UniqueConflicts {
            email: email.map_or(false, |e| others().any(|c| c.email == e)),
            phone: phone.map_or(false, |p| others().any(|c| c.phone == p)),
        })
    }

    async fn insert_customer(&self, customer: NewCustomer) -> Result<Customer, StoreError> {
        let mut t = self.lock();
        if let Some(field) = t.conflict(&customer.email, &customer.phone, None) {
            return Err(StoreError::Conflict(field));
        }
        Ok(t.insert(customer))
    }

    async fn insert_customers_if_absent(
        &self,
        customers: Vec<NewCustomer>,
    ) -> Result<Vec<Option<Customer>>, StoreError> {
        let failing = self.failing_email.lock().expect("memory store poisoned").clone();
        let mut t = self.lock();
        let committed = t.customers.len();

        let mut rows = Vec::with_capacity(customers.len());
        for customer in customers {
            if failing.as_deref() == Some(customer.email.as_str()) {
                t.customers.truncate(committed);
                return Err(StoreError::Database(sqlx::Error::Protocol("injected write failure".into())));
            }
            if t.conflict(&customer.email, &customer.phone, None).is_some() {
                rows.push(None);
            } else {
                rows.push(Some(t.insert(customer)));
            }
        }
        Ok(rows)
    }

    async fn update_customer(&self, id: Uuid, changes: CustomerChanges) -> Result<Customer, StoreError> {
        let mut t = self.lock();
        let current = t.customers.iter().find(|c| c.id == id).cloned().ok_or(StoreError::NotFound)?;

        let email = changes.email.clone().unwrap_or_else(|| current.email.clone());
        let phone = changes.phone.clone().unwrap_or_else(|| current.phone.clone());
        if let Some(field) = t.conflict(&email, &phone, Some(id)) {
            return Err(StoreError::Conflict(field));
        }

        let row = t.customers.iter_mut().find(|c| c.id == id).ok_or(StoreError::NotFound)?;
        if let Some(name) = changes.name {
            row.name = name;
        }
        row.email = email;
        row.phone = phone;
        if let Some(company_name) = changes.company_name {
            row.company_name = company_name;
        }
        row.updated_at = Utc::now();
        let row = row.clone();
        Ok(t.with_creator(&row))
    }

    async fn delete_customer(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut t = self.lock();
        let before = t.customers.len();
        t.customers.retain(|c| c.id != id);
        Ok(t.customers.len() < before)
    }

    async fn summarize_customers(&self, scope: &Scope, today: DateTime<Utc>) -> Result<CustomerSummary, StoreError> {
        let rows = self.lock().matching(&CustomerFilter::new(*scope));

        let mut companies: Vec<CompanyCount> = Vec::new();
        for c in &rows {
            match companies.iter_mut().find(|cc| cc.company_name == c.company_name) {
                Some(cc) => cc.total += 1,
                None => companies.push(CompanyCount {
                    company_name: c.company_name.clone(),
                    total: 1,
                }),
            }
        }
        companies.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.company_name.cmp(&b.company_name)));
        companies.truncate(5);

        Ok(CustomerSummary {
            total_customers: rows.len() as i64,
            customers_today: rows.iter().filter(|c| c.created_at >= today).count() as i64,
            top_companies: companies,
        })
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        if self.offline.load(AtomicOrdering::SeqCst) {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        } else {
            Ok(())
        }
    }
}

pub mod fixtures {
    use super::MemoryStore;
    use crate::auth::{generate_jwt, hash_password, Claims};
    use crate::config::AppConfig;
    use crate::database::models::{Actor, Customer, NewActor, NewCustomer, Role};
    use crate::database::store::{ActorStore, CustomerStore, TokenStore};

    pub const PASSWORD: &str = "password";

    pub async fn actor(store: &MemoryStore, email: &str, role: Role) -> Actor {
        let name = email.split('@').next().unwrap_or(email).to_string();
        store
            .insert_actor(NewActor {
                name,
                email: email.to_string(),
                password_hash: hash_password(PASSWORD).unwrap(),
                role,
            })
            .await
            .unwrap()
    }

    /// Bearer token for `actor`, backed by a live token row
    pub async fn bearer(store: &MemoryStore, config: &AppConfig, actor: &Actor) -> String {
        let token = store.insert_token(actor.id, "test").await.unwrap();
        let claims = Claims::new(actor.id, token.id, config.security.jwt_expiry_hours);
        generate_jwt(&claims, &config.security.jwt_secret).unwrap()
    }

    pub async fn customer(store: &MemoryStore, owner: &Actor, n: u32, company: &str) -> Customer {
        store
            .insert_customer(NewCustomer {
                name: format!("Customer {}", n),
                email: format!("customer{}@example.com", n),
                phone: format!("555-{:04}", n),
                company_name: company.to_string(),
                created_by: owner.id,
            })
            .await
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PaginationConfig;
    use crate::database::models::Role;
    use crate::filter::ListParams;

    #[tokio::test]
    async fn removing_an_actor_orphans_their_customers() {
        let store = MemoryStore::new();
        let owner = fixtures::actor(&store, "gone@example.com", Role::User).await;
        let c = fixtures::customer(&store, &owner, 1, "Acme").await;
        assert_eq!(c.creator_name.as_deref(), Some("gone"));

        store.remove_actor(owner.id);
        let c = store.find_customer(c.id).await.unwrap().unwrap();
        assert_eq!(c.created_by, None);
        assert_eq!(c.creator_name, None);
    }

    #[tokio::test]
    async fn paging_and_sorting_follow_the_filter() {
        let store = MemoryStore::new();
        let owner = fixtures::actor(&store, "o@example.com", Role::User).await;
        for n in [3, 1, 2] {
            fixtures::customer(&store, &owner, n, "Acme").await;
        }

        let params = ListParams {
            sort_by: Some("name".into()),
            sort_order: Some("asc".into()),
            per_page: Some("2".into()),
            page: Some("2".into()),
            ..Default::default()
        };
        let pagination = PaginationConfig { default_per_page: 10, max_per_page: 100 };
        let filter = CustomerFilter::from_params(&params, Scope::All, &pagination);

        let rows = store.select_customers(&filter).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Customer 3");
        assert_eq!(store.count_customers(&filter).await.unwrap(), 3);
    }
}
