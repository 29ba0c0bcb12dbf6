use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::auth::policy::Scope;
use crate::database::models::{
    AccessToken, Actor, CompanyCount, Customer, CustomerChanges, CustomerSummary, NewActor, NewCustomer, Role,
};
use crate::database::manager::DatabaseManager;
use crate::database::query_builder::{self, QueryBuilder};
use crate::database::store::{
    ActorStore, CustomerStore, StoreError, StoreHealth, TokenStore, UniqueConflicts, UniqueField,
};
use crate::filter::filter::{SELECT_COLUMNS, TABLE_ALIAS};
use crate::filter::filter_where::FilterWhere;
use crate::filter::types::SqlResult;
use crate::filter::CustomerFilter;

const TOP_COMPANIES: i64 = 5;

const CUSTOMER_EMAIL_UNIQUE: &str = "customers_email_unique";
const CUSTOMER_PHONE_UNIQUE: &str = "customers_phone_unique";
const ACTOR_EMAIL_UNIQUE: &str = "actors_email_unique";

/// Postgres-backed store used by the running service
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Re-select a written customer with the creator name joined in
    fn returning_customer(write: &str) -> String {
        format!(
            "WITH c AS ({} RETURNING *) SELECT {} FROM c LEFT JOIN \"actors\" a ON a.\"id\" = c.\"created_by\"",
            write, SELECT_COLUMNS
        )
    }
}

#[derive(Debug, FromRow)]
struct ActorRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ActorRow> for Actor {
    type Error = StoreError;

    fn try_from(row: ActorRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse::<Role>()
            .map_err(|e| StoreError::DataCorruption(format!("actor {}: {}", row.id, e)))?;

        Ok(Actor {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Translate unique violations into `Conflict`, keyed by constraint name
fn map_write_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            match db.constraint() {
                Some(CUSTOMER_EMAIL_UNIQUE) | Some(ACTOR_EMAIL_UNIQUE) => {
                    return StoreError::Conflict(UniqueField::Email)
                }
                Some(CUSTOMER_PHONE_UNIQUE) => return StoreError::Conflict(UniqueField::Phone),
                _ => {}
            }
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl ActorStore for PgStore {
    async fn insert_actor(&self, actor: NewActor) -> Result<Actor, StoreError> {
        let row = sqlx::query_as::<_, ActorRow>(
            "INSERT INTO actors (id, name, email, password_hash, role) VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, name, email, password_hash, role, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(&actor.name)
        .bind(&actor.email)
        .bind(&actor.password_hash)
        .bind(actor.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        Actor::try_from(row)
    }

    async fn find_actor(&self, id: Uuid) -> Result<Option<Actor>, StoreError> {
        let row = sqlx::query_as::<_, ActorRow>(
            "SELECT id, name, email, password_hash, role, created_at, updated_at FROM actors WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Actor::try_from).transpose()
    }

    async fn find_actor_by_email(&self, email: &str) -> Result<Option<Actor>, StoreError> {
        let row = sqlx::query_as::<_, ActorRow>(
            "SELECT id, name, email, password_hash, role, created_at, updated_at FROM actors WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Actor::try_from).transpose()
    }
}

#[async_trait]
impl TokenStore for PgStore {
    async fn insert_token(&self, actor_id: Uuid, name: &str) -> Result<AccessToken, StoreError> {
        let token = sqlx::query_as::<_, AccessToken>(
            "INSERT INTO access_tokens (id, actor_id, name) VALUES ($1, $2, $3) \
             RETURNING id, actor_id, name, created_at, last_used_at",
        )
        .bind(Uuid::new_v4())
        .bind(actor_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(token)
    }

    async fn use_token(&self, id: Uuid) -> Result<Option<AccessToken>, StoreError> {
        let token = sqlx::query_as::<_, AccessToken>(
            "UPDATE access_tokens SET last_used_at = now() WHERE id = $1 \
             RETURNING id, actor_id, name, created_at, last_used_at",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(token)
    }

    async fn delete_token(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM access_tokens WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl CustomerStore for PgStore {
    async fn select_customers(&self, filter: &CustomerFilter) -> Result<Vec<Customer>, StoreError> {
        let rows = QueryBuilder::<Customer>::new(filter.to_sql())
            .select_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn count_customers(&self, filter: &CustomerFilter) -> Result<i64, StoreError> {
        Ok(query_builder::count(&filter.to_count_sql(), &self.pool).await?)
    }

    async fn find_customer(&self, id: Uuid) -> Result<Option<Customer>, StoreError> {
        let sql = format!(
            "SELECT {} FROM \"customers\" c LEFT JOIN \"actors\" a ON a.\"id\" = c.\"created_by\" WHERE c.\"id\" = $1",
            SELECT_COLUMNS
        );
        let row = sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn unique_conflicts(
        &self,
        email: Option<&str>,
        phone: Option<&str>,
        except: Option<Uuid>,
    ) -> Result<UniqueConflicts, StoreError> {
        let (email_taken, phone_taken) = sqlx::query_as::<_, (bool, bool)>(
            "SELECT \
                EXISTS (SELECT 1 FROM customers WHERE email = $1 AND ($3::uuid IS NULL OR id <> $3)), \
                EXISTS (SELECT 1 FROM customers WHERE phone = $2 AND ($3::uuid IS NULL OR id <> $3))",
        )
        .bind(email)
        .bind(phone)
        .bind(except)
        .fetch_one(&self.pool)
        .await?;

        Ok(UniqueConflicts {
            email: email_taken,
            phone: phone_taken,
        })
    }

    async fn insert_customer(&self, customer: NewCustomer) -> Result<Customer, StoreError> {
        let sql = Self::returning_customer(
            "INSERT INTO customers (id, name, email, phone, company_name, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        );
        sqlx::query_as::<_, Customer>(&sql)
            .bind(Uuid::new_v4())
            .bind(&customer.name)
            .bind(&customer.email)
            .bind(&customer.phone)
            .bind(&customer.company_name)
            .bind(customer.created_by)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)
    }

    async fn insert_customers_if_absent(
        &self,
        customers: Vec<NewCustomer>,
    ) -> Result<Vec<Option<Customer>>, StoreError> {
        let sql = Self::returning_customer(
            "INSERT INTO customers (id, name, email, phone, company_name, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6) ON CONFLICT DO NOTHING",
        );

        // Dropping the transaction on an early return rolls it back
        let mut tx = self.pool.begin().await?;
        let mut rows = Vec::with_capacity(customers.len());
        for customer in customers {
            let row = sqlx::query_as::<_, Customer>(&sql)
                .bind(Uuid::new_v4())
                .bind(&customer.name)
                .bind(&customer.email)
                .bind(&customer.phone)
                .bind(&customer.company_name)
                .bind(customer.created_by)
                .fetch_optional(&mut *tx)
                .await?;
            rows.push(row);
        }
        tx.commit().await?;

        Ok(rows)
    }

    async fn update_customer(&self, id: Uuid, changes: CustomerChanges) -> Result<Customer, StoreError> {
        let sql = Self::returning_customer(
            "UPDATE customers SET \
                name = COALESCE($2, name), \
                email = COALESCE($3, email), \
                phone = COALESCE($4, phone), \
                company_name = COALESCE($5, company_name), \
                updated_at = now() \
             WHERE id = $1",
        );
        sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .bind(changes.name)
            .bind(changes.email)
            .bind(changes.phone)
            .bind(changes.company_name)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?
            .ok_or(StoreError::NotFound)
    }

    async fn delete_customer(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn summarize_customers(&self, scope: &Scope, today: DateTime<Utc>) -> Result<CustomerSummary, StoreError> {
        let total_customers = query_builder::count(&count_sql(scope, None), &self.pool).await?;
        let customers_today = query_builder::count(&count_sql(scope, Some(today)), &self.pool).await?;

        let mut w = FilterWhere::new(TABLE_ALIAS);
        w.scope(scope);
        let (where_clause, params) = w.finish();
        let query = format!(
            "SELECT c.\"company_name\", COUNT(*) AS total FROM \"customers\" c {} \
             GROUP BY c.\"company_name\" ORDER BY total DESC, c.\"company_name\" ASC LIMIT {}",
            where_clause, TOP_COMPANIES
        );
        let top_companies = QueryBuilder::<CompanyCount>::new(SqlResult { query, params })
            .select_all(&self.pool)
            .await?;

        Ok(CustomerSummary {
            total_customers,
            customers_today,
            top_companies,
        })
    }
}

#[async_trait]
impl StoreHealth for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(DatabaseManager::health_check(&self.pool).await?)
    }
}

fn count_sql(scope: &Scope, since: Option<DateTime<Utc>>) -> SqlResult {
    let mut w = FilterWhere::new(TABLE_ALIAS);
    w.scope(scope);
    if let Some(since) = since {
        w.created_since(since);
    }
    let (where_clause, params) = w.finish();
    SqlResult {
        query: format!("SELECT COUNT(*) AS count FROM \"customers\" c {}", where_clause)
            .trim_end()
            .to_string(),
        params,
    }
}
