use sqlx::{self, postgres::PgArguments, FromRow, PgPool, Row};

use crate::filter::types::{FilterParam, SqlResult};

/// Runs a generated statement, binding its positional parameters in order
pub struct QueryBuilder<T> {
    sql: SqlResult,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> QueryBuilder<T>
where
    T: for<'r> FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
{
    pub fn new(sql: SqlResult) -> Self {
        Self {
            sql,
            _phantom: std::marker::PhantomData,
        }
    }

    pub async fn select_all(self, pool: &PgPool) -> Result<Vec<T>, sqlx::Error> {
        tracing::debug!("select_all: {}", self.sql.query);
        let mut q = sqlx::query_as::<_, T>(&self.sql.query);
        for p in self.sql.params.iter() {
            q = bind_param_query_as(q, p);
        }
        q.fetch_all(pool).await
    }
}

/// Runs a `SELECT COUNT(*) AS count ...` statement
pub async fn count(sql: &SqlResult, pool: &PgPool) -> Result<i64, sqlx::Error> {
    tracing::debug!("count: {}", sql.query);
    let mut q = sqlx::query(&sql.query);
    for p in sql.params.iter() {
        q = bind_param_query(q, p);
    }
    let row = q.fetch_one(pool).await?;
    row.try_get("count")
}

fn bind_param_query<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &FilterParam,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        FilterParam::Text(s) => q.bind(s.clone()),
        FilterParam::Uuid(u) => q.bind(*u),
        FilterParam::Int(i) => q.bind(*i),
        FilterParam::Timestamp(t) => q.bind(*t),
    }
}

fn bind_param_query_as<'q, O>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    v: &FilterParam,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, sqlx::postgres::PgRow>,
{
    match v {
        FilterParam::Text(s) => q.bind(s.clone()),
        FilterParam::Uuid(u) => q.bind(*u),
        FilterParam::Int(i) => q.bind(*i),
        FilterParam::Timestamp(t) => q.bind(*t),
    }
}
