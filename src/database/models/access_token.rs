use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Server-side record of an issued bearer token; deleting it revokes the token
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AccessToken {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}
