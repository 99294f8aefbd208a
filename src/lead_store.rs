use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

/// A lead as stored and as served back to clients (§3, §6 "Lead
/// representation"). Created exactly once by Intake; never mutated or
/// deleted by the core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Lead {
    pub id: Uuid,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub name: Option<String>,
    pub note: String,
    pub source: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The caller-supplied fields of a new lead, before a server id and
/// timestamp are assigned. Also the payload normalized for idempotency
/// conflict detection (§4.1 step 1) — it deliberately excludes `id` and
/// `created_at`, which are volatile by construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewLead {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub name: Option<String>,
    pub note: String,
    pub source: Option<String>,
}

pub async fn insert(pool: &PgPool, new_lead: &NewLead) -> Result<Lead, sqlx::Error> {
    let lead = sqlx::query_as!(
        Lead,
        r#"
        INSERT INTO leads (id, email, phone, name, note, source, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, now())
        RETURNING id, email, phone, name, note, source, created_at
        "#,
        Uuid::new_v4(),
        new_lead.email,
        new_lead.phone,
        new_lead.name,
        new_lead.note,
        new_lead.source,
    )
    .fetch_one(pool)
    .await?;
    Ok(lead)
}

pub async fn get_by_id(pool: &PgPool, lead_id: Uuid) -> Result<Option<Lead>, sqlx::Error> {
    sqlx::query_as!(
        Lead,
        r#"
        SELECT id, email, phone, name, note, source, created_at
        FROM leads
        WHERE id = $1
        "#,
        lead_id,
    )
    .fetch_optional(pool)
    .await
}
