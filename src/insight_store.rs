use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::Confidence;
use crate::domain::ContentHash;
use crate::domain::Intent;
use crate::domain::NextAction;
use crate::domain::Priority;

/// The classification result for a lead's note (§3). Created by a worker
/// after successful classification; never mutated or deleted by the core.
#[derive(Debug, Clone, Serialize)]
pub struct Insight {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub content_hash: ContentHash,
    pub intent: Intent,
    pub priority: Priority,
    pub next_action: NextAction,
    pub confidence: Confidence,
    pub tags: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to insert an insight row; `id`/`created_at` are assigned by
/// the store.
pub struct NewInsight {
    pub lead_id: Uuid,
    pub content_hash: ContentHash,
    pub intent: Intent,
    pub priority: Priority,
    pub next_action: NextAction,
    pub confidence: Confidence,
    pub tags: Option<Vec<String>>,
}

/// Postgres error code for a unique-constraint violation.
const UNIQUE_VIOLATION: &str = "23505";

/// Attempts to insert the insight row for `(lead_id, content_hash)`.
/// §4.3(d): if the `uq_lead_content` constraint rejects the insert, a
/// concurrent worker already won the race — that is a *successful* no-op,
/// not a failure, and is reported as `Ok(None)` rather than an error.
pub async fn try_insert(pool: &PgPool, new_insight: &NewInsight) -> Result<Option<Insight>, sqlx::Error> {
    let result = sqlx::query_as!(
        InsightRow,
        r#"
        INSERT INTO insights (id, lead_id, content_hash, intent, priority, next_action, confidence, tags, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, now())
        RETURNING id, lead_id, content_hash, intent, priority, next_action, confidence, tags as "tags: Json<Vec<String>>", created_at
        "#,
        Uuid::new_v4(),
        new_insight.lead_id,
        new_insight.content_hash.as_ref(),
        new_insight.intent as Intent,
        new_insight.priority as Priority,
        new_insight.next_action as NextAction,
        new_insight.confidence.value(),
        new_insight.tags.clone().map(Json) as Option<Json<Vec<String>>>,
    )
    .fetch_one(pool)
    .await;

    match result {
        Ok(row) => Ok(Some(row.into())),
        Err(sqlx::Error::Database(e)) if e.code().as_deref() == Some(UNIQUE_VIOLATION) => Ok(None),
        Err(e) => Err(e),
    }
}

pub async fn find_by_lead_and_hash(
    pool: &PgPool,
    lead_id: Uuid,
    content_hash: &ContentHash,
) -> Result<Option<Insight>, sqlx::Error> {
    let row = sqlx::query_as!(
        InsightRow,
        r#"
        SELECT id, lead_id, content_hash, intent, priority, next_action, confidence, tags as "tags: Json<Vec<String>>", created_at
        FROM insights
        WHERE lead_id = $1 AND content_hash = $2
        "#,
        lead_id,
        content_hash.as_ref(),
    )
    .fetch_optional(pool)
    .await?;
    Ok(row.map(Into::into))
}

pub async fn find_by_lead(pool: &PgPool, lead_id: Uuid) -> Result<Option<Insight>, sqlx::Error> {
    let row = sqlx::query_as!(
        InsightRow,
        r#"
        SELECT id, lead_id, content_hash, intent, priority, next_action, confidence, tags as "tags: Json<Vec<String>>", created_at
        FROM insights
        WHERE lead_id = $1
        ORDER BY created_at DESC
        LIMIT 1
        "#,
        lead_id,
    )
    .fetch_optional(pool)
    .await?;
    Ok(row.map(Into::into))
}

/// Intermediate shape matching the raw row; `tags` needs the `Json<_>`
/// wrapper for sqlx's query macro but callers want a plain `Vec<String>`.
struct InsightRow {
    id: Uuid,
    lead_id: Uuid,
    content_hash: String,
    intent: Intent,
    priority: Priority,
    next_action: NextAction,
    confidence: f32,
    tags: Option<Json<Vec<String>>>,
    created_at: DateTime<Utc>,
}

impl From<InsightRow> for Insight {
    fn from(row: InsightRow) -> Self {
        Self {
            id: row.id,
            lead_id: row.lead_id,
            content_hash: ContentHash::parse(row.content_hash)
                .expect("content_hash column always holds a valid hash"),
            intent: row.intent,
            priority: row.priority,
            next_action: row.next_action,
            confidence: Confidence::new(row.confidence)
                .expect("confidence column always holds a valid value"),
            tags: row.tags.map(|Json(tags)| tags),
            created_at: row.created_at,
        }
    }
}
