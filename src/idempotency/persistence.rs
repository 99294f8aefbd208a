use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::Deserialize;
use serde::Serialize;

use super::IdempotencyKey;

/// 24-hour TTL per §3's `IdempotencyRecord` lifecycle.
const TTL_SECONDS: u64 = 24 * 60 * 60;

fn redis_key(key: &IdempotencyKey) -> String { format!("idempotency:{}", key.as_ref()) }

/// The cached `POST /leads` outcome: the response the caller originally
/// received, plus the normalized request body it was computed from. The
/// request is retained purely for conflict detection (§4.1 step 1), never
/// read by any other component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdempotencyRecord {
    pub status_code: u16,
    pub response_data: serde_json::Value,
    pub request_data: serde_json::Value,
}

/// Outcome of looking up a token against the cache, per §4.1 step 1.
pub enum LookupOutcome {
    /// No cached record for this token; the caller should process the
    /// request normally.
    Miss,
    /// Same token, same normalized body: replay the cached response.
    Replay(IdempotencyRecord),
    /// Same token, different normalized body: the caller should respond
    /// `409 Conflict`.
    Conflict,
}

/// `serde_json::Value`'s default map representation is a `BTreeMap`, so two
/// structurally-equal payloads serialize to byte-identical JSON regardless
/// of field declaration order — exactly the "deterministic, no volatile
/// fields" normalization §4.1 requires, as long as the caller excludes
/// server-assigned fields (id, created_at) from what it passes in here.
pub fn normalize<T: Serialize>(payload: &T) -> Result<serde_json::Value, serde_json::Error> {
    serde_json::to_value(payload)
}

pub async fn lookup(
    conn: &mut ConnectionManager,
    key: &IdempotencyKey,
    incoming_request: &serde_json::Value,
) -> Result<LookupOutcome, anyhow::Error> {
    let raw: Option<String> = conn.get(redis_key(key)).await?;
    let Some(raw) = raw else {
        return Ok(LookupOutcome::Miss);
    };
    let cached: IdempotencyRecord = serde_json::from_str(&raw)?;
    if &cached.request_data == incoming_request {
        Ok(LookupOutcome::Replay(cached))
    } else {
        Ok(LookupOutcome::Conflict)
    }
}

pub async fn store(
    conn: &mut ConnectionManager,
    key: &IdempotencyKey,
    record: &IdempotencyRecord,
) -> Result<(), anyhow::Error> {
    let raw = serde_json::to_string(record)?;
    conn.set_ex::<_, _, ()>(redis_key(key), raw, TTL_SECONDS).await?;
    Ok(())
}
