use std::collections::HashMap;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use redis::RedisError;
use redis::Value;

use crate::events::LeadCreatedEvent;

#[derive(Debug, thiserror::Error)]
pub enum EventLogError {
    #[error("redis error: {0}")]
    Redis(#[from] RedisError),
    #[error("could not parse stream reply: {0}")]
    MalformedReply(String),
}

/// One delivered-but-not-yet-acknowledged stream entry, as seen by a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEntry {
    pub id: String,
    pub fields: HashMap<String, String>,
}

/// An append-only log with named consumer groups: append, blocking
/// group-read, acknowledge, and idle-entry reclaim. §4.2's contract,
/// abstracted as a trait so the worker pool's dispatch/ack logic (§4.3) can
/// be unit-tested against `InMemoryEventLog` without a running Redis.
#[async_trait]
pub trait EventLog: Send + Sync {
    /// Idempotently create the consumer group; the "group already exists"
    /// condition is swallowed per §7.
    async fn ensure_group(&self) -> Result<(), EventLogError>;

    /// Append an entry, returning its log-assigned id.
    async fn append(&self, event: &LeadCreatedEvent) -> Result<String, EventLogError>;

    /// Block up to `block_ms` for up to `count` new entries addressed to
    /// `consumer`.
    async fn read_group(
        &self,
        consumer: &str,
        count: usize,
        block_ms: usize,
    ) -> Result<Vec<StreamEntry>, EventLogError>;

    /// Reassign up to `count` entries idle longer than `min_idle_ms` to
    /// `consumer`.
    async fn claim_idle(
        &self,
        consumer: &str,
        min_idle_ms: usize,
        count: usize,
    ) -> Result<Vec<StreamEntry>, EventLogError>;

    /// Mark an entry as durably processed; removes it from the pending list.
    async fn ack(&self, entry_id: &str) -> Result<(), EventLogError>;

    /// Number of times an entry has been delivered (read or reclaimed),
    /// used by the poison-message guard in §4.3.
    async fn delivery_count(&self, entry_id: &str) -> Result<u64, EventLogError>;

    /// Move a poison entry to `{stream}:dead` and ack the original so it
    /// stops recirculating.
    async fn dead_letter(&self, entry: &StreamEntry) -> Result<(), EventLogError>;
}

/// Redis Streams-backed implementation: `XADD`/`XGROUP CREATE`/
/// `XREADGROUP`/`XAUTOCLAIM`/`XACK`/`XPENDING`.
pub struct RedisEventLog {
    conn: ConnectionManager,
    stream: String,
    group: String,
}

impl RedisEventLog {
    pub fn new(conn: ConnectionManager, stream: String, group: String) -> Self {
        Self {
            conn,
            stream,
            group,
        }
    }

    fn dead_stream(&self) -> String { format!("{}:dead", self.stream) }
}

#[async_trait]
impl EventLog for RedisEventLog {
    async fn ensure_group(&self) -> Result<(), EventLogError> {
        let mut conn = self.conn.clone();
        let result: Result<(), RedisError> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(&self.stream)
            .arg(&self.group)
            .arg("$")
            .arg("MKSTREAM")
            .query_async(&mut conn)
            .await;

        match result {
            Ok(()) => Ok(()),
            // "BUSYGROUP Consumer Group name already exists" — expected on
            // every restart after the first; not an error (§7).
            Err(e) if e.to_string().contains("BUSYGROUP") => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn append(&self, event: &LeadCreatedEvent) -> Result<String, EventLogError> {
        let mut conn = self.conn.clone();
        let mut command = redis::cmd("XADD");
        command.arg(&self.stream).arg("*");
        for (field, value) in event.to_fields() {
            command.arg(field).arg(value);
        }
        let id: String = command.query_async(&mut conn).await?;
        Ok(id)
    }

    async fn read_group(
        &self,
        consumer: &str,
        count: usize,
        block_ms: usize,
    ) -> Result<Vec<StreamEntry>, EventLogError> {
        let mut conn = self.conn.clone();
        let reply: Value = redis::cmd("XREADGROUP")
            .arg("GROUP")
            .arg(&self.group)
            .arg(consumer)
            .arg("COUNT")
            .arg(count)
            .arg("BLOCK")
            .arg(block_ms)
            .arg("STREAMS")
            .arg(&self.stream)
            .arg(">")
            .query_async(&mut conn)
            .await?;
        parse_xread_reply(reply)
    }

    async fn claim_idle(
        &self,
        consumer: &str,
        min_idle_ms: usize,
        count: usize,
    ) -> Result<Vec<StreamEntry>, EventLogError> {
        let mut conn = self.conn.clone();
        let reply: Value = redis::cmd("XAUTOCLAIM")
            .arg(&self.stream)
            .arg(&self.group)
            .arg(consumer)
            .arg(min_idle_ms)
            .arg("0-0")
            .arg("COUNT")
            .arg(count)
            .query_async(&mut conn)
            .await?;
        parse_xautoclaim_reply(reply)
    }

    async fn ack(&self, entry_id: &str) -> Result<(), EventLogError> {
        let mut conn = self.conn.clone();
        let _: i64 = conn.xack(&self.stream, &self.group, &[entry_id]).await?;
        Ok(())
    }

    async fn delivery_count(&self, entry_id: &str) -> Result<u64, EventLogError> {
        let mut conn = self.conn.clone();
        let reply: Value = redis::cmd("XPENDING")
            .arg(&self.stream)
            .arg(&self.group)
            .arg(entry_id)
            .arg(entry_id)
            .arg(1)
            .query_async(&mut conn)
            .await?;
        parse_delivery_count(reply)
    }

    async fn dead_letter(&self, entry: &StreamEntry) -> Result<(), EventLogError> {
        let mut conn = self.conn.clone();
        let mut command = redis::cmd("XADD");
        command.arg(self.dead_stream()).arg("*").arg("original_id").arg(&entry.id);
        for (field, value) in &entry.fields {
            command.arg(field).arg(value);
        }
        let _id: String = command.query_async(&mut conn).await?;
        self.ack(&entry.id).await
    }
}

fn value_to_string(value: &Value) -> Result<String, EventLogError> {
    match value {
        Value::BulkString(bytes) => Ok(String::from_utf8_lossy(bytes).into_owned()),
        Value::SimpleString(s) => Ok(s.clone()),
        Value::Int(i) => Ok(i.to_string()),
        other => Err(EventLogError::MalformedReply(format!(
            "expected a string-like reply, got {other:?}"
        ))),
    }
}

/// `XREADGROUP`/`XREAD` reply shape:
/// `[[stream_name, [[id, [field, value, ...]], ...]], ...]`
fn parse_xread_reply(reply: Value) -> Result<Vec<StreamEntry>, EventLogError> {
    let streams = match reply {
        Value::Nil => return Ok(vec![]),
        Value::Array(streams) => streams,
        other => return Err(EventLogError::MalformedReply(format!("{other:?}"))),
    };

    let mut entries = Vec::new();
    for stream in streams {
        let Value::Array(parts) = stream else {
            return Err(EventLogError::MalformedReply("expected [name, entries]".into()));
        };
        let [_name, Value::Array(raw_entries)] = parts.as_slice() else {
            return Err(EventLogError::MalformedReply("expected [name, entries]".into()));
        };
        for raw_entry in raw_entries {
            entries.push(parse_entry(raw_entry)?);
        }
    }
    Ok(entries)
}

/// `XAUTOCLAIM` reply shape: `[next_cursor, [[id, [field, value, ...]], ...], deleted_ids]`
/// (the trailing `deleted_ids` element is absent on older Redis versions).
fn parse_xautoclaim_reply(reply: Value) -> Result<Vec<StreamEntry>, EventLogError> {
    let Value::Array(parts) = reply else {
        return Err(EventLogError::MalformedReply(format!("{reply:?}")));
    };
    let Some(Value::Array(raw_entries)) = parts.into_iter().nth(1) else {
        return Err(EventLogError::MalformedReply("missing claimed-entries element".into()));
    };
    raw_entries.iter().map(parse_entry).collect()
}

fn parse_entry(raw_entry: &Value) -> Result<StreamEntry, EventLogError> {
    let Value::Array(entry_parts) = raw_entry else {
        return Err(EventLogError::MalformedReply("expected [id, fields]".into()));
    };
    let [id_value, Value::Array(raw_fields)] = entry_parts.as_slice() else {
        return Err(EventLogError::MalformedReply("expected [id, fields]".into()));
    };
    let id = value_to_string(id_value)?;

    let mut fields = HashMap::with_capacity(raw_fields.len() / 2);
    let mut iter = raw_fields.iter();
    while let (Some(field), Some(value)) = (iter.next(), iter.next()) {
        fields.insert(value_to_string(field)?, value_to_string(value)?);
    }
    Ok(StreamEntry { id, fields })
}

/// `XPENDING key group start end count` reply shape:
/// `[[id, consumer, idle_ms, delivery_count], ...]`
fn parse_delivery_count(reply: Value) -> Result<u64, EventLogError> {
    let Value::Array(rows) = reply else {
        return Err(EventLogError::MalformedReply(format!("{reply:?}")));
    };
    let Some(Value::Array(row)) = rows.into_iter().next() else {
        // Not in the PEL (already acked, or never delivered); treat as the
        // first delivery.
        return Ok(1);
    };
    let Some(count_value) = row.into_iter().nth(3) else {
        return Err(EventLogError::MalformedReply("missing delivery-count field".into()));
    };
    match count_value {
        Value::Int(n) => Ok(n as u64),
        other => value_to_string(&other)?
            .parse()
            .map_err(|_| EventLogError::MalformedReply("delivery-count not an integer".into())),
    }
}
