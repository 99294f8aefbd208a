use std::collections::HashMap;

use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::ContentHash;

/// Wire error for a stream entry that cannot be parsed into a
/// `LeadCreatedEvent`. Per §4.3(a), a worker treats this as processing
/// *failure* (entry stays pending) rather than panicking.
#[derive(Debug, thiserror::Error)]
pub enum EventParseError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("field `{field}` has invalid value {value:?}: {reason}")]
    InvalidField {
        field: &'static str,
        value: String,
        reason: String,
    },
}

/// The `lead.created` stream entry published by the Intake service and
/// consumed by the triage worker pool. All fields are strings on the wire
/// (§6); `to_fields`/`try_from_fields` are the only (de)serialization paths,
/// so round-tripping is exercised directly (invariant 5, §8).
#[derive(Debug, Clone, PartialEq)]
pub struct LeadCreatedEvent {
    pub event_id: Uuid,
    pub lead_id: Uuid,
    pub note: String,
    pub content_hash: ContentHash,
    pub occurred_at: DateTime<Utc>,
}

const EVENT_TYPE: &str = "lead.created";

impl LeadCreatedEvent {
    pub fn new(lead_id: Uuid, note: String) -> Self {
        let content_hash = ContentHash::of(&note);
        Self {
            event_id: Uuid::new_v4(),
            lead_id,
            note,
            content_hash,
            occurred_at: Utc::now(),
        }
    }

    /// The field-value pairs written via `XADD`, matching §6's wire format.
    pub fn to_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("event_id", self.event_id.to_string()),
            ("type", EVENT_TYPE.to_string()),
            ("lead_id", self.lead_id.to_string()),
            ("note", self.note.clone()),
            ("content_hash", self.content_hash.to_string()),
            ("occurred_at", self.occurred_at.to_rfc3339()),
        ]
    }

    /// Parses the field map returned by `XREADGROUP`/`XCLAIM` back into an
    /// event. Unknown extra fields are ignored; any missing or malformed
    /// required field is an `EventParseError`.
    pub fn try_from_fields(fields: &HashMap<String, String>) -> Result<Self, EventParseError> {
        let get = |name: &'static str| -> Result<&String, EventParseError> {
            fields.get(name).ok_or(EventParseError::MissingField(name))
        };

        let event_type = get("type")?;
        if event_type != EVENT_TYPE {
            return Err(EventParseError::InvalidField {
                field: "type",
                value: event_type.clone(),
                reason: format!("expected `{EVENT_TYPE}`"),
            });
        }

        let event_id = parse_uuid("event_id", get("event_id")?)?;
        let lead_id = parse_uuid("lead_id", get("lead_id")?)?;
        let note = get("note")?.clone();
        let content_hash = ContentHash::parse(get("content_hash")?.clone()).map_err(|reason| {
            EventParseError::InvalidField {
                field: "content_hash",
                value: get("content_hash").map(String::clone).unwrap_or_default(),
                reason,
            }
        })?;
        let occurred_raw = get("occurred_at")?;
        let occurred_at = DateTime::parse_from_rfc3339(occurred_raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| EventParseError::InvalidField {
                field: "occurred_at",
                value: occurred_raw.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            event_id,
            lead_id,
            note,
            content_hash,
            occurred_at,
        })
    }
}

fn parse_uuid(field: &'static str, value: &str) -> Result<Uuid, EventParseError> {
    Uuid::parse_str(value).map_err(|e| EventParseError::InvalidField {
        field,
        value: value.to_string(),
        reason: e.to_string(),
    })
}
