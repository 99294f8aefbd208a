use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::web;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::Note;
use crate::events::LeadCreatedEvent;
use crate::idempotency;
use crate::idempotency::IdempotencyKey;
use crate::idempotency::IdempotencyRecord;
use crate::idempotency::LookupOutcome;
use crate::lead_store;
use crate::lead_store::NewLead;
use crate::stream::EventLog;
use crate::utils::error_409;
use crate::utils::error_422;
use crate::utils::error_500;

#[derive(Deserialize)]
pub struct LeadPayload {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub name: Option<String>,
    pub note: String,
    pub source: Option<String>,
}

/// `POST /leads` — deduplicates by the caller's `Idempotency-Key`, persists
/// the lead, publishes `lead.created`, and caches the response. Step
/// numbering follows §4.1.
#[tracing::instrument(
    skip(request, payload, pool, redis, event_log),
    fields(idempotency_key = tracing::field::Empty, lead_id = tracing::field::Empty)
)]
pub async fn create_lead(
    request: HttpRequest,
    payload: web::Json<LeadPayload>,
    pool: web::Data<PgPool>,
    redis: web::Data<redis::aio::ConnectionManager>,
    event_log: web::Data<Arc<dyn EventLog>>,
) -> Result<HttpResponse, actix_web::Error> {
    let idempotency_key = extract_idempotency_key(&request)?;
    tracing::Span::current().record("idempotency_key", idempotency_key.as_ref());

    let note = Note::parse(payload.note.clone()).map_err(error_422)?;
    let new_lead = NewLead {
        email: payload.email.clone(),
        phone: payload.phone.clone(),
        name: payload.name.clone(),
        note: note.into(),
        source: payload.source.clone(),
    };
    let normalized_request = idempotency::normalize(&new_lead).map_err(error_500)?;

    let mut conn = redis.get_ref().clone();
    match idempotency::lookup(&mut conn, &idempotency_key, &normalized_request)
        .await
        .map_err(error_500)?
    {
        LookupOutcome::Replay(record) => return Ok(replay_response(record)?),
        LookupOutcome::Conflict => {
            return Err(error_409("idempotency key reused with a different request body"))
        }
        LookupOutcome::Miss => {}
    }

    let lead = lead_store::insert(pool.get_ref(), &new_lead)
        .await
        .map_err(error_500)?;
    tracing::Span::current().record("lead_id", tracing::field::display(lead.id));

    let event = LeadCreatedEvent::new(lead.id, lead.note.clone());
    event_log.append(&event).await.map_err(error_500)?;

    let response_data = serde_json::to_value(&lead).map_err(error_500)?;
    let record = IdempotencyRecord {
        status_code: StatusCode::CREATED.as_u16(),
        response_data,
        request_data: normalized_request,
    };
    idempotency::store(&mut conn, &idempotency_key, &record)
        .await
        .map_err(error_500)?;

    Ok(HttpResponse::Created().json(&lead))
}

/// `GET /leads/{id}` — the lead or `404`.
pub async fn get_lead(
    path: web::Path<Uuid>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, actix_web::Error> {
    let lead_id = path.into_inner();
    match lead_store::get_by_id(pool.get_ref(), lead_id)
        .await
        .map_err(error_500)?
    {
        Some(lead) => Ok(HttpResponse::Ok().json(lead)),
        None => Ok(HttpResponse::NotFound().finish()),
    }
}

fn extract_idempotency_key(request: &HttpRequest) -> Result<IdempotencyKey, actix_web::Error> {
    let raw = request
        .headers()
        .get("Idempotency-Key")
        .ok_or_else(|| actix_web::error::ErrorUnprocessableEntity("missing Idempotency-Key header"))?
        .to_str()
        .map_err(error_422)?;
    // §4.1: the token must parse as a 128-bit id.
    let token = Uuid::parse_str(raw).map_err(error_422)?;
    IdempotencyKey::try_from(token.to_string()).map_err(error_422)
}

fn replay_response(record: IdempotencyRecord) -> Result<HttpResponse, actix_web::Error> {
    let status = StatusCode::from_u16(record.status_code).map_err(error_500)?;
    Ok(HttpResponse::build(status).json(record.response_data))
}
