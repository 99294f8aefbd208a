use actix_web::web;
use actix_web::HttpResponse;
use sqlx::PgPool;
use uuid::Uuid;

use crate::insight_store;
use crate::utils::error_500;

/// `GET /leads/{id}/insight` — the most recent insight for the lead, or
/// `404` if the worker hasn't produced one yet.
pub async fn get_insight(
    path: web::Path<Uuid>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, actix_web::Error> {
    let lead_id = path.into_inner();
    match insight_store::find_by_lead(pool.get_ref(), lead_id)
        .await
        .map_err(error_500)?
    {
        Some(insight) => Ok(HttpResponse::Ok().json(insight)),
        None => Ok(HttpResponse::NotFound().finish()),
    }
}
