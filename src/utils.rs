use std::fmt::Debug;
use std::fmt::Display;

/// Convert arbitrary error types to `actix_web::Error` with HTTP 500
pub fn error_500<T>(e: T) -> actix_web::Error
where
    T: Debug + Display + 'static,
{
    actix_web::error::ErrorInternalServerError(e)
}

/// Convert arbitrary error types to `actix_web::Error` with HTTP 400
pub fn error_400<T>(e: T) -> actix_web::Error
where
    T: Debug + Display + 'static,
{
    actix_web::error::ErrorBadRequest(e)
}

/// Convert arbitrary error types to `actix_web::Error` with HTTP 422
pub fn error_422<T>(e: T) -> actix_web::Error
where
    T: Debug + Display + 'static,
{
    actix_web::error::ErrorUnprocessableEntity(e)
}

/// Convert arbitrary error types to `actix_web::Error` with HTTP 409
pub fn error_409<T>(e: T) -> actix_web::Error
where
    T: Debug + Display + 'static,
{
    actix_web::error::ErrorConflict(e)
}

/// `web::JsonConfig` error handler: a body that fails to deserialize (bad
/// JSON, wrong field types, missing required fields) is a malformed request
/// per §6, not actix's default `400`.
pub fn json_error_handler(
    err: actix_web::error::JsonPayloadError,
    _req: &actix_web::HttpRequest,
) -> actix_web::Error {
    actix_web::error::ErrorUnprocessableEntity(err.to_string())
}
