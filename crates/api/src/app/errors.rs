use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use tracing::error;

use hvacdesk_infra::ServiceError;

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        ServiceError::Auth(e) => json_error(StatusCode::UNAUTHORIZED, "unauthorized", e.to_string()),
        ServiceError::NotFound(entity) => {
            json_error(StatusCode::NOT_FOUND, "not_found", format!("{entity} not found"))
        }
        ServiceError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        ServiceError::Backend(e) => {
            error!(error = %e, "backend failure");
            json_error(StatusCode::BAD_GATEWAY, "backend_error", e.to_string())
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Parse a path id, answering 400 on malformed input.
pub fn parse_id<T>(raw: &str, what: &'static str) -> Result<T, axum::response::Response>
where
    T: core::str::FromStr,
{
    raw.parse()
        .map_err(|_| json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("invalid {what} id")))
}
