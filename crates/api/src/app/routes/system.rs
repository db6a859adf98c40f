use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use hvacdesk_auth::RequestContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(ctx): Extension<RequestContext>) -> impl IntoResponse {
    Json(serde_json::json!({
        "tenant_id": ctx.tenant_id().to_string(),
        "user_id": ctx.actor_id().to_string(),
    }))
}
