use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use hvacdesk_auth::RequestContext;

use crate::app::services::{AppServices, blocking};
use crate::app::{dto, errors};

pub async fn summary(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
) -> axum::response::Response {
    match blocking(move || services.dashboard.summary(&ctx)).await {
        Ok(summary) => (StatusCode::OK, Json(dto::dashboard_to_json(&summary))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
