use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use hvacdesk_auth::RequestContext;
use hvacdesk_quotes::{QuoteDraft, QuoteId, QuotePatch};

use crate::app::services::{AppServices, blocking};
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_quotes).post(create_quote))
        .route("/:id", get(get_quote).patch(update_quote).delete(delete_quote))
        .route("/:id/status", post(transition_quote))
}

pub async fn list_quotes(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
) -> axum::response::Response {
    match blocking(move || services.quotes.list(&ctx)).await {
        Ok(quotes) => (StatusCode::OK, Json(dto::quotes_to_json(&quotes))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_quote(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Json(draft): Json<QuoteDraft>,
) -> axum::response::Response {
    match blocking(move || services.quotes.create(&ctx, draft)).await {
        Ok(quote) => (StatusCode::CREATED, Json(dto::quote_to_json(&quote))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_quote(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: QuoteId = match errors::parse_id(&id, "quote") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match blocking(move || services.quotes.get(&ctx, id)).await {
        Ok(quote) => (StatusCode::OK, Json(dto::quote_to_json(&quote))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_quote(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    Json(patch): Json<QuotePatch>,
) -> axum::response::Response {
    let id: QuoteId = match errors::parse_id(&id, "quote") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match blocking(move || services.quotes.update(&ctx, id, patch)).await {
        Ok(quote) => (StatusCode::OK, Json(dto::quote_to_json(&quote))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn transition_quote(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::TransitionQuoteRequest>,
) -> axum::response::Response {
    let id: QuoteId = match errors::parse_id(&id, "quote") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match blocking(move || services.quotes.transition(&ctx, id, body.status)).await {
        Ok(quote) => (StatusCode::OK, Json(dto::quote_to_json(&quote))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_quote(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: QuoteId = match errors::parse_id(&id, "quote") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match blocking(move || services.quotes.delete(&ctx, id)).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
