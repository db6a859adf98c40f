use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use hvacdesk_auth::RequestContext;
use hvacdesk_inventory::{ItemDraft, ItemPatch, MovementRequest, StockItemId};

use crate::app::services::{AppServices, blocking};
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/low-stock", get(low_stock))
        .route("/:id", get(get_item).patch(update_item).delete(delete_item))
        .route("/:id/movements", get(item_history).post(record_movement))
}

pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
) -> axum::response::Response {
    match blocking(move || services.catalog.list(&ctx)).await {
        Ok(items) => (StatusCode::OK, Json(dto::items_to_json(&items))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn low_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
) -> axum::response::Response {
    match blocking(move || services.catalog.low_stock(&ctx)).await {
        Ok(items) => (StatusCode::OK, Json(dto::items_to_json(&items))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Json(draft): Json<ItemDraft>,
) -> axum::response::Response {
    match blocking(move || services.catalog.create(&ctx, draft)).await {
        Ok(item) => (StatusCode::CREATED, Json(dto::item_to_json(&item))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: StockItemId = match errors::parse_id(&id, "item") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match blocking(move || services.catalog.get(&ctx, id)).await {
        Ok(item) => (StatusCode::OK, Json(dto::item_to_json(&item))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    Json(patch): Json<ItemPatch>,
) -> axum::response::Response {
    let id: StockItemId = match errors::parse_id(&id, "item") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match blocking(move || services.catalog.update(&ctx, id, patch)).await {
        Ok(item) => (StatusCode::OK, Json(dto::item_to_json(&item))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: StockItemId = match errors::parse_id(&id, "item") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match blocking(move || services.catalog.delete(&ctx, id)).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn item_history(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: StockItemId = match errors::parse_id(&id, "item") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match blocking(move || services.ledger.history(&ctx, id)).await {
        Ok(movements) => (StatusCode::OK, Json(dto::movements_to_json(&movements))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn record_movement(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::RecordMovementRequest>,
) -> axum::response::Response {
    let item_id: StockItemId = match errors::parse_id(&id, "item") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let request = MovementRequest {
        item_id,
        kind: body.kind,
        quantity: body.quantity,
        reason: body.reason,
    };

    match blocking(move || services.ledger.record(&ctx, request)).await {
        Ok(movement) => (StatusCode::CREATED, Json(dto::movement_to_json(&movement))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
