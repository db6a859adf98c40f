use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use hvacdesk_infra::DashboardSummary;
use hvacdesk_inventory::{MovementKind, StockItem, StockMovement};
use hvacdesk_quotes::{Quote, QuoteStatus};

// -------------------------
// Request DTOs
// -------------------------

/// Body of `POST /items/:id/movements`; the item comes from the path.
#[derive(Debug, Deserialize)]
pub struct RecordMovementRequest {
    pub kind: MovementKind,
    pub quantity: Decimal,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TransitionQuoteRequest {
    pub status: QuoteStatus,
}

// -------------------------
// Response mapping
// -------------------------

pub fn item_to_json(item: &StockItem) -> JsonValue {
    let mut json = serde_json::to_value(item).unwrap_or(JsonValue::Null);
    if let Some(obj) = json.as_object_mut() {
        obj.insert("low_stock".to_string(), JsonValue::Bool(item.is_low_stock()));
        obj.insert(
            "stock_value".to_string(),
            JsonValue::String(item.stock_value().to_string()),
        );
    }
    json
}

pub fn items_to_json(items: &[StockItem]) -> JsonValue {
    JsonValue::Array(items.iter().map(item_to_json).collect())
}

pub fn movement_to_json(movement: &StockMovement) -> JsonValue {
    serde_json::to_value(movement).unwrap_or(JsonValue::Null)
}

pub fn movements_to_json(movements: &[StockMovement]) -> JsonValue {
    JsonValue::Array(movements.iter().map(movement_to_json).collect())
}

pub fn quote_to_json(quote: &Quote) -> JsonValue {
    let mut json = serde_json::to_value(quote).unwrap_or(JsonValue::Null);
    if let Some(obj) = json.as_object_mut() {
        obj.insert("total".to_string(), JsonValue::String(quote.total().to_string()));
    }
    json
}

pub fn quotes_to_json(quotes: &[Quote]) -> JsonValue {
    JsonValue::Array(quotes.iter().map(quote_to_json).collect())
}

pub fn dashboard_to_json(summary: &DashboardSummary) -> JsonValue {
    serde_json::to_value(summary).unwrap_or(JsonValue::Null)
}
