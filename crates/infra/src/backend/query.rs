//! Filter/order description for `DataBackend::select`.
//!
//! Ordering on string fields is case-insensitive for ASCII letters: values
//! compare by their ASCII-lowercased form, ties by the exact bytes, then by
//! creation time and id so that every backend yields the same order regardless
//! of the database locale.

use std::cmp::Ordering;

use serde_json::Value as JsonValue;

use hvacdesk_core::EntityId;

use super::Record;

/// Row predicate. All filters of a query must match.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Match the record id.
    Id(EntityId),
    /// Payload field equals the given JSON value.
    Eq { field: String, value: JsonValue },
}

impl Filter {
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Filter::Id(id) => record.id == *id,
            Filter::Eq { field, value } => record.data.get(field) == Some(value),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderField {
    /// Server-assigned creation timestamp.
    CreatedAt,
    /// A payload field.
    Data(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub field: OrderField,
    pub direction: Direction,
}

/// Select query: filters, optional order, optional limit.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: EntityId) -> Self {
        self.filters.push(Filter::Id(id));
        self
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.filters.push(Filter::Eq {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order = Some(Order {
            field: OrderField::Data(field.into()),
            direction,
        });
        self
    }

    pub fn newest_first(mut self) -> Self {
        self.order = Some(Order {
            field: OrderField::CreatedAt,
            direction: Direction::Desc,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.filters.iter().all(|f| f.matches(record))
    }

    /// Compare two records under this query's order (ascending form).
    ///
    /// Direction is applied by the caller so tie-breakers can be reversed too.
    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        let primary = match self.order.as_ref().map(|o| &o.field) {
            Some(OrderField::Data(field)) => compare_values(a.data.get(field), b.data.get(field)),
            Some(OrderField::CreatedAt) | None => Ordering::Equal,
        };
        primary
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    }

    pub fn direction(&self) -> Direction {
        self.order.as_ref().map(|o| o.direction).unwrap_or(Direction::Asc)
    }
}

/// Collation key for string ordering. Only ASCII letters are folded, which is
/// what Postgres `lower()` does under the `"C"` collation.
fn collation_key(s: &str) -> String {
    s.to_ascii_lowercase()
}

fn type_rank(v: Option<&JsonValue>) -> u8 {
    match v {
        None | Some(JsonValue::Null) => 0,
        Some(JsonValue::Bool(_)) => 1,
        Some(JsonValue::Number(_)) => 2,
        Some(JsonValue::String(_)) => 3,
        Some(JsonValue::Array(_)) => 4,
        Some(JsonValue::Object(_)) => 5,
    }
}

fn compare_values(a: Option<&JsonValue>, b: Option<&JsonValue>) -> Ordering {
    match (a, b) {
        (Some(JsonValue::String(x)), Some(JsonValue::String(y))) => collation_key(x)
            .cmp(&collation_key(y))
            .then_with(|| x.cmp(y)),
        (Some(JsonValue::Number(x)), Some(JsonValue::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(JsonValue::Bool(x)), Some(JsonValue::Bool(y))) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use hvacdesk_core::TenantId;
    use serde_json::json;

    fn record(id: u128, name: &str, age_secs: i64) -> Record {
        let at = Utc::now() - Duration::seconds(age_secs);
        Record {
            id: EntityId::from_u128(id),
            tenant_id: TenantId::from_u128(1),
            version: 1,
            created_at: at,
            updated_at: at,
            data: super::super::encode(&json!({ "name": name, "kind": "exit" })).unwrap(),
        }
    }

    #[test]
    fn string_order_is_case_insensitive_with_exact_tiebreak() {
        let q = Query::all().order_by("name", Direction::Asc);
        let mut rows = vec![
            record(1, "filter", 0),
            record(2, "Capacitor", 0),
            record(3, "Filter", 0),
            record(4, "bracket", 0),
        ];
        rows.sort_by(|a, b| q.compare(a, b));
        let names: Vec<_> = rows.iter().map(|r| r.data["name"].as_str().unwrap()).collect();
        assert_eq!(names, ["bracket", "Capacitor", "Filter", "filter"]);
    }

    #[test]
    fn non_ascii_letters_order_by_bytes() {
        let q = Query::all().order_by("name", Direction::Asc);
        let mut rows = vec![
            record(1, "évora", 0),
            record(2, "Évora", 0),
            record(3, "AR", 0),
            record(4, "zinco", 0),
        ];
        rows.sort_by(|a, b| q.compare(a, b));
        let names: Vec<_> = rows.iter().map(|r| r.data["name"].as_str().unwrap()).collect();
        assert_eq!(names, ["AR", "zinco", "Évora", "évora"]);
    }

    #[test]
    fn eq_filters_all_must_match() {
        let q = Query::all().eq("kind", "exit").eq("name", "Filter");
        assert!(q.matches(&record(1, "Filter", 0)));
        assert!(!q.matches(&record(1, "filter", 0)));
        assert!(Query::all().with_id(EntityId::from_u128(7)).matches(&record(7, "x", 0)));
    }

    #[test]
    fn unordered_query_falls_back_to_creation_time() {
        let q = Query::all();
        let older = record(9, "b", 60);
        let newer = record(1, "a", 0);
        assert_eq!(q.compare(&older, &newer), Ordering::Less);
    }
}
