use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;
use serde_json::Value as JsonValue;

use hvacdesk_core::{EntityId, ExpectedVersion, TenantId};

use super::query::Direction;
use super::{BackendError, Collection, DataBackend, Increment, Query, Record, Row, decimal_field};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
struct TableKey {
    tenant_id: TenantId,
    collection: Collection,
}

/// In-memory data backend.
///
/// Intended for tests/dev. Each call takes the table lock for its whole
/// duration, so every single-record write is atomic.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    tables: RwLock<HashMap<TableKey, Vec<Record>>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(tenant_id: TenantId, collection: Collection) -> TableKey {
        TableKey {
            tenant_id,
            collection,
        }
    }
}

fn poisoned<T>(_: T) -> BackendError {
    BackendError::Unavailable("lock poisoned".to_string())
}

impl DataBackend for InMemoryBackend {
    fn select(
        &self,
        tenant_id: TenantId,
        collection: Collection,
        query: &Query,
    ) -> Result<Vec<Record>, BackendError> {
        let tables = self.tables.read().map_err(poisoned)?;
        let Some(rows) = tables.get(&Self::key(tenant_id, collection)) else {
            return Ok(vec![]);
        };

        let mut out: Vec<Record> = rows.iter().filter(|r| query.matches(r)).cloned().collect();
        out.sort_by(|a, b| match query.direction() {
            Direction::Asc => query.compare(a, b),
            Direction::Desc => query.compare(b, a),
        });
        if let Some(limit) = query.limit {
            out.truncate(limit);
        }
        Ok(out)
    }

    fn insert(
        &self,
        tenant_id: TenantId,
        collection: Collection,
        data: Row,
    ) -> Result<Record, BackendError> {
        let now = Utc::now();
        let record = Record {
            id: EntityId::new(),
            tenant_id,
            version: 1,
            created_at: now,
            updated_at: now,
            data,
        };

        let mut tables = self.tables.write().map_err(poisoned)?;
        tables
            .entry(Self::key(tenant_id, collection))
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    fn update(
        &self,
        tenant_id: TenantId,
        collection: Collection,
        id: EntityId,
        patch: Row,
        expected: ExpectedVersion,
    ) -> Result<Record, BackendError> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        let record = tables
            .get_mut(&Self::key(tenant_id, collection))
            .and_then(|rows| rows.iter_mut().find(|r| r.id == id))
            .ok_or(BackendError::NotFound)?;

        if !expected.matches(record.version) {
            return Err(BackendError::Conflict(format!(
                "{collection} {id}: expected {expected:?}, found {}",
                record.version
            )));
        }

        for (field, value) in patch {
            record.data.insert(field, value);
        }
        record.version += 1;
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    fn delete(
        &self,
        tenant_id: TenantId,
        collection: Collection,
        id: EntityId,
    ) -> Result<(), BackendError> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        let rows = tables
            .get_mut(&Self::key(tenant_id, collection))
            .ok_or(BackendError::NotFound)?;
        let before = rows.len();
        rows.retain(|r| r.id != id);
        if rows.len() == before {
            return Err(BackendError::NotFound);
        }
        Ok(())
    }

    fn increment(
        &self,
        tenant_id: TenantId,
        collection: Collection,
        id: EntityId,
        op: &Increment,
    ) -> Result<Record, BackendError> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        let record = tables
            .get_mut(&Self::key(tenant_id, collection))
            .and_then(|rows| rows.iter_mut().find(|r| r.id == id))
            .ok_or(BackendError::NotFound)?;

        let current = decimal_field(&record.data, &op.field)?;
        let next = current.checked_add(op.delta).ok_or_else(|| {
            BackendError::Constraint(format!("{} would leave the decimal range", op.field))
        })?;
        if let Some(floor) = op.floor {
            if next < floor {
                return Err(BackendError::Constraint(format!(
                    "{} would drop to {next}, below {floor}",
                    op.field
                )));
            }
        }

        record
            .data
            .insert(op.field.clone(), JsonValue::String(next.to_string()));
        record.version += 1;
        record.updated_at = Utc::now();
        Ok(record.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::encode;
    use rust_decimal::Decimal;
    use serde_json::json;

    fn test_tenant_id() -> TenantId {
        TenantId::new()
    }

    fn row(value: serde_json::Value) -> Row {
        encode(&value).unwrap()
    }

    #[test]
    fn insert_stamps_metadata() {
        let backend = InMemoryBackend::new();
        let tenant = test_tenant_id();
        let rec = backend
            .insert(tenant, Collection::StockItems, row(json!({"name": "Filter"})))
            .unwrap();
        assert_eq!(rec.version, 1);
        assert_eq!(rec.tenant_id, tenant);
        assert_eq!(rec.created_at, rec.updated_at);
        assert_eq!(
            backend.get(tenant, Collection::StockItems, rec.id).unwrap(),
            Some(rec)
        );
    }

    #[test]
    fn tenants_are_isolated() {
        let backend = InMemoryBackend::new();
        let (a, b) = (test_tenant_id(), test_tenant_id());
        let rec = backend
            .insert(a, Collection::Quotes, row(json!({"customer_name": "ACME"})))
            .unwrap();

        assert!(backend.get(b, Collection::Quotes, rec.id).unwrap().is_none());
        assert!(backend.select(b, Collection::Quotes, &Query::all()).unwrap().is_empty());
        assert_eq!(
            backend.delete(b, Collection::Quotes, rec.id),
            Err(BackendError::NotFound)
        );
        assert_eq!(
            backend
                .update(b, Collection::Quotes, rec.id, Row::new(), ExpectedVersion::Any)
                .unwrap_err(),
            BackendError::NotFound
        );
    }

    #[test]
    fn update_merges_patch_and_checks_version() {
        let backend = InMemoryBackend::new();
        let tenant = test_tenant_id();
        let rec = backend
            .insert(tenant, Collection::StockItems, row(json!({"name": "a", "unit": "un"})))
            .unwrap();

        let updated = backend
            .update(
                tenant,
                Collection::StockItems,
                rec.id,
                row(json!({"name": "b"})),
                ExpectedVersion::Exact(1),
            )
            .unwrap();
        assert_eq!(updated.version, 2);
        assert_eq!(updated.data["name"], "b");
        assert_eq!(updated.data["unit"], "un");

        let stale = backend.update(
            tenant,
            Collection::StockItems,
            rec.id,
            row(json!({"name": "c"})),
            ExpectedVersion::Exact(1),
        );
        assert!(matches!(stale, Err(BackendError::Conflict(_))));
    }

    #[test]
    fn increment_respects_floor() {
        let backend = InMemoryBackend::new();
        let tenant = test_tenant_id();
        let rec = backend
            .insert(tenant, Collection::StockItems, row(json!({"quantity_on_hand": "3"})))
            .unwrap();

        let op = Increment::new("quantity_on_hand", Decimal::from(-4)).with_floor(Some(Decimal::ZERO));
        assert!(matches!(
            backend.increment(tenant, Collection::StockItems, rec.id, &op),
            Err(BackendError::Constraint(_))
        ));

        let op = Increment::new("quantity_on_hand", Decimal::new(-25, 1));
        let after = backend
            .increment(tenant, Collection::StockItems, rec.id, &op)
            .unwrap();
        assert_eq!(decimal_field(&after.data, "quantity_on_hand").unwrap(), Decimal::new(5, 1));
        assert_eq!(after.version, 2);
    }

    #[test]
    fn increment_overflow_is_a_constraint_and_keeps_the_store_usable() {
        let backend = InMemoryBackend::new();
        let tenant = test_tenant_id();
        let max = Decimal::MAX.to_string();
        let rec = backend
            .insert(tenant, Collection::StockItems, row(json!({"quantity_on_hand": max})))
            .unwrap();

        let op = Increment::new("quantity_on_hand", Decimal::ONE);
        assert!(matches!(
            backend.increment(tenant, Collection::StockItems, rec.id, &op),
            Err(BackendError::Constraint(_))
        ));

        let other = test_tenant_id();
        backend
            .insert(other, Collection::StockItems, row(json!({"quantity_on_hand": "1"})))
            .unwrap();
        let unchanged = backend
            .get(tenant, Collection::StockItems, rec.id)
            .unwrap()
            .unwrap();
        assert_eq!(unchanged.version, 1);
        assert_eq!(decimal_field(&unchanged.data, "quantity_on_hand").unwrap(), Decimal::MAX);
    }

    #[test]
    fn select_orders_filters_and_limits() {
        let backend = InMemoryBackend::new();
        let tenant = test_tenant_id();
        for (name, kind) in [("b", "x"), ("A", "x"), ("c", "y")] {
            backend
                .insert(tenant, Collection::StockItems, row(json!({"name": name, "kind": kind})))
                .unwrap();
        }

        let names = |q: Query| -> Vec<String> {
            backend
                .select(tenant, Collection::StockItems, &q)
                .unwrap()
                .into_iter()
                .map(|r| r.data["name"].as_str().unwrap().to_string())
                .collect()
        };

        assert_eq!(names(Query::all().order_by("name", Direction::Asc)), ["A", "b", "c"]);
        assert_eq!(names(Query::all().order_by("name", Direction::Desc).limit(2)), ["c", "b"]);
        assert_eq!(names(Query::all().eq("kind", "x").order_by("name", Direction::Asc)), ["A", "b"]);
    }
}
