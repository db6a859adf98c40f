//! Tenant-scoped data backend abstraction.
//!
//! The hosted data service is table-based: each collection stores rows keyed by
//! a server-assigned id, every row belongs to exactly one tenant, and the
//! server stamps version and timestamps on write. Row payloads are opaque JSON
//! objects; typed services above this layer own their meaning.
//!
//! ## Metadata vs payload
//!
//! [`Record`] separates server metadata (`id`, `tenant_id`, `version`,
//! `created_at`, `updated_at`) from the client payload (`data`). Updates merge
//! a patch into `data` only, so no caller can rewrite identity, tenancy or
//! timestamps through the backend.
//!
//! ## Concurrency
//!
//! `update` accepts an [`ExpectedVersion`] for compare-and-set writes and
//! `increment` applies a signed delta to a numeric field in one step. Both are
//! atomic per record; nothing spans multiple records.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

use hvacdesk_core::{EntityId, ExpectedVersion, TenantId};

pub mod in_memory;
pub mod postgres;
pub mod query;

pub use in_memory::InMemoryBackend;
pub use postgres::PostgresBackend;
pub use query::{Direction, Filter, Order, OrderField, Query};

/// A row payload.
pub type Row = Map<String, JsonValue>;

/// Entity collections known to the application.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    StockItems,
    StockMovements,
    Quotes,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::StockItems => "stock_items",
            Collection::StockMovements => "stock_movements",
            Collection::Quotes => "quotes",
        }
    }
}

impl core::fmt::Display for Collection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored row plus its server metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: EntityId,
    pub tenant_id: TenantId,
    /// Bumped by one on every successful write; 1 after insert.
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub data: Row,
}

impl Record {
    /// Deserialize the payload into a typed attribute set.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, BackendError> {
        serde_json::from_value(JsonValue::Object(self.data.clone())).map_err(|e| {
            BackendError::Malformed(format!("record {} does not decode: {e}", self.id))
        })
    }
}

/// Serialize a typed value into a row payload (must be a JSON object).
pub fn encode<T: Serialize>(value: &T) -> Result<Row, BackendError> {
    match serde_json::to_value(value) {
        Ok(JsonValue::Object(map)) => Ok(map),
        Ok(other) => Err(BackendError::Malformed(format!(
            "row payload must be an object, got {other}"
        ))),
        Err(e) => Err(BackendError::Malformed(format!("row payload serialization failed: {e}"))),
    }
}

/// Atomic numeric adjustment of one payload field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Increment {
    pub field: String,
    pub delta: Decimal,
    /// Reject the write (with [`BackendError::Constraint`]) if the result would be below this.
    pub floor: Option<Decimal>,
}

impl Increment {
    pub fn new(field: impl Into<String>, delta: Decimal) -> Self {
        Self {
            field: field.into(),
            delta,
            floor: None,
        }
    }

    pub fn with_floor(mut self, floor: Option<Decimal>) -> Self {
        self.floor = floor;
        self
    }
}

/// Backend operation error.
///
/// These are **infrastructure errors** reported by the data service; services
/// translate them into the application taxonomy.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("record not found")]
    NotFound,

    #[error("version conflict: {0}")]
    Conflict(String),

    #[error("constraint violated: {0}")]
    Constraint(String),

    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("malformed data: {0}")]
    Malformed(String),
}

/// Tenant-scoped, table-based data service.
///
/// Every call names the tenant explicitly; implementations must never return
/// or modify rows of another tenant (a foreign id behaves as absent).
pub trait DataBackend: Send + Sync {
    /// Rows of one collection matching `query`, in the query's order.
    fn select(
        &self,
        tenant_id: TenantId,
        collection: Collection,
        query: &Query,
    ) -> Result<Vec<Record>, BackendError>;

    /// Insert a row; the backend assigns id, version and timestamps.
    fn insert(
        &self,
        tenant_id: TenantId,
        collection: Collection,
        data: Row,
    ) -> Result<Record, BackendError>;

    /// Merge `patch` into the row's payload.
    ///
    /// Fails with `NotFound` if absent and `Conflict` if `expected` does not
    /// match the stored version.
    fn update(
        &self,
        tenant_id: TenantId,
        collection: Collection,
        id: EntityId,
        patch: Row,
        expected: ExpectedVersion,
    ) -> Result<Record, BackendError>;

    /// Remove a row; `NotFound` if absent.
    fn delete(
        &self,
        tenant_id: TenantId,
        collection: Collection,
        id: EntityId,
    ) -> Result<(), BackendError>;

    /// Atomically add `op.delta` to a numeric payload field.
    fn increment(
        &self,
        tenant_id: TenantId,
        collection: Collection,
        id: EntityId,
        op: &Increment,
    ) -> Result<Record, BackendError>;

    /// Fetch one row by id.
    fn get(
        &self,
        tenant_id: TenantId,
        collection: Collection,
        id: EntityId,
    ) -> Result<Option<Record>, BackendError> {
        let query = Query::all().with_id(id).limit(1);
        Ok(self.select(tenant_id, collection, &query)?.into_iter().next())
    }
}

impl<S> DataBackend for Arc<S>
where
    S: DataBackend + ?Sized,
{
    fn select(
        &self,
        tenant_id: TenantId,
        collection: Collection,
        query: &Query,
    ) -> Result<Vec<Record>, BackendError> {
        (**self).select(tenant_id, collection, query)
    }

    fn insert(
        &self,
        tenant_id: TenantId,
        collection: Collection,
        data: Row,
    ) -> Result<Record, BackendError> {
        (**self).insert(tenant_id, collection, data)
    }

    fn update(
        &self,
        tenant_id: TenantId,
        collection: Collection,
        id: EntityId,
        patch: Row,
        expected: ExpectedVersion,
    ) -> Result<Record, BackendError> {
        (**self).update(tenant_id, collection, id, patch, expected)
    }

    fn delete(
        &self,
        tenant_id: TenantId,
        collection: Collection,
        id: EntityId,
    ) -> Result<(), BackendError> {
        (**self).delete(tenant_id, collection, id)
    }

    fn increment(
        &self,
        tenant_id: TenantId,
        collection: Collection,
        id: EntityId,
        op: &Increment,
    ) -> Result<Record, BackendError> {
        (**self).increment(tenant_id, collection, id, op)
    }

    fn get(
        &self,
        tenant_id: TenantId,
        collection: Collection,
        id: EntityId,
    ) -> Result<Option<Record>, BackendError> {
        (**self).get(tenant_id, collection, id)
    }
}

/// Read a decimal out of a JSON payload value (string or number encoding).
pub(crate) fn decimal_field(data: &Row, field: &str) -> Result<Decimal, BackendError> {
    let value = data
        .get(field)
        .ok_or_else(|| BackendError::Malformed(format!("field '{field}' is missing")))?;
    serde_json::from_value::<Decimal>(value.clone())
        .map_err(|e| BackendError::Malformed(format!("field '{field}' is not numeric: {e}")))
}
