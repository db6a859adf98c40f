//! Postgres-backed data backend.
//!
//! All collections share one `records` table keyed by
//! `(tenant_id, collection, id)`; the client payload lives in a `jsonb`
//! column. Tenant isolation is enforced by including `tenant_id` in every
//! `WHERE` clause.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | BackendError |
//! |------------|----------------------|--------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (check violation) | `23514` | `Constraint` |
//! | Database (other) | Any other | `Unavailable` |
//! | PoolClosed / Io / Tls / timeouts | N/A | `Unavailable` |
//! | Decode / ColumnNotFound | N/A | `Malformed` |
//!
//! ## Sync bridge
//!
//! [`DataBackend`] is synchronous. The trait impl obtains the current tokio
//! runtime handle and blocks on the async method, so callers must be inside a
//! runtime on a thread that may block (e.g. `spawn_blocking`).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, QueryBuilder, Row as _};
use tracing::{debug, instrument};

use hvacdesk_core::{EntityId, ExpectedVersion, TenantId};

use super::query::{Direction, Filter, OrderField};
use super::{BackendError, Collection, DataBackend, Increment, Query, Record, Row};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS records (
    tenant_id   UUID        NOT NULL,
    collection  TEXT        NOT NULL,
    id          UUID        NOT NULL,
    version     BIGINT      NOT NULL CHECK (version > 0),
    created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
    data        JSONB       NOT NULL,
    PRIMARY KEY (tenant_id, collection, id)
)
"#;

const SCHEMA_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS records_tenant_collection_created
    ON records (tenant_id, collection, created_at)
"#;

const RETURNING: &str = " RETURNING id, tenant_id, version, created_at, updated_at, data";

/// Postgres implementation of [`DataBackend`].
#[derive(Debug, Clone)]
pub struct PostgresBackend {
    pool: Arc<PgPool>,
}

impl PostgresBackend {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self, BackendError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the `records` table if it does not exist yet.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> Result<(), BackendError> {
        for stmt in [SCHEMA, SCHEMA_INDEX] {
            sqlx::query(stmt)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("migrate", e))?;
        }
        Ok(())
    }

    #[instrument(
        skip(self, query),
        fields(tenant_id = %tenant_id, collection = %collection),
        err
    )]
    pub async fn select_records(
        &self,
        tenant_id: TenantId,
        collection: Collection,
        query: &Query,
    ) -> Result<Vec<Record>, BackendError> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT id, tenant_id, version, created_at, updated_at, data FROM records WHERE tenant_id = ",
        );
        qb.push_bind(*tenant_id.as_uuid());
        qb.push(" AND collection = ");
        qb.push_bind(collection.as_str());

        for filter in &query.filters {
            match filter {
                Filter::Id(id) => {
                    qb.push(" AND id = ");
                    qb.push_bind(*id.as_uuid());
                }
                Filter::Eq { field, value } => {
                    let mut probe = Row::new();
                    probe.insert(field.clone(), value.clone());
                    qb.push(" AND data @> ");
                    qb.push_bind(JsonValue::Object(probe));
                }
            }
        }

        let dir = match query.direction() {
            Direction::Asc => " ASC",
            Direction::Desc => " DESC",
        };
        qb.push(" ORDER BY ");
        if let Some(OrderField::Data(field)) = query.order.as_ref().map(|o| &o.field) {
            // ASCII case folding under "C", independent of the database locale.
            qb.push("lower((data->>");
            qb.push_bind(field.clone());
            qb.push(") COLLATE \"C\")");
            qb.push(dir);
            qb.push(", (data->>");
            qb.push_bind(field.clone());
            qb.push(") COLLATE \"C\"");
            qb.push(dir);
            qb.push(", ");
        }
        qb.push("created_at");
        qb.push(dir);
        qb.push(", id");
        qb.push(dir);

        if let Some(limit) = query.limit {
            qb.push(" LIMIT ");
            qb.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        let rows = qb
            .build()
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("select", e))?;

        let records = rows.iter().map(record_from_row).collect::<Result<Vec<_>, _>>()?;
        debug!(count = records.len(), "selected records");
        Ok(records)
    }

    #[instrument(skip(self, data), fields(tenant_id = %tenant_id, collection = %collection), err)]
    pub async fn insert_record(
        &self,
        tenant_id: TenantId,
        collection: Collection,
        data: Row,
    ) -> Result<Record, BackendError> {
        let sql = format!(
            "INSERT INTO records (tenant_id, collection, id, version, data) VALUES ($1, $2, $3, 1, $4){RETURNING}"
        );
        let row = sqlx::query(&sql)
            .bind(*tenant_id.as_uuid())
            .bind(collection.as_str())
            .bind(*EntityId::new().as_uuid())
            .bind(JsonValue::Object(data))
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert", e))?;
        record_from_row(&row)
    }

    #[instrument(
        skip(self, patch),
        fields(tenant_id = %tenant_id, collection = %collection, id = %id, expected = ?expected),
        err
    )]
    pub async fn update_record(
        &self,
        tenant_id: TenantId,
        collection: Collection,
        id: EntityId,
        patch: Row,
        expected: ExpectedVersion,
    ) -> Result<Record, BackendError> {
        let expected_version: Option<i64> = match expected {
            ExpectedVersion::Any => None,
            ExpectedVersion::Exact(v) => Some(to_db_version(v)?),
        };
        let sql = format!(
            r#"
            UPDATE records
            SET data = data || $4, version = version + 1, updated_at = now()
            WHERE tenant_id = $1 AND collection = $2 AND id = $3
              AND ($5::bigint IS NULL OR version = $5)
            {RETURNING}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(*tenant_id.as_uuid())
            .bind(collection.as_str())
            .bind(*id.as_uuid())
            .bind(JsonValue::Object(patch))
            .bind(expected_version)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update", e))?;

        match row {
            Some(row) => record_from_row(&row),
            None => match self.current_version(tenant_id, collection, id).await? {
                None => Err(BackendError::NotFound),
                Some(found) => Err(BackendError::Conflict(format!(
                    "{collection} {id}: expected {expected:?}, found {found}"
                ))),
            },
        }
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, collection = %collection, id = %id), err)]
    pub async fn delete_record(
        &self,
        tenant_id: TenantId,
        collection: Collection,
        id: EntityId,
    ) -> Result<(), BackendError> {
        let result = sqlx::query(
            "DELETE FROM records WHERE tenant_id = $1 AND collection = $2 AND id = $3",
        )
        .bind(*tenant_id.as_uuid())
        .bind(collection.as_str())
        .bind(*id.as_uuid())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("delete", e))?;

        if result.rows_affected() == 0 {
            return Err(BackendError::NotFound);
        }
        Ok(())
    }

    /// Single-statement increment; the floor and the decimal range are checked
    /// in the same `WHERE`.
    #[instrument(
        skip(self, op),
        fields(tenant_id = %tenant_id, collection = %collection, id = %id, field = %op.field, delta = %op.delta),
        err
    )]
    pub async fn increment_record(
        &self,
        tenant_id: TenantId,
        collection: Collection,
        id: EntityId,
        op: &Increment,
    ) -> Result<Record, BackendError> {
        let sql = format!(
            r#"
            UPDATE records
            SET data = jsonb_set(data, ARRAY[$4::text], to_jsonb((((data->>$4)::numeric) + $5)::text)),
                version = version + 1,
                updated_at = now()
            WHERE tenant_id = $1 AND collection = $2 AND id = $3
              AND ($6::numeric IS NULL OR ((data->>$4)::numeric) + $5 >= $6)
              AND abs(((data->>$4)::numeric) + $5) <= $7
            {RETURNING}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(*tenant_id.as_uuid())
            .bind(collection.as_str())
            .bind(*id.as_uuid())
            .bind(op.field.as_str())
            .bind(op.delta)
            .bind(op.floor)
            .bind(Decimal::MAX)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("increment", e))?;

        match row {
            Some(row) => record_from_row(&row),
            None => match self.current_version(tenant_id, collection, id).await? {
                None => Err(BackendError::NotFound),
                Some(_) => Err(BackendError::Constraint(format!(
                    "{} would drop below {} or leave the decimal range",
                    op.field,
                    op.floor.unwrap_or(Decimal::MIN)
                ))),
            },
        }
    }

    async fn current_version(
        &self,
        tenant_id: TenantId,
        collection: Collection,
        id: EntityId,
    ) -> Result<Option<i64>, BackendError> {
        let row = sqlx::query(
            "SELECT version FROM records WHERE tenant_id = $1 AND collection = $2 AND id = $3",
        )
        .bind(*tenant_id.as_uuid())
        .bind(collection.as_str())
        .bind(*id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("current_version", e))?;

        row.map(|r| r.try_get::<i64, _>("version"))
            .transpose()
            .map_err(|e| map_sqlx_error("current_version", e))
    }
}

fn runtime() -> Result<tokio::runtime::Handle, BackendError> {
    tokio::runtime::Handle::try_current().map_err(|_| {
        BackendError::Unavailable(
            "PostgresBackend requires a tokio runtime; call it from within a runtime context"
                .to_string(),
        )
    })
}

impl DataBackend for PostgresBackend {
    fn select(
        &self,
        tenant_id: TenantId,
        collection: Collection,
        query: &Query,
    ) -> Result<Vec<Record>, BackendError> {
        runtime()?.block_on(self.select_records(tenant_id, collection, query))
    }

    fn insert(
        &self,
        tenant_id: TenantId,
        collection: Collection,
        data: Row,
    ) -> Result<Record, BackendError> {
        runtime()?.block_on(self.insert_record(tenant_id, collection, data))
    }

    fn update(
        &self,
        tenant_id: TenantId,
        collection: Collection,
        id: EntityId,
        patch: Row,
        expected: ExpectedVersion,
    ) -> Result<Record, BackendError> {
        runtime()?.block_on(self.update_record(tenant_id, collection, id, patch, expected))
    }

    fn delete(
        &self,
        tenant_id: TenantId,
        collection: Collection,
        id: EntityId,
    ) -> Result<(), BackendError> {
        runtime()?.block_on(self.delete_record(tenant_id, collection, id))
    }

    fn increment(
        &self,
        tenant_id: TenantId,
        collection: Collection,
        id: EntityId,
        op: &Increment,
    ) -> Result<Record, BackendError> {
        runtime()?.block_on(self.increment_record(tenant_id, collection, id, op))
    }
}

fn to_db_version(v: u64) -> Result<i64, BackendError> {
    i64::try_from(v).map_err(|_| BackendError::Conflict(format!("version {v} out of range")))
}

fn record_from_row(row: &PgRow) -> Result<Record, BackendError> {
    let decode = |e: sqlx::Error| BackendError::Malformed(format!("failed to decode record row: {e}"));

    let id: uuid::Uuid = row.try_get("id").map_err(decode)?;
    let tenant_id: uuid::Uuid = row.try_get("tenant_id").map_err(decode)?;
    let version: i64 = row.try_get("version").map_err(decode)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(decode)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(decode)?;
    let data: JsonValue = row.try_get("data").map_err(decode)?;

    let JsonValue::Object(data) = data else {
        return Err(BackendError::Malformed(format!("record {id} payload is not an object")));
    };

    Ok(Record {
        id: EntityId::from_uuid(id),
        tenant_id: TenantId::from_uuid(tenant_id),
        version: u64::try_from(version)
            .map_err(|_| BackendError::Malformed(format!("record {id} has negative version")))?,
        created_at,
        updated_at,
        data,
    })
}

/// Map SQLx errors onto the backend taxonomy.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> BackendError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {operation}: {}", db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => BackendError::Conflict(msg),
                Some("23514") => BackendError::Constraint(msg),
                _ => BackendError::Unavailable(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            BackendError::Unavailable(format!("connection pool closed in {operation}"))
        }
        sqlx::Error::RowNotFound => BackendError::NotFound,
        e @ (sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::Decode(_)) => {
            BackendError::Malformed(format!("decode error in {operation}: {e}"))
        }
        e => BackendError::Unavailable(format!("sqlx error in {operation}: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_conversion_rejects_out_of_range() {
        assert_eq!(to_db_version(7).unwrap(), 7);
        assert!(to_db_version(u64::MAX).is_err());
    }

    #[test]
    fn pool_closed_maps_to_unavailable() {
        assert!(matches!(
            map_sqlx_error("select", sqlx::Error::PoolClosed),
            BackendError::Unavailable(_)
        ));
        assert_eq!(
            map_sqlx_error("get", sqlx::Error::RowNotFound),
            BackendError::NotFound
        );
    }

    #[test]
    fn sync_calls_outside_runtime_fail_cleanly() {
        assert!(matches!(runtime(), Err(BackendError::Unavailable(_))));
    }
}
