//! Database adapter
//!
//! One backend-agnostic query/execute/close contract over two storage
//! engines: an embedded SQLite file database and a networked PostgreSQL
//! database. The backend is chosen once, at adapter construction, from
//! configuration; it never switches within a process lifetime.
//!
//! The two engines differ in placeholder syntax, result-set shape, and
//! connection lifecycle (single file handle vs. bounded pool). The adapter
//! erases exactly those differences and nothing else: query text stays
//! portable ANSI-ish SQL with `?` placeholders, and only the placeholders
//! are rewritten for the networked backend.
//!
//! The adapter instance is constructed by the process entry point and passed
//! by reference to everything that needs storage. Nothing else in the server
//! touches a pool directly.

use std::str::FromStr;
use std::time::Duration;

use chrono::SecondsFormat;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row as _, TypeInfo, ValueRef};
use thiserror::Error;

use crate::config::{DatabaseBackend, DatabaseConfig};

mod placeholder;
mod value;

pub use value::{Row, SqlValue};

/// Database operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Backend unreachable or misconfigured at startup. Fatal: the process
    /// must not start serving traffic.
    #[error("Database connection failed: {0}")]
    Connection(#[source] sqlx::Error),

    /// Malformed query or backend-native failure at call time
    #[error("Database query failed: {0}")]
    Query(#[source] sqlx::Error),

    /// The query's placeholder count does not match the provided parameters
    #[error("Parameter count mismatch: query has {placeholders} placeholders, {provided} parameters provided")]
    ParameterCount { placeholders: usize, provided: usize },

    /// A result row could not be decoded into adapter values
    #[error("Malformed result row: {0}")]
    Decode(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Bootstrap schema for the embedded backend. Ids and timestamps are stored
/// as text; RFC 3339 with fixed-width fractional seconds sorts
/// chronologically.
const SQLITE_SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS books (
    id         TEXT PRIMARY KEY,
    title      TEXT NOT NULL,
    author     TEXT NOT NULL,
    date_added TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
)";

/// Bootstrap schema for the networked backend
const POSTGRES_SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS books (
    id         UUID PRIMARY KEY,
    title      TEXT NOT NULL,
    author     TEXT NOT NULL,
    date_added TIMESTAMPTZ NOT NULL DEFAULT now()
)";

#[derive(Clone, Debug)]
enum Backend {
    Sqlite(SqlitePool),
    Postgres(PgPool),
}

/// The database adapter
///
/// Cheap to clone; both backends hold their connections behind shared
/// pools.
#[derive(Clone, Debug)]
pub struct Db {
    backend: Backend,
}

impl Db {
    /// Connect to the configured backend and run the bootstrap schema
    ///
    /// Returns [`DbError::Connection`] when credentials or connectivity are
    /// invalid (networked backend), the file path is unusable (embedded
    /// backend), or the bootstrap schema cannot be applied. Idempotent at
    /// process startup: the schema uses `CREATE TABLE IF NOT EXISTS`.
    pub async fn connect(config: &DatabaseConfig) -> DbResult<Self> {
        let backend = match config.backend {
            DatabaseBackend::Sqlite => {
                let options = SqliteConnectOptions::from_str(&config.url)
                    .map_err(DbError::Connection)?
                    .create_if_missing(true);

                // Single file handle: one writer connection is all SQLite
                // meaningfully supports here.
                let pool = SqlitePoolOptions::new()
                    .max_connections(1)
                    .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
                    .connect_with(options)
                    .await
                    .map_err(DbError::Connection)?;

                sqlx::query(SQLITE_SCHEMA)
                    .execute(&pool)
                    .await
                    .map_err(DbError::Connection)?;

                Backend::Sqlite(pool)
            },
            DatabaseBackend::Postgres => {
                let pool = PgPoolOptions::new()
                    .max_connections(config.max_connections)
                    .min_connections(config.min_connections)
                    .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
                    .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
                    .connect(&config.url)
                    .await
                    .map_err(DbError::Connection)?;

                sqlx::query(POSTGRES_SCHEMA)
                    .execute(&pool)
                    .await
                    .map_err(DbError::Connection)?;

                Backend::Postgres(pool)
            },
        };

        tracing::info!(
            backend = match backend {
                Backend::Sqlite(_) => "sqlite",
                Backend::Postgres(_) => "postgres",
            },
            "Database adapter initialized"
        );

        Ok(Self { backend })
    }

    /// Which backend this adapter was constructed with
    pub fn backend(&self) -> DatabaseBackend {
        match self.backend {
            Backend::Sqlite(_) => DatabaseBackend::Sqlite,
            Backend::Postgres(_) => DatabaseBackend::Postgres,
        }
    }

    /// Execute a read query with positional `?` parameters
    ///
    /// Returns rows in select order as ordered column mappings.
    pub async fn query(&self, sql: &str, params: &[SqlValue]) -> DbResult<Vec<Row>> {
        check_parameter_count(sql, params)?;

        match &self.backend {
            Backend::Sqlite(pool) => {
                let mut query = sqlx::query(sql);
                for value in params {
                    query = bind_sqlite(query, value);
                }
                let rows = query.fetch_all(pool).await.map_err(DbError::Query)?;
                rows.iter().map(decode_sqlite_row).collect()
            },
            Backend::Postgres(pool) => {
                let (translated, _) = placeholder::numbered_placeholders(sql);
                let mut query = sqlx::query(&translated);
                for value in params {
                    query = bind_postgres(query, value);
                }
                let rows = query.fetch_all(pool).await.map_err(DbError::Query)?;
                rows.iter().map(decode_postgres_row).collect()
            },
        }
    }

    /// Execute a write query with positional `?` parameters
    ///
    /// Returns the affected-row count.
    pub async fn execute(&self, sql: &str, params: &[SqlValue]) -> DbResult<u64> {
        check_parameter_count(sql, params)?;

        match &self.backend {
            Backend::Sqlite(pool) => {
                let mut query = sqlx::query(sql);
                for value in params {
                    query = bind_sqlite(query, value);
                }
                let result = query.execute(pool).await.map_err(DbError::Query)?;
                Ok(result.rows_affected())
            },
            Backend::Postgres(pool) => {
                let (translated, _) = placeholder::numbered_placeholders(sql);
                let mut query = sqlx::query(&translated);
                for value in params {
                    query = bind_postgres(query, value);
                }
                let result = query.execute(pool).await.map_err(DbError::Query)?;
                Ok(result.rows_affected())
            },
        }
    }

    /// Probe backend connectivity
    pub async fn ping(&self) -> DbResult<()> {
        self.query("SELECT 1", &[]).await.map(|_| ())
    }

    /// Release the backend connections
    ///
    /// Safe to call more than once; closing an already-closed adapter is a
    /// no-op that still succeeds.
    pub async fn close(&self) {
        match &self.backend {
            Backend::Sqlite(pool) => pool.close().await,
            Backend::Postgres(pool) => pool.close().await,
        }
    }
}

fn check_parameter_count(sql: &str, params: &[SqlValue]) -> DbResult<()> {
    let placeholders = placeholder::placeholder_count(sql);
    if placeholders != params.len() {
        return Err(DbError::ParameterCount {
            placeholders,
            provided: params.len(),
        });
    }
    Ok(())
}

fn bind_sqlite<'q>(
    query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    value: &SqlValue,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    match value {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::Text(s) => query.bind(s.clone()),
        SqlValue::Integer(i) => query.bind(*i),
        SqlValue::Real(f) => query.bind(*f),
        SqlValue::Bool(b) => query.bind(*b),
        // SQLite has no UUID or timestamp affinity; both travel as text
        SqlValue::Uuid(u) => query.bind(u.to_string()),
        SqlValue::Timestamp(t) => query.bind(t.to_rfc3339_opts(SecondsFormat::Micros, true)),
    }
}

fn bind_postgres<'q>(
    query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    value: &SqlValue,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    match value {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::Text(s) => query.bind(s.clone()),
        SqlValue::Integer(i) => query.bind(*i),
        SqlValue::Real(f) => query.bind(*f),
        SqlValue::Bool(b) => query.bind(*b),
        SqlValue::Uuid(u) => query.bind(*u),
        SqlValue::Timestamp(t) => query.bind(*t),
    }
}

fn decode_sqlite_row(row: &SqliteRow) -> DbResult<Row> {
    let mut columns = Vec::with_capacity(row.columns().len());

    for column in row.columns() {
        let idx = column.ordinal();
        let (is_null, type_name) = {
            let raw = row.try_get_raw(idx).map_err(DbError::Query)?;
            (raw.is_null(), raw.type_info().name().to_string())
        };

        let value = if is_null {
            SqlValue::Null
        } else {
            match type_name.as_str() {
                "TEXT" => SqlValue::Text(row.try_get(idx).map_err(DbError::Query)?),
                "INTEGER" => SqlValue::Integer(row.try_get(idx).map_err(DbError::Query)?),
                "REAL" => SqlValue::Real(row.try_get(idx).map_err(DbError::Query)?),
                "BOOLEAN" => SqlValue::Bool(row.try_get(idx).map_err(DbError::Query)?),
                other => {
                    return Err(DbError::Decode(format!(
                        "unsupported SQLite column type '{}' for column '{}'",
                        other,
                        column.name()
                    )))
                },
            }
        };

        columns.push((column.name().to_string(), value));
    }

    Ok(Row::new(columns))
}

fn decode_postgres_row(row: &PgRow) -> DbResult<Row> {
    let mut columns = Vec::with_capacity(row.columns().len());

    for column in row.columns() {
        let idx = column.ordinal();
        let (is_null, type_name) = {
            let raw = row.try_get_raw(idx).map_err(DbError::Query)?;
            (raw.is_null(), raw.type_info().name().to_string())
        };

        let value = if is_null {
            SqlValue::Null
        } else {
            match type_name.as_str() {
                "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => {
                    SqlValue::Text(row.try_get(idx).map_err(DbError::Query)?)
                },
                "UUID" => SqlValue::Uuid(row.try_get(idx).map_err(DbError::Query)?),
                "TIMESTAMPTZ" => SqlValue::Timestamp(row.try_get(idx).map_err(DbError::Query)?),
                "TIMESTAMP" => {
                    let naive: chrono::NaiveDateTime =
                        row.try_get(idx).map_err(DbError::Query)?;
                    SqlValue::Timestamp(naive.and_utc())
                },
                "INT2" => {
                    SqlValue::Integer(row.try_get::<i16, _>(idx).map_err(DbError::Query)? as i64)
                },
                "INT4" => {
                    SqlValue::Integer(row.try_get::<i32, _>(idx).map_err(DbError::Query)? as i64)
                },
                "INT8" => SqlValue::Integer(row.try_get(idx).map_err(DbError::Query)?),
                "FLOAT4" => {
                    SqlValue::Real(row.try_get::<f32, _>(idx).map_err(DbError::Query)? as f64)
                },
                "FLOAT8" => SqlValue::Real(row.try_get(idx).map_err(DbError::Query)?),
                "BOOL" => SqlValue::Bool(row.try_get(idx).map_err(DbError::Query)?),
                other => {
                    return Err(DbError::Decode(format!(
                        "unsupported PostgreSQL column type '{}' for column '{}'",
                        other,
                        column.name()
                    )))
                },
            }
        };

        columns.push((column.name().to_string(), value));
    }

    Ok(Row::new(columns))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_count_mismatch_rejected() {
        let err = check_parameter_count("SELECT * FROM books WHERE id = ?", &[]).unwrap_err();
        assert!(matches!(
            err,
            DbError::ParameterCount { placeholders: 1, provided: 0 }
        ));
    }

    #[test]
    fn test_parameter_count_match_accepted() {
        let params = vec![SqlValue::from("abc")];
        assert!(check_parameter_count("SELECT * FROM books WHERE id = ?", &params).is_ok());
        assert!(check_parameter_count("SELECT 1", &[]).is_ok());
    }
}
