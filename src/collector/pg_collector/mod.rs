//! PostgreSQL snapshot source.
//!
//! Collects from PostgreSQL statistics views:
//! - `pg_stat_database`, `pg_stat_bgwriter` / `pg_stat_io`, WAL position: counters
//! - `pg_stat_activity`: sessions and sampled wait events
//! - `pg_stat_statements`: top SQL (requires extension)
//!
//! PostgreSQL has no native gauge view; the rate engine derives active
//! sessions and DB time from the `active_time` time model (14+).
//!
//! A single connection is used for all views.

mod queries;
mod waits;

use std::time::Instant;

use postgres::{Client, NoTls, Row};
use tracing::{debug, info, warn};

use super::traits::{InstanceInfo, SnapshotSource, SourceError, WaitTotal};
use super::vendor::{Counters, Gauges, Vendor, keys};
use crate::fmt::compact_sql;
use crate::storage::model::{HotspotRow, SessionRow};
use queries::{
    EXECUTIONS_QUERY, INSTANCE_INFO_QUERY, STATEMENTS_EXTENSION_QUERY,
    STATEMENTS_READABLE_QUERY, WAIT_SAMPLE_QUERY,
    build_counters_query, build_hotspots_query, build_sessions_query,
};
use waits::WaitSampler;

const APPLICATION_NAME: &str = "ditop";

/// PostgreSQL [`SnapshotSource`].
///
/// Connects using standard environment variables:
/// - PGHOST (default: localhost)
/// - PGPORT (default: 5432)
/// - PGUSER (default: $USER)
/// - PGPASSWORD (default: empty)
/// - PGDATABASE (default: same as PGUSER)
pub struct PostgresSource {
    connection_string: String,
    client: Option<Client>,
    server_version_num: Option<i32>,
    block_size: i64,
    statements_available: bool,
    waits: WaitSampler,
}

impl PostgresSource {
    /// Creates a source from libpq environment variables.
    ///
    /// Uses $USER as default if PGUSER is not set.
    pub fn from_env() -> Result<Self, SourceError> {
        let user = std::env::var("PGUSER")
            .or_else(|_| std::env::var("USER"))
            .map_err(|_| SourceError::Config("PGUSER or USER not set".to_string()))?;

        let host = std::env::var("PGHOST").unwrap_or_else(|_| "localhost".to_string());
        let port = std::env::var("PGPORT").unwrap_or_else(|_| "5432".to_string());
        let password = std::env::var("PGPASSWORD").unwrap_or_default();
        let database = std::env::var("PGDATABASE").unwrap_or_else(|_| user.clone());

        let connection_string = if password.is_empty() {
            format!(
                "host={} port={} user={} dbname={}",
                host, port, user, database
            )
        } else {
            format!(
                "host={} port={} user={} password={} dbname={}",
                host, port, user, password, database
            )
        };

        Ok(Self::with_connection_string(connection_string))
    }

    /// Creates a source with an explicit key=value or URL connection string.
    pub fn with_connection_string(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: with_application_name(&connection_string.into()),
            client: None,
            server_version_num: None,
            block_size: 8192,
            statements_available: false,
            waits: WaitSampler::default(),
        }
    }

    fn client(&mut self) -> Result<&mut Client, SourceError> {
        self.client
            .as_mut()
            .ok_or_else(|| SourceError::Connection("not connected".to_string()))
    }

    /// Classifies a query error. A closed client is dropped so the poll loop
    /// reconnects; anything else is a query-level failure.
    fn query_error(&mut self, e: postgres::Error) -> SourceError {
        let msg = format_postgres_error(&e);
        let closed = e.is_closed() || self.client.as_ref().is_none_or(|c| c.is_closed());
        if closed {
            self.client = None;
            SourceError::Connection(msg)
        } else {
            SourceError::Query(msg)
        }
    }

    fn query(&mut self, sql: &str) -> Result<Vec<Row>, SourceError> {
        let result = self.client()?.query(sql, &[]);
        result.map_err(|e| self.query_error(e))
    }

    fn query_one(&mut self, sql: &str) -> Result<Row, SourceError> {
        let result = self.client()?.query_one(sql, &[]);
        result.map_err(|e| self.query_error(e))
    }

    /// Reads per-connection server properties.
    fn probe_server(&mut self) {
        let Some(client) = self.client.as_mut() else {
            return;
        };

        self.server_version_num = client
            .query_one("SHOW server_version_num", &[])
            .ok()
            .and_then(|row| row.try_get::<_, String>(0).ok())
            .and_then(|v| v.parse::<i32>().ok());

        self.block_size = client
            .query_one("SHOW block_size", &[])
            .ok()
            .and_then(|row| row.try_get::<_, String>(0).ok())
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(8192);

        let installed = client
            .query_opt(STATEMENTS_EXTENSION_QUERY, &[])
            .ok()
            .flatten()
            .is_some();
        self.statements_available =
            installed && client.query_opt(STATEMENTS_READABLE_QUERY, &[]).is_ok();

        debug!(
            server_version_num = ?self.server_version_num,
            block_size = self.block_size,
            pg_stat_statements = self.statements_available,
            "probed server"
        );
    }
}

impl SnapshotSource for PostgresSource {
    fn vendor(&self) -> Vendor {
        Vendor::Postgres
    }

    fn connect(&mut self) -> Result<(), SourceError> {
        if self.client.as_ref().is_some_and(|c| !c.is_closed()) {
            return Ok(());
        }
        match Client::connect(&self.connection_string, NoTls) {
            Ok(client) => {
                self.client = Some(client);
                self.probe_server();
                info!(server_version_num = ?self.server_version_num, "connected to PostgreSQL");
                Ok(())
            }
            Err(e) => {
                self.client = None;
                self.server_version_num = None;
                Err(SourceError::Connection(format_postgres_error(&e)))
            }
        }
    }

    fn close(&mut self) {
        if let Some(client) = self.client.take() {
            let _ = client.close();
        }
        self.server_version_num = None;
        self.statements_available = false;
    }

    fn is_connected(&self) -> bool {
        self.client.as_ref().is_some_and(|c| !c.is_closed())
    }

    fn instance_info(&mut self) -> Result<InstanceInfo, SourceError> {
        let row = self.query_one(INSTANCE_INFO_QUERY)?;
        Ok(InstanceInfo {
            instance_name: get(&row, "instance_name")?,
            host_name: get(&row, "host_name")?,
            version: get(&row, "version")?,
        })
    }

    fn fetch_counters(&mut self) -> Result<Counters, SourceError> {
        let query = build_counters_query(self.server_version_num);
        let row = self.query_one(&query)?;

        let commits: i64 = get(&row, "commits")?;
        let rollbacks: i64 = get(&row, "rollbacks")?;
        let physical_reads: i64 = get(&row, "physical_reads")?;
        let physical_writes: i64 = get(&row, "physical_writes")?;

        let mut c = Counters::new();
        c.insert(keys::COMMITS.to_string(), commits);
        c.insert(keys::ROLLBACKS.to_string(), rollbacks);
        c.insert(keys::LOGICAL_READS.to_string(), get(&row, "logical_reads")?);
        c.insert(keys::PHYSICAL_READS.to_string(), physical_reads);
        c.insert(keys::PHYSICAL_WRITES.to_string(), physical_writes);
        c.insert(keys::REDO_BYTES.to_string(), get(&row, "redo_bytes")?);
        c.insert(
            keys::PHYSICAL_READ_BYTES.to_string(),
            physical_reads.saturating_mul(self.block_size),
        );
        c.insert(
            keys::PHYSICAL_WRITE_BYTES.to_string(),
            physical_writes.saturating_mul(self.block_size),
        );
        c.insert(keys::DB_TIME_US.to_string(), get(&row, "db_time_us")?);

        let statements = self.statements_available.then(|| {
            self.query_one(EXECUTIONS_QUERY)
                .and_then(|row| get::<i64>(&row, "execute_count"))
        });
        let (executions, available) =
            resolve_executions(statements, commits.saturating_add(rollbacks))?;
        self.statements_available = available;
        c.insert(keys::EXECUTE_COUNT.to_string(), executions);

        Ok(c)
    }

    fn fetch_gauges(&mut self) -> Result<Option<Gauges>, SourceError> {
        Ok(None)
    }

    fn fetch_wait_totals(&mut self) -> Result<Vec<WaitTotal>, SourceError> {
        let rows = self.query(WAIT_SAMPLE_QUERY)?;
        let mut sample = Vec::with_capacity(rows.len());
        for row in &rows {
            sample.push((
                get::<String>(row, "wait_class")?,
                get::<String>(row, "event")?,
                get::<i64>(row, "sessions")?,
            ));
        }
        Ok(self.waits.sample(sample, Instant::now()))
    }

    fn fetch_sessions(&mut self) -> Result<Vec<SessionRow>, SourceError> {
        let query = build_sessions_query(self.server_version_num);
        let rows = self.query(&query)?;
        rows.iter()
            .map(|row| -> Result<SessionRow, SourceError> {
                let sql_text: String = get(row, "sql_text")?;
                Ok(SessionRow {
                    sid: get(row, "sid")?,
                    serial: get(row, "serial")?,
                    username: get(row, "username")?,
                    status: get(row, "status")?,
                    event: get(row, "event")?,
                    wait_class: get(row, "wait_class")?,
                    blocking_sid: get(row, "blocking_sid")?,
                    sql_id: get(row, "sql_id")?,
                    seconds_in_wait: get(row, "seconds_in_wait")?,
                    program: get(row, "program")?,
                    sql_text: compact_sql(&sql_text),
                })
            })
            .collect()
    }

    fn fetch_hotspots(&mut self) -> Result<Vec<HotspotRow>, SourceError> {
        if !self.statements_available {
            return Err(SourceError::Query(
                "pg_stat_statements is not available".to_string(),
            ));
        }
        let query = build_hotspots_query(self.server_version_num);
        let rows = self.query(&query)?;
        rows.iter()
            .map(|row| -> Result<HotspotRow, SourceError> {
                let sql_text: String = get(row, "sql_text")?;
                Ok(HotspotRow {
                    sql_id: get(row, "sql_id")?,
                    plan_hash: get(row, "plan_hash")?,
                    elapsed_sec: get(row, "elapsed_sec")?,
                    cpu_sec: get(row, "cpu_sec")?,
                    executions: get(row, "executions")?,
                    buffer_gets: get(row, "buffer_gets")?,
                    disk_reads: get(row, "disk_reads")?,
                    rows_processed: get(row, "rows_processed")?,
                    sql_text: compact_sql(&sql_text),
                })
            })
            .collect()
    }
}

/// Picks the execution counter and whether `pg_stat_statements` stays in use.
///
/// Without the extension, transactions approximate executions. A query-level
/// failure reading it switches to that approximation for the rest of the
/// connection instead of failing the counters; a lost connection propagates.
fn resolve_executions(
    statements: Option<Result<i64, SourceError>>,
    transactions: i64,
) -> Result<(i64, bool), SourceError> {
    match statements {
        None => Ok((transactions, false)),
        Some(Ok(calls)) => Ok((calls, true)),
        Some(Err(e)) if e.is_connection_lost() => Err(e),
        Some(Err(e)) => {
            warn!(error = %e, "pg_stat_statements unreadable, counting transactions as executions");
            Ok((transactions, false))
        }
    }
}

/// Typed column read; a type mismatch is a query-level error.
fn get<'a, T>(row: &'a Row, column: &str) -> Result<T, SourceError>
where
    T: postgres::types::FromSql<'a>,
{
    row.try_get(column)
        .map_err(|e| SourceError::Query(format!("column {}: {}", column, e)))
}

/// Adds `application_name` unless the connection string already sets it.
fn with_application_name(connection_string: &str) -> String {
    if connection_string.contains("application_name") {
        return connection_string.to_string();
    }
    let is_url = connection_string.starts_with("postgres://")
        || connection_string.starts_with("postgresql://");
    if is_url {
        let sep = if connection_string.contains('?') { '&' } else { '?' };
        format!("{}{}application_name={}", connection_string, sep, APPLICATION_NAME)
    } else {
        format!("{} application_name={}", connection_string, APPLICATION_NAME)
    }
}

/// Formats PostgreSQL error message for display.
pub(crate) fn format_postgres_error(e: &postgres::Error) -> String {
    if let Some(db_error) = e.as_db_error() {
        format!("{}: {}", db_error.severity(), db_error.message())
    } else {
        let msg = e.to_string();
        if msg.contains("Connection refused") {
            "connection refused".to_string()
        } else if msg.contains("password authentication failed") {
            "password authentication failed".to_string()
        } else {
            msg
        }
    }
}
