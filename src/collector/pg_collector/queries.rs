//! SQL query builders for PostgreSQL statistics views.

/// Session cap shared with the other vendors.
pub(super) const SESSION_LIMIT: usize = 30;

/// Top SQL cap shared with the other vendors.
pub(super) const HOTSPOT_LIMIT: usize = 15;

pub(super) const INSTANCE_INFO_QUERY: &str = r#"
    SELECT
        COALESCE(NULLIF(current_setting('cluster_name'), ''), current_database()) AS instance_name,
        COALESCE(host(inet_server_addr()), 'local') AS host_name,
        current_setting('server_version') AS version
"#;

pub(super) const STATEMENTS_EXTENSION_QUERY: &str =
    "SELECT extversion FROM pg_extension WHERE extname = 'pg_stat_statements'";

/// Fails when the extension exists but its library is not preloaded.
pub(super) const STATEMENTS_READABLE_QUERY: &str = "SELECT 1 FROM pg_stat_statements LIMIT 1";

/// Builds the cumulative counters query.
///
/// `pg_stat_database` provides transactions and block access, the WAL
/// position stands in for redo, and buffer writes come from
/// `pg_stat_bgwriter` (before 17) or `pg_stat_io` (17+).
/// `active_time` (14+) is reported in milliseconds.
pub(super) fn build_counters_query(server_version_num: Option<i32>) -> String {
    let v = server_version_num.unwrap_or(0);

    let db_time_expr = if v >= 140000 {
        "(COALESCE(SUM(active_time), 0) * 1000)::bigint"
    } else {
        "0::bigint"
    };

    let writes_query = if v >= 170000 {
        "SELECT COALESCE(SUM(writes), 0)::bigint AS physical_writes FROM pg_stat_io"
    } else {
        "SELECT (buffers_checkpoint + buffers_clean + buffers_backend)::bigint AS physical_writes \
         FROM pg_stat_bgwriter"
    };

    format!(
        r#"
            SELECT
                d.commits,
                d.rollbacks,
                d.logical_reads,
                d.physical_reads,
                d.db_time_us,
                w.physical_writes,
                wal.redo_bytes
            FROM (
                SELECT
                    COALESCE(SUM(xact_commit), 0)::bigint AS commits,
                    COALESCE(SUM(xact_rollback), 0)::bigint AS rollbacks,
                    COALESCE(SUM(blks_hit + blks_read), 0)::bigint AS logical_reads,
                    COALESCE(SUM(blks_read), 0)::bigint AS physical_reads,
                    {db_time_expr} AS db_time_us
                FROM pg_stat_database
            ) d,
            ({writes_query}) w,
            (
                SELECT COALESCE(
                    (CASE WHEN pg_is_in_recovery()
                          THEN pg_last_wal_replay_lsn()
                          ELSE pg_current_wal_lsn() END) - '0/0'::pg_lsn,
                    0
                )::bigint AS redo_bytes
            ) wal
        "#
    )
}

/// Total statement executions; only valid with pg_stat_statements installed.
pub(super) const EXECUTIONS_QUERY: &str =
    "SELECT COALESCE(SUM(calls), 0)::bigint AS execute_count FROM pg_stat_statements";

/// Waiting client backends grouped by wait event, own backend excluded.
pub(super) const WAIT_SAMPLE_QUERY: &str = r#"
    SELECT
        COALESCE(wait_event_type, '') AS wait_class,
        wait_event AS event,
        COUNT(*)::bigint AS sessions
    FROM pg_stat_activity
    WHERE wait_event IS NOT NULL
      AND state = 'active'
      AND backend_type = 'client backend'
      AND pid <> pg_backend_pid()
    GROUP BY 1, 2
"#;

/// Builds version-aware query for active sessions.
pub(super) fn build_sessions_query(server_version_num: Option<i32>) -> String {
    let sql_id_expr = if server_version_num.unwrap_or(0) >= 140000 {
        "COALESCE(query_id::text, '')"
    } else {
        "''::text"
    };

    format!(
        r#"
            SELECT
                pid::bigint AS sid,
                COALESCE(EXTRACT(EPOCH FROM backend_start)::bigint, 0) AS serial,
                COALESCE(usename, '') AS username,
                COALESCE(state, '') AS status,
                COALESCE(wait_event, '') AS event,
                COALESCE(wait_event_type, '') AS wait_class,
                (pg_blocking_pids(pid))[1]::bigint AS blocking_sid,
                {sql_id_expr} AS sql_id,
                COALESCE(EXTRACT(EPOCH FROM (now() - state_change))::bigint, 0) AS seconds_in_wait,
                COALESCE(application_name, '') AS program,
                COALESCE(query, '') AS sql_text
            FROM pg_stat_activity
            WHERE backend_type = 'client backend'
              AND state IS DISTINCT FROM 'idle'
              AND pid <> pg_backend_pid()
            ORDER BY query_start NULLS LAST
            LIMIT {SESSION_LIMIT}
        "#
    )
}

/// Builds version-aware query for top SQL by total elapsed time.
pub(super) fn build_hotspots_query(server_version_num: Option<i32>) -> String {
    let v = server_version_num.unwrap_or(0);
    let total_time_expr = if v >= 130000 {
        "s.total_exec_time"
    } else {
        "s.total_time"
    };
    let io_time_expr = if v >= 170000 {
        "(s.shared_blk_read_time + s.shared_blk_write_time)"
    } else {
        "(s.blk_read_time + s.blk_write_time)"
    };

    format!(
        r#"
            SELECT
                s.queryid::text AS sql_id,
                0::bigint AS plan_hash,
                ({total_time_expr} / 1000.0)::double precision AS elapsed_sec,
                (GREATEST({total_time_expr} - {io_time_expr}, 0) / 1000.0)::double precision AS cpu_sec,
                s.calls::bigint AS executions,
                (s.shared_blks_hit + s.shared_blks_read)::bigint AS buffer_gets,
                s.shared_blks_read::bigint AS disk_reads,
                s.rows::bigint AS rows_processed,
                COALESCE(s.query, '') AS sql_text
            FROM pg_stat_statements s
            ORDER BY {total_time_expr} DESC
            LIMIT {HOTSPOT_LIMIT}
        "#
    )
}
