//! Database metrics collection.

use metrics::{counter, gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Record database query duration.
pub fn record_query_duration(query_name: &'static str, duration_secs: f64) {
    histogram!("database_query_duration_seconds", "query" => query_name).record(duration_secs);
}

/// Record database connection pool metrics.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();
    let active = size.saturating_sub(idle);

    gauge!("database_connections_active").set(active as f64);
    gauge!("database_connections_idle").set(idle as f64);
    gauge!("database_connections_total").set(size as f64);
}

/// Times a single query and records the outcome.
///
/// ```ignore
/// let timer = QueryTimer::new("profiles.insert");
/// let result = sqlx::query_as::<_, ProfileEntity>(...).fetch_one(&pool).await;
/// timer.finish(result.is_ok());
/// ```
pub struct QueryTimer {
    query_name: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query_name: &'static str) -> Self {
        Self {
            query_name,
            start: Instant::now(),
        }
    }

    /// Record the elapsed duration, and count the query as failed if `ok`
    /// is false.
    pub fn finish(self, ok: bool) {
        record_query_duration(self.query_name, self.start.elapsed().as_secs_f64());
        if !ok {
            counter!("database_query_errors_total", "query" => self.query_name).increment(1);
        }
    }
}
