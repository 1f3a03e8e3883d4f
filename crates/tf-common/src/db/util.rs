#![allow(async_fn_in_trait)]

use std::{sync::OnceLock, time::Instant};

use deadpool_postgres::GenericClient;
use tokio_postgres::{types::ToSql, Row};
use tracing::{debug, warn};

const SLOW_QUERY_ENV: &str = "TF_DB_LOG_MIN_DURATION_MS";

fn parse_threshold(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|v| *v > 0)
}

fn slow_query_threshold_ms() -> Option<u64> {
    static THRESHOLD: OnceLock<Option<u64>> = OnceLock::new();
    *THRESHOLD.get_or_init(|| parse_threshold(std::env::var(SLOW_QUERY_ENV).ok().as_deref()))
}

struct QueryTimer<'a> {
    label: &'a str,
    started: Instant,
}

impl<'a> QueryTimer<'a> {
    fn start(label: &'a str) -> Self {
        Self {
            label,
            started: Instant::now(),
        }
    }

    fn finish(self, rows: usize) {
        let elapsed_ms = self.started.elapsed().as_millis() as u64;
        debug!(query = self.label, rows, elapsed_ms, "query finished");

        if slow_query_threshold_ms().is_some_and(|threshold| elapsed_ms >= threshold) {
            warn!(query = self.label, rows, elapsed_ms, "slow_query_detected");
        }
    }
}

/// Prepared-statement queries with timing. Anything slower than
/// `TF_DB_LOG_MIN_DURATION_MS` is logged at warn level.
pub trait TimedClientExt: GenericClient {
    async fn timed_query_cached(
        &self,
        statement: &str,
        params: &[&(dyn ToSql + Sync)],
        label: &str,
    ) -> Result<Vec<Row>, tokio_postgres::Error> {
        let timer = QueryTimer::start(label);
        let prepared = self.prepare_cached(statement).await?;
        let rows = self.query(&prepared, params).await?;
        timer.finish(rows.len());
        Ok(rows)
    }

    async fn timed_query_opt_cached(
        &self,
        statement: &str,
        params: &[&(dyn ToSql + Sync)],
        label: &str,
    ) -> Result<Option<Row>, tokio_postgres::Error> {
        let timer = QueryTimer::start(label);
        let prepared = self.prepare_cached(statement).await?;
        let row = self.query_opt(&prepared, params).await?;
        timer.finish(usize::from(row.is_some()));
        Ok(row)
    }
}

impl<T: GenericClient + ?Sized> TimedClientExt for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_ignores_zero_and_garbage() {
        assert_eq!(parse_threshold(Some("250")), Some(250));
        assert_eq!(parse_threshold(Some(" 40 ")), Some(40));
        assert_eq!(parse_threshold(Some("0")), None);
        assert_eq!(parse_threshold(Some("-5")), None);
        assert_eq!(parse_threshold(Some("fast")), None);
        assert_eq!(parse_threshold(None), None);
    }
}
