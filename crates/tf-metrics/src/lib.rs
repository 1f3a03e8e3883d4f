use std::net::{Ipv4Addr, SocketAddr};
use std::sync::OnceLock;

use metrics::{describe_counter, describe_histogram, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::{info, warn};

pub const CACHE_HITS: &str = "tf_match_cache_hits_total";
pub const CACHE_MISSES: &str = "tf_match_cache_misses_total";
pub const CACHE_COALESCED: &str = "tf_match_cache_coalesced_total";
pub const CACHE_INVALIDATIONS: &str = "tf_match_cache_invalidations_total";
pub const STORE_RETRIES: &str = "tf_match_store_retries_total";
pub const CANDIDATES: &str = "tf_match_candidates";

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Starts the Prometheus scrape endpoint on `0.0.0.0:<port>` and registers
/// descriptions for the matching metrics. A second call returns the handle of
/// the first; a failed install is logged and yields `None`.
pub fn init_metrics(port: u16) -> Option<&'static PrometheusHandle> {
    if let Some(existing) = PROMETHEUS_HANDLE.get() {
        return Some(existing);
    }

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    match PrometheusBuilder::new()
        .with_http_listener(addr)
        .install_recorder()
    {
        Ok(handle) => {
            let _ = PROMETHEUS_HANDLE.set(handle);
            describe_matching_metrics();
            info!(%addr, "prometheus exporter listening");
            PROMETHEUS_HANDLE.get()
        }
        Err(err) => {
            warn!(error = %err, %addr, "prometheus exporter not started");
            None
        }
    }
}

pub fn describe_matching_metrics() {
    describe_counter!(CACHE_HITS, Unit::Count, "Match requests served from the ranking cache");
    describe_counter!(CACHE_MISSES, Unit::Count, "Match requests that started a ranking build");
    describe_counter!(
        CACHE_COALESCED,
        Unit::Count,
        "Match requests that joined a build already in flight"
    );
    describe_counter!(CACHE_INVALIDATIONS, Unit::Count, "Ranking cache invalidations by scope");
    describe_counter!(STORE_RETRIES, Unit::Count, "Store reads retried after a transient failure");
    describe_histogram!(CANDIDATES, Unit::Count, "Ranked candidates per build");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describing_without_a_recorder_is_a_no_op() {
        describe_matching_metrics();
    }

    #[test]
    fn metric_names_share_the_service_prefix() {
        for name in [
            CACHE_HITS,
            CACHE_MISSES,
            CACHE_COALESCED,
            CACHE_INVALIDATIONS,
            STORE_RETRIES,
            CANDIDATES,
        ] {
            assert!(name.starts_with("tf_match_"), "{name}");
        }
    }
}
