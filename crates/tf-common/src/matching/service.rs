use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, histogram};
use tf_metrics::{
    CACHE_COALESCED, CACHE_HITS, CACHE_INVALIDATIONS, CACHE_MISSES, CANDIDATES, STORE_RETRIES,
};
use tracing::{debug, info, instrument, warn};

use super::{
    cache::{BuildResult, CacheKey, Lookup, MatchCache, RankedList},
    error::MatchingError,
    pipeline::MatchingEngine,
    prefilter::MatchConstraints,
    snapshot::DeveloperSnapshot,
};
use crate::api::{MatchPage, MatchQuery};
use crate::db::{MatchStore, StoreError};

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3);
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct MatchingServiceConfig {
    /// How long a ranked list may be served. `None` disables caching.
    pub cache_ttl: Option<Duration>,
    /// Pause before the single retry of a transient store failure.
    pub store_retry_backoff: Duration,
}

impl Default for MatchingServiceConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Some(DEFAULT_CACHE_TTL),
            store_retry_backoff: DEFAULT_RETRY_BACKOFF,
        }
    }
}

/// Everything a detached build needs; cloned into the spawned task.
#[derive(Clone)]
struct BuildContext {
    store: Arc<dyn MatchStore>,
    engine: Arc<MatchingEngine>,
    retry_backoff: Duration,
    generation: Arc<AtomicU64>,
}

/// Entry point for `getMatches`: validation, cache lookup, snapshot read,
/// ranking and pagination.
#[derive(Clone)]
pub struct MatchingService {
    ctx: BuildContext,
    cache: MatchCache,
}

impl MatchingService {
    pub fn new(store: Arc<dyn MatchStore>, config: MatchingServiceConfig) -> Self {
        Self {
            ctx: BuildContext {
                store,
                engine: Arc::new(MatchingEngine::default()),
                retry_backoff: config.store_retry_backoff,
                generation: Arc::new(AtomicU64::new(0)),
            },
            cache: MatchCache::new(config.cache_ttl),
        }
    }

    pub fn store(&self) -> &Arc<dyn MatchStore> {
        &self.ctx.store
    }

    /// One page of the ranking for `project_id`. Page parameters are checked
    /// before any store access.
    #[instrument(skip(self, query), fields(page = query.page, limit = query.limit))]
    pub async fn get_matches(
        &self,
        project_id: &str,
        query: &MatchQuery,
    ) -> Result<MatchPage, MatchingError> {
        let request = query.page_request()?;
        let ranked = self.ranked_matches(project_id, query.constraints()).await?;
        Ok(MatchPage::from_ranked(project_id, &ranked, request))
    }

    /// The full ranked list, from cache or from a fresh build.
    pub async fn ranked_matches(
        &self,
        project_id: &str,
        constraints: MatchConstraints,
    ) -> Result<RankedList, MatchingError> {
        let key: CacheKey = (project_id.to_string(), constraints);

        match self.cache.lookup(&key) {
            Lookup::Hit(ranked) => {
                counter!(CACHE_HITS).increment(1);
                debug!(project_id, total = ranked.len(), "match cache hit");
                Ok(ranked)
            }
            Lookup::Wait(waiter) => {
                counter!(CACHE_COALESCED).increment(1);
                debug!(project_id, "joining in-flight match build");
                waiter.wait().await
            }
            Lookup::Build(ticket) => {
                counter!(CACHE_MISSES).increment(1);
                debug!(project_id, "match cache miss");

                let waiter = ticket.waiter();
                let ctx = self.ctx.clone();
                // Detached so a disconnecting caller does not abort the build.
                tokio::spawn(async move {
                    let (project_id, constraints) = ticket.key().clone();
                    let result = ctx.build(&project_id, &constraints).await;
                    let installed = ticket.complete(result);
                    debug!(%project_id, installed, "match build finished");
                });

                waiter.wait().await
            }
        }
    }

    /// Call after a write to a project's status or required skills.
    pub fn invalidate_project(&self, project_id: &str) {
        let dropped = self.cache.invalidate_project(project_id);
        counter!(CACHE_INVALIDATIONS, "scope" => "project").increment(1);
        info!(project_id, dropped, "match cache invalidated for project");
    }

    /// Call after a write to any developer's availability, skills or rate.
    pub fn invalidate_developers(&self) {
        let dropped = self.cache.invalidate_all();
        counter!(CACHE_INVALIDATIONS, "scope" => "all").increment(1);
        info!(dropped, "match cache invalidated for all projects");
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.ready_entries()
    }
}

impl BuildContext {
    #[instrument(skip(self, constraints))]
    async fn build(&self, project_id: &str, constraints: &MatchConstraints) -> BuildResult {
        let project = read_with_retry(self.retry_backoff, "get_project", || {
            self.store.get_project(project_id)
        })
        .await?
        .ok_or_else(|| MatchingError::ProjectNotFound(project_id.to_string()))?;

        self.engine.check_matchable(&project)?;

        let developers = read_with_retry(self.retry_backoff, "list_available_developers", || {
            self.store.list_available_developers()
        })
        .await?;

        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let snapshot = DeveloperSnapshot::new(generation, developers);
        let ranked = self
            .engine
            .rank_developers_for_project(&project, &snapshot, constraints)?;

        histogram!(CANDIDATES).record(ranked.len() as f64);
        Ok(Arc::new(ranked))
    }
}

/// Runs `read`, retrying exactly once after `backoff` when the first attempt
/// fails transiently.
async fn read_with_retry<T, F, Fut>(
    backoff: Duration,
    operation: &'static str,
    mut read: F,
) -> Result<T, MatchingError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    match read().await {
        Ok(value) => Ok(value),
        Err(err) if err.is_transient() => {
            counter!(STORE_RETRIES, "operation" => operation).increment(1);
            warn!(
                operation,
                error = %err,
                backoff_ms = backoff.as_millis() as u64,
                "transient store failure, retrying once"
            );
            tokio::time::sleep(backoff).await;

            read().await.map_err(|err| {
                warn!(operation, error = %err, "store retry failed");
                MatchingError::from(err)
            })
        }
        Err(err) => Err(err.into()),
    }
}
