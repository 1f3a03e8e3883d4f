use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::{mapref::entry::Entry, DashMap};
use tokio::sync::watch;
use tokio::time::Instant;

use super::{error::MatchingError, prefilter::MatchConstraints, ranking::RankedMatch};
use crate::ProjectId;

pub type CacheKey = (ProjectId, MatchConstraints);
pub type RankedList = Arc<Vec<RankedMatch>>;
pub type BuildResult = Result<RankedList, MatchingError>;

enum Slot {
    Ready {
        ranked: RankedList,
        expires_at: Instant,
    },
    Building {
        build_id: u64,
        rx: watch::Receiver<Option<BuildResult>>,
    },
}

impl Slot {
    fn is_live(&self, now: Instant) -> bool {
        match self {
            Slot::Ready { expires_at, .. } => *expires_at > now,
            Slot::Building { .. } => true,
        }
    }
}

/// Full ranked lists per (project, constraints), kept for a fixed TTL.
///
/// Concurrent misses on one key collapse into a single build: the first caller
/// gets a [`BuildTicket`], everyone else a [`BuildWaiter`] on the same result.
/// Invalidation removes the key's in-flight slot, so a build that started
/// earlier no longer owns it and never installs.
#[derive(Clone)]
pub struct MatchCache {
    ttl: Option<Duration>,
    slots: Arc<DashMap<CacheKey, Slot>>,
    next_build_id: Arc<AtomicU64>,
}

pub enum Lookup {
    Hit(RankedList),
    Wait(BuildWaiter),
    Build(BuildTicket),
}

impl MatchCache {
    /// `None` or a zero TTL keeps nothing once a build finishes; concurrent
    /// callers still share one build.
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            ttl: ttl.filter(|ttl| !ttl.is_zero()),
            slots: Arc::new(DashMap::new()),
            next_build_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    pub fn lookup(&self, key: &CacheKey) -> Lookup {
        let now = Instant::now();

        match self.slots.entry(key.clone()) {
            Entry::Occupied(mut occupied) => match occupied.get() {
                Slot::Ready { ranked, expires_at } if *expires_at > now => {
                    Lookup::Hit(Arc::clone(ranked))
                }
                Slot::Building { rx, .. } => Lookup::Wait(BuildWaiter { rx: rx.clone() }),
                Slot::Ready { .. } => {
                    let (slot, ticket) = self.start_build(key);
                    occupied.insert(slot);
                    Lookup::Build(ticket)
                }
            },
            Entry::Vacant(vacant) => {
                let (slot, ticket) = self.start_build(key);
                vacant.insert(slot);
                Lookup::Build(ticket)
            }
        }
    }

    fn start_build(&self, key: &CacheKey) -> (Slot, BuildTicket) {
        let build_id = self.next_build_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = watch::channel(None);
        let ticket = BuildTicket {
            cache: self.clone(),
            key: key.clone(),
            build_id,
            tx,
            completed: false,
        };
        (Slot::Building { build_id, rx }, ticket)
    }

    /// Drops every entry of one project, in-flight builds included.
    pub fn invalidate_project(&self, project_id: &str) -> usize {
        let mut dropped = 0;
        self.slots.retain(|(project, _), _| {
            let keep = project != project_id;
            if !keep {
                dropped += 1;
            }
            keep
        });
        dropped
    }

    /// Drops everything, in-flight builds included.
    pub fn invalidate_all(&self) -> usize {
        let mut dropped = 0;
        self.slots.retain(|_, _| {
            dropped += 1;
            false
        });
        dropped
    }

    /// Number of ranked lists currently servable.
    pub fn ready_entries(&self) -> usize {
        let now = Instant::now();
        self.slots
            .iter()
            .filter(|entry| matches!(entry.value(), Slot::Ready { expires_at, .. } if *expires_at > now))
            .count()
    }

    #[cfg(test)]
    fn slot_count(&self) -> usize {
        self.slots.len()
    }
}

/// Handle for a build another caller is running.
pub struct BuildWaiter {
    rx: watch::Receiver<Option<BuildResult>>,
}

impl BuildWaiter {
    pub async fn wait(mut self) -> BuildResult {
        match self.rx.wait_for(Option::is_some).await {
            Ok(outcome) => match outcome.as_ref() {
                Some(result) => result.clone(),
                None => Err(aborted()),
            },
            Err(_) => Err(aborted()),
        }
    }
}

fn aborted() -> MatchingError {
    MatchingError::Internal("match build aborted".into())
}

/// Exclusive right to build one key. Dropping it without calling
/// [`BuildTicket::complete`] releases the key and fails the waiters.
pub struct BuildTicket {
    cache: MatchCache,
    key: CacheKey,
    build_id: u64,
    tx: watch::Sender<Option<BuildResult>>,
    completed: bool,
}

impl BuildTicket {
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    pub fn waiter(&self) -> BuildWaiter {
        BuildWaiter {
            rx: self.tx.subscribe(),
        }
    }

    /// Publishes the outcome to all waiters. Returns `true` when the result was
    /// installed for later lookups.
    pub fn complete(mut self, result: BuildResult) -> bool {
        self.completed = true;
        let installed = self.settle(result.as_ref().ok());
        self.tx.send_replace(Some(result));
        installed
    }

    fn settle(&self, ranked: Option<&RankedList>) -> bool {
        let now = Instant::now();

        let installed = match self.cache.slots.entry(self.key.clone()) {
            Entry::Occupied(mut occupied) => {
                let owns_slot = matches!(
                    occupied.get(),
                    Slot::Building { build_id, .. } if *build_id == self.build_id
                );
                match (owns_slot, ranked, self.cache.ttl) {
                    (false, _, _) => false,
                    (true, Some(ranked), Some(ttl)) => {
                        occupied.insert(Slot::Ready {
                            ranked: Arc::clone(ranked),
                            expires_at: now + ttl,
                        });
                        true
                    }
                    (true, _, _) => {
                        occupied.remove();
                        false
                    }
                }
            }
            Entry::Vacant(_) => false,
        };

        // Entry guard is gone here; retain locks every shard.
        if installed {
            self.cache.slots.retain(|_, slot| slot.is_live(now));
        }
        installed
    }
}

impl Drop for BuildTicket {
    fn drop(&mut self) {
        if !self.completed {
            self.settle(None);
        }
    }
}
