//! Memoized schedule with stale-snapshot fallback
//!
//! The cache holds one immutable [`ScheduleSnapshot`] behind an `Arc`. A refresh
//! builds the replacement completely before swapping it in, so readers only ever
//! see a whole snapshot. At most one refresh runs at a time per cache.

use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, RwLock};
use std::time::Duration as StdDuration;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::config::defaults::{DEFAULT_CACHE_TTL_SECS, DEFAULT_LOOKAHEAD_SECS, DEFAULT_LOOKBEHIND_SECS};
use crate::config::ScheduleConfig;
use crate::errors::ScheduleResult;
use crate::models::Programme;
use crate::schedule::aggregator::ScheduleAggregator;
use crate::schedule::fetcher::ScheduleFetcher;
use crate::utils::clock::Clock;
use crate::utils::time::to_chrono_duration;

/// Freshness and window settings for a [`ScheduleCache`]
#[derive(Debug, Clone, Copy)]
pub struct CachePolicy {
    pub ttl: StdDuration,
    pub lookbehind: StdDuration,
    pub lookahead: StdDuration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            ttl: StdDuration::from_secs(DEFAULT_CACHE_TTL_SECS),
            lookbehind: StdDuration::from_secs(DEFAULT_LOOKBEHIND_SECS),
            lookahead: StdDuration::from_secs(DEFAULT_LOOKAHEAD_SECS),
        }
    }
}

impl From<&ScheduleConfig> for CachePolicy {
    fn from(config: &ScheduleConfig) -> Self {
        Self {
            ttl: config.cache_ttl,
            lookbehind: config.lookbehind,
            lookahead: config.lookahead,
        }
    }
}

/// Programmes in chronological fetch order plus the instant they were captured
#[derive(Debug, Clone)]
pub struct ScheduleSnapshot {
    programmes: Vec<Programme>,
    captured_at: DateTime<Utc>,
}

impl ScheduleSnapshot {
    pub fn new(programmes: Vec<Programme>, captured_at: DateTime<Utc>) -> Self {
        Self {
            programmes,
            captured_at,
        }
    }

    pub fn programmes(&self) -> &[Programme] {
        &self.programmes
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.captured_at
    }
}

pub struct ScheduleCache<F> {
    aggregator: ScheduleAggregator<F>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    lookbehind: Duration,
    lookahead: Duration,
    snapshot: RwLock<Option<Arc<ScheduleSnapshot>>>,
    refresh_gate: Mutex<()>,
}

impl<F: ScheduleFetcher> ScheduleCache<F> {
    pub fn new(aggregator: ScheduleAggregator<F>, clock: Arc<dyn Clock>, policy: CachePolicy) -> Self {
        Self {
            aggregator,
            clock,
            ttl: to_chrono_duration(policy.ttl),
            lookbehind: to_chrono_duration(policy.lookbehind),
            lookahead: to_chrono_duration(policy.lookahead),
            snapshot: RwLock::new(None),
            refresh_gate: Mutex::new(()),
        }
    }

    /// Current snapshot without triggering a refresh
    pub fn snapshot(&self) -> Option<Arc<ScheduleSnapshot>> {
        match self.snapshot.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn replace_snapshot(&self, snapshot: Arc<ScheduleSnapshot>) {
        match self.snapshot.write() {
            Ok(mut guard) => *guard = Some(snapshot),
            Err(poisoned) => *poisoned.into_inner() = Some(snapshot),
        }
    }

    /// Return the schedule, refreshing it when older than the TTL.
    ///
    /// A failed refresh falls back to the previous snapshot, whose capture time
    /// is left untouched so the next call retries. With no previous snapshot the
    /// error is returned.
    pub async fn get(&self) -> ScheduleResult<Arc<ScheduleSnapshot>> {
        if let Some(snapshot) = self.fresh_snapshot() {
            return Ok(snapshot);
        }

        let _gate = self.refresh_gate.lock().await;

        // Another caller may have refreshed while we waited
        if let Some(snapshot) = self.fresh_snapshot() {
            return Ok(snapshot);
        }

        let previous = self.snapshot();
        debug!("Retrieving schedule");

        match self.refresh().await {
            Ok(snapshot) => {
                self.replace_snapshot(snapshot.clone());
                Ok(snapshot)
            }
            Err(e) => {
                error!("Failed to get schedule data: {}", e);
                match previous {
                    Some(snapshot) => {
                        info!(
                            "Falling back to old cached version ({} seconds old)",
                            snapshot.age(self.clock.now()).num_seconds()
                        );
                        Ok(snapshot)
                    }
                    None => Err(e),
                }
            }
        }
    }

    fn fresh_snapshot(&self) -> Option<Arc<ScheduleSnapshot>> {
        let snapshot = self.snapshot()?;
        let age = snapshot.age(self.clock.now());
        if age < self.ttl {
            debug!("Using cached schedule ({} seconds old)", age.num_seconds());
            Some(snapshot)
        } else {
            None
        }
    }

    async fn refresh(&self) -> ScheduleResult<Arc<ScheduleSnapshot>> {
        let now = self.clock.now();
        let start = now - self.lookbehind;
        let end = now + self.lookahead;
        debug!("Getting schedule data from {} to {}", start, end);

        let programmes = self.aggregator.fetch_window(start, end).await?;
        info!("Schedule refreshed with {} programmes", programmes.len());
        Ok(Arc::new(ScheduleSnapshot::new(programmes, self.clock.now())))
    }
}
