//! Read-through cache of member plans.
//!
//! Plans depend only on the carrier type and the expected-type sequence, and
//! the registry behind a [`Splitter`](crate::Splitter) never changes, so
//! entries are never invalidated.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use quarry_ast::Ty;
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::error::RewriteError;
use crate::matcher::MemberPlan;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct PlanKey {
    carrier: Ty,
    expected: Vec<Ty>,
}

/// Hit and miss counts since the cache was created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

#[derive(Debug, Default)]
pub struct MemberPlanCache {
    entries: RwLock<FxHashMap<PlanKey, Arc<MemberPlan>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemberPlanCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached plan for `(carrier, expected)`, computing it with
    /// `compute` on the first request.
    ///
    /// Lookups share a read lock. A miss takes the upgradable lock, checks
    /// again and only then computes, so concurrent misses on one key run
    /// `compute` once. Errors are not cached.
    pub fn get_or_try_insert<F>(
        &self,
        carrier: &Ty,
        expected: &[Ty],
        compute: F,
    ) -> Result<Arc<MemberPlan>, RewriteError>
    where
        F: FnOnce() -> Result<MemberPlan, RewriteError>,
    {
        let key = PlanKey {
            carrier: carrier.clone(),
            expected: expected.to_vec(),
        };

        if let Some(plan) = self.entries.read().get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(carrier = %carrier, "member plan cache hit");
            return Ok(Arc::clone(plan));
        }

        let guard = self.entries.upgradable_read();
        if let Some(plan) = guard.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(carrier = %carrier, "member plan cache hit after wait");
            return Ok(Arc::clone(plan));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let plan = Arc::new(compute()?);
        let mut entries = RwLockUpgradableReadGuard::upgrade(guard);
        entries.insert(key, Arc::clone(&plan));
        Ok(plan)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.read().len(),
        }
    }
}
