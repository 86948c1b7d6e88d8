//! # Deduplication
//! Exact-fingerprint duplicate removal plus cross-run suppression.
//!
//! Items are visited in descending `source_priority` when any item carries a
//! hint (stable, so equal hints keep input order), otherwise in input order.
//! The first item per fingerprint survives. Fingerprints found in the
//! injected [`AlreadyUsedStore`] are dropped as well.

use metrics::counter;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::item::ContentItem;

/// Log of fingerprints that already went on air in earlier runs.
pub trait AlreadyUsedStore: Send + Sync {
    fn contains(&self, fingerprint: &str) -> bool;
    fn record(&self, fingerprint: &str);
}

/// Process-local store; enough for tests and single-process schedulers.
#[derive(Debug, Default)]
pub struct InMemoryUsedStore {
    inner: Mutex<HashSet<String>>,
}

impl InMemoryUsedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A panic elsewhere while holding the lock leaves the set itself intact,
    /// so a poisoned lock is taken over instead of treating the log as empty.
    fn set(&self) -> MutexGuard<'_, HashSet<String>> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            warn!(target: "dedup", "used-store lock poisoned, recovering");
            self.inner.clear_poison();
            poisoned.into_inner()
        })
    }

    pub fn len(&self) -> usize {
        self.set().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AlreadyUsedStore for InMemoryUsedStore {
    fn contains(&self, fingerprint: &str) -> bool {
        self.set().contains(fingerprint)
    }

    fn record(&self, fingerprint: &str) {
        self.set().insert(fingerprint.to_string());
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DedupStats {
    pub duplicates: usize,
    pub already_used: usize,
}

pub struct Deduplicator<'a> {
    used: Option<&'a dyn AlreadyUsedStore>,
}

impl<'a> Deduplicator<'a> {
    pub fn new(used: Option<&'a dyn AlreadyUsedStore>) -> Self {
        Self { used }
    }

    pub fn dedup(&self, mut items: Vec<ContentItem>) -> (Vec<ContentItem>, DedupStats) {
        if items.iter().any(|it| it.source_priority.is_some()) {
            // Vec::sort_by is stable: equal hints keep their input order.
            items.sort_by(|a, b| {
                let pa = a.source_priority.unwrap_or(f64::NEG_INFINITY);
                let pb = b.source_priority.unwrap_or(f64::NEG_INFINITY);
                pb.partial_cmp(&pa).unwrap_or(Ordering::Equal)
            });
        }

        let mut seen: HashSet<String> = HashSet::with_capacity(items.len());
        let mut stats = DedupStats::default();
        let mut keep = Vec::with_capacity(items.len());

        for it in items {
            if self.used.is_some_and(|u| u.contains(it.fingerprint())) {
                debug!(target: "dedup", id = it.fingerprint(), "already used");
                stats.already_used += 1;
                continue;
            }
            if !seen.insert(it.fingerprint().to_string()) {
                debug!(target: "dedup", id = it.fingerprint(), source = %it.source, "duplicate");
                stats.duplicates += 1;
                continue;
            }
            keep.push(it);
        }

        counter!("selector_duplicates_total").increment(stats.duplicates as u64);
        counter!("selector_already_used_total").increment(stats.already_used as u64);
        (keep, stats)
    }
}
