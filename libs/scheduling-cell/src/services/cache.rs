// libs/scheduling-cell/src/services/cache.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;
use uuid::Uuid;

use crate::models::TimeSlot;
use crate::services::slots::refresh_availability;

type SlotCacheKey = (Uuid, NaiveDate);

struct CacheEntry {
    slots: Vec<TimeSlot>,
    stored_at: Instant,
}

struct CacheInner {
    entries: HashMap<SlotCacheKey, CacheEntry>,
    // Keys in first-insertion order. Mirrors `entries` exactly.
    insertion_order: VecDeque<SlotCacheKey>,
    hits: u64,
    misses: u64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SlotCacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Bounded in-process cache for generated day grids, keyed by doctor and day.
///
/// Entries expire after a short TTL and the oldest entry is dropped once the
/// bound is reached. Writers that touch a doctor's day must invalidate it.
pub struct SlotCache {
    ttl: Duration,
    max_entries: usize,
    inner: Mutex<CacheInner>,
}

impl SlotCache {
    pub fn new(ttl_seconds: u64, max_entries: usize) -> Self {
        Self {
            ttl: Duration::from_secs(ttl_seconds),
            max_entries: max_entries.max(1),
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                insertion_order: VecDeque::new(),
                hits: 0,
                misses: 0,
            }),
        }
    }

    /// Fetch a fresh copy of a cached grid. Availability is re-derived
    /// against `now` so an entry never reports a slot that has slipped
    /// into the past during its lifetime.
    pub fn get(&self, doctor_id: Uuid, date: NaiveDate, now: DateTime<Utc>) -> Option<Vec<TimeSlot>> {
        let key = (doctor_id, date);
        let mut inner = self.lock_inner();

        let expired = match inner.entries.get(&key) {
            Some(entry) => entry.stored_at.elapsed() > self.ttl,
            None => {
                inner.misses += 1;
                return None;
            }
        };

        if expired {
            inner.entries.remove(&key);
            inner.insertion_order.retain(|k| k != &key);
            inner.misses += 1;
            return None;
        }

        inner.hits += 1;
        let entry = inner
            .entries
            .get(&key)
            .map(|entry| entry.slots.clone());
        entry.map(|mut slots| {
            refresh_availability(date, &mut slots, now);
            slots
        })
    }

    /// Store a freshly generated grid. Re-inserting a live key overwrites its
    /// slots without renewing its position in the eviction order.
    pub fn insert(&self, doctor_id: Uuid, date: NaiveDate, slots: Vec<TimeSlot>) {
        let key = (doctor_id, date);
        let mut inner = self.lock_inner();

        let entry = CacheEntry {
            slots,
            stored_at: Instant::now(),
        };

        if inner.entries.insert(key, entry).is_some() {
            return;
        }

        inner.insertion_order.push_back(key);
        while inner.entries.len() > self.max_entries {
            if let Some(oldest) = inner.insertion_order.pop_front() {
                inner.entries.remove(&oldest);
                debug!("Slot cache evicted doctor {} on {}", oldest.0, oldest.1);
            } else {
                break;
            }
        }
    }

    /// Drop a doctor's day so the next read regenerates from storage.
    pub fn invalidate(&self, doctor_id: Uuid, date: NaiveDate) {
        let key = (doctor_id, date);
        let mut inner = self.lock_inner();
        if inner.entries.remove(&key).is_some() {
            inner.insertion_order.retain(|k| k != &key);
            debug!("Slot cache invalidated doctor {} on {}", doctor_id, date);
        }
    }

    pub fn stats(&self) -> SlotCacheStats {
        let inner = self.lock_inner();
        SlotCacheStats {
            entries: inner.entries.len(),
            hits: inner.hits,
            misses: inner.misses,
        }
    }

    fn lock_inner(&self) -> std::sync::MutexGuard<'_, CacheInner> {
        // A poisoned lock only means another thread panicked mid-update;
        // cached grids are safe to reuse or overwrite.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
