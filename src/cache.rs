use chrono::{DateTime, Duration, Utc};
use std::sync::{Mutex, MutexGuard, PoisonError};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    pub fetched_at: DateTime<Utc>,
    pub payload: T,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Fresh { payload: T, age: Duration },
    Stale { payload: T, age: Duration },
    Empty,
}

/// Single-slot cache for the last successful response. Each warm instance
/// holds its own copy; nothing is shared across instances.
pub struct ResponseCache<T> {
    freshness: Duration,
    entry: Mutex<Option<CacheEntry<T>>>,
}

impl<T: Clone> ResponseCache<T> {
    pub fn new(freshness: Duration) -> Self {
        ResponseCache {
            freshness,
            entry: Mutex::new(None),
        }
    }

    pub fn freshness(&self) -> Duration {
        self.freshness
    }

    pub fn lookup(&self, now: DateTime<Utc>) -> Lookup<T> {
        match self.slot().as_ref() {
            Some(entry) => {
                let age = (now - entry.fetched_at).max(Duration::zero());
                if age < self.freshness {
                    Lookup::Fresh {
                        payload: entry.payload.clone(),
                        age,
                    }
                } else {
                    Lookup::Stale {
                        payload: entry.payload.clone(),
                        age,
                    }
                }
            }
            None => Lookup::Empty,
        }
    }

    pub fn store(&self, fetched_at: DateTime<Utc>, payload: T) {
        *self.slot() = Some(CacheEntry {
            fetched_at,
            payload,
        });
    }

    fn slot(&self) -> MutexGuard<'_, Option<CacheEntry<T>>> {
        self.entry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
