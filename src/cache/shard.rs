//! Shard Module
//!
//! A double-buffered key-value store. Readers only ever touch the front map;
//! writers and the sweep work on the back map and publish their changes by
//! swapping the two.
//!
//! # Protocol
//! - `write`: insert into back, swap, insert the same entry into the new back.
//! - `sweep`: delete expired keys from back, swap, delete them again from the
//!   new back.
//!
//! The second insert/delete brings the previous front (now back) up to date,
//! so both maps hold the same key set once the back lock is released. Every
//! swap happens while the back lock is held exclusively, which keeps swaps on
//! one shard strictly serialized.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::cache::CacheEntry;

pub(crate) type EntryMap<V> = HashMap<String, Arc<CacheEntry<V>>>;

// == Write Outcome ==
/// Result of a shard write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The entry was stored and is visible to readers
    Inserted,
    /// The key was already stored; nothing changed
    AlreadyPresent,
}

// == Sweep Outcome ==
/// Result of sweeping one shard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepOutcome {
    /// Entries removed because they had expired
    pub expired: usize,
    /// Entries left in the shard after the sweep
    pub remaining: usize,
}

// == Shard ==
/// One independently locked partition of the cache.
#[derive(Debug)]
pub struct Shard<V> {
    /// Map serving reads
    pub(crate) front: RwLock<EntryMap<V>>,
    /// Map absorbing writes and deletions
    pub(crate) back: RwLock<EntryMap<V>>,
    /// Initial sizing hint for the expired-key buffer of a sweep
    key_buffer_size: usize,
}

impl<V> Shard<V> {
    // == Constructor ==
    /// Creates an empty shard with both maps pre-sized for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            front: RwLock::new(HashMap::with_capacity(capacity)),
            back: RwLock::new(HashMap::with_capacity(capacity)),
            key_buffer_size: capacity,
        }
    }

    // == Read ==
    /// Looks `key` up in the front map.
    ///
    /// Expiry is not checked: an expired entry stays readable until a sweep
    /// removes it.
    pub fn read(&self, key: &str) -> Option<Arc<CacheEntry<V>>> {
        self.front.read().get(key).cloned()
    }

    // == Write ==
    /// Stores `value` under `key` unless the key is already present.
    ///
    /// An existing entry is never overwritten and its TTL is not refreshed.
    pub fn write(&self, key: &str, value: V, ttl: Duration) -> WriteOutcome {
        if self.read(key).is_some() {
            return WriteOutcome::AlreadyPresent;
        }

        let mut back = self.back.write();
        // A concurrent writer may have stored the key after our read.
        if back.contains_key(key) {
            return WriteOutcome::AlreadyPresent;
        }

        let entry = Arc::new(CacheEntry::new(value, ttl));
        back.insert(key.to_owned(), Arc::clone(&entry));

        self.swap(&mut back);

        back.insert(key.to_owned(), entry);

        WriteOutcome::Inserted
    }

    // == Sweep ==
    /// Removes every entry that had expired at `now`.
    ///
    /// Sweeps may overlap. A key collected as expired but stored again before
    /// this sweep takes the back lock is kept.
    pub fn sweep(&self, now: Instant) -> SweepOutcome {
        let mut keys = Vec::with_capacity(self.key_buffer_size);
        {
            let back = self.back.read();
            keys.extend(
                back.iter()
                    .filter(|(_, entry)| entry.is_expired_at(now))
                    .map(|(key, _)| key.clone()),
            );
        }

        if keys.is_empty() {
            return SweepOutcome {
                expired: 0,
                remaining: self.back.read().len(),
            };
        }

        // Another sweep may have run since the scan and the key been stored
        // again, so only entries still expired under the write lock go.
        let mut back = self.back.write();
        let expired = keys
            .iter()
            .filter(|key| remove_if_expired(&mut back, key, now))
            .count();

        self.swap(&mut back);

        for key in &keys {
            remove_if_expired(&mut back, key, now);
        }

        SweepOutcome {
            expired,
            remaining: back.len(),
        }
    }

    // == Swap ==
    /// Exchanges the front and back maps.
    ///
    /// Takes the held back guard so it can only run inside a write or sweep.
    /// Readers are blocked for the duration of a constant-size `mem::swap`.
    fn swap(&self, back: &mut EntryMap<V>) {
        let mut front = self.front.write();
        std::mem::swap(&mut *front, back);
    }

    // == Length ==
    /// Number of entries currently readable, expired-but-unswept included.
    pub fn len(&self) -> usize {
        self.front.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.front.read().is_empty()
    }
}

fn remove_if_expired<V>(map: &mut EntryMap<V>, key: &str, now: Instant) -> bool {
    if map.get(key).is_some_and(|entry| entry.is_expired_at(now)) {
        map.remove(key);
        true
    } else {
        false
    }
}
