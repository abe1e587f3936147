// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Redelivery protection for webhook items.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use civic_core::{Clock, later_by};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// Remembers item keys for a retention window. Claims are atomic, so two
/// concurrent deliveries of one item cannot both win.
pub struct DedupCache {
    seen: DashMap<String, DateTime<Utc>>,
    retention: TimeDelta,
    clock: Arc<dyn Clock>,
}

impl DedupCache {
    pub fn new(retention: TimeDelta, clock: Arc<dyn Clock>) -> Self {
        Self {
            seen: DashMap::new(),
            retention,
            clock,
        }
    }

    /// Returns `true` if the caller is the first to see `key` within the
    /// retention window.
    pub fn claim(&self, key: &str) -> bool {
        let now = self.clock.now();
        match self.seen.entry(key.to_string()) {
            Entry::Occupied(mut slot) => {
                if later_by(*slot.get(), self.retention) <= now {
                    slot.insert(now);
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(now);
                true
            }
        }
    }

    /// Forgets a claim so a redelivery of the item is processed again.
    pub fn release(&self, key: &str) {
        self.seen.remove(key);
    }

    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.seen.len();
        self.seen
            .retain(|_, seen_at| later_by(*seen_at, self.retention) > now);
        before.saturating_sub(self.seen.len())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
