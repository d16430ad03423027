//! In-memory event store
//!
//! Append-only `Vec` behind a write lock. Id and timestamp are assigned while
//! the lock is held, so `created_at` order is insertion order.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use super::{EventStore, StoreError};
use crate::models::{Event, EventFilter, EventStats, NewEvent, Severity};

#[derive(Default)]
pub struct MemoryEventStore {
    events: RwLock<Vec<Event>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn insert(&self, event: NewEvent) -> Result<Event, StoreError> {
        let mut events = self.events.write();

        // Keep timestamps strictly monotonic even if the clock does not advance
        let mut created_at = Utc::now();
        if let Some(last) = events.last() {
            if created_at <= last.created_at {
                created_at = last.created_at + chrono::Duration::microseconds(1);
            }
        }

        let stored = event.into_event(Uuid::new_v4(), created_at);
        events.push(stored.clone());
        Ok(stored)
    }

    async fn list(&self, filter: EventFilter) -> Result<Vec<Event>, StoreError> {
        let events = self.events.read();
        Ok(events
            .iter()
            .rev()
            .filter(|e| !filter.threats_only || e.is_threat)
            .take(filter.limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn stats(&self) -> Result<EventStats, StoreError> {
        let events = self.events.read();
        Ok(EventStats {
            total: events.len() as i64,
            threats: events.iter().filter(|e| e.is_threat).count() as i64,
            critical: events.iter().filter(|e| e.severity == Severity::Critical).count() as i64,
        })
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
