//! In-process message collection.
//!
//! Backs `STORE_BACKEND=memory` and the test suite. Documents are kept in
//! insertion order behind a single mutex, so a batch delete is trivially
//! all-or-nothing. Timestamps come from the system clock but are clamped to
//! never go backwards, which keeps `time` order equal to insertion order.

use std::collections::HashSet;
use std::sync::Mutex;

use time::OffsetDateTime;
use uuid::Uuid;

use super::{Message, MessageStore, NewMessage, StoreError, parse_ids};

#[derive(Default)]
struct Collection {
    docs: Vec<Message>,
    last_time: Option<OffsetDateTime>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Collection>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Collection> {
        // Every mutation is a single push or retain; poisoned data is consistent.
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait::async_trait]
impl MessageStore for MemoryStore {
    async fn fetch_ordered(&self) -> Result<Vec<Message>, StoreError> {
        Ok(self.lock().docs.clone())
    }

    async fn insert(&self, message: NewMessage) -> Result<Message, StoreError> {
        let mut coll = self.lock();
        let now = OffsetDateTime::now_utc();
        let time = match coll.last_time {
            Some(last) if last > now => last,
            _ => now,
        };
        coll.last_time = Some(time);

        let stored = Message::stored(Uuid::new_v4().to_string(), time, message);
        coll.docs.push(stored.clone());
        Ok(stored)
    }

    async fn list_ids(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.lock().docs.iter().map(|m| m.id.clone()).collect())
    }

    async fn delete_batch(&self, ids: &[String]) -> Result<(), StoreError> {
        let doomed: HashSet<Uuid> = parse_ids(ids)?.into_iter().collect();
        let mut coll = self.lock();
        coll.docs
            .retain(|m| Uuid::parse_str(&m.id).map_or(true, |id| !doomed.contains(&id)));
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
