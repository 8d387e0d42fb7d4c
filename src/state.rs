//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the message store handle, created once at startup, and the upload
//! ceiling the routes enforce before calling into the message service.

use std::sync::Arc;

use crate::store::MessageStore;

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped or Copy.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MessageStore>,
    pub upload_limit: usize,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn MessageStore>, upload_limit: usize) -> Self {
        Self { store, upload_limit }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use super::*;
    use crate::config::DEFAULT_UPLOAD_LIMIT_BYTES;
    use crate::store::memory::MemoryStore;
    use crate::store::{Message, NewMessage, StoreError};

    /// Create a test `AppState` backed by an empty in-memory store.
    #[must_use]
    pub fn test_app_state() -> AppState {
        AppState::new(Arc::new(MemoryStore::new()), DEFAULT_UPLOAD_LIMIT_BYTES)
    }

    /// Create a test `AppState` around a given store and upload ceiling.
    #[must_use]
    pub fn test_app_state_with(store: Arc<dyn MessageStore>, upload_limit: usize) -> AppState {
        AppState::new(store, upload_limit)
    }

    fn unavailable() -> StoreError {
        StoreError::Database(sqlx::Error::PoolTimedOut)
    }

    /// In-memory store with switchable failures and an insert counter.
    #[derive(Default)]
    pub struct FlakyStore {
        pub inner: MemoryStore,
        pub fail_fetch: AtomicBool,
        pub fail_insert: AtomicBool,
        pub fail_list_ids: AtomicBool,
        pub fail_commit: AtomicBool,
        pub inserts: AtomicUsize,
    }

    impl FlakyStore {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        pub fn inserts(&self) -> usize {
            self.inserts.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl MessageStore for FlakyStore {
        async fn fetch_ordered(&self) -> Result<Vec<Message>, StoreError> {
            if self.fail_fetch.load(Ordering::SeqCst) {
                return Err(unavailable());
            }
            self.inner.fetch_ordered().await
        }

        async fn insert(&self, message: NewMessage) -> Result<Message, StoreError> {
            if self.fail_insert.load(Ordering::SeqCst) {
                return Err(unavailable());
            }
            self.inserts.fetch_add(1, Ordering::SeqCst);
            self.inner.insert(message).await
        }

        async fn list_ids(&self) -> Result<Vec<String>, StoreError> {
            if self.fail_list_ids.load(Ordering::SeqCst) {
                return Err(unavailable());
            }
            self.inner.list_ids().await
        }

        async fn delete_batch(&self, ids: &[String]) -> Result<(), StoreError> {
            // Fails at commit time: nothing from the batch is applied.
            if self.fail_commit.load(Ordering::SeqCst) {
                return Err(unavailable());
            }
            self.inner.delete_batch(ids).await
        }
    }
}
