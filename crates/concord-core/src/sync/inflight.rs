//! Keyed single-flight: at most one running attempt per key.
//!
//! The first caller for a key (the leader) spawns the work on its own task;
//! later callers for the same key join the leader's shared future. The work
//! is never cancelled by callers dropping their future, and the slot is freed
//! when the task finishes, even by panicking.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

type SharedOutput<V> = Shared<BoxFuture<'static, V>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Leader,
    Follower,
}

pub struct InFlight<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    slots: Arc<DashMap<K, SharedOutput<V>>>,
}

impl<K, V> Default for InFlight<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Frees the slot when the spawned task ends.
struct SlotRelease<K: Eq + Hash, V: Clone> {
    slots: Arc<DashMap<K, SharedOutput<V>>>,
    key: Option<K>,
}

impl<K: Eq + Hash, V: Clone> Drop for SlotRelease<K, V> {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.slots.remove(&key);
        }
    }
}

impl<K, V> InFlight<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self { slots: Arc::new(DashMap::new()) }
    }

    /// Join the running attempt for `key`, or start `work` as the leader.
    ///
    /// `on_abort` supplies the value observed when the task dies without
    /// producing one.
    pub async fn run<F, A>(&self, key: K, work: F, on_abort: A) -> (V, Role)
    where
        F: Future<Output = V> + Send + 'static,
        A: FnOnce() -> V + Send + 'static,
    {
        let (shared, role) = match self.slots.entry(key.clone()) {
            Entry::Occupied(slot) => (slot.get().clone(), Role::Follower),
            Entry::Vacant(slot) => {
                let release = SlotRelease { slots: Arc::clone(&self.slots), key: Some(key) };
                let handle = tokio::spawn(async move {
                    let _release = release;
                    work.await
                });
                let shared = async move {
                    match handle.await {
                        Ok(value) => value,
                        Err(e) => {
                            tracing::error!("[Engine] in-flight task aborted: {}", e);
                            on_abort()
                        },
                    }
                }
                .boxed()
                .shared();
                slot.insert(shared.clone());
                (shared, Role::Leader)
            },
        };
        (shared.await, role)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
