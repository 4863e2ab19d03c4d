//! Loop suppression for engine-originated writes.
//!
//! Every successful write registers a marker keyed by the side that was
//! written and that side's own id, holding the value the engine copied onto
//! that side. A listener reporting a change back is an echo only while the
//! written side still agrees with that value; a reversal inside the TTL is a
//! genuine change. Markers are not consumed and expire after their TTL.

use dashmap::DashMap;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use concord_types::{Side, SyncKind};

#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct MarkerKey {
    pub kind: SyncKind,
    pub side: Side,
    /// Account id on `side`
    pub subject: String,
    /// Mapping entity on `side` (group name or role id); `None` for single-mapping kinds
    pub entry: Option<String>,
}

impl MarkerKey {
    pub fn new(kind: SyncKind, side: Side, subject: impl fmt::Display, entry: Option<String>) -> Self {
        Self { kind, side, subject: subject.to_string(), entry }
    }
}

impl fmt::Display for MarkerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.kind, self.side.as_str(), self.subject)?;
        if let Some(entry) = &self.entry {
            write!(f, ":{}", entry)?;
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct Marker {
    pub expires_at: Instant,
    intended: Arc<dyn Any + Send + Sync>,
}

impl Marker {
    /// The value the engine copied onto the written side, if it is a `T`.
    pub fn intended<T: 'static>(&self) -> Option<&T> {
        self.intended.downcast_ref::<T>()
    }
}

impl fmt::Debug for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Marker").field("expires_at", &self.expires_at).finish_non_exhaustive()
    }
}

pub struct LoopGuard {
    markers: DashMap<MarkerKey, Marker>,
}

impl Default for LoopGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopGuard {
    pub fn new() -> Self {
        Self { markers: DashMap::new() }
    }

    /// Register (or refresh) a marker that lives for `ttl`.
    pub fn mark<T: Any + Send + Sync>(&self, key: MarkerKey, intended: T, ttl: Duration) {
        let marker = Marker { expires_at: Instant::now() + ttl, intended: Arc::new(intended) };
        tracing::trace!("[LoopGuard] marked {} for {:?}", key, ttl);
        self.markers.insert(key, marker);
    }

    /// Live marker for `key`, if any. Expired markers are dropped on read.
    pub fn check(&self, key: &MarkerKey) -> Option<Marker> {
        let now = Instant::now();
        if let Some(marker) = self.markers.get(key) {
            if marker.expires_at > now {
                return Some(marker.clone());
            }
        } else {
            return None;
        }
        self.markers.remove_if(key, |_, m| m.expires_at <= now);
        None
    }

    /// Drop expired markers; returns how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.markers.len();
        self.markers.retain(|_, marker| marker.expires_at > now);
        before.saturating_sub(self.markers.len())
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn clear(&self) {
        self.markers.clear();
    }
}
