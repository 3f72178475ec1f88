//! Storage for live instances, session state, and the widget-runtime queues.

use std::collections::HashMap;
use std::collections::HashSet;

use parking_lot::{Mutex, RwLock};

use crate::key::{InstanceKey, PassId};
use crate::value::{Params, Value};

/// A live widget instance.
///
/// Clones returned from [`Session::instance`](crate::Session::instance) are
/// snapshots; mutating them has no effect on the session.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Instance {
    /// The resolved identity this instance lives under.
    pub key: InstanceKey,
    /// Snapshot of the declared parameters at (re)creation.
    ///
    /// For site-identified instances this is what the next pass's parameters
    /// are compared against. It is never updated on reuse.
    pub params: Params,
    /// The last value emitted by this instance.
    pub value: Value,
    /// The default value the instance was created with. Kept so drift in a
    /// later declaration's default can be flagged.
    pub default: Value,
    /// The pass in which this instance was (re)created.
    pub mounted_at: PassId,
}

/// Notice that an instance was created and its sandboxed widget should be
/// instantiated with the given parameters.
///
/// Drained via [`Session::pending_mounts`](crate::Session::pending_mounts).
/// Creation is the only point at which a widget runtime receives parameters;
/// reuse passes produce no notice.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MountNotice {
    /// The identity to address deliveries to.
    pub key: InstanceKey,
    /// The creation parameters.
    pub params: Params,
    /// The pass in which the instance was created.
    pub pass: PassId,
}

/// The table of live instances.
pub(crate) struct InstanceStore {
    entries: RwLock<HashMap<InstanceKey, Instance, ahash::RandomState>>,
}

impl Default for InstanceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InstanceStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::default()),
        }
    }

    /// Get a snapshot of the instance under a key.
    pub fn get(&self, key: &InstanceKey) -> Option<Instance> {
        self.entries.read().get(key).cloned()
    }

    /// Returns true if an instance is live under this key.
    pub fn contains(&self, key: &InstanceKey) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Insert or replace the instance under its key.
    pub fn insert(&self, instance: Instance) {
        self.entries
            .write()
            .insert(instance.key.clone(), instance);
    }

    /// Apply a delivered value to a live instance.
    ///
    /// Returns false if no instance is live under the key.
    pub fn apply_delivery(&self, key: &InstanceKey, value: Value) -> bool {
        match self.entries.write().get_mut(key) {
            Some(instance) => {
                instance.value = value;
                true
            }
            None => false,
        }
    }

    /// Drop every instance whose key is not in `touched`, returning the
    /// dropped keys.
    pub fn retain_touched(
        &self,
        touched: &HashSet<InstanceKey, ahash::RandomState>,
    ) -> Vec<InstanceKey> {
        let mut entries = self.entries.write();
        let dropped: Vec<InstanceKey> = entries
            .keys()
            .filter(|key| !touched.contains(*key))
            .cloned()
            .collect();
        for key in &dropped {
            entries.remove(key);
        }
        dropped
    }

    /// Keys of all live instances.
    pub fn keys(&self) -> Vec<InstanceKey> {
        self.entries.read().keys().cloned().collect()
    }

    /// Number of live instances.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }
}

/// String-keyed per-session state, the host-owned store scripts and widget
/// wrappers persist values in between passes.
pub(crate) struct StateStore {
    entries: RwLock<HashMap<String, Value, ahash::RandomState>>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::default()),
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.read().get(key).cloned()
    }

    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.entries.write().insert(key.into(), value);
    }

    /// Get the value under `key`, inserting `default` first if absent.
    pub fn get_or_insert(&self, key: &str, default: Value) -> Value {
        self.entries
            .write()
            .entry(key.to_string())
            .or_insert(default)
            .clone()
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.entries.write().remove(key)
    }
}

/// Queue of values emitted by widget runtimes, waiting for the next pass.
pub(crate) struct DeliveryQueue {
    queue: Mutex<Vec<(InstanceKey, Value)>>,
}

impl Default for DeliveryQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl DeliveryQueue {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, key: InstanceKey, value: Value) {
        self.queue.lock().push((key, value));
    }

    pub fn drain(&self) -> Vec<(InstanceKey, Value)> {
        std::mem::take(&mut *self.queue.lock())
    }
}

/// Queue of mount notices waiting for the embedding to instantiate widgets.
pub(crate) struct MountQueue {
    queue: Mutex<Vec<MountNotice>>,
}

impl Default for MountQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl MountQueue {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, notice: MountNotice) {
        self.queue.lock().push(notice);
    }

    pub fn drain(&self) -> Vec<MountNotice> {
        std::mem::take(&mut *self.queue.lock())
    }
}
