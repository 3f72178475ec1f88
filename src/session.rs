//! Session: the per-user instance table and the host render loop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::PassError;
use crate::key::{InstanceKey, PassId};
use crate::pass::{PassContext, PassReport};
use crate::storage::{DeliveryQueue, Instance, InstanceStore, MountNotice, MountQueue, StateStore};
use crate::tracer::{NoopTracer, PassOutcome, Tracer};
use crate::value::Value;

/// Default bound on consecutive rerun requests within one [`Session::run`].
const DEFAULT_MAX_RERUNS: u32 = 32;

/// A user session: the live-instance table, session state, and the queues
/// crossing the widget-runtime boundary.
///
/// This is cheap to clone - all data is behind `Arc`. One handle typically
/// drives the render loop while another feeds deliveries in from the widget
/// runtime.
///
/// # Example
///
/// ```ignore
/// let session = Session::new();
///
/// let report = session.run(|ctx| {
///     let value = ctx.widget()
///         .param("label", "Create")
///         .default(false)
///         .mount();
///     println!("{}", value);
///     Ok(())
/// })?;
/// ```
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    instances: InstanceStore,
    state: StateStore,
    deliveries: DeliveryQueue,
    mounts: MountQueue,
    passes: AtomicU64,
    max_reruns: u32,
    tracer: Arc<dyn Tracer>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Session {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl Session {
    /// Create a session with default settings.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a builder for customizing the session.
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Run one render pass of `script`, restarting it as long as it requests
    /// reruns.
    ///
    /// Before each attempt, queued deliveries are applied to their instances,
    /// so a value a widget emitted after the previous pass is observed
    /// exactly once, at the start of the next one. After a completed attempt,
    /// instances no declaration resolved to are collected.
    ///
    /// # Errors
    ///
    /// - `PassError::RerunLimit` - the script kept requesting reruns past the
    ///   configured bound
    /// - `PassError::UserError` - the script itself failed
    ///
    /// `PassError::Rerun` never escapes; it is consumed by the loop.
    pub fn run<F>(&self, mut script: F) -> Result<PassReport, PassError>
    where
        F: FnMut(&mut PassContext<'_>) -> Result<(), PassError>,
    {
        let mut reruns = 0u32;
        loop {
            self.apply_deliveries();
            let pass = self.inner.passes.fetch_add(1, Ordering::Relaxed) + 1;
            self.inner.tracer.on_pass_start(pass);

            let mut ctx = PassContext::new(self, pass);
            match script(&mut ctx) {
                Ok(()) => return Ok(ctx.finish(reruns)),
                Err(PassError::Rerun) => {
                    // Abandoned pass: no collection, no outputs. Instances
                    // declared before the rerun point stay live and are
                    // reconciled by the next full attempt.
                    self.inner.tracer.on_pass_end(pass, PassOutcome::Restarted);
                    reruns += 1;
                    if reruns > self.inner.max_reruns {
                        return Err(PassError::RerunLimit {
                            limit: self.inner.max_reruns,
                        });
                    }
                }
                Err(other) => return Err(other),
            }
        }
    }

    /// Report a value emitted by a widget runtime.
    ///
    /// The value is applied to the instance at the start of the next pass.
    /// Returns false if no instance is live under `key`; the value is then
    /// discarded rather than queued.
    pub fn deliver(&self, key: InstanceKey, value: Value) -> bool {
        if !self.inner.instances.contains(&key) {
            self.inner.tracer.on_stale_delivery(&key, &value);
            return false;
        }
        self.inner.deliveries.push(key, value);
        true
    }

    /// Drain the notices for instances created since the last call.
    ///
    /// An embedding uses these to instantiate the sandboxed widgets: each
    /// notice carries the creation parameters and the key future deliveries
    /// must be addressed to.
    pub fn pending_mounts(&self) -> Vec<MountNotice> {
        self.inner.mounts.drain()
    }

    /// Snapshot of the instance live under a key.
    pub fn instance(&self, key: &InstanceKey) -> Option<Instance> {
        self.inner.instances.get(key)
    }

    /// Current emitted value of the instance live under a key.
    pub fn value(&self, key: &InstanceKey) -> Option<Value> {
        self.inner.instances.get(key).map(|instance| instance.value)
    }

    /// Keys of all live instances.
    pub fn live_keys(&self) -> Vec<InstanceKey> {
        self.inner.instances.keys()
    }

    /// Number of live instances.
    pub fn live_count(&self) -> usize {
        self.inner.instances.len()
    }

    /// Number of passes started so far, abandoned attempts included.
    pub fn passes(&self) -> PassId {
        self.inner.passes.load(Ordering::Relaxed)
    }

    /// Read a session-state entry from outside a pass.
    pub fn state(&self, key: &str) -> Option<Value> {
        self.inner.state.get(key)
    }

    /// Write a session-state entry from outside a pass.
    pub fn set_state(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.inner.state.set(key, value.into());
    }

    /// Remove a session-state entry, returning the value it held.
    pub fn remove_state(&self, key: &str) -> Option<Value> {
        self.inner.state.remove(key)
    }

    fn apply_deliveries(&self) {
        for (key, value) in self.inner.deliveries.drain() {
            // The instance can be gone if it was collected after the
            // delivery was queued; late discard, same as at the door.
            if self.inner.instances.apply_delivery(&key, value.clone()) {
                self.inner.tracer.on_delivery(&key, &value);
            } else {
                self.inner.tracer.on_stale_delivery(&key, &value);
            }
        }
    }

    pub(crate) fn instances(&self) -> &InstanceStore {
        &self.inner.instances
    }

    pub(crate) fn state_store(&self) -> &StateStore {
        &self.inner.state
    }

    pub(crate) fn mounts(&self) -> &MountQueue {
        &self.inner.mounts
    }

    pub(crate) fn tracer(&self) -> &dyn Tracer {
        &*self.inner.tracer
    }
}

/// Builder for [`Session`] with customizable settings.
///
/// # Example
///
/// ```ignore
/// let tracer = Arc::new(MyTracer::default());
/// let session = Session::builder()
///     .max_reruns(4)
///     .tracer(tracer.clone())
///     .build();
/// ```
pub struct SessionBuilder {
    max_reruns: u32,
    tracer: Arc<dyn Tracer>,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            max_reruns: DEFAULT_MAX_RERUNS,
            tracer: Arc::new(NoopTracer),
        }
    }

    /// Bound the number of consecutive rerun requests one
    /// [`Session::run`] call will honor before failing with
    /// [`PassError::RerunLimit`](crate::PassError::RerunLimit).
    pub fn max_reruns(mut self, limit: u32) -> Self {
        self.max_reruns = limit;
        self
    }

    /// Install a tracer observing resolution events.
    ///
    /// Takes an `Arc` so the caller can keep a handle for reading whatever
    /// the tracer collects.
    pub fn tracer(mut self, tracer: Arc<dyn Tracer>) -> Self {
        self.tracer = tracer;
        self
    }

    /// Build the session with the configured settings.
    pub fn build(self) -> Session {
        Session {
            inner: Arc::new(SessionInner {
                instances: InstanceStore::new(),
                state: StateStore::new(),
                deliveries: DeliveryQueue::new(),
                mounts: MountQueue::new(),
                passes: AtomicU64::new(0),
                max_reruns: self.max_reruns,
                tracer: self.tracer,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<Session>();
        assert_sync::<Session>();
    }

    #[test]
    fn test_pass_ids_are_monotonic() {
        let session = Session::new();
        let first = session.run(|_ctx| Ok(())).unwrap();
        let second = session.run(|_ctx| Ok(())).unwrap();
        assert!(second.pass > first.pass);
        assert_eq!(session.passes(), 2);
    }

    #[test]
    fn test_rerun_limit() {
        let session = Session::builder().max_reruns(3).build();
        let result = session.run(|ctx| ctx.request_rerun());
        match result {
            Err(PassError::RerunLimit { limit }) => assert_eq!(limit, 3),
            other => panic!("expected RerunLimit, got {:?}", other),
        }
        // Three honored reruns plus the initial attempt.
        assert_eq!(session.passes(), 4);
    }
}
