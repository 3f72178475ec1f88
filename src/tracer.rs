//! Tracer trait for observing identity resolution.
//!
//! This module defines the [`Tracer`] trait and related types for observing
//! what happens to widget instances across render passes. The default
//! [`NoopTracer`] provides zero cost when tracing is not needed.
//!
//! The tracer is also the crate's diagnostic channel: key collisions, stale
//! deliveries, and default drift are surfaced here rather than failing the
//! pass, since none of them is fatal to resolution.
//!
//! # Example
//!
//! ```ignore
//! use remount::{Session, Tracer, InstanceKey, PassId};
//!
//! struct LoggingTracer;
//!
//! impl Tracer for LoggingTracer {
//!     fn on_remount(&self, key: &InstanceKey, _old: &Params, _new: &Params, pass: PassId) {
//!         eprintln!("pass {}: {} reinstantiated, state discarded", pass, key);
//!     }
//! }
//!
//! let session = Session::builder().tracer(Arc::new(LoggingTracer)).build();
//! ```

use crate::key::{InstanceKey, PassId};
use crate::value::{Params, Value};

/// How a render pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// The script ran to completion; untouched instances were collected.
    Completed {
        /// Number of widget declarations resolved in the pass.
        widgets: usize,
    },
    /// The script requested a rerun; the pass was abandoned without
    /// collection and a new pass starts immediately.
    Restarted,
}

/// Tracer trait for observing identity resolution.
///
/// All methods have default empty implementations, so implementations only
/// override the events they are interested in. Implementations must be
/// `Send + Sync` because a session handle may be shared across threads.
pub trait Tracer: Send + Sync + 'static {
    /// Called when a render pass starts, after queued deliveries are applied.
    #[inline]
    fn on_pass_start(&self, _pass: PassId) {}

    /// Called when a render pass ends, completed or restarted.
    #[inline]
    fn on_pass_end(&self, _pass: PassId, _outcome: PassOutcome) {}

    /// Called when a declaration creates a fresh instance.
    ///
    /// `params` is the creation snapshot, the only point at which a widget
    /// runtime receives parameters.
    #[inline]
    fn on_mount(&self, _key: &InstanceKey, _params: &Params, _pass: PassId) {}

    /// Called when a declaration resolves to a live instance and reuses it.
    #[inline]
    fn on_reuse(&self, _key: &InstanceKey, _pass: PassId) {}

    /// Called when a site-identified instance is discarded and recreated
    /// because its declared parameters drifted from the stored snapshot.
    #[inline]
    fn on_remount(&self, _key: &InstanceKey, _old: &Params, _new: &Params, _pass: PassId) {}

    /// Called when an instance is dropped because no declaration in a
    /// completed pass resolved to it.
    #[inline]
    fn on_unmount(&self, _key: &InstanceKey, _pass: PassId) {}

    /// Called when a queued delivery is applied to a live instance.
    #[inline]
    fn on_delivery(&self, _key: &InstanceKey, _value: &Value) {}

    /// Called when a delivery is discarded because its instance is gone.
    #[inline]
    fn on_stale_delivery(&self, _key: &InstanceKey, _value: &Value) {}

    /// Called when two declarations in one pass resolve to the same explicit
    /// key. The first declaration owns the instance; the collision is flagged
    /// instead of merging state.
    #[inline]
    fn on_key_collision(&self, _key: &InstanceKey, _pass: PassId) {}

    /// Called when a reused instance is declared with a default value that
    /// differs from the one it was created with. The declared default is
    /// ignored; the drift usually signals caller confusion.
    #[inline]
    fn on_default_drift(&self, _key: &InstanceKey, _stored: &Value, _declared: &Value) {}

    /// Called when the script requests an extra render pass.
    #[inline]
    fn on_rerun_requested(&self, _pass: PassId) {}
}

/// Zero-cost tracer that discards all events.
///
/// This is the default tracer for [`Session`](crate::Session).
pub struct NoopTracer;

impl Tracer for NoopTracer {}
