//! Remount: identity resolution for stateful widgets in re-rendered UIs.
//!
//! A declarative host re-runs its whole script to produce each frame, so on
//! every render pass it must decide, per widget declaration, whether it is
//! looking at the same live instance as last pass (keep its state) or at a
//! new one (reset to the default). This crate implements that decision and
//! the machinery around it.
//!
//! # Key Features
//!
//! - **Two identity modes**: an explicit key pins an instance for as long as
//!   the key is redeclared, ignoring parameter changes entirely; without a
//!   key, identity is the declaration site plus structural equality of the
//!   parameters, so any parameter drift reinstantiates the widget and
//!   discards its state
//! - **Pass-oriented value flow**: widget runtimes emit values
//!   asynchronously via [`Session::deliver`]; each value is observed exactly
//!   once, at the start of the next pass
//! - **Rerun as control flow**: [`PassContext::request_rerun`] abandons the
//!   current pass and restarts the script, bounded by a configurable limit
//! - **Garbage collection**: instances no declaration resolved to are
//!   dropped when a pass completes
//! - **Tracing**: the [`Tracer`] trait observes mounts, reuses, remounts,
//!   collections, and the non-fatal diagnostics (key collisions, stale
//!   deliveries, default drift)
//! - **One-shot actions**: [`ActionButton`] packages the counter/rerun dance
//!   needed for exactly-once-per-press semantics behind a single flag
//!
//! # Example
//!
//! ```ignore
//! use remount::{InstanceKey, Session, Value};
//!
//! let session = Session::new();
//!
//! // First pass: the widget is created and emits its default.
//! let report = session.run(|ctx| {
//!     let value = ctx.widget()
//!         .key("greeting")
//!         .param("label", "hello")
//!         .default("")
//!         .mount();
//!     println!("{}", value);
//!     Ok(())
//! })?;
//!
//! // The widget runtime reports a value between passes...
//! session.deliver(InstanceKey::keyed("greeting"), Value::from("clicked"));
//!
//! // ...and the next pass observes it, still the same instance.
//! session.run(|ctx| {
//!     let value = ctx.widget()
//!         .key("greeting")
//!         .param("label", "a different label, same instance")
//!         .default("")
//!         .mount();
//!     assert_eq!(value.as_str(), Some("clicked"));
//!     Ok(())
//! })?;
//! ```

mod error;
mod key;
mod pass;
mod session;
mod storage;
mod tracer;
mod value;
mod widget;

pub use error::PassError;
pub use key::{InstanceKey, PassId, SiteId};
pub use pass::{Declaration, PassContext, PassReport, WidgetBuilder};
pub use session::{Session, SessionBuilder};
pub use storage::{Instance, MountNotice};
pub use tracer::{NoopTracer, PassOutcome, Tracer};
pub use value::{Params, TypeMismatch, Value};
pub use widget::ActionButton;
