//! Widget wrappers that hide the reinstantiation mechanics from callers.

use crate::error::PassError;
use crate::pass::PassContext;
use crate::value::Value;

/// A button with exactly-once-per-press semantics.
///
/// A plain boolean-valued widget cannot express "the user pressed since the
/// last pass": once pressed, a reused instance keeps emitting `true` on every
/// subsequent pass. The workable protocol is a monotonically increasing press
/// counter, and this wrapper packages the whole dance behind one object so
/// calling code only ever reads [`pressed`](Self::pressed):
///
/// - the last-known counter is passed back to the widget as both an input
///   parameter and the default, so a counter advance reinstantiates the
///   widget and refreshes its baseline;
/// - a press makes the widget emit `baseline + 1`;
/// - when the emitted counter differs from the stored one, the new counter is
///   recorded and an extra render pass is requested, so the derived flag is
///   visible without another physical interaction;
/// - the flag itself is the counter moving past a separately stored
///   last-acted-upon mark.
///
/// Construction is idempotent across passes. Both session-state slots are
/// keyed by the caller-provided `id`, which must be unique per logical
/// button within the session.
///
/// # Example
///
/// ```ignore
/// session.run(|ctx| {
///     let create = ActionButton::mount(ctx, "create-btn", "Create")?;
///     if create.pressed() {
///         // runs exactly once per press
///     }
///     Ok(())
/// })?;
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ActionButton {
    pressed: bool,
}

impl ActionButton {
    /// Slot holding the last counter already acted upon.
    fn seen_slot(id: &str) -> String {
        format!("{}.seen", id)
    }

    /// Declare the button for this pass and resolve its one-shot state.
    ///
    /// Requests a rerun when a fresh press is first observed; the press is
    /// then reported by the pass that follows.
    pub fn mount(ctx: &mut PassContext<'_>, id: &str, label: &str) -> Result<Self, PassError> {
        let count = ctx.state_or(id, Value::Int(0)).try_int()?;

        let emitted = ctx
            .widget()
            .param("id", id)
            .param("label", label)
            .param("count", count)
            .default(Value::Int(count))
            .mount()
            .try_int()?;

        if emitted != count {
            ctx.set_state(id, Value::Int(emitted));
            ctx.request_rerun()?;
        }

        let seen_slot = Self::seen_slot(id);
        let seen = ctx.state_or(&seen_slot, Value::Int(0)).try_int()?;
        let pressed = count != seen;
        if pressed {
            ctx.set_state(seen_slot, Value::Int(count));
        }

        Ok(Self { pressed })
    }

    /// True exactly once per press: on the pass where the advanced counter
    /// was first reconciled, false again until the next press.
    pub fn pressed(&self) -> bool {
        self.pressed
    }
}
