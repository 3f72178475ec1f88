//! The one-shot button wrapper, and the boolean-button bug it replaces.

use std::collections::HashMap;

use remount::{ActionButton, InstanceKey, PassContext, PassError, Session, Value};

// ============================================================================
// Simulated widget runtime
// ============================================================================

/// Stands in for the sandboxed button widgets: remembers, per instance, the
/// press counter each one was created with, and emits `baseline + 1` when the
/// user presses it.
struct Frontend {
    session: Session,
    baselines: HashMap<InstanceKey, i64>,
}

impl Frontend {
    fn new(session: &Session) -> Self {
        Self {
            session: session.clone(),
            baselines: HashMap::new(),
        }
    }

    /// Pick up widgets (re)created since the last sync.
    fn sync(&mut self) {
        for notice in self.session.pending_mounts() {
            let baseline = notice
                .params
                .get("count")
                .and_then(Value::as_int)
                .unwrap_or(0);
            self.baselines.insert(notice.key, baseline);
        }
    }

    /// The user presses the button living at `key`.
    fn press(&mut self, key: &InstanceKey) {
        self.sync();
        let baseline = self.baselines[key];
        assert!(self.session.deliver(key.clone(), Value::Int(baseline + 1)));
    }
}

/// A pass declaring two buttons; each button's flag is published to session
/// state so the test can read it after the pass.
fn two_buttons(ctx: &mut PassContext<'_>) -> Result<(), PassError> {
    let b1 = ActionButton::mount(ctx, "b1", "Custom button 1")?;
    let b2 = ActionButton::mount(ctx, "b2", "Custom button 2")?;
    ctx.set_state("b1.fired", b1.pressed());
    ctx.set_state("b2.fired", b2.pressed());
    Ok(())
}

fn fired(session: &Session, slot: &str) -> bool {
    session.state(slot).and_then(|v| v.as_bool()).unwrap()
}

// ============================================================================
// The bug: a boolean button stays true after use
// ============================================================================

#[test]
fn test_naive_boolean_button_latches() {
    let session = Session::new();
    let script = |ctx: &mut PassContext<'_>| {
        ctx.widget()
            .param("label", "Custom button 1")
            .default(false)
            .mount();
        Ok(())
    };

    session.run(script).unwrap();
    assert!(session.deliver(InstanceKey::site(0), Value::Bool(true)));

    // Once used, the button renders true on every later pass: a boolean
    // cannot distinguish "pressed now" from "pressed at some point".
    for _ in 0..3 {
        let report = session.run(script).unwrap();
        assert_eq!(report.output(0), Some(&Value::Bool(true)));
    }
}

// ============================================================================
// The wrapper: exactly once per press
// ============================================================================

#[test]
fn test_press_fires_exactly_once() {
    let session = Session::new();
    let mut frontend = Frontend::new(&session);

    let report = session.run(two_buttons).unwrap();
    assert_eq!(report.reruns, 0);
    assert!(!fired(&session, "b1.fired"));
    assert!(!fired(&session, "b2.fired"));

    frontend.press(&InstanceKey::site(0));

    // The press is absorbed by an automatic extra pass, and the flag is
    // already visible when that run returns.
    let report = session.run(two_buttons).unwrap();
    assert_eq!(report.reruns, 1);
    assert!(fired(&session, "b1.fired"));
    assert!(!fired(&session, "b2.fired"));

    // The next pass goes quiet again.
    let report = session.run(two_buttons).unwrap();
    assert_eq!(report.reruns, 0);
    assert!(!fired(&session, "b1.fired"));
    assert!(!fired(&session, "b2.fired"));
}

#[test]
fn test_buttons_are_independent() {
    let session = Session::new();
    let mut frontend = Frontend::new(&session);

    session.run(two_buttons).unwrap();
    frontend.press(&InstanceKey::site(1));
    session.run(two_buttons).unwrap();

    assert!(!fired(&session, "b1.fired"));
    assert!(fired(&session, "b2.fired"));
}

#[test]
fn test_repeated_presses_each_fire() {
    let session = Session::new();
    let mut frontend = Frontend::new(&session);

    session.run(two_buttons).unwrap();

    for press in 1..=3 {
        frontend.press(&InstanceKey::site(0));
        session.run(two_buttons).unwrap();
        assert!(fired(&session, "b1.fired"), "press {} not observed", press);

        session.run(two_buttons).unwrap();
        assert!(!fired(&session, "b1.fired"), "press {} observed twice", press);
    }

    // The counter slot recorded every press.
    assert_eq!(session.state("b1"), Some(Value::Int(3)));
}

#[test]
fn test_mount_is_idempotent_across_quiet_passes() {
    let session = Session::new();
    let mut frontend = Frontend::new(&session);

    for _ in 0..4 {
        let report = session.run(two_buttons).unwrap();
        assert_eq!(report.reruns, 0);
    }
    frontend.sync();

    // Quiet passes neither reinstantiate nor fire.
    assert_eq!(session.instance(&InstanceKey::site(0)).unwrap().mounted_at, 1);
    assert!(!fired(&session, "b1.fired"));
}

#[test]
fn test_wrapper_state_uses_caller_id_slots() {
    let session = Session::new();
    let mut frontend = Frontend::new(&session);

    session.run(two_buttons).unwrap();
    frontend.press(&InstanceKey::site(0));
    session.run(two_buttons).unwrap();

    assert_eq!(session.state("b1"), Some(Value::Int(1)));
    assert_eq!(session.state("b1.seen"), Some(Value::Int(1)));
    assert_eq!(session.state("b2"), Some(Value::Int(0)));
    assert_eq!(session.state("b2.seen"), Some(Value::Int(0)));
}
