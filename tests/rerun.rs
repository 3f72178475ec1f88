//! Rerun control flow and the value-lag behaviors it exists to fix.
//!
//! An echo widget (a widget that reports its creation parameters back as its
//! value) makes the timing visible: a fresh instance emits its default until
//! the runtime's report arrives, one pass later.

use remount::{InstanceKey, PassContext, PassError, Session, Value};

/// Simulate the widget runtime for every echo instance created so far:
/// each pending mount gets its creation params delivered back as the value.
fn echo_runtime(session: &Session) {
    for notice in session.pending_mounts() {
        session.deliver(notice.key, Value::from(notice.params));
    }
}

fn echo_script(ctx: &mut PassContext<'_>) -> Result<(), PassError> {
    let alpha = ctx.state_or("alpha", 0).try_int()?;
    let beta = ctx.state_or("beta", 0).try_int()?;
    ctx.widget()
        .param("alpha", alpha)
        .param("beta", beta)
        .default(Value::Null)
        .mount();
    Ok(())
}

fn echoed(report: &remount::PassReport) -> Value {
    report.output(0).cloned().unwrap()
}

// ============================================================================
// Without rerun: one interaction of lag
// ============================================================================

#[test]
fn test_echo_lags_one_interaction_without_rerun() {
    let session = Session::new();

    let report = session.run(echo_script).unwrap();
    assert_eq!(echoed(&report), Value::Null);
    echo_runtime(&session);

    // The user increments alpha; the state change only takes effect on the
    // pass it causes.
    session.set_state("alpha", 1);
    let report = session.run(echo_script).unwrap();
    // Parameter drift reinstantiated the echo, so the pass still shows the
    // default, not {alpha: 1}.
    assert_eq!(echoed(&report), Value::Null);
    echo_runtime(&session);

    // Only the next interaction reveals the value from the previous one.
    let report = session.run(echo_script).unwrap();
    let value = echoed(&report);
    let map = value.as_map().unwrap();
    assert_eq!(map.get("alpha"), Some(&Value::Int(1)));
    assert_eq!(map.get("beta"), Some(&Value::Int(0)));
}

// ============================================================================
// With rerun: fresh value within the same interaction
// ============================================================================

#[test]
fn test_rerun_absorbs_the_lag() {
    let session = Session::new();
    let frontend = session.clone();

    session.set_state("alpha", 1);
    let report = session
        .run(move |ctx| {
            let alpha = ctx.state_or("alpha", 0).try_int()?;
            let value = ctx
                .widget()
                .param("alpha", alpha)
                .default(Value::Null)
                .mount();
            if value.is_null() {
                // Fresh instance: the runtime reports during this cycle, and
                // the extra pass picks the value up without another
                // physical interaction.
                for notice in frontend.pending_mounts() {
                    frontend.deliver(notice.key, Value::from(notice.params));
                }
                ctx.request_rerun()?;
            }
            let map = value.as_map().unwrap();
            assert_eq!(map.get("alpha"), Some(&Value::Int(1)));
            Ok(())
        })
        .unwrap();

    assert_eq!(report.reruns, 1);
    assert_eq!(report.pass, 2);
}

#[test]
fn test_rerun_abandons_rest_of_pass() {
    let session = Session::new();

    let report = session
        .run(|ctx| {
            ctx.widget().key("before").default(0).mount();
            if ctx.pass_id() == 1 {
                ctx.request_rerun()?;
            }
            ctx.widget().key("after").default(0).mount();
            Ok(())
        })
        .unwrap();

    // The abandoned pass produced no report; both widgets exist because the
    // completed attempt declared them again.
    assert_eq!(report.pass, 2);
    assert_eq!(report.outputs.len(), 2);
    assert_eq!(session.live_count(), 2);
}

#[test]
fn test_abandoned_pass_does_not_collect() {
    let session = Session::new();

    session
        .run(|ctx| {
            ctx.widget().key("stays").default(0).mount();
            Ok(())
        })
        .unwrap();

    // The first attempt never declares "stays", but it is abandoned before
    // completion; only the completed attempt decides what survives.
    session
        .run(|ctx| {
            if ctx.pass_id() == 2 {
                ctx.request_rerun()?;
            }
            ctx.widget().key("stays").default(0).mount();
            Ok(())
        })
        .unwrap();

    assert_eq!(session.live_keys(), vec![InstanceKey::keyed("stays")]);
    let instance = session.instance(&InstanceKey::keyed("stays")).unwrap();
    assert_eq!(instance.mounted_at, 1);
}

// ============================================================================
// Explicit keys and the two key-handling bugs
// ============================================================================

#[test]
fn test_constant_key_freezes_the_widget() {
    let session = Session::new();

    for kalpha in 0..4 {
        let report = session
            .run(|ctx| {
                ctx.widget()
                    .key("xxx")
                    .param("kalpha", kalpha)
                    .default(Value::Null)
                    .mount();
                Ok(())
            })
            .unwrap();

        if kalpha == 0 {
            echo_runtime(&session);
        } else {
            // The parameters change in value, but the key stays constant and
            // the widget is never reinstantiated: no new mount, and the
            // emitted value is whatever the first instantiation reported.
            assert!(session.pending_mounts().is_empty());
            let value = echoed(&report);
            let map = value.as_map().unwrap();
            assert_eq!(map.get("kalpha"), Some(&Value::Int(0)));
        }
    }

    assert_eq!(session.instance(&InstanceKey::keyed("xxx")).unwrap().mounted_at, 1);
}

#[test]
fn test_key_rotated_per_interaction_reinstantiates() {
    let session = Session::new();

    for n in 0..3 {
        let key = format!("xxx{}", n);
        let report = session
            .run(|ctx| {
                ctx.widget()
                    .key(key.clone())
                    .param("kgamma", n)
                    .default(Value::Null)
                    .mount();
                Ok(())
            })
            .unwrap();

        // Every interaction gets a fresh instance with fresh parameters...
        assert_eq!(echoed(&report), Value::Null);
        let notices = session.pending_mounts();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].params.get("kgamma"), Some(&Value::Int(n)));

        // ...and the previous one is collected.
        assert_eq!(session.live_count(), 1);
        assert_eq!(session.live_keys(), vec![InstanceKey::keyed(key)]);
    }
}

// ============================================================================
// Rerun limit
// ============================================================================

#[test]
fn test_runaway_rerun_is_bounded() {
    let session = Session::builder().max_reruns(8).build();

    let result = session.run(|ctx| {
        // A key rotated on every pass, with the rerun issued unconditionally:
        // the reset condition never converges.
        let n = ctx.state_or("n", 0).try_int()?;
        ctx.set_state("n", n + 1);
        ctx.widget().key(format!("w{}", n)).default(0).mount();
        ctx.request_rerun()
    });

    match result {
        Err(PassError::RerunLimit { limit }) => assert_eq!(limit, 8),
        other => panic!("expected RerunLimit, got {:?}", other),
    }
}
