//! Integration tests for the two-press confirmation gate.

use chrono::{TimeDelta, TimeZone, Utc};
use esports_tournament_web::logic::{GatePhase, Press};
use esports_tournament_web::{ConfirmationGate, GateOutcome, GateRegistry};
use std::sync::atomic::{AtomicUsize, Ordering};

fn t0() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 1, 18, 0, 0).unwrap()
}

fn secs(n: i64) -> TimeDelta {
    TimeDelta::seconds(n)
}

#[test]
fn first_press_arms_and_second_executes() {
    let mut gate = ConfirmationGate::default();
    assert_eq!(gate.phase(t0()), GatePhase::Idle);
    assert_eq!(gate.press(t0()), Press::Armed { expires_at: t0() + secs(3) });
    assert_eq!(gate.phase(t0() + secs(1)), GatePhase::Armed);
    assert_eq!(gate.press(t0() + secs(1)), Press::Execute);
    assert_eq!(gate.phase(t0() + secs(1)), GatePhase::Executing);
    gate.finish();
    assert_eq!(gate.phase(t0() + secs(1)), GatePhase::Idle);
}

#[test]
fn armed_gate_expires_back_to_idle() {
    let mut gate = ConfirmationGate::new(secs(3));
    gate.press(t0());
    assert_eq!(gate.phase(t0() + secs(3)), GatePhase::Idle);
    // A late press arms again instead of executing
    assert!(matches!(gate.press(t0() + secs(4)), Press::Armed { .. }));
}

#[test]
fn press_while_executing_rearms() {
    let mut gate = ConfirmationGate::default();
    gate.press(t0());
    gate.press(t0());
    assert!(matches!(gate.press(t0()), Press::Armed { .. }));
}

#[tokio::test]
async fn action_runs_once_per_confirmed_pair() {
    let counter = AtomicUsize::new(0);
    let runs = &counter;
    let action = move || async move {
        runs.fetch_add(1, Ordering::SeqCst);
        Ok::<_, String>("deleted")
    };
    let mut gate = ConfirmationGate::default();

    let first = gate.run(t0(), action).await.unwrap();
    assert_eq!(first, GateOutcome::Armed { expires_at: t0() + secs(3) });
    assert_eq!(runs.load(Ordering::SeqCst), 0);

    let second = gate.run(t0() + secs(1), action).await.unwrap();
    assert_eq!(second, GateOutcome::Executed("deleted"));
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    // Four seconds later the gate starts over
    let third = gate.run(t0() + secs(5), action).await.unwrap();
    assert!(matches!(third, GateOutcome::Armed { .. }));
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_action_still_resets_the_gate() {
    let mut gate = ConfirmationGate::default();
    gate.press(t0());
    let result = gate
        .run(t0(), || async { Err::<(), _>("store down") })
        .await;
    assert_eq!(result, Err("store down"));
    assert_eq!(gate.phase(t0()), GatePhase::Idle);
}

#[test]
fn registry_keeps_one_gate_per_key() {
    let gates = GateRegistry::new(secs(3));
    assert!(matches!(gates.press("reset-match:1", t0()), Press::Armed { .. }));
    assert!(matches!(gates.press("reset-match:2", t0()), Press::Armed { .. }));
    assert_eq!(gates.press("reset-match:1", t0() + secs(2)), Press::Execute);
    assert_eq!(gates.phase("reset-match:2", t0() + secs(2)), GatePhase::Armed);
    gates.finish("reset-match:1");
    assert_eq!(gates.phase("reset-match:1", t0() + secs(2)), GatePhase::Idle);
    assert_eq!(gates.phase("unknown", t0()), GatePhase::Idle);
}

#[test]
fn finish_keeps_a_gate_armed_during_the_action() {
    let mut gate = ConfirmationGate::default();
    gate.press(t0());
    assert_eq!(gate.press(t0()), Press::Execute);
    assert!(matches!(gate.press(t0() + secs(1)), Press::Armed { .. }));
    gate.finish();
    assert_eq!(gate.phase(t0() + secs(2)), GatePhase::Armed);
    // The armed press confirms the next run
    assert_eq!(gate.press(t0() + secs(2)), Press::Execute);
}

#[test]
fn registry_finish_keeps_a_newer_arm() {
    let gates = GateRegistry::new(secs(3));
    gates.press("delete-matches:1", t0());
    assert_eq!(gates.press("delete-matches:1", t0()), Press::Execute);
    assert!(matches!(gates.press("delete-matches:1", t0() + secs(1)), Press::Armed { .. }));
    gates.finish("delete-matches:1");
    assert_eq!(gates.phase("delete-matches:1", t0() + secs(2)), GatePhase::Armed);
}

#[tokio::test]
async fn registry_run_executes_on_confirmation() {
    let gates = GateRegistry::new(secs(3));
    let counter = AtomicUsize::new(0);
    let runs = &counter;
    let action = move || async move {
        runs.fetch_add(1, Ordering::SeqCst);
        Ok::<_, String>(())
    };
    let armed = gates.run("delete-tournament:x", t0(), action).await.unwrap();
    assert!(matches!(armed, GateOutcome::Armed { .. }));
    let done = gates.run("delete-tournament:x", t0() + secs(2), action).await.unwrap();
    assert_eq!(done, GateOutcome::Executed(()));
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(gates.phase("delete-tournament:x", t0() + secs(2)), GatePhase::Idle);
}
