//! Two-press confirmation for irreversible actions: the first press arms, a second press
//! inside the window runs the action, and an armed gate quietly expires back to idle.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, PoisonError};

/// Seconds an armed gate waits for the confirming press.
pub const DEFAULT_CONFIRM_WINDOW_SECS: i64 = 3;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GatePhase {
    #[default]
    Idle,
    Armed,
    Executing,
}

/// Result of pressing a gate.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Press {
    /// Waiting for a confirming press until `expires_at`.
    Armed { expires_at: DateTime<Utc> },
    /// Confirmed; run the action and then call `finish`.
    Execute,
}

/// What a gated run did.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum GateOutcome<T> {
    Armed { expires_at: DateTime<Utc> },
    Executed(T),
}

#[derive(Clone, Debug)]
pub struct ConfirmationGate {
    phase: GatePhase,
    expires_at: Option<DateTime<Utc>>,
    window: TimeDelta,
}

impl Default for ConfirmationGate {
    fn default() -> Self {
        Self::new(TimeDelta::seconds(DEFAULT_CONFIRM_WINDOW_SECS))
    }
}

impl ConfirmationGate {
    pub fn new(window: TimeDelta) -> Self {
        Self {
            phase: GatePhase::Idle,
            expires_at: None,
            window,
        }
    }

    /// Phase as seen at `now`; an armed gate past its expiry reads as idle.
    pub fn phase(&self, now: DateTime<Utc>) -> GatePhase {
        match (self.phase, self.expires_at) {
            (GatePhase::Armed, Some(expires_at)) if now >= expires_at => GatePhase::Idle,
            (phase, _) => phase,
        }
    }

    /// Idle (or expired) arms; armed moves to executing. A press while another
    /// execution is running arms again rather than queueing a second run.
    pub fn press(&mut self, now: DateTime<Utc>) -> Press {
        match self.phase(now) {
            GatePhase::Armed => {
                self.phase = GatePhase::Executing;
                self.expires_at = None;
                Press::Execute
            }
            GatePhase::Idle | GatePhase::Executing => {
                let expires_at = now + self.window;
                self.phase = GatePhase::Armed;
                self.expires_at = Some(expires_at);
                Press::Armed { expires_at }
            }
        }
    }

    /// Back to idle once the action is done, whatever its result. A gate armed again
    /// while the action ran stays armed.
    pub fn finish(&mut self) {
        if self.phase != GatePhase::Executing {
            return;
        }
        self.phase = GatePhase::Idle;
        self.expires_at = None;
    }

    /// Press the gate and, when confirmed, run `action`.
    pub async fn run<F, Fut, T, E>(&mut self, now: DateTime<Utc>, action: F) -> Result<GateOutcome<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Press::Armed { expires_at } = self.press(now) {
            return Ok(GateOutcome::Armed { expires_at });
        }
        let result = action().await;
        self.finish();
        result.map(GateOutcome::Executed)
    }
}

/// One gate per guarded target (e.g. `"reset-match:{id}"`), shared across requests.
pub struct GateRegistry {
    window: TimeDelta,
    gates: Mutex<HashMap<String, ConfirmationGate>>,
}

impl GateRegistry {
    pub fn new(window: TimeDelta) -> Self {
        Self {
            window,
            gates: Mutex::new(HashMap::new()),
        }
    }

    pub fn press(&self, key: &str, now: DateTime<Utc>) -> Press {
        let mut gates = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
        gates.retain(|_, gate| gate.phase(now) != GatePhase::Idle);
        gates
            .entry(key.to_string())
            .or_insert_with(|| ConfirmationGate::new(self.window))
            .press(now)
    }

    pub fn finish(&self, key: &str) {
        let mut gates = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(gate) = gates.get_mut(key) {
            gate.finish();
        }
    }

    pub fn phase(&self, key: &str, now: DateTime<Utc>) -> GatePhase {
        let gates = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
        gates.get(key).map_or(GatePhase::Idle, |gate| gate.phase(now))
    }

    /// Press the gate for `key` and, when confirmed, run `action`. The lock is not held
    /// while the action runs.
    pub async fn run<F, Fut, T, E>(&self, key: &str, now: DateTime<Utc>, action: F) -> Result<GateOutcome<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Press::Armed { expires_at } = self.press(key, now) {
            return Ok(GateOutcome::Armed { expires_at });
        }
        let result = action().await;
        self.finish(key);
        result.map(GateOutcome::Executed)
    }
}
