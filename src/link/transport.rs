//! Effect transport trait: what the engine asks the effect service to do,
//! independent of how the bytes get there.
//!
//! Layers:
//! - `EffectTransport` (this file) — semantic: one command per effect kind
//! - `IpcClient` (client.rs) — wire: frames over the service's TCP endpoint
//!
//! `RecordingTransport` captures operations for unit tests; `NullTransport`
//! silently succeeds when no real service is wanted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::{ControllerTarget, LinkResult};

/// Capability interface to the effect service.
///
/// `start`/`stop`/`is_running` cover the connection lifecycle; the rest are
/// the per-effect commands plus the target-scoped disable. Commands take
/// `&self` so a shared handle can be used from the debounce timers and the
/// supervising thread at once.
pub trait EffectTransport: Send + Sync {
    /// Attempt to bring the connection up. Returns whether it is now live.
    fn start(&self) -> bool;

    /// Tear the connection down. Idempotent.
    fn stop(&self);

    fn is_running(&self) -> bool;

    fn feedback(&self, target: ControllerTarget, position: u8, strength: u8) -> LinkResult;

    fn weapon(
        &self,
        target: ControllerTarget,
        start_position: u8,
        end_position: u8,
        strength: u8,
    ) -> LinkResult;

    fn vibration(
        &self,
        target: ControllerTarget,
        position: u8,
        amplitude: u8,
        frequency: u8,
    ) -> LinkResult;

    fn slope_feedback(
        &self,
        target: ControllerTarget,
        start_position: u8,
        end_position: u8,
        start_strength: u8,
        end_strength: u8,
    ) -> LinkResult;

    fn multi_position_feedback(&self, target: ControllerTarget, strengths: &[u8]) -> LinkResult;

    fn multi_position_vibration(
        &self,
        target: ControllerTarget,
        frequency: u8,
        amplitudes: &[u8],
    ) -> LinkResult;

    /// Stop all effects for the target. Always available.
    fn disable(&self, target: ControllerTarget) -> LinkResult;
}

// ─── Recording transport ────────────────────────────────────────────

/// An operation recorded by `RecordingTransport` for assertion in tests.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportOp {
    Start,
    Stop,
    Feedback {
        target: ControllerTarget,
        position: u8,
        strength: u8,
    },
    Weapon {
        target: ControllerTarget,
        start_position: u8,
        end_position: u8,
        strength: u8,
    },
    Vibration {
        target: ControllerTarget,
        position: u8,
        amplitude: u8,
        frequency: u8,
    },
    SlopeFeedback {
        target: ControllerTarget,
        start_position: u8,
        end_position: u8,
        start_strength: u8,
        end_strength: u8,
    },
    MultiPositionFeedback {
        target: ControllerTarget,
        strengths: Vec<u8>,
    },
    MultiPositionVibration {
        target: ControllerTarget,
        frequency: u8,
        amplitudes: Vec<u8>,
    },
    Disable {
        target: ControllerTarget,
    },
}

/// A transport that records every operation for assertions. `start` succeeds
/// or fails on demand so supervisor retry paths can be exercised. Uses a
/// `Mutex` for interior mutability so a shared `Arc` handle works from any
/// thread.
pub struct RecordingTransport {
    ops: Mutex<Vec<TransportOp>>,
    running: AtomicBool,
    start_succeeds: AtomicBool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self {
            ops: Mutex::new(Vec::new()),
            running: AtomicBool::new(false),
            start_succeeds: AtomicBool::new(true),
        }
    }

    /// Make subsequent `start` calls fail (until allowed again).
    pub fn refuse_start(&self) {
        self.start_succeeds.store(false, Ordering::SeqCst);
    }

    pub fn allow_start(&self) {
        self.start_succeeds.store(true, Ordering::SeqCst);
    }

    /// Return all recorded operations.
    pub fn operations(&self) -> Vec<TransportOp> {
        self.ops.lock().unwrap().clone()
    }

    /// Clear recorded operations.
    pub fn clear(&self) {
        self.ops.lock().unwrap().clear();
    }

    /// Count operations matching a predicate.
    pub fn count<F: Fn(&TransportOp) -> bool>(&self, f: F) -> usize {
        self.ops.lock().unwrap().iter().filter(|op| f(op)).count()
    }

    /// Find the first operation matching a predicate.
    pub fn find<F: Fn(&TransportOp) -> bool>(&self, f: F) -> Option<TransportOp> {
        self.ops.lock().unwrap().iter().find(|op| f(op)).cloned()
    }

    fn record(&self, op: TransportOp) {
        self.ops.lock().unwrap().push(op);
    }
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectTransport for RecordingTransport {
    fn start(&self) -> bool {
        self.record(TransportOp::Start);
        let ok = self.start_succeeds.load(Ordering::SeqCst);
        if ok {
            self.running.store(true, Ordering::SeqCst);
        }
        ok
    }

    fn stop(&self) {
        self.record(TransportOp::Stop);
        self.running.store(false, Ordering::SeqCst);
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn feedback(&self, target: ControllerTarget, position: u8, strength: u8) -> LinkResult {
        self.record(TransportOp::Feedback {
            target,
            position,
            strength,
        });
        Ok(())
    }

    fn weapon(
        &self,
        target: ControllerTarget,
        start_position: u8,
        end_position: u8,
        strength: u8,
    ) -> LinkResult {
        self.record(TransportOp::Weapon {
            target,
            start_position,
            end_position,
            strength,
        });
        Ok(())
    }

    fn vibration(
        &self,
        target: ControllerTarget,
        position: u8,
        amplitude: u8,
        frequency: u8,
    ) -> LinkResult {
        self.record(TransportOp::Vibration {
            target,
            position,
            amplitude,
            frequency,
        });
        Ok(())
    }

    fn slope_feedback(
        &self,
        target: ControllerTarget,
        start_position: u8,
        end_position: u8,
        start_strength: u8,
        end_strength: u8,
    ) -> LinkResult {
        self.record(TransportOp::SlopeFeedback {
            target,
            start_position,
            end_position,
            start_strength,
            end_strength,
        });
        Ok(())
    }

    fn multi_position_feedback(&self, target: ControllerTarget, strengths: &[u8]) -> LinkResult {
        self.record(TransportOp::MultiPositionFeedback {
            target,
            strengths: strengths.to_vec(),
        });
        Ok(())
    }

    fn multi_position_vibration(
        &self,
        target: ControllerTarget,
        frequency: u8,
        amplitudes: &[u8],
    ) -> LinkResult {
        self.record(TransportOp::MultiPositionVibration {
            target,
            frequency,
            amplitudes: amplitudes.to_vec(),
        });
        Ok(())
    }

    fn disable(&self, target: ControllerTarget) -> LinkResult {
        self.record(TransportOp::Disable { target });
        Ok(())
    }
}

// ─── Null transport ─────────────────────────────────────────────────

/// A no-op transport that reports itself running and silently succeeds.
/// Useful for driving the engine with no effect service at all.
pub struct NullTransport;

impl EffectTransport for NullTransport {
    fn start(&self) -> bool {
        true
    }

    fn stop(&self) {}

    fn is_running(&self) -> bool {
        true
    }

    fn feedback(&self, _: ControllerTarget, _: u8, _: u8) -> LinkResult {
        Ok(())
    }

    fn weapon(&self, _: ControllerTarget, _: u8, _: u8, _: u8) -> LinkResult {
        Ok(())
    }

    fn vibration(&self, _: ControllerTarget, _: u8, _: u8, _: u8) -> LinkResult {
        Ok(())
    }

    fn slope_feedback(&self, _: ControllerTarget, _: u8, _: u8, _: u8, _: u8) -> LinkResult {
        Ok(())
    }

    fn multi_position_feedback(&self, _: ControllerTarget, _: &[u8]) -> LinkResult {
        Ok(())
    }

    fn multi_position_vibration(&self, _: ControllerTarget, _: u8, _: &[u8]) -> LinkResult {
        Ok(())
    }

    fn disable(&self, _: ControllerTarget) -> LinkResult {
        Ok(())
    }
}
