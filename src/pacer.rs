// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Contagion Simulation Suite ("The Ward") - Real-Time Pacing
//
// The host supplies a monotonic clock in milliseconds (performance.now() in
// the browser, Instant in native drivers) and polls. The pacer decides
// whether a simulated day is due; it never runs the simulation itself.

use serde::{Deserialize, Serialize};

/// Interval timer with cancel semantics.
///
/// At most one fire per `poll`. A late poll fires once and re-anchors on
/// the poll time, so a stalled host never triggers a burst of catch-up days.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pacer {
    interval_ms: f64,
    anchor_ms: Option<f64>,
}

impl Pacer {
    pub fn new(interval_ms: u32) -> Self {
        Self { interval_ms: f64::from(interval_ms), anchor_ms: None }
    }

    pub fn is_armed(&self) -> bool {
        self.anchor_ms.is_some()
    }

    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    /// Arm the timer; the first fire is one interval after `now_ms`.
    pub fn start(&mut self, now_ms: f64) {
        self.anchor_ms = Some(now_ms);
    }

    /// Cancel any pending fire.
    pub fn stop(&mut self) {
        self.anchor_ms = None;
    }

    /// Change the interval. A running timer keeps its anchor (the last fire
    /// or the start), so the pending day is neither skipped nor repeated.
    pub fn rebind(&mut self, interval_ms: u32) {
        self.interval_ms = f64::from(interval_ms);
    }

    pub fn next_due_ms(&self) -> Option<f64> {
        self.anchor_ms.map(|a| a + self.interval_ms)
    }

    /// `true` when a day should run now.
    pub fn poll(&mut self, now_ms: f64) -> bool {
        match self.next_due_ms() {
            Some(due) if now_ms >= due => {
                self.anchor_ms = Some(now_ms);
                true
            }
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_pacer_never_fires() {
        let mut pacer = Pacer::new(100);
        assert!(!pacer.poll(1_000_000.0));
        assert_eq!(pacer.next_due_ms(), None);
    }

    #[test]
    fn test_fires_once_per_interval() {
        let mut pacer = Pacer::new(100);
        pacer.start(0.0);
        assert!(!pacer.poll(50.0));
        assert!(!pacer.poll(99.9));
        assert!(pacer.poll(100.0));
        assert!(!pacer.poll(100.0));
        assert!(!pacer.poll(150.0));
        assert!(pacer.poll(200.0));
    }

    #[test]
    fn test_late_poll_does_not_burst() {
        let mut pacer = Pacer::new(100);
        pacer.start(0.0);
        assert!(pacer.poll(1_000.0));
        assert!(!pacer.poll(1_050.0));
        assert_eq!(pacer.next_due_ms(), Some(1_100.0));
    }

    #[test]
    fn test_stop_cancels_pending_fire() {
        let mut pacer = Pacer::new(100);
        pacer.start(0.0);
        pacer.stop();
        assert!(!pacer.poll(500.0));
        assert!(!pacer.is_armed());
    }

    #[test]
    fn test_rebind_keeps_anchor() {
        let mut pacer = Pacer::new(500);
        pacer.start(0.0);
        assert!(!pacer.poll(200.0));
        pacer.rebind(250);
        assert_eq!(pacer.next_due_ms(), Some(250.0));
        assert!(pacer.poll(260.0));
        assert!(!pacer.poll(300.0));

        pacer.rebind(1_000);
        assert!(!pacer.poll(1_000.0));
        assert!(pacer.poll(1_260.0));
    }
}
